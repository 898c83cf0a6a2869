//! Accept loop and connection lifecycle.
//!
//! [`Server::serve`] accepts connections until its shutdown token is
//! cancelled, running each one in its own task. On shutdown it stops
//! accepting, signals every open connection, and waits up to the configured
//! timeout for them to drain.
//!
//! A fatal generation error on any connection (see [`Error::is_fatal`]) is
//! treated like a shutdown, except that [`Server::serve`] then returns that
//! error so the process exits unsuccessfully.

use core::fmt;
use core::time::Duration;
use std::io;
use std::sync::{Arc, OnceLock};

use noeq::{Sequencer, TimeSource};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::Instrument;

use crate::server::{
    service::handler::{handle_connection, log_outcome},
    telemetry::{
        decrement_connections_inflight, increment_connection_errors,
        increment_connections_inflight,
    },
};
use crate::{Clock, Error, Result};

/// Default time allowed for open connections to finish on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause before accepting again after `accept` fails.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A source of client connections.
///
/// Implemented for [`TcpListener`] and, on unix, `UnixListener`.
pub trait Listener: Send {
    type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;
    type Addr: fmt::Debug + Send;

    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Io, Self::Addr)>> + Send;
}

impl Listener for TcpListener {
    type Io = tokio::net::TcpStream;
    type Addr = std::net::SocketAddr;

    async fn accept(&mut self) -> io::Result<(Self::Io, Self::Addr)> {
        let (stream, addr) = TcpListener::accept(self).await?;
        // Responses are small and latency bound.
        stream.set_nodelay(true)?;
        Ok((stream, addr))
    }
}

#[cfg(unix)]
impl Listener for tokio::net::UnixListener {
    type Io = tokio::net::UnixStream;
    type Addr = tokio::net::unix::SocketAddr;

    async fn accept(&mut self) -> io::Result<(Self::Io, Self::Addr)> {
        tokio::net::UnixListener::accept(self).await
    }
}

/// The ID service: one shared [`Sequencer`] behind an accept loop.
pub struct Server<T = Clock>
where
    T: TimeSource<u64>,
{
    sequencer: Arc<Sequencer<T>>,
    shutdown_timeout: Duration,
}

impl<T> Server<T>
where
    T: TimeSource<u64> + Send + Sync + 'static,
{
    pub fn new(sequencer: Sequencer<T>) -> Self {
        Self {
            sequencer: Arc::new(sequencer),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn sequencer(&self) -> &Arc<Sequencer<T>> {
        &self.sequencer
    }

    /// Runs the accept loop until `shutdown` is cancelled or a connection hits
    /// a fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] with the fatal error that stopped the
    /// server. Accept failures are logged and retried after a short pause.
    pub async fn serve<L>(&self, mut listener: L, shutdown: CancellationToken) -> Result<()>
    where
        L: Listener,
    {
        let tracker = TaskTracker::new();
        // Cancelled by the caller, or by a connection that hit a fatal error.
        let stop = shutdown.child_token();
        let fatal: Arc<OnceLock<noeq::Error>> = Arc::new(OnceLock::new());

        loop {
            let accepted = tokio::select! {
                () = stop.cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            let (io, addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    // Errors like EMFILE persist until a connection closes.
                    tracing::warn!(
                        error = %e,
                        backoff = ?ACCEPT_BACKOFF,
                        "failed to accept connection"
                    );
                    tokio::select! {
                        () = stop.cancelled() => break,
                        () = tokio::time::sleep(ACCEPT_BACKOFF) => continue,
                    }
                }
            };

            let sequencer = Arc::clone(&self.sequencer);
            let stop = stop.clone();
            let fatal = Arc::clone(&fatal);
            let span = tracing::info_span!("connection", peer = ?addr);

            tracker.spawn(
                async move {
                    increment_connections_inflight();
                    let result = handle_connection(io, sequencer, stop.clone()).await;
                    decrement_connections_inflight();

                    log_outcome(&result);
                    match result {
                        Ok(()) => {}
                        Err(Error::Generation(e)) if e.is_fatal() => {
                            increment_connection_errors();
                            let _ = fatal.set(e);
                            stop.cancel();
                        }
                        Err(_) => increment_connection_errors(),
                    }
                }
                .instrument(span),
            );
        }

        tracker.close();
        tracing::info!(
            open = tracker.len(),
            timeout = ?self.shutdown_timeout,
            "stopped accepting, draining connections"
        );
        if tokio::time::timeout(self.shutdown_timeout, tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                open = tracker.len(),
                "connections still open after shutdown timeout"
            );
        }

        match fatal.get() {
            Some(e) => Err(Error::Generation(e.clone())),
            None => Ok(()),
        }
    }
}
