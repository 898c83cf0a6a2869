//! Connection handler for the two-byte ID protocol.
//!
//! A connection is a loop of `{count, space}` headers. Each header is answered
//! with exactly `count` big-endian IDs from `space`, written as one frame.
//! Headers may be pipelined; they are served strictly in order.
//!
//! ## Failure behavior
//!
//! Any error ends the loop and the connection is closed by dropping it:
//! - `count == 0` ([`Error::InvalidRequest`])
//! - a failed batch ([`Error::Generation`]); no ID from it is written
//! - a transport failure ([`Error::Io`]), including a stream that ends
//!   part-way through a header
//!
//! A stream that ends cleanly between headers is not an error.

use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use noeq::{Sequencer, SequencerAsyncTokioExt, TimeSource};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::{codec::Framed, sync::CancellationToken};

use crate::server::{
    codec::RequestCodec,
    telemetry::{
        increment_clock_regressions, increment_ids_generated, increment_requests,
        record_request_duration,
    },
};
use crate::{Error, Result};

/// Serves one connection until the peer closes it, an error occurs, or
/// `shutdown` is cancelled.
///
/// Cancellation is only observed between requests: a batch that has started
/// minting is always written out first.
///
/// # Errors
///
/// Returns the error that ended the connection. The caller decides whether
/// it is fatal to the server via [`Error::is_fatal`].
pub async fn handle_connection<S, T>(
    stream: S,
    sequencer: Arc<Sequencer<T>>,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: TimeSource<u64> + Send + Sync,
{
    let mut framed = Framed::new(stream, RequestCodec);

    loop {
        let request = tokio::select! {
            () = shutdown.cancelled() => {
                tracing::debug!("shutdown requested, closing connection");
                break;
            }
            next = framed.next() => match next {
                Some(request) => request?,
                None => break,
            },
        };

        let start = Instant::now();
        increment_requests();

        let ids = sequencer
            .next_ids_async(request.space(), request.count())
            .await
            .inspect_err(|e| {
                if matches!(e, noeq::Error::ClockRegression { .. }) {
                    increment_clock_regressions();
                }
            })?;

        let count = ids.len() as u64;
        framed.send(ids).await?;

        increment_ids_generated(count);
        record_request_duration(start.elapsed().as_secs_f64() * 1000.0);
        tracing::trace!(count, space = request.space(), "served request");
    }

    Ok(())
}

/// Logs the outcome of a finished connection at a level matching its cause.
pub(crate) fn log_outcome(result: &Result<()>) {
    match result {
        Ok(()) => tracing::debug!("connection closed"),
        Err(e) if e.is_fatal() => tracing::error!(error = %e, "fatal generation error"),
        Err(Error::Io(e)) => tracing::debug!(error = %e, "connection dropped"),
        Err(e) => tracing::warn!(error = %e, "connection closed with error"),
    }
}
