//! A pipelining client for the two-byte ID protocol.
//!
//! ```no_run
//! use noeq_server::client::Client;
//!
//! # async fn run() -> noeq_server::Result<()> {
//! let mut client = Client::connect("127.0.0.1:4444").await?;
//! let ids = client.request_ids(10, 0).await?;
//! assert_eq!(ids.len(), 10);
//! # Ok(())
//! # }
//! ```

use std::io;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

use crate::server::codec::ResponseCodec;
use crate::{Error, IdBatch, Request, Result};

/// A connection to a running ID server.
///
/// Requests can be queued with [`Client::send`] and answered later with
/// [`Client::recv`]; responses always come back in request order.
pub struct Client<S = TcpStream> {
    framed: Framed<S, ResponseCodec>,
}

impl Client<TcpStream> {
    /// Connects over TCP.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already established stream, such as a `UnixStream`.
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, ResponseCodec::default()),
        }
    }

    /// Requests `count` IDs from `space` and waits for them.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] if `count` is zero. An I/O error if the
    /// server closes the connection instead of answering, which is how it
    /// reports a failed batch.
    pub async fn request_ids(&mut self, count: u8, space: u8) -> Result<IdBatch> {
        self.send(Request::new(count, space)?).await?;
        self.recv().await
    }

    /// Writes all `requests` in one flush, then reads every response.
    pub async fn pipeline(&mut self, requests: &[Request]) -> Result<Vec<IdBatch>> {
        for request in requests {
            self.framed.feed(*request).await?;
        }
        self.framed.flush().await?;

        let mut batches = Vec::with_capacity(requests.len());
        for _ in requests {
            batches.push(self.recv().await?);
        }
        Ok(batches)
    }

    /// Writes one request without waiting for its response.
    pub async fn send(&mut self, request: Request) -> Result<()> {
        self.framed.send(request).await
    }

    /// Reads the response to the oldest unanswered request.
    pub async fn recv(&mut self) -> Result<IdBatch> {
        if self.framed.codec().in_flight() == 0 {
            return Err(Error::InvalidRequest {
                reason: "no request in flight".to_string(),
            });
        }
        match self.framed.next().await {
            Some(batch) => batch,
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            )
            .into()),
        }
    }

    /// Number of requests sent whose responses have not been read.
    pub fn in_flight(&self) -> usize {
        self.framed.codec().in_flight()
    }

    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}
