//! # Request/Reply
//!
//! Strict lock-step, point-to-point. One side listens and accepts
//! connections one at a time; callers decide which side sends first. The
//! control plane and subworker always `recv`-then-`send` on an accepted
//! connection; the client always `send`-then-`recv` on a dialed one.

use tokio::net::{TcpListener, TcpStream};
use futures::{SinkExt, StreamExt};

use crate::error::{TransportError, TransportResult};
use crate::framing::{frame, FramedStream};

/// One lock-step connection, held by either side.
pub struct ReqRepConnection {
    framed: FramedStream,
}

impl ReqRepConnection {
    fn new(stream: TcpStream) -> Self {
        Self {
            framed: frame(stream),
        }
    }

    pub async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        self.framed.send(data.to_vec().into()).await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> TransportResult<Vec<u8>> {
        match self.framed.next().await {
            Some(Ok(bytes)) => Ok(bytes.to_vec()),
            Some(Err(e)) => Err(e.into()),
            None => Err(TransportError::PeerClosed),
        }
    }

    pub async fn close(mut self) -> TransportResult<()> {
        self.framed.close().await?;
        Ok(())
    }
}

/// Accepts Request/Reply connections on one TCP port.
pub struct ReqRepListener {
    listener: TcpListener,
}

impl ReqRepListener {
    pub async fn bind(addr: &str) -> TransportResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept the next connection. The caller drives the lock-step protocol
    /// on the returned connection (typically `recv` then `send`).
    pub async fn accept(&self) -> TransportResult<ReqRepConnection> {
        let (stream, _peer) = self.listener.accept().await?;
        Ok(ReqRepConnection::new(stream))
    }

    pub fn local_addr(&self) -> TransportResult<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

/// Dials a Request/Reply listener.
pub struct ReqRepDialer;

impl ReqRepDialer {
    /// Connect to `addr` and return a connection ready for `send`-then-`recv`.
    pub async fn dial(addr: &str) -> TransportResult<ReqRepConnection> {
        let stream = TcpStream::connect(addr).await?;
        Ok(ReqRepConnection::new(stream))
    }

    /// Connect with a bounded timeout, used by the client's per-attempt dial.
    pub async fn dial_timeout(
        addr: &str,
        timeout: std::time::Duration,
    ) -> TransportResult<ReqRepConnection> {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(ReqRepConnection::new(stream)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reqrep_lock_step_round_trip() {
        let listener = ReqRepListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            let request = conn.recv().await.unwrap();
            assert_eq!(request, b"ping");
            conn.send(b"pong").await.unwrap();
        });

        let mut client = ReqRepDialer::dial(&addr.to_string()).await.unwrap();
        client.send(b"ping").await.unwrap();
        let reply = client.recv().await.unwrap();
        assert_eq!(reply, b"pong");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_recv_after_peer_close_errors() {
        let listener = ReqRepListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            drop(conn);
        });

        let mut client = ReqRepDialer::dial(&addr.to_string()).await.unwrap();
        server.await.unwrap();
        let result = client.recv().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dial_timeout_on_unroutable_address() {
        let result =
            ReqRepDialer::dial_timeout("10.255.255.1:1", std::time::Duration::from_millis(50))
                .await;
        assert!(result.is_err());
    }
}
