//! # Pair
//!
//! One-to-one, bidirectional, no lock-step. Used only for one-shot
//! completion callbacks: the execution engine dials, sends a single
//! payload, and closes.

use tokio::net::{TcpListener, TcpStream};
use futures::{SinkExt, StreamExt};

use crate::error::TransportResult;
use crate::framing::{frame, FramedStream};

pub struct PairConnection {
    framed: FramedStream,
}

impl PairConnection {
    fn new(stream: TcpStream) -> Self {
        Self {
            framed: frame(stream),
        }
    }

    pub async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        self.framed.send(data.to_vec().into()).await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> TransportResult<Option<Vec<u8>>> {
        match self.framed.next().await {
            Some(Ok(bytes)) => Ok(Some(bytes.to_vec())),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub async fn close(mut self) -> TransportResult<()> {
        self.framed.close().await?;
        Ok(())
    }
}

pub struct PairListener {
    listener: TcpListener,
}

impl PairListener {
    pub async fn bind(addr: &str) -> TransportResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> TransportResult<PairConnection> {
        let (stream, _peer) = self.listener.accept().await?;
        Ok(PairConnection::new(stream))
    }

    pub fn local_addr(&self) -> TransportResult<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct PairDialer;

impl PairDialer {
    pub async fn dial(addr: &str) -> TransportResult<PairConnection> {
        let stream = TcpStream::connect(addr).await?;
        Ok(PairConnection::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_one_shot_send() {
        let listener = PairListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            let payload = conn.recv().await.unwrap();
            assert_eq!(payload, Some(b"callback-payload".to_vec()));
        });

        let mut client = PairDialer::dial(&addr.to_string()).await.unwrap();
        client.send(b"callback-payload").await.unwrap();
        client.close().await.unwrap();

        server.await.unwrap();
    }
}
