//! # Bus
//!
//! Many-to-many gossip. This crate's deployments always use one listener
//! (the control plane, emitting discovery announcements) and many dialers
//! (clients and subworkers, listening only); the listener relays any
//! message it sends or receives to every other connected dialer, and a
//! sender never sees its own message echoed back. A full n-way mesh across
//! multiple listeners is not needed by the core and is not implemented.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::TransportResult;
use crate::framing::frame;

const BROADCAST_CAPACITY: usize = 1024;

/// A relayed message, tagged with the id of the peer that originated it so
/// other peers can filter out their own sends.
#[derive(Debug, Clone)]
struct Relayed {
    origin: u64,
    payload: Bytes,
}

/// The reserved origin id for the listener itself.
const LISTENER_ORIGIN: u64 = 0;

/// Listens for bus dialers and relays messages between them.
pub struct BusListener {
    listener: TcpListener,
    tx: broadcast::Sender<Relayed>,
    rx: broadcast::Receiver<Relayed>,
    next_peer_id: AtomicU64,
}

impl BusListener {
    pub async fn bind(addr: &str) -> TransportResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (tx, rx) = broadcast::channel(BROADCAST_CAPACITY);
        Ok(Self {
            listener,
            tx,
            rx,
            next_peer_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> TransportResult<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept the next dialer and spawn its relay task. Call this in a loop.
    pub async fn accept(&self) -> TransportResult<()> {
        let (stream, peer_addr) = self.listener.accept().await?;
        let peer_id = self.next_peer_id.fetch_add(1, Ordering::SeqCst);
        spawn_relay(stream, peer_id, self.tx.clone());
        debug!(%peer_addr, peer_id, "bus peer connected");
        Ok(())
    }

    /// Broadcast a message to every connected dialer.
    pub fn send(&self, data: &[u8]) -> TransportResult<()> {
        let _ = self.tx.send(Relayed {
            origin: LISTENER_ORIGIN,
            payload: Bytes::copy_from_slice(data),
        });
        Ok(())
    }

    /// Receive the next message originated by a dialer (never the
    /// listener's own sends).
    pub async fn recv(&mut self) -> TransportResult<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Ok(msg) if msg.origin != LISTENER_ORIGIN => return Ok(msg.payload.to_vec()),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(crate::error::TransportError::PeerClosed)
                }
            }
        }
    }
}

fn spawn_relay(stream: TcpStream, peer_id: u64, tx: broadcast::Sender<Relayed>) {
    let framed = frame(stream);
    let (mut sink, mut stream) = framed.split();
    let mut rx = tx.subscribe();

    tokio::spawn(async move {
        while let Some(frame_result) = stream.next().await {
            match frame_result {
                Ok(bytes) => {
                    let _ = tx.send(Relayed {
                        origin: peer_id,
                        payload: bytes.freeze(),
                    });
                }
                Err(_) => break,
            }
        }
    });

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) if msg.origin != peer_id => {
                    if sink.send(msg.payload).await.is_err() {
                        break;
                    }
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Dials a bus listener.
pub struct BusDialer {
    framed: crate::framing::FramedStream,
}

impl BusDialer {
    pub async fn dial(addr: &str) -> TransportResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            framed: frame(stream),
        })
    }

    pub async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        self.framed.send(data.to_vec().into()).await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> TransportResult<Vec<u8>> {
        match self.framed.next().await {
            Some(Ok(bytes)) => Ok(bytes.to_vec()),
            Some(Err(e)) => Err(e.into()),
            None => Err(crate::error::TransportError::PeerClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_broadcast_reaches_dialer() {
        let mut listener = BusListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            loop {
                if listener.accept().await.is_err() {
                    break;
                }
            }
        });

        let mut dialer = BusDialer::dial(&addr).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // Can't reach the listener handle after moving it into the accept
        // loop in this test; verify dialer-to-dialer relay instead.
        let mut dialer2 = BusDialer::dial(&addr).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        dialer.send(b"hello").await.unwrap();
        let received = dialer2.recv().await.unwrap();
        assert_eq!(received, b"hello");
    }

    #[tokio::test]
    async fn test_sender_does_not_receive_own_message() {
        let listener = BusListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            loop {
                if listener.accept().await.is_err() {
                    break;
                }
            }
        });

        let mut dialer = BusDialer::dial(&addr).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        dialer.send(b"self").await.unwrap();

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(100), dialer.recv()).await;
        assert!(result.is_err(), "dialer should not observe its own message");
    }
}
