//! # Discovery Listener
//!
//! Dials the discovery bus in the background, parses
//! `WORKER_ANNOUNCE:<id>:<address>` messages and inserts them into the
//! known-workers set. Malformed messages are logged and dropped.

use tracing::warn;

use fastworker_shared::discovery::parse_announcement;
use fastworker_transport::bus::BusDialer;

use crate::state::ClientState;

pub async fn run_discovery_listener(state: ClientState, discovery_address: String) {
    loop {
        match BusDialer::dial(&discovery_address).await {
            Ok(mut dialer) => loop {
                match dialer.recv().await {
                    Ok(bytes) => {
                        let Ok(text) = String::from_utf8(bytes) else {
                            warn!("discovery message was not valid utf-8");
                            continue;
                        };
                        match parse_announcement(&text) {
                            Some((id, address)) => {
                                state.known_workers.lock().await.insert((id, address));
                            }
                            None => warn!(message = %text, "malformed discovery announcement"),
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "discovery bus connection lost, reconnecting");
                        break;
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "discovery bus dial failed, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_shared::discovery::format_announcement;
    use fastworker_transport::bus::BusListener;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_listener_populates_known_workers() {
        let bus = Arc::new(BusListener::bind("127.0.0.1:0").await.unwrap());
        let addr = bus.local_addr().unwrap().to_string();

        let bus_accept = bus.clone();
        tokio::spawn(async move {
            loop {
                if bus_accept.accept().await.is_err() {
                    break;
                }
            }
        });

        let state = ClientState::new();
        tokio::spawn(run_discovery_listener(state.clone(), addr));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        bus.send(format_announcement("w1", "tcp://127.0.0.1:5655").as_bytes())
            .unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                if state.has_known_workers().await {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("worker should be discovered within timeout");

        let workers = state.known_workers.lock().await;
        assert!(workers.contains(&("w1".to_string(), "tcp://127.0.0.1:5655".to_string())));
    }
}
