//! # Discovery Announcements
//!
//! Text-framed `WORKER_ANNOUNCE:<worker_id>:<base_address>` messages emitted
//! by a control plane on the gossip bus and parsed by clients and (purely
//! informationally) subworkers.

const PREFIX: &str = "WORKER_ANNOUNCE:";

/// Format an announcement for `worker_id` at `base_address`.
pub fn format_announcement(worker_id: &str, base_address: &str) -> String {
    format!("{PREFIX}{worker_id}:{base_address}")
}

/// Parse an announcement, splitting on the first two colons after the
/// prefix. `base_address` is consumed verbatim and may itself contain
/// colons (e.g. `tcp://127.0.0.1:5555`).
pub fn parse_announcement(message: &str) -> Option<(String, String)> {
    let rest = message.strip_prefix(PREFIX)?;
    let (worker_id, base_address) = rest.split_once(':')?;
    if worker_id.is_empty() || base_address.is_empty() {
        return None;
    }
    Some((worker_id.to_string(), base_address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let msg = format_announcement("w1", "tcp://127.0.0.1:5555");
        assert_eq!(msg, "WORKER_ANNOUNCE:w1:tcp://127.0.0.1:5555");
        let (id, addr) = parse_announcement(&msg).unwrap();
        assert_eq!(id, "w1");
        assert_eq!(addr, "tcp://127.0.0.1:5555");
    }

    #[test]
    fn test_address_containing_colons_preserved_verbatim() {
        let (id, addr) = parse_announcement("WORKER_ANNOUNCE:worker-7:tcp://10.0.0.2:5900").unwrap();
        assert_eq!(id, "worker-7");
        assert_eq!(addr, "tcp://10.0.0.2:5900");
    }

    #[test]
    fn test_malformed_missing_prefix() {
        assert!(parse_announcement("GARBAGE:w1:tcp://x:1").is_none());
    }

    #[test]
    fn test_malformed_missing_address() {
        assert!(parse_announcement("WORKER_ANNOUNCE:w1").is_none());
    }

    #[test]
    fn test_malformed_empty_id() {
        assert!(parse_announcement("WORKER_ANNOUNCE::tcp://x:1").is_none());
    }
}
