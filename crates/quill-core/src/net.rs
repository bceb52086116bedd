//! Connectivity checking.
//!
//! The engine only needs a boolean answer to "is the network reachable
//! right now"; the real capability lives with the embedding platform. The
//! trait keeps that boundary explicit and lets tests pin the answer.

use std::net::ToSocketAddrs;
use std::time::Duration;

/// Boolean predicate consulted before each remote fetch.
pub trait Connectivity: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Assumes connectivity; the fetch itself reports failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }
}

/// Pins the answer to offline; useful for tests and airplane-mode callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOffline;

impl Connectivity for AlwaysOffline {
    fn is_connected(&self) -> bool {
        false
    }
}

/// Best-effort reachability probe: can we open a TCP connection to a
/// well-known address within the timeout?
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

impl Connectivity for TcpProbe {
    fn is_connected(&self) -> bool {
        let Ok(addresses) = self.address.to_socket_addrs() else {
            return false;
        };
        for address in addresses {
            if std::net::TcpStream::connect_timeout(&address, self.timeout).is_ok() {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_probes_answer_as_named() {
        assert!(AlwaysOnline.is_connected());
        assert!(!AlwaysOffline.is_connected());
    }

    #[test]
    fn tcp_probe_reports_unreachable_address() {
        // Port 1 on loopback is refused immediately on any sane host.
        let probe = TcpProbe::new("127.0.0.1:1", Duration::from_millis(200));
        assert!(!probe.is_connected());
    }
}
