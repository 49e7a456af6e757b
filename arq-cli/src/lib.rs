//! ARQ CLI Library
//!
//! Shared functionality for the ARQ command-line tools.

pub mod config;
pub mod stats;

pub use config::{Config, ConfigError, ModeName, ReceiverConfig, SenderConfig};
pub use stats::{csv_line, format_bytes, format_duration, print_receive_summary, print_send_summary};

use std::net::{SocketAddr, ToSocketAddrs};

/// Resolve `host:port` to the first address it names
pub fn resolve_peer(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("could not resolve host {}", host))
}

/// Wildcard address on `port` in the same family as `peer`
pub fn local_bind_addr(peer: SocketAddr, port: u16) -> SocketAddr {
    if peer.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], port))
    } else {
        SocketAddr::from(([0u16; 8], port))
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over `verbose`
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_peer_literal() {
        let addr = resolve_peer("127.0.0.1", 9000).unwrap();
        assert_eq!(addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_local_bind_addr_matches_family() {
        let v4 = local_bind_addr("10.0.0.1:1".parse().unwrap(), 7000);
        assert_eq!(v4, "0.0.0.0:7000".parse::<SocketAddr>().unwrap());

        let v6 = local_bind_addr("[::1]:1".parse().unwrap(), 7000);
        assert_eq!(v6, "[::]:7000".parse::<SocketAddr>().unwrap());
    }
}
