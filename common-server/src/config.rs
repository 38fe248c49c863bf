//! Command-line and environment configuration
//!
//! The connection string itself is read from `DB_URL` by
//! [`ConnectionSettings::from_env`](common_db::ConnectionSettings::from_env).

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::http::ServerConfig;

/// Arguments for the server binary
#[derive(Parser, Debug)]
#[command(name = "common-server", version, about = "Dispatch server with a resilient database handle")]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b', env = "BIND_ADDR", default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Fail a request with a timeout error after this many seconds
    #[arg(long = "dispatch-timeout", env = "DISPATCH_TIMEOUT_SECS")]
    pub dispatch_timeout_secs: Option<u64>,

    /// Connections held by the database handle
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Start connecting at startup instead of on the first request
    #[arg(long)]
    pub eager_connect: bool,
}

impl ServeArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: self.cors_permissive,
        }
    }

    /// `None` (no timeout) when unset or zero.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = ServeArgs::try_parse_from(["common-server"]).unwrap();
        assert_eq!(args.server_config().bind_addr.port(), 3030);
        assert!(!args.cors_permissive);
        assert!(!args.eager_connect);
        assert_eq!(args.max_connections, 5);
    }

    #[test]
    fn flags_are_parsed() {
        let args = ServeArgs::try_parse_from([
            "common-server",
            "--bind",
            "0.0.0.0:8080",
            "--dispatch-timeout",
            "30",
            "--max-connections",
            "12",
            "--eager-connect",
            "--cors-permissive",
        ])
        .unwrap();

        let config = args.server_config();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.cors_permissive);
        assert_eq!(args.dispatch_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(args.max_connections, 12);
        assert!(args.eager_connect);
    }

    #[test]
    fn zero_timeout_means_none() {
        let args = ServeArgs::try_parse_from(["common-server", "--dispatch-timeout", "0"]).unwrap();
        assert_eq!(args.dispatch_timeout(), None);
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        assert!(ServeArgs::try_parse_from(["common-server", "--bind", "nowhere"]).is_err());
    }
}
