// Relay server configuration.
//
// Centralizes environment variable parsing with defaults for local
// development. Pool sizing is read separately by `db::pool::PoolConfig`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Core relay server configuration.
///
/// Constructed via [`RelayConfig::from_env`] which reads environment
/// variables and falls back to development defaults.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen address (host:port).
    pub listen_addr: SocketAddr,
    /// PostgreSQL connection string. Without it messages live in memory.
    pub database_url: Option<String>,
    /// Allowed browser origin(s), comma-separated, or `"*"` for any.
    pub frontend_origins: String,
    /// Maximum number of records replayed to a connecting participant.
    pub history_limit: usize,
    /// Log filter directive (e.g. `info`, `pairchat_relay=debug`).
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl RelayConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `PAIRCHAT_RELAY_HOST` | `0.0.0.0` |
    /// | `PAIRCHAT_RELAY_PORT` | `8080` |
    /// | `PAIRCHAT_RELAY_DATABASE_URL` | *(none, in-memory store)* |
    /// | `PAIRCHAT_RELAY_FRONTEND_URL` | `*` |
    /// | `PAIRCHAT_RELAY_HISTORY_LIMIT` | `1000` |
    /// | `PAIRCHAT_RELAY_LOG_FILTER` | `info` |
    /// | `PAIRCHAT_RELAY_LOG_FORMAT` | `text` |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = env("PAIRCHAT_RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env("PAIRCHAT_RELAY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let ip = host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let listen_addr = SocketAddr::new(ip, port);

        let database_url = env("PAIRCHAT_RELAY_DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let frontend_origins = env("PAIRCHAT_RELAY_FRONTEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "*".into());

        let history_limit = env("PAIRCHAT_RELAY_HISTORY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let log_filter = env("PAIRCHAT_RELAY_LOG_FILTER").unwrap_or_else(|_| "info".into());
        let log_format = match env("PAIRCHAT_RELAY_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self { listen_addr, database_url, frontend_origins, history_limit, log_filter, log_format }
    }

    /// Returns true when any browser origin may call the relay.
    pub fn allows_any_origin(&self) -> bool {
        self.frontend_origins.trim() == "*"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from_map(
        map: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_when_no_env_vars() {
        let cfg = RelayConfig::from_env_fn(env_from_map(HashMap::new()));
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert_eq!(cfg.listen_addr.ip().to_string(), "0.0.0.0");
        assert!(cfg.database_url.is_none());
        assert!(cfg.allows_any_origin());
        assert_eq!(cfg.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn custom_host_and_port() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_HOST", "127.0.0.1");
        m.insert("PAIRCHAT_RELAY_PORT", "3000");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn ipv6_host_is_honored() {
        for host in ["::", "[::1]"] {
            let mut m = HashMap::new();
            m.insert("PAIRCHAT_RELAY_HOST", host);
            m.insert("PAIRCHAT_RELAY_PORT", "9000");
            let cfg = RelayConfig::from_env_fn(env_from_map(m));
            assert!(cfg.listen_addr.is_ipv6(), "host {host}");
            assert_eq!(cfg.listen_addr.port(), 9000);
        }
    }

    #[test]
    fn unparseable_host_falls_back_to_unspecified() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_HOST", "relay.local");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn invalid_port_uses_default() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_PORT", "not_a_number");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.port(), 8080);
    }

    #[test]
    fn database_url_from_env() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_DATABASE_URL", "postgres://u:p@host/chat");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://u:p@host/chat"));
    }

    #[test]
    fn blank_database_url_is_treated_as_unset() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_DATABASE_URL", "  ");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn frontend_url_restricts_origins() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_FRONTEND_URL", "https://chat.example.com");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert!(!cfg.allows_any_origin());
        assert_eq!(cfg.frontend_origins, "https://chat.example.com");
    }

    #[test]
    fn history_limit_override() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_HISTORY_LIMIT", "250");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.history_limit, 250);
    }

    #[test]
    fn zero_or_invalid_history_limit_uses_default() {
        for raw in ["0", "-5", "lots"] {
            let mut m = HashMap::new();
            m.insert("PAIRCHAT_RELAY_HISTORY_LIMIT", raw);
            let cfg = RelayConfig::from_env_fn(env_from_map(m));
            assert_eq!(cfg.history_limit, DEFAULT_HISTORY_LIMIT, "input {raw:?}");
        }
    }

    #[test]
    fn log_settings_override() {
        let mut m = HashMap::new();
        m.insert("PAIRCHAT_RELAY_LOG_FILTER", "debug,tower_http=trace");
        m.insert("PAIRCHAT_RELAY_LOG_FORMAT", "json");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.log_filter, "debug,tower_http=trace");
        assert_eq!(cfg.log_format, LogFormat::Json);
    }
}
