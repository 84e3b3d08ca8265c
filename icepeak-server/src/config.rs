//! Server configuration.

use clap::Parser;
use icepeak_store::StoreConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Icepeak server configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "icepeak")]
#[command(about = "In-memory JSON document store with HTTP and WebSocket access")]
pub struct ServerConfig {
    /// Address to listen on for HTTP and WebSocket traffic
    #[arg(long, env = "ICEPEAK_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: SocketAddr,

    /// Snapshot file holding the full document
    #[arg(long, env = "ICEPEAK_DATA_FILE", default_value = "icepeak.json")]
    pub data_file: PathBuf,

    /// Append-only journal file (journaling disabled when absent)
    #[arg(long, env = "ICEPEAK_JOURNAL_FILE")]
    pub journal_file: Option<PathBuf>,

    /// Interval between periodic syncs (snapshot rewrite + journal truncate),
    /// in seconds
    #[arg(long, env = "ICEPEAK_SYNC_INTERVAL", default_value = "10")]
    pub sync_interval: u64,

    /// Address for the metrics endpoint (disabled when absent)
    #[arg(long, env = "ICEPEAK_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Secret for verifying HS256 bearer tokens; requests are unauthenticated
    /// when absent
    #[arg(long, env = "ICEPEAK_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Capacity of the command queue feeding the store writer
    #[arg(long, env = "ICEPEAK_QUEUE_CAPACITY", default_value = "256")]
    pub queue_capacity: usize,

    /// Per-subscriber update buffer; a subscriber that falls this far behind
    /// is disconnected
    #[arg(long, env = "ICEPEAK_SUBSCRIBER_BUFFER", default_value = "16")]
    pub subscriber_buffer: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ICEPEAK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".parse().expect("valid default address"),
            data_file: PathBuf::from("icepeak.json"),
            journal_file: None,
            sync_interval: 10,
            metrics_addr: None,
            jwt_secret: None,
            queue_capacity: 256,
            subscriber_buffer: 16,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate the configuration at startup.
    pub fn validate(&self) -> Result<(), String> {
        if self.sync_interval == 0 {
            return Err("sync_interval must be > 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be > 0".to_string());
        }
        if self.subscriber_buffer == 0 {
            return Err("subscriber_buffer must be > 0".to_string());
        }
        if let Some(secret) = &self.jwt_secret {
            if secret.is_empty() {
                return Err("jwt_secret must not be empty".to_string());
            }
        }
        if self.journal_file.as_deref() == Some(self.data_file.as_path()) {
            return Err("journal_file must differ from data_file".to_string());
        }
        Ok(())
    }

    /// Whether bearer-token authentication is enabled.
    pub fn auth_enabled(&self) -> bool {
        self.jwt_secret.is_some()
    }

    /// Whether journaling is enabled.
    pub fn journaling_enabled(&self) -> bool {
        self.journal_file.is_some()
    }

    /// The store configuration derived from the server flags.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_file: self.data_file.clone(),
            journal_file: self.journal_file.clone(),
            queue_capacity: self.queue_capacity,
            subscriber_buffer: self.subscriber_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sync_interval_is_rejected() {
        let config = ServerConfig {
            sync_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = ServerConfig {
            jwt_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn journal_colliding_with_data_file_is_rejected() {
        let config = ServerConfig {
            data_file: PathBuf::from("store.json"),
            journal_file: Some(PathBuf::from("store.json")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
