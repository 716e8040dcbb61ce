//! Configuration for Waypost
//!
//! CLI arguments and environment variable handling using clap.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use uuid::Uuid;

/// Waypost - lightweight service registry
#[derive(Parser, Debug, Clone)]
#[command(name = "waypost")]
#[command(about = "Service registry with heartbeat liveness and filtered discovery")]
pub struct Args {
    /// Unique node identifier for this registry instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379/0")]
    pub redis_url: String,

    /// Entry TTL in seconds. Intentionally short: a service must keep
    /// heartbeating to stay registered.
    #[arg(long, env = "ENTRY_TTL_SECS", default_value = "60")]
    pub entry_ttl_secs: u64,

    /// Unacknowledged report count above which a heartbeat marks the
    /// service suspicious
    #[arg(long, env = "REPORT_TOLERANCE", default_value = "3")]
    pub report_tolerance: i64,

    /// Path to the service type / provider vocabulary file
    #[arg(long, env = "VOCAB_PATH", default_value = "conf.json")]
    pub vocab_path: String,

    /// Application name reported by /version
    #[arg(long, env = "APP_NAME", default_value = "waypost")]
    pub app_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable development mode (in-memory store, no Redis required)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,
}

impl Args {
    /// Entry TTL as a duration
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_ttl_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.entry_ttl_secs == 0 {
            return Err("ENTRY_TTL_SECS must be at least 1".to_string());
        }
        if self.report_tolerance < 0 {
            return Err("REPORT_TOLERANCE must not be negative".to_string());
        }
        Ok(())
    }
}
