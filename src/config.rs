// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use dotenvy::dotenv;

/// Minimum percentage of the total points a result needs to count as a pass.
pub const PASSING_SCORE_PERCENTAGE: f64 = 60.0;

/// Results at or above this percentage land in the top distribution bucket.
pub const EXCELLENT_SCORE_PERCENTAGE: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the service keeps everything in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    /// Period of the attempt sweeper that drives exam timers.
    pub tick_interval: Duration,
    /// How long a submitted attempt stays readable before it is discarded.
    pub session_retention: Duration,
    /// How long an in-progress attempt may go untouched before it is abandoned.
    pub session_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|addr| addr.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let tick_interval = Duration::from_millis(env_u64("TICK_INTERVAL_MS", 1000).max(1));

        let session_retention = Duration::from_secs(env_u64("SESSION_RETENTION_SECS", 600));

        let session_idle_timeout = Duration::from_secs(env_u64("SESSION_IDLE_SECS", 24 * 60 * 60));

        Self {
            database_url,
            jwt_secret,
            bind_addr,
            rust_log,
            log_dir,
            tick_interval,
            session_retention,
            session_idle_timeout,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
