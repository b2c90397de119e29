//! Runtime configuration, read from the environment.
//!
//! Unset variables take their default; unparsable ones log a warning and fall
//! back to the default as well.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use budgetwatch_forecasting::DEFAULT_MAX_RUNS;
use budgetwatch_monitoring::DEFAULT_CHANNEL_CAPACITY;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Ceiling on `runs` accepted by the forecast endpoints.
    pub forecast_max_runs: usize,
    pub forecast_timeout: Duration,
    /// Per-subscriber alert buffer.
    pub alert_channel_capacity: usize,
    pub sse_keep_alive: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8082,
            forecast_max_runs: DEFAULT_MAX_RUNS,
            forecast_timeout: Duration::from_millis(5_000),
            alert_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            sse_keep_alive: Duration::from_secs(15),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr),
            port: parse_or(&lookup, "PORT", defaults.port),
            forecast_max_runs: parse_or(&lookup, "FORECAST_MAX_RUNS", defaults.forecast_max_runs),
            forecast_timeout: Duration::from_millis(parse_or(
                &lookup,
                "FORECAST_TIMEOUT_MS",
                defaults.forecast_timeout.as_millis() as u64,
            )),
            alert_channel_capacity: parse_or(
                &lookup,
                "ALERT_CHANNEL_CAPACITY",
                defaults.alert_channel_capacity,
            ),
            sse_keep_alive: Duration::from_secs(parse_or(
                &lookup,
                "SSE_KEEP_ALIVE_SECS",
                defaults.sse_keep_alive.as_secs(),
            )),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + core::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{key}={raw:?} is not valid; using default {default:?}");
            default
        }),
    }
}
