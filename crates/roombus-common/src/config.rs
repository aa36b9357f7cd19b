//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("Config not initialized. Call roombus_common::config::init() first.")
}

/// Initialize the global configuration from environment.
///
/// Should be called once at application startup, before any other code accesses config.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.bus_port", 8080)?
        .set_default("server.health_port", 8081)?
        .set_default("database.max_connections", 20)?
        .set_default("database.min_connections", 5)?
        .set_default("auth.jwt_secret", "dev-secret-change-me")?
        .set_default("sfu.worker_count", 4)?
        .set_default("sfu.plain_transport_port_offset", 10_000)?
        .set_default("sfu.audio_clock_rate", 48_000)?
        .set_default("sfu.audio_channels", 2)?
        .set_default("mixer.heartbeat_window_secs", 5)?
        .set_default("mixer.failover_timeout_secs", 5)?
        .set_default("egress.retry_delays_secs", vec![5, 15, 30])?
        .set_default("egress.stop_grace_period_ms", 1000)?
        .set_default("egress.bus_level_debounce_ms", 500)?
        .set_default("ingest.srt_port_min", 31_000)?
        .set_default("ingest.srt_port_max", 31_999)?
        .set_default("ingest.rist_port_min", 32_000)?
        .set_default("ingest.rist_port_max", 32_999)?
        .set_default("ingest.connection_timeout_secs", 15)?
        .set_default("ingest.progress_timeout_secs", 10)?
        .set_default("limits.max_chat_message_length", 4000)?
        .set_default("limits.ifb_poll_interval_ms", 250)?
        .set_default("limits.ifb_poll_max_retries", 20)?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (ROOMBUS_SERVER__HOST, ROOMBUS_DATABASE__URL, etc.)
        .add_source(
            config::Environment::with_prefix("ROOMBUS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub sfu: SfuConfig,
    pub mixer: MixerConfig,
    pub egress: EgressConfig,
    pub ingest: IngestConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Port the Room Session Bus WebSocket (`/call-center`) listens on.
    pub bus_port: u16,
    /// Port the minimal health façade listens on.
    pub health_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL; `postgres://` or `sqlite://` selects the backend.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret used to validate claims bundles presented by clients.
    /// Verification of *how* a token was issued is out of scope (§1); this
    /// core only decodes the claims it is handed.
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SfuConfig {
    /// Size of the SFU worker pool (§4.1 `initialize()`).
    pub worker_count: u32,
    /// Offset applied to the mediasoup-chosen loopback port to get the
    /// external port an encoder/ingest process is told to use (§4.1, §6).
    pub plain_transport_port_offset: u16,
    pub audio_clock_rate: u32,
    pub audio_channels: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MixerConfig {
    /// Heartbeat window: a primary missing this long is considered dead (§4.3).
    pub heartbeat_window_secs: u64,
    /// `FAILOVER_TIMEOUT` from §8 — takeover is only accepted past this.
    pub failover_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EgressConfig {
    /// `RETRY_DELAYS` from §8, indexed by `min(retry_count, len-1)`.
    pub retry_delays_secs: Vec<u64>,
    /// How long `stopEncoder` waits for graceful exit before force-killing.
    pub stop_grace_period_ms: u64,
    /// Debounce window for `updateBusLevels` restarts.
    pub bus_level_debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    pub srt_port_min: u16,
    pub srt_port_max: u16,
    pub rist_port_min: u16,
    pub rist_port_max: u16,
    /// `CONNECTION_TIMEOUT` — no progress before the producer exists.
    pub connection_timeout_secs: u64,
    /// `PROGRESS_TIMEOUT` — no progress after the producer exists.
    pub progress_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_chat_message_length: u32,
    pub ifb_poll_interval_ms: u64,
    pub ifb_poll_max_retries: u32,
}
