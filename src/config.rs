use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub ingest: IngestConfig,
    pub audio: AudioConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct IngestConfig {
    /// WebSocket ingestion endpoint, e.g. "wss://ingest.example.com/audio"
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Chunk boundary interval in milliseconds
    pub chunk_interval_ms: u64,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

/// Resolved user identity. The identity provider itself is external; by the
/// time meetstream runs, authentication has already happened and only the
/// stable user id matters here.
#[derive(Debug, Deserialize)]
pub struct IdentityConfig {
    pub user_id: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
