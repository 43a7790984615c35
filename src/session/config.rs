use std::time::Duration;

use crate::capture::CaptureConfig;

/// Resolved user identity, supplied by the composition root once the
/// external identity provider has authenticated the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

/// Configuration for a session controller instance
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Resolved identity; commands that need one fail with
    /// `Unauthenticated` while this is absent
    pub identity: Option<Identity>,

    /// Capture device configuration
    pub capture: CaptureConfig,

    /// Chunk boundary interval
    pub chunk_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            identity: None,
            capture: CaptureConfig::default(),
            chunk_interval: Duration::from_secs(1),
        }
    }
}
