//! Recording session lifecycle
//!
//! This module provides the `SessionController` that owns:
//! - The capture device binding and the transport channel (one of each)
//! - The Idle -> Connecting -> Ready -> Recording state machine
//! - Chunk forwarding from capture to transport
//! - State snapshots published to observers on every change

mod config;
mod controller;
mod observers;
mod state;

pub use config::{Identity, SessionConfig};
pub use controller::SessionController;
pub use observers::{ObserverRegistry, Subscription};
pub use state::{format_duration, ErrorInfo, ErrorKind, SessionState};
