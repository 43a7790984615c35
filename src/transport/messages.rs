use serde::{Deserialize, Serialize};

/// Control message sent to the ingestion endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartRecording { title: String, user_id: String },
    StopRecording,
}

/// Control message received from the ingestion endpoint
///
/// Unrecognized `type` values deserialize to `Unknown` so newer servers can
/// add message kinds without breaking older clients.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionCreated { meeting_id: String },
    RecordingStarted,
    RecordingStopped,
    Error { message: String },
    #[serde(other)]
    Unknown,
}
