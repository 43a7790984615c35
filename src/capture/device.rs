use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CaptureError;

/// One interval's worth of captured audio, packaged as a standalone WAV
/// payload. Consumers must not assume chunk size or any frame alignment.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Encoded payload, sent to the transport as-is.
    pub payload: Vec<u8>,
    /// 0-indexed position within the capture run.
    pub index: u64,
}

/// Configuration for a capture device
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate for chunk payloads
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Requested input processing; applied when the backend supports it
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono is what the backend STT expects
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Exclusive binding to one audio input.
///
/// Lifecycle is `acquire` -> `start` -> `stop`, one capture run per device;
/// a new device is created for every recording attempt. `acquire` always
/// resolves to a terminal outcome, success or a typed `CaptureError`.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Obtain permissioned access to the input hardware without starting
    /// capture. Must be called before `start`.
    async fn acquire(&mut self) -> Result<(), CaptureError>;

    /// Begin producing chunks on the given interval.
    ///
    /// The returned channel closing is the terminal "capture ended"
    /// notification. Not restartable once stopped.
    async fn start(
        &mut self,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Release the hardware so the device indicator turns off. Idempotent;
    /// safe to call when not capturing.
    async fn stop(&mut self);
}

/// Where capture input comes from
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Default system microphone
    Microphone,
    /// WAV file replayed in real time (rehearsal/batch testing)
    File(PathBuf),
}

/// Creates one fresh device per recording attempt.
pub trait CaptureFactory: Send + Sync {
    fn create(&self) -> Box<dyn CaptureDevice>;
}

/// Capture backend factory
pub struct CaptureBackendFactory {
    source: CaptureSource,
    config: CaptureConfig,
    /// Whether the ingestion endpoint qualifies as a secure context.
    /// Computed once at composition time; capture refuses to touch hardware
    /// when this is false.
    secure_context: bool,
}

impl CaptureBackendFactory {
    pub fn new(source: CaptureSource, config: CaptureConfig, secure_context: bool) -> Self {
        Self {
            source,
            config,
            secure_context,
        }
    }
}

impl CaptureFactory for CaptureBackendFactory {
    fn create(&self) -> Box<dyn CaptureDevice> {
        match &self.source {
            CaptureSource::Microphone => Box::new(super::microphone::MicrophoneDevice::new(
                self.config.clone(),
                self.secure_context,
            )),
            CaptureSource::File(path) => Box::new(super::file::FileDevice::new(
                path.clone(),
                self.secure_context,
            )),
        }
    }
}
