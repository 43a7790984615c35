use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hound::WavReader;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::chunker::encode_wav_chunk;
use super::device::{AudioChunk, CaptureDevice};
use crate::error::CaptureError;

/// Capture backend that replays a WAV file as real-time chunks.
///
/// Stands in for a live microphone during rehearsal and batch testing; the
/// stream ends on its own when the file runs out.
pub struct FileDevice {
    path: PathBuf,
    secure_context: bool,
    source: Option<FileSource>,
    shutdown: Arc<AtomicBool>,
}

struct FileSource {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl FileDevice {
    pub fn new(path: PathBuf, secure_context: bool) -> Self {
        Self {
            path,
            secure_context,
            source: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl CaptureDevice for FileDevice {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        if !self.secure_context {
            return Err(CaptureError::InsecureContext);
        }

        let reader = WavReader::open(&self.path).map_err(|e| match e {
            hound::Error::IoError(_) => CaptureError::DeviceNotFound,
            other => CaptureError::DeviceUnsupported(other.to_string()),
        })?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CaptureError::DeviceUnsupported(e.to_string()))?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);
        info!(
            "Replay source loaded: {} ({:.1}s, {}Hz, {} channels)",
            self.path.display(),
            duration_seconds,
            spec.sample_rate,
            spec.channels
        );

        self.source = Some(FileSource {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        });
        Ok(())
    }

    async fn start(
        &mut self,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        let source = self.source.take().ok_or(CaptureError::DeviceNotFound)?;

        let shutdown = Arc::clone(&self.shutdown);
        shutdown.store(false, Ordering::Release);

        let (chunk_tx, chunk_rx) = mpsc::channel(16);
        let samples_per_chunk = (source.sample_rate as u64 * source.channels as u64
            * chunk_interval.as_millis() as u64
            / 1000) as usize;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(chunk_interval);
            interval.tick().await; // immediate first tick
            let mut index: u64 = 0;
            for window in source.samples.chunks(samples_per_chunk.max(1)) {
                interval.tick().await;
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                match encode_wav_chunk(window, source.sample_rate, source.channels) {
                    Ok(payload) => {
                        if chunk_tx.send(AudioChunk { payload, index }).await.is_err() {
                            break;
                        }
                        index += 1;
                    }
                    Err(e) => warn!("Failed to encode replay chunk: {}", e),
                }
            }
            debug!("Replay ended after {} chunks", index);
        });

        Ok(chunk_rx)
    }

    async fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.source = None;
    }
}
