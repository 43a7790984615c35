use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SupportedStreamConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::chunker::encode_wav_chunk;
use super::device::{AudioChunk, CaptureConfig, CaptureDevice};
use crate::error::CaptureError;

/// Microphone capture via the platform's default input device.
///
/// The cpal stream is not `Send`, so a dedicated thread owns it for the
/// duration of the capture run; the async side only sees the shared sample
/// buffer and the chunk channel.
pub struct MicrophoneDevice {
    config: CaptureConfig,
    secure_context: bool,
    acquired: Option<(Device, SupportedStreamConfig)>,
    shutdown: Arc<AtomicBool>,
    capture_thread: Option<std::thread::JoinHandle<()>>,
    started: bool,
}

impl MicrophoneDevice {
    pub fn new(config: CaptureConfig, secure_context: bool) -> Self {
        Self {
            config,
            secure_context,
            acquired: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            started: false,
        }
    }
}

#[async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        // Refused before any hardware access is attempted.
        if !self.secure_context {
            return Err(CaptureError::InsecureContext);
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotFound)?;

        let stream_config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnsupported(e.to_string()))?;

        info!(
            "Microphone acquired ({}Hz, {} channels, {:?})",
            stream_config.sample_rate().0,
            stream_config.channels(),
            stream_config.sample_format()
        );
        debug!(
            "Requested input processing: aec={}, ns={}, agc={} (applied when the host supports it)",
            self.config.echo_cancellation,
            self.config.noise_suppression,
            self.config.auto_gain_control
        );

        self.acquired = Some((device, stream_config));
        Ok(())
    }

    async fn start(
        &mut self,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if self.started {
            return Err(CaptureError::DeviceUnsupported(
                "capture already started; create a new device".into(),
            ));
        }
        let (device, stream_config) = self
            .acquired
            .take()
            .ok_or(CaptureError::DeviceNotFound)?;

        let source_rate = stream_config.sample_rate().0;
        let source_channels = stream_config.channels();
        let sample_format = stream_config.sample_format();

        let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::clone(&self.shutdown);
        shutdown.store(false, Ordering::Release);

        // Capture thread: owns the stream, pushes interleaved i16 samples
        // into the shared buffer until shutdown.
        let (ready_tx, ready_rx) = oneshot::channel();
        let thread_samples = Arc::clone(&samples);
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || {
            let result = build_stream(
                &device,
                &stream_config.into(),
                sample_format,
                thread_samples,
                Arc::clone(&thread_shutdown),
            );
            let stream = match result {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(CaptureError::DeviceUnsupported(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            while !thread_shutdown.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(25));
            }
            drop(stream);
            debug!("Capture thread stopped");
        });

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                return Err(CaptureError::DeviceUnsupported(
                    "capture thread exited before starting".into(),
                ))
            }
        }

        self.capture_thread = Some(handle);
        self.started = true;
        info!(
            "Microphone capture started (chunks every {}ms)",
            chunk_interval.as_millis()
        );

        // Chunker task: drains the buffer on the interval and emits each
        // drain as a standalone WAV payload. Dropping the sender when the
        // run ends is the terminal capture-ended notification.
        let (chunk_tx, chunk_rx) = mpsc::channel(16);
        let target_rate = self.config.sample_rate;
        let target_channels = self.config.channels;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(chunk_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await; // immediate first tick
            let mut index: u64 = 0;
            loop {
                interval.tick().await;
                let stopping = shutdown.load(Ordering::Acquire);
                let drained: Vec<i16> = {
                    let mut buf = samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    std::mem::take(&mut *buf)
                };
                if !drained.is_empty() {
                    let processed = to_target_format(
                        drained,
                        source_rate,
                        source_channels,
                        target_rate,
                        target_channels,
                    );
                    match encode_wav_chunk(&processed, target_rate, target_channels) {
                        Ok(payload) => {
                            if chunk_tx.send(AudioChunk { payload, index }).await.is_err() {
                                break;
                            }
                            index += 1;
                        }
                        Err(e) => warn!("Failed to encode audio chunk: {}", e),
                    }
                }
                if stopping {
                    break;
                }
            }
            debug!("Chunker stopped after {} chunks", index);
        });

        Ok(chunk_rx)
    }

    async fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.acquired = None;
        if let Some(handle) = self.capture_thread.take() {
            // Join off the async runtime; the thread polls the flag at 25ms.
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
            info!("Microphone released");
        }
    }
}

fn build_stream(
    device: &Device,
    config: &cpal::StreamConfig,
    sample_format: SampleFormat,
    samples: Arc<Mutex<Vec<i16>>>,
    shutdown: Arc<AtomicBool>,
) -> Result<cpal::Stream, CaptureError> {
    let err_fn = |e| error!("Audio stream error: {}", e);

    let result = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                let mut buf = samples.lock().unwrap_or_else(|e| e.into_inner());
                buf.extend(data.iter().map(|&s| {
                    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                }));
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                let mut buf = samples.lock().unwrap_or_else(|e| e.into_inner());
                buf.extend_from_slice(data);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::DeviceUnsupported(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    };

    result.map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            CaptureError::DeviceUnsupported("stream config not supported".into())
        }
        // OS-level input denial surfaces as a backend error on every host
        cpal::BuildStreamError::BackendSpecific { err } => {
            warn!("Input stream refused: {}", err);
            CaptureError::PermissionDenied
        }
        other => CaptureError::DeviceUnsupported(other.to_string()),
    })
}

/// Convert captured samples to the configured payload format.
fn to_target_format(
    samples: Vec<i16>,
    source_rate: u32,
    source_channels: u16,
    target_rate: u32,
    target_channels: u16,
) -> Vec<i16> {
    let mono = if source_channels != target_channels && target_channels == 1 {
        stereo_to_mono(samples, source_channels)
    } else {
        samples
    };
    downsample(mono, source_rate, target_rate)
}

/// Downsample by decimation; upsampling is not attempted.
fn downsample(samples: Vec<i16>, source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate {
        return samples;
    }
    let ratio = source_rate / target_rate;
    if ratio <= 1 {
        return samples;
    }
    samples.iter().step_by(ratio as usize).copied().collect()
}

/// Sum channel pairs into mono with clipping (no division, preserves volume).
fn stereo_to_mono(samples: Vec<i16>, channels: u16) -> Vec<i16> {
    if channels != 2 {
        return samples;
    }
    samples
        .chunks_exact(2)
        .map(|pair| {
            let sum = pair[0] as i32 + pair[1] as i32;
            sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        })
        .collect()
}
