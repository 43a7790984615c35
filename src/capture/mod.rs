pub mod chunker;
pub mod device;
pub mod file;
pub mod microphone;

pub use chunker::encode_wav_chunk;
pub use device::{
    AudioChunk, CaptureBackendFactory, CaptureConfig, CaptureDevice, CaptureFactory, CaptureSource,
};
pub use file::FileDevice;
pub use microphone::MicrophoneDevice;
