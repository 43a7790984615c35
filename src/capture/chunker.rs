use std::io::Cursor;

use crate::error::CaptureError;

/// Packages raw PCM samples into a standalone WAV payload.
///
/// Each chunk is a complete, independently decodable file so the ingestion
/// side never depends on chunk ordering to parse a payload.
pub fn encode_wav_chunk(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::DeviceUnsupported(format!("WAV encoding failed: {}", e)))?;
        for &sample in samples {
            writer.write_sample(sample).map_err(|e| {
                CaptureError::DeviceUnsupported(format!("WAV encoding failed: {}", e))
            })?;
        }
        writer.finalize().map_err(|e| {
            CaptureError::DeviceUnsupported(format!("WAV encoding failed: {}", e))
        })?;
    }

    Ok(cursor.into_inner())
}
