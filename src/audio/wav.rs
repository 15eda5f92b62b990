use anyhow::{Context, Result};
use std::io::Cursor;

/// Wrap mono 16-bit PCM samples in an in-memory WAV container.
///
/// The transcription backend only accepts WAV, so every dispatched segment
/// goes through this. An empty sample slice still produces a well-formed
/// container with a zero-length data chunk.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut buffer, spec).context("Failed to create WAV writer")?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }

        writer.finalize().context("Failed to finalize WAV")?;
    }

    Ok(buffer.into_inner())
}
