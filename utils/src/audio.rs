use base64::Engine;
use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree};

/// Sample rate of the PCM16 audio the remote agent consumes and produces.
pub const REALTIME_PCM16_SAMPLE_RATE: f64 = 24000.0;

/// Builds a mono resampler with a fixed input chunk size.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits samples into fixed-size chunks, zero-padding the tail chunk.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Ring buffer shared between the playback callback and the decode task.
pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Decodes a base64 PCM16 fragment into f32 samples in [-1.0, 1.0].
pub fn decode(fragment: &str) -> Vec<f32> {
    match base64::engine::general_purpose::STANDARD.decode(fragment) {
        Ok(pcm16) => pcm16
            .chunks_exact(2)
            .map(|pair| {
                let v = i16::from_le_bytes([pair[0], pair[1]]);
                (v as f32 / i16::MAX as f32).clamp(-1.0, 1.0)
            })
            .collect(),
        Err(e) => {
            tracing::error!("failed to decode base64 audio fragment: {}", e);
            Vec::new()
        }
    }
}

/// Encodes f32 samples as base64 PCM16.
pub fn encode(samples: &[f32]) -> String {
    let mut pcm16 = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let v = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        pcm16.extend_from_slice(&v.to_le_bytes());
    }
    base64::engine::general_purpose::STANDARD.encode(&pcm16)
}
