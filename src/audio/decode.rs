//! Narration audio decoder — base64 PCM → normalized `f32` sample buffer.
//!
//! The speech-synthesis API returns raw signed 16-bit little-endian PCM at
//! 24 kHz mono, wrapped in base64.  [`decode_narration`] turns that string
//! into a [`DecodedAudioBuffer`] the playback engine can hand to the output
//! device directly — no resampling, no channel mapping.
//!
//! # Example
//!
//! ```rust
//! use landmark_guide::audio::decode_narration;
//!
//! // Two samples: 0 and -32768 (i16 LE), base64-encoded.
//! let buffer = decode_narration("AAAAgA==").unwrap();
//! assert_eq!(buffer.samples, vec![0.0, -1.0]);
//! assert_eq!(buffer.sample_rate, 24_000);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sample rate of synthesized narration audio in Hz.
///
/// Fixed by the speech-synthesis API contract; the output device context is
/// opened at this rate so no resampling is ever needed.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;

/// Narration audio is always mono.
pub const NARRATION_CHANNELS: u16 = 1;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding a narration blob.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("narration audio is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

// ---------------------------------------------------------------------------
// DecodedAudioBuffer
// ---------------------------------------------------------------------------

/// An immutable buffer of normalized mono samples ready for playback.
///
/// Samples are `f32` in `[-1.0, 1.0]`.  Derived deterministically from the
/// encoded blob by [`decode_narration`]; never mutated after creation — the
/// playback engine holds it behind an `Arc` and only ever reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    /// Sample rate in Hz (always [`NARRATION_SAMPLE_RATE`] for narration).
    pub sample_rate: u32,
    /// Number of interleaved channels (always [`NARRATION_CHANNELS`]).
    pub channels: u16,
    /// Normalized PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

impl DecodedAudioBuffer {
    /// Number of sample frames in the buffer.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// decode_narration
// ---------------------------------------------------------------------------

/// Decode a base64 string of 16-bit LE mono PCM into a [`DecodedAudioBuffer`].
///
/// Each consecutive byte pair is reinterpreted as a signed 16-bit
/// little-endian integer and divided by 32768.0, mapping the full signed
/// range into `[-1.0, 0.999969…]`.  The slight positive-side asymmetry is
/// inherent to the representation and left uncorrected.
///
/// A trailing odd byte (an incomplete sample) is silently dropped.  An empty
/// input yields an empty buffer, not an error.
///
/// # Errors
///
/// Returns [`DecodeError::Base64`] when the input is not valid base64.
pub fn decode_narration(encoded: &str) -> Result<DecodedAudioBuffer, DecodeError> {
    let bytes = STANDARD.decode(encoded)?;

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(DecodedAudioBuffer {
        sample_rate: NARRATION_SAMPLE_RATE,
        channels: NARRATION_CHANNELS,
        samples,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_samples(samples: &[i16]) -> String {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        STANDARD.encode(&bytes)
    }

    // ---- Round trip --------------------------------------------------------

    #[test]
    fn round_trip_within_one_quantization_step() {
        let original: Vec<i16> = vec![0, 1, -1, 1000, -1000, 12345, -12345, i16::MAX, i16::MIN];
        let encoded = encode_samples(&original);

        let buffer = decode_narration(&encoded).unwrap();
        assert_eq!(buffer.len(), original.len());

        for (sample, raw) in buffer.samples.iter().zip(&original) {
            let expected = *raw as f32 / 32768.0;
            assert!(
                (sample - expected).abs() <= 1.0 / 32768.0,
                "sample {sample} too far from {expected}"
            );
        }
    }

    #[test]
    fn extreme_values_map_asymmetrically() {
        let buffer = decode_narration(&encode_samples(&[i16::MIN, i16::MAX])).unwrap();
        assert_eq!(buffer.samples[0], -1.0);
        // +32767 does not reach +1.0 — accepted asymmetry.
        assert!(buffer.samples[1] < 1.0);
        assert!((buffer.samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
    }

    // ---- Determinism -------------------------------------------------------

    #[test]
    fn same_input_yields_identical_buffers() {
        let encoded = encode_samples(&[42, -42, 7, 9001, -31000]);
        let a = decode_narration(&encoded).unwrap();
        let b = decode_narration(&encoded).unwrap();
        assert_eq!(a, b);
    }

    // ---- Edge cases --------------------------------------------------------

    #[test]
    fn empty_input_yields_empty_buffer() {
        let buffer = decode_narration("").unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.sample_rate, NARRATION_SAMPLE_RATE);
        assert_eq!(buffer.channels, NARRATION_CHANNELS);
    }

    #[test]
    fn trailing_odd_byte_is_dropped() {
        // Three bytes: one complete sample plus one stray byte.
        let encoded = STANDARD.encode([0x34, 0x12, 0xFF]);
        let buffer = decode_narration(&encoded).unwrap();
        assert_eq!(buffer.len(), 1);
        assert!((buffer.samples[0] - 0x1234 as f32 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_base64_is_an_error() {
        assert!(decode_narration("not base64!!").is_err());
    }

    #[test]
    fn samples_stay_in_normalized_range() {
        let all_over: Vec<i16> = (-50i16..50).map(|i| i * 655).collect();
        let buffer = decode_narration(&encode_samples(&all_over)).unwrap();
        for s in &buffer.samples {
            assert!((-1.0..=1.0).contains(s), "sample {s} out of range");
        }
    }

    // ---- Duration ----------------------------------------------------------

    #[test]
    fn duration_secs_calculation() {
        // 12 000 samples at 24 kHz = 0.5 seconds.
        let encoded = encode_samples(&vec![0i16; 12_000]);
        let buffer = decode_narration(&encoded).unwrap();
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn duration_of_empty_buffer_is_zero() {
        let buffer = decode_narration("").unwrap();
        assert_eq!(buffer.duration_secs(), 0.0);
    }
}
