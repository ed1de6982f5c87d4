// Format conversion - Mono f32 band output to device frames and WAV samples
//
// The renderer produces mono f32. Devices take interleaved frames in f32,
// i16 or u16; 16-bit WAV export takes i16. Nothing here allocates.

use cpal::{FromSample, Sample};

/// f32 to i16, clamping to [-1.0, 1.0] first
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Copy one mono sample to every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(sample: f32, frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel in frame.iter_mut() {
        *channel = Sample::from_sample::<f32>(sample);
    }
}

/// Fill a device buffer from a mono block, silencing frames the block does not cover
pub fn write_block_to_interleaved<T>(block: &[f32], output: &mut [T], channels: usize)
where
    T: Sample + FromSample<f32>,
{
    let channels = channels.max(1);
    for (i, frame) in output.chunks_mut(channels).enumerate() {
        let sample = block.get(i).copied().unwrap_or(0.0);
        write_mono_to_interleaved_frame(sample, frame);
    }
}
