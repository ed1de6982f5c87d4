// Chorus - Short delay line swept by an LFO
//
// Delay centre 3.5 ms, swept at 2.5 Hz. Reads interpolate linearly between
// samples so the sweep stays smooth.

use super::lfo::Lfo;
use super::oscillator::WaveformType;
use crate::audio::dsp_utils::OnePoleSmoother;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusParams {
    pub rate_hz: f32,
    pub delay_ms: f32,
    /// 0.0 - 1.0, sweep as a fraction of the centre delay
    pub depth: f32,
    /// Dry/Wet mix
    pub mix: f32,
}

impl ChorusParams {
    pub fn with_mix(mix: f32) -> Self {
        Self {
            mix: mix.clamp(0.0, 1.0),
            ..Self::default()
        }
    }
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate_hz: 2.5,
            delay_ms: 3.5,
            depth: 0.5,
            mix: 0.0,
        }
    }
}

pub struct Chorus {
    params: ChorusParams,
    sample_rate: f32,
    buffer: Vec<f32>,
    write_pos: usize,
    lfo: Lfo,
    mix_smoother: OnePoleSmoother,
}

impl Chorus {
    const MAX_DELAY_MS: f32 = 20.0;

    pub fn new(params: ChorusParams, sample_rate: f32) -> Self {
        let len = (Self::MAX_DELAY_MS * 0.001 * sample_rate) as usize + 2;
        Self {
            params,
            sample_rate,
            buffer: vec![0.0; len],
            write_pos: 0,
            lfo: Lfo::new(WaveformType::Sine, params.rate_hz, params.depth, sample_rate),
            mix_smoother: OnePoleSmoother::new(params.mix, 10.0, sample_rate),
        }
    }

    pub fn set_params(&mut self, params: ChorusParams) {
        self.params = params;
        self.lfo.set_rate(params.rate_hz);
        self.lfo.set_depth(params.depth);
    }

    pub fn params(&self) -> ChorusParams {
        self.params
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.lfo.reset();
    }

    #[inline]
    fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, (len - 2) as f32);
        let whole = delay.floor() as usize;
        let frac = delay - whole as f32;
        let a = self.buffer[(self.write_pos + len - whole) % len];
        let b = self.buffer[(self.write_pos + len - whole - 1) % len];
        a + (b - a) * frac
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mix = self.mix_smoother.process(self.params.mix);
        let modulation = self.lfo.process();

        self.buffer[self.write_pos] = input;
        let centre = self.params.delay_ms * 0.001 * self.sample_rate;
        let wet = self.read_interpolated(centre * (1.0 + modulation));
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        input * (1.0 - mix) + wet * mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_default_shape() {
        let params = ChorusParams::with_mix(0.4);
        assert_eq!(params.rate_hz, 2.5);
        assert_eq!(params.delay_ms, 3.5);
        assert_eq!(params.depth, 0.5);
        assert_eq!(params.mix, 0.4);
    }

    #[test]
    fn test_dry_when_mix_zero() {
        let mut chorus = Chorus::new(ChorusParams::default(), SAMPLE_RATE);
        for i in 0..100 {
            let x = (i as f32 * 0.1).sin();
            assert_eq!(chorus.process(x), x);
        }
    }

    #[test]
    fn test_wet_signal_is_delayed() {
        let mut params = ChorusParams::with_mix(1.0);
        params.depth = 0.0;
        let mut chorus = Chorus::new(params, SAMPLE_RATE);
        let first = chorus.process(1.0);
        assert_eq!(first, 0.0);
        let echoed: f32 = (0..400).map(|_| chorus.process(0.0)).sum();
        assert!((echoed - 1.0).abs() < 0.01, "echo {}", echoed);
    }

    #[test]
    fn test_output_stays_finite() {
        let mut chorus = Chorus::new(ChorusParams::with_mix(0.5), SAMPLE_RATE);
        for i in 0..44100 {
            assert!(chorus.process(if i % 2 == 0 { 1.0 } else { -1.0 }).is_finite());
        }
    }
}
