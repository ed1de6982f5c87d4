// Reverb - Freeverb-style reverb effect
//
// Based on the Freeverb algorithm by Jezar at Dreampoint (public domain),
// mono version: 4 parallel damped combs into 2 series allpasses.
//
// Instead of an abstract room size, each comb's feedback is derived from a
// decay time so the tail falls 60 dB in `decay_secs`.

use crate::audio::dsp_utils::OnePoleSmoother;

/// Reverb parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Time for the tail to fall by 60 dB, in seconds
    pub decay_secs: f32,
    /// 0.0 - 1.0, high frequency damping in the feedback loop
    pub damping: f32,
    /// Dry/Wet mix (0.0 = fully dry, 1.0 = fully wet)
    pub mix: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            decay_secs: 2.5,
            damping: 0.5,
            mix: 0.0,
        }
    }
}

impl ReverbParams {
    pub fn new(decay_secs: f32, damping: f32, mix: f32) -> Self {
        Self {
            decay_secs: decay_secs.clamp(0.1, 20.0),
            damping: damping.clamp(0.0, 1.0),
            mix: mix.clamp(0.0, 1.0),
        }
    }
}

/// Comb filter with a one-pole low-pass in the loop
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damping: f32,
    filter_state: f32,
}

impl CombFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback: 0.5,
            damping: 0.5,
            filter_state: 0.0,
        }
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_state = output * (1.0 - self.damping) + self.filter_state * self.damping;
        self.buffer[self.index] = input + self.filter_state * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.filter_state = 0.0;
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let bufout = self.buffer[self.index];
        let output = -input + bufout;
        self.buffer[self.index] = input + bufout * 0.5;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

pub struct Reverb {
    params: ReverbParams,
    sample_rate: f32,
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
    mix_smoother: OnePoleSmoother,
}

impl Reverb {
    // Tunings for 44.1kHz, scaled to the actual rate
    const COMB_TUNINGS: [usize; 4] = [1116, 1188, 1277, 1356];
    const ALLPASS_TUNINGS: [usize; 2] = [556, 441];

    const SCALE_DAMPING: f32 = 0.4;
    const GAIN: f32 = 0.015;

    pub fn new(params: ReverbParams, sample_rate: f32) -> Self {
        let scale = sample_rate / 44100.0;
        let mut reverb = Self {
            params,
            sample_rate,
            combs: Self::COMB_TUNINGS
                .iter()
                .map(|&t| CombFilter::new((t as f32 * scale) as usize))
                .collect(),
            allpasses: Self::ALLPASS_TUNINGS
                .iter()
                .map(|&t| AllpassFilter::new((t as f32 * scale) as usize))
                .collect(),
            mix_smoother: OnePoleSmoother::new(params.mix, 10.0, sample_rate),
        };
        reverb.update();
        reverb
    }

    pub fn set_params(&mut self, params: ReverbParams) {
        self.params = params;
        self.update();
    }

    pub fn params(&self) -> ReverbParams {
        self.params
    }

    /// g = 10^(-3 * delay / decay)
    fn comb_feedback(len: usize, decay_secs: f32, sample_rate: f32) -> f32 {
        let delay = len as f32 / sample_rate;
        10f32.powf(-3.0 * delay / decay_secs.max(0.1)).min(0.98)
    }

    fn update(&mut self) {
        let damping = self.params.damping * Self::SCALE_DAMPING;
        for comb in &mut self.combs {
            comb.feedback = Self::comb_feedback(comb.len(), self.params.decay_secs, self.sample_rate);
            comb.damping = damping;
        }
    }

    pub fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::mute);
        self.allpasses.iter_mut().for_each(AllpassFilter::mute);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mix = self.mix_smoother.process(self.params.mix);
        if mix <= 0.0 {
            return input;
        }

        let scaled = input * Self::GAIN;
        let mut wet: f32 = self.combs.iter_mut().map(|c| c.process(scaled)).sum();
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }

        input * (1.0 - mix) + wet * mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_params_clamped() {
        let params = ReverbParams::new(100.0, 2.0, -1.0);
        assert_eq!(params.decay_secs, 20.0);
        assert_eq!(params.damping, 1.0);
        assert_eq!(params.mix, 0.0);
    }

    #[test]
    fn test_comb_feedback_follows_decay() {
        // 1116 samples at 44.1kHz over a 2.5s decay
        let g = Reverb::comb_feedback(1116, 2.5, SAMPLE_RATE);
        let expected = 10f32.powf(-3.0 * (1116.0 / SAMPLE_RATE) / 2.5);
        assert!((g - expected).abs() < 1e-6);
        assert!(Reverb::comb_feedback(1116, 5.0, SAMPLE_RATE) > g);
    }

    #[test]
    fn test_dry_when_mix_zero() {
        let mut reverb = Reverb::new(ReverbParams::default(), SAMPLE_RATE);
        assert_eq!(reverb.process(0.5), 0.5);
    }

    #[test]
    fn test_impulse_produces_tail() {
        let mut reverb = Reverb::new(ReverbParams::new(2.5, 0.5, 1.0), SAMPLE_RATE);
        reverb.process(1.0);
        let tail: f32 = (0..4410).map(|_| reverb.process(0.0).abs()).sum();
        assert!(tail > 0.0);
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut reverb = Reverb::new(ReverbParams::new(2.5, 0.5, 1.0), SAMPLE_RATE);
        for _ in 0..2000 {
            reverb.process(1.0);
        }
        reverb.reset();
        let tail: f32 = (0..2000).map(|_| reverb.process(0.0).abs()).sum();
        assert!(tail < 1e-6);
    }

    #[test]
    fn test_output_stays_finite() {
        let mut reverb = Reverb::new(ReverbParams::new(20.0, 0.0, 1.0), SAMPLE_RATE);
        for _ in 0..44100 {
            assert!(reverb.process(1.0).is_finite());
        }
    }
}
