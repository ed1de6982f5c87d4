// LFO (Low Frequency Oscillator) - Modulation source for time-based effects
//
// Runs the audio oscillator at sub-audio rates (0.1 Hz - 20 Hz).

use super::oscillator::{Oscillator, SimpleOscillator, WaveformType};

pub struct Lfo {
    oscillator: SimpleOscillator,
    rate: f32,
    depth: f32,
}

impl Lfo {
    pub fn new(waveform: WaveformType, rate: f32, depth: f32, sample_rate: f32) -> Self {
        let mut lfo = Self {
            oscillator: SimpleOscillator::new(waveform, sample_rate),
            rate: 0.0,
            depth: depth.clamp(0.0, 1.0),
        };
        lfo.set_rate(rate);
        lfo
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(0.1, 20.0);
        self.oscillator.set_frequency(self.rate);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Next modulation value in [-depth, depth]
    #[inline]
    pub fn process(&mut self) -> f32 {
        self.oscillator.next_sample() * self.depth
    }

    pub fn reset(&mut self) {
        self.oscillator.reset();
    }
}
