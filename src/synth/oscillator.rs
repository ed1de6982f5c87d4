// Oscillators - Waveform and noise generators

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

pub trait Oscillator {
    fn next_sample(&mut self) -> f32;
    fn set_frequency(&mut self, freq: f32);
    fn reset(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformType {
    Sine,
    Square,
    Saw,
    Triangle,
}

#[derive(Debug, Clone)]
pub struct SimpleOscillator {
    waveform: WaveformType,
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
}

impl SimpleOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
        }
    }

    pub fn waveform(&self) -> WaveformType {
        self.waveform
    }
}

impl Oscillator for SimpleOscillator {
    fn next_sample(&mut self) -> f32 {
        let sample = match self.waveform {
            WaveformType::Sine => (self.phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Saw => (self.phase * 2.0) - 1.0,
            WaveformType::Triangle => {
                if self.phase < 0.5 {
                    (self.phase * 4.0) - 1.0
                } else {
                    3.0 - (self.phase * 4.0)
                }
            }
        };

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    fn set_frequency(&mut self, freq: f32) {
        self.phase_increment = (freq / self.sample_rate).max(0.0);
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseColor {
    White,
    Pink,
}

/// Noise source with a fixed seed so renders are reproducible
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    color: NoiseColor,
    rng: StdRng,
    // Paul Kellet's economy pink filter state
    b: [f32; 3],
}

impl NoiseGenerator {
    pub fn new(color: NoiseColor, seed: u64) -> Self {
        Self {
            color,
            rng: StdRng::seed_from_u64(seed),
            b: [0.0; 3],
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let white: f32 = self.rng.gen_range(-1.0..1.0);
        match self.color {
            NoiseColor::White => white,
            NoiseColor::Pink => {
                self.b[0] = 0.99765 * self.b[0] + white * 0.0990460;
                self.b[1] = 0.96300 * self.b[1] + white * 0.2965164;
                self.b[2] = 0.57000 * self.b[2] + white * 1.0526913;
                (self.b[0] + self.b[1] + self.b[2] + white * 0.1848) * 0.25
            }
        }
    }
}
