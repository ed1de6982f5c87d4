// Voice - One sounding note: oscillator, envelope and a gate countdown

use super::envelope::{AdsrEnvelope, AdsrParams};
use super::oscillator::{Oscillator, SimpleOscillator, WaveformType};
use crate::chord::Pitch;

pub struct Voice {
    oscillator: SimpleOscillator,
    envelope: AdsrEnvelope,
    pitch: Pitch,
    velocity: f32,
    /// Samples left before the note releases by itself
    gate_remaining: u64,
    held: bool,
    /// Age counter for voice stealing priority (lower = older)
    age: u64,
}

impl Voice {
    pub fn new(waveform: WaveformType, params: AdsrParams, sample_rate: f32) -> Self {
        Self {
            oscillator: SimpleOscillator::new(waveform, sample_rate),
            envelope: AdsrEnvelope::new(params, sample_rate),
            pitch: Pitch(0),
            velocity: 0.0,
            gate_remaining: 0,
            held: false,
            age: 0,
        }
    }

    /// Start a note that releases after `gate_samples`
    pub fn note_on(&mut self, pitch: Pitch, velocity: f32, gate_samples: u64, age: u64) {
        let retrigger = self.envelope.is_active() && self.pitch == pitch;
        self.pitch = pitch;
        self.velocity = velocity.clamp(0.0, 1.0);
        self.gate_remaining = gate_samples.max(1);
        self.held = true;
        self.age = age;

        self.oscillator.set_frequency(pitch.frequency());
        if !retrigger {
            self.oscillator.reset();
        }
        self.envelope.note_on();
    }

    pub fn note_off(&mut self) {
        self.held = false;
        self.gate_remaining = 0;
        self.envelope.note_off();
    }

    /// Cut to silence immediately
    pub fn kill(&mut self) {
        self.held = false;
        self.gate_remaining = 0;
        self.envelope.reset();
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn is_releasing(&self) -> bool {
        !self.held && self.envelope.is_active()
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        if self.held {
            self.gate_remaining = self.gate_remaining.saturating_sub(1);
            if self.gate_remaining == 0 {
                self.note_off();
            }
        }
        let level = self.envelope.process();
        self.oscillator.next_sample() * self.velocity * level
    }
}
