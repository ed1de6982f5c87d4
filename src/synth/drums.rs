// Drums - One-shot percussion voices: membrane (kick), noise (snare),
// metallic (hi-hat)
//
// One-shots have no sustain, so a trigger's duration only matters for the
// queue; the sound length is set by the decay.

use super::envelope::DecayEnvelope;
use super::filter::{FilterParams, StateVariableFilter};
use super::oscillator::{NoiseColor, NoiseGenerator, Oscillator, SimpleOscillator, WaveformType};
use super::schedule::{NoteQueue, ScheduledSource, render_scheduled};
use crate::audio::mixer::db_to_gain;
use crate::chord::Pitch;
use crate::voice::{Instrument, NoteTrigger};

pub const SNARE_TRIM_DB: f32 = -10.0;
pub const HIHAT_TRIM_DB: f32 = -15.0;

/// A percussion sound generator
pub trait Percussion: Send {
    fn strike(&mut self, pitch: Option<Pitch>, velocity: f32);
    fn next_sample(&mut self) -> f32;
}

/// Sine with a fast downward pitch sweep
pub struct Membrane {
    oscillator: SimpleOscillator,
    envelope: DecayEnvelope,
    default_pitch: Pitch,
    base_frequency: f32,
    octaves: f32,
    ratio: f32,
    sweep_coefficient: f32,
}

impl Membrane {
    /// Sweep starts at `octaves` times the note frequency and falls to it
    /// over `pitch_decay` seconds
    pub fn new(default_pitch: Pitch, pitch_decay: f32, octaves: f32, decay: f32, sample_rate: f32) -> Self {
        let octaves = octaves.max(1.0);
        let samples = (pitch_decay.max(0.001) * sample_rate).max(1.0);
        Self {
            oscillator: SimpleOscillator::new(WaveformType::Sine, sample_rate),
            envelope: DecayEnvelope::new(decay, sample_rate),
            default_pitch,
            base_frequency: default_pitch.frequency(),
            octaves,
            ratio: 1.0,
            sweep_coefficient: (1.0 / octaves).powf(1.0 / samples),
        }
    }

    pub fn kick(sample_rate: f32) -> Self {
        Self::new(Pitch::C1, 0.05, 4.0, 0.2, sample_rate)
    }
}

impl Percussion for Membrane {
    fn strike(&mut self, pitch: Option<Pitch>, velocity: f32) {
        self.base_frequency = pitch.unwrap_or(self.default_pitch).frequency();
        self.ratio = self.octaves;
        self.oscillator.reset();
        self.envelope.trigger(velocity);
    }

    fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        self.oscillator.set_frequency(self.base_frequency * self.ratio);
        self.ratio = (self.ratio * self.sweep_coefficient).max(1.0);
        self.oscillator.next_sample() * self.envelope.process()
    }
}

/// Unfiltered noise burst
pub struct NoiseBurst {
    noise: NoiseGenerator,
    envelope: DecayEnvelope,
    trim: f32,
}

impl NoiseBurst {
    pub fn new(color: NoiseColor, decay: f32, trim_db: f32, sample_rate: f32) -> Self {
        Self {
            noise: NoiseGenerator::new(color, 0x5eed),
            envelope: DecayEnvelope::new(decay, sample_rate),
            trim: db_to_gain(trim_db),
        }
    }

    pub fn snare(sample_rate: f32) -> Self {
        Self::new(NoiseColor::Pink, 0.2, SNARE_TRIM_DB, sample_rate)
    }
}

impl Percussion for NoiseBurst {
    fn strike(&mut self, _pitch: Option<Pitch>, velocity: f32) {
        self.envelope.trigger(velocity);
    }

    fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        self.noise.next_sample() * self.envelope.process() * self.trim
    }
}

/// Inharmonic square cluster through a high-pass
pub struct Metallic {
    partials: [SimpleOscillator; 6],
    filter: StateVariableFilter,
    envelope: DecayEnvelope,
    trim: f32,
}

impl Metallic {
    // Classic drum machine cymbal partials
    const PARTIALS_HZ: [f32; 6] = [205.3, 304.4, 369.6, 522.7, 540.0, 800.0];
    const HIGH_PASS_HZ: f32 = 7000.0;

    pub fn new(decay: f32, trim_db: f32, sample_rate: f32) -> Self {
        let partials = Self::PARTIALS_HZ.map(|hz| {
            let mut osc = SimpleOscillator::new(WaveformType::Square, sample_rate);
            osc.set_frequency(hz);
            osc
        });
        Self {
            partials,
            filter: StateVariableFilter::new(FilterParams::high_pass(Self::HIGH_PASS_HZ), sample_rate),
            envelope: DecayEnvelope::new(decay, sample_rate),
            trim: db_to_gain(trim_db),
        }
    }

    pub fn hihat(sample_rate: f32) -> Self {
        Self::new(0.05, HIHAT_TRIM_DB, sample_rate)
    }
}

impl Percussion for Metallic {
    fn strike(&mut self, _pitch: Option<Pitch>, velocity: f32) {
        self.envelope.trigger(velocity);
    }

    fn next_sample(&mut self) -> f32 {
        let raw: f32 = self.partials.iter_mut().map(|p| p.next_sample()).sum::<f32>() / 6.0;
        let filtered = self.filter.process(raw);
        if !self.envelope.is_active() {
            return 0.0;
        }
        filtered * self.envelope.process() * self.trim
    }
}

/// A percussion sound driven by scheduled triggers
pub struct Drum<P: Percussion> {
    voice: P,
    queue: NoteQueue,
    sample_rate: f32,
}

impl<P: Percussion> Drum<P> {
    pub fn new(voice: P, sample_rate: f32) -> Self {
        Self {
            voice,
            queue: NoteQueue::new(),
            sample_rate,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<P: Percussion> ScheduledSource for Drum<P> {
    fn queue_mut(&mut self) -> &mut NoteQueue {
        &mut self.queue
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn start_note(&mut self, trigger: NoteTrigger) {
        self.voice.strike(trigger.pitch, trigger.velocity);
    }

    fn next_sample(&mut self) -> f32 {
        self.voice.next_sample()
    }
}

impl<P: Percussion> Instrument for Drum<P> {
    fn trigger(&mut self, trigger: NoteTrigger) {
        self.queue.push(trigger);
    }

    /// One-shots already sounding decay on their own
    fn release_all(&mut self, at: f64) {
        self.queue.drop_after(at);
    }

    fn set_tempo(&mut self, bpm: f64) {
        self.queue.set_tempo(bpm);
    }

    fn render(&mut self, start: f64, out: &mut [f32]) {
        render_scheduled(self, start, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::timeline::NoteValue;

    const SAMPLE_RATE: f32 = 44100.0;

    fn hit(time: f64, pitch: Option<Pitch>) -> NoteTrigger {
        NoteTrigger {
            pitch,
            duration: NoteValue::Eighth,
            time,
            velocity: 1.0,
        }
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_kick_sweeps_down_to_pitch() {
        let mut kick = Membrane::kick(SAMPLE_RATE);
        kick.strike(None, 1.0);
        assert_eq!(kick.ratio, 4.0);
        for _ in 0..(0.06 * SAMPLE_RATE) as usize {
            kick.next_sample();
        }
        assert_eq!(kick.ratio, 1.0);
    }

    #[test]
    fn test_silent_until_triggered() {
        let mut drum = Drum::new(NoiseBurst::snare(SAMPLE_RATE), SAMPLE_RATE);
        let mut out = vec![0.0; 512];
        drum.render(0.0, &mut out);
        assert_eq!(energy(&out), 0.0);
    }

    #[test]
    fn test_hit_lands_in_block() {
        let mut drum = Drum::new(Membrane::kick(SAMPLE_RATE), SAMPLE_RATE);
        drum.trigger(hit(0.01, Some(Pitch::C1)));
        let mut out = vec![0.0; 882];
        drum.render(0.0, &mut out);
        assert_eq!(energy(&out[..441]), 0.0);
        assert!(energy(&out[441..]) > 0.0);
    }

    #[test]
    fn test_release_all_drops_future_hits() {
        let mut drum = Drum::new(Metallic::hihat(SAMPLE_RATE), SAMPLE_RATE);
        drum.trigger(hit(0.1, None));
        drum.trigger(hit(0.5, None));
        drum.release_all(0.2);
        assert_eq!(drum.pending(), 1);
    }

    #[test]
    fn test_hihat_decays_fast() {
        let mut hat = Metallic::hihat(SAMPLE_RATE);
        hat.strike(None, 1.0);
        let head: Vec<f32> = (0..441).map(|_| hat.next_sample()).collect();
        let _: Vec<f32> = (0..4410).map(|_| hat.next_sample()).collect();
        let tail: Vec<f32> = (0..441).map(|_| hat.next_sample()).collect();
        assert!(energy(&head) > 0.0);
        assert_eq!(energy(&tail), 0.0);
    }
}
