// Voice Manager - Polyphony handling
//
// Voices are allocated once. A new note reuses the voice already sounding the
// same pitch (a re-plucked string), then a free voice, then steals one.

use super::envelope::AdsrParams;
use super::oscillator::WaveformType;
use super::voice::Voice;
use crate::chord::Pitch;

pub struct VoiceManager {
    voices: Vec<Voice>,
    /// Incremented on each note_on for voice stealing priority
    age_counter: u64,
    gain: f32,
}

impl VoiceManager {
    pub fn new(polyphony: usize, waveform: WaveformType, params: AdsrParams, sample_rate: f32) -> Self {
        let polyphony = polyphony.max(1);
        Self {
            voices: (0..polyphony).map(|_| Voice::new(waveform, params, sample_rate)).collect(),
            age_counter: 0,
            gain: 1.0 / (polyphony as f32).sqrt().max(1.0),
        }
    }

    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    pub fn note_on(&mut self, pitch: Pitch, velocity: f32, gate_samples: u64) {
        self.age_counter = self.age_counter.wrapping_add(1);

        let index = self
            .voices
            .iter()
            .position(|v| v.is_active() && v.pitch() == pitch)
            .or_else(|| self.voices.iter().position(|v| !v.is_active()))
            .unwrap_or_else(|| self.find_voice_to_steal());
        self.voices[index].note_on(pitch, velocity, gate_samples, self.age_counter);
    }

    /// Releasing voices first, then the oldest
    fn find_voice_to_steal(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (!v.is_releasing(), v.age()))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn note_off(&mut self, pitch: Pitch) {
        for voice in &mut self.voices {
            if voice.is_active() && voice.pitch() == pitch {
                voice.note_off();
            }
        }
    }

    /// Release every held voice; tails ring out
    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            if voice.is_active() && !voice.is_releasing() {
                voice.note_off();
            }
        }
    }

    pub fn kill_all(&mut self) {
        self.voices.iter_mut().for_each(Voice::kill);
    }

    pub fn next_sample(&mut self) -> f32 {
        self.voices.iter_mut().map(Voice::next_sample).sum::<f32>() * self.gain
    }

    pub fn all_releasing(&self) -> bool {
        self.voices.iter().filter(|v| v.is_active()).all(Voice::is_releasing)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }
}
