// Synth instruments - Pitched voices (guitar, bass) and the synthesized band
//
// `release_all(at)` drops triggers queued after `at` and releases whatever
// is sounding once the render position reaches `at`, so lookahead never cuts
// notes early.

use log::trace;

use super::drums::{Drum, Membrane, Metallic, NoiseBurst};
use super::envelope::AdsrParams;
use super::filter::{FilterParams, StateVariableFilter};
use super::oscillator::WaveformType;
use super::schedule::{NoteQueue, ScheduledSource, block_offset, render_scheduled};
use super::voice_manager::VoiceManager;
use crate::sequencer::metronome::ClickVoice;
use crate::voice::{Instrument, NoteTrigger, VoiceSet};

/// Lowest and highest pitch the synth voices accept
const PITCH_RANGE: std::ops::RangeInclusive<u8> = 12..=108;

pub struct SynthInstrument {
    voices: VoiceManager,
    filter: Option<StateVariableFilter>,
    queue: NoteQueue,
    release_at: Option<f64>,
    sample_rate: f32,
}

impl SynthInstrument {
    pub fn new(voices: VoiceManager, filter: Option<StateVariableFilter>, sample_rate: f32) -> Self {
        Self {
            voices,
            filter,
            queue: NoteQueue::new(),
            release_at: None,
            sample_rate,
        }
    }

    /// Six plucked strings plus room for ringing tails
    pub fn guitar(sample_rate: f32) -> Self {
        Self::new(
            VoiceManager::new(12, WaveformType::Triangle, AdsrParams::pluck(), sample_rate),
            Some(StateVariableFilter::new(FilterParams::low_pass(3500.0), sample_rate)),
            sample_rate,
        )
    }

    /// Monophonic saw through a low-pass
    pub fn bass(sample_rate: f32) -> Self {
        Self::new(
            VoiceManager::new(1, WaveformType::Saw, AdsrParams::bass(), sample_rate),
            Some(StateVariableFilter::new(FilterParams::low_pass(400.0), sample_rate)),
            sample_rate,
        )
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_voice_count()
    }
}

impl ScheduledSource for SynthInstrument {
    fn queue_mut(&mut self) -> &mut NoteQueue {
        &mut self.queue
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn start_note(&mut self, trigger: NoteTrigger) {
        let Some(pitch) = trigger.pitch.filter(|p| PITCH_RANGE.contains(&p.0)) else {
            trace!("Dropping trigger outside synth range: {:?}", trigger.pitch);
            return;
        };
        let gate = self.queue.duration_secs(trigger.duration) * self.sample_rate as f64;
        self.voices.note_on(pitch, trigger.velocity, gate.round() as u64);
    }

    fn next_sample(&mut self) -> f32 {
        let sample = self.voices.next_sample();
        match self.filter.as_mut() {
            Some(filter) => filter.process(sample),
            None => sample,
        }
    }
}

impl Instrument for SynthInstrument {
    fn trigger(&mut self, trigger: NoteTrigger) {
        self.queue.push(trigger);
    }

    fn release_all(&mut self, at: f64) {
        let dropped = self.queue.drop_after(at);
        if dropped > 0 {
            trace!("Dropped {} queued notes after {:.3}s", dropped, at);
        }
        self.release_at = Some(at);
    }

    fn set_tempo(&mut self, bpm: f64) {
        self.queue.set_tempo(bpm);
    }

    fn render(&mut self, start: f64, out: &mut [f32]) {
        let end = start + out.len() as f64 / self.sample_rate as f64;
        match self.release_at {
            Some(at) if at < end => {
                let split = block_offset(at, start, self.sample_rate).min(out.len());
                let (head, tail) = out.split_at_mut(split);
                render_scheduled(self, start, head);
                self.voices.release_all();
                self.release_at = None;
                let tail_start = start + split as f64 / self.sample_rate as f64;
                render_scheduled(self, tail_start, tail);
            }
            _ => render_scheduled(self, start, out),
        }
    }
}

impl VoiceSet {
    /// The full band rendered by the built-in synths
    pub fn synthesized(sample_rate: f32) -> Self {
        Self {
            guitar: Box::new(SynthInstrument::guitar(sample_rate)),
            bass: Box::new(SynthInstrument::bass(sample_rate)),
            kick: Box::new(Drum::new(Membrane::kick(sample_rate), sample_rate)),
            snare: Box::new(Drum::new(NoiseBurst::snare(sample_rate), sample_rate)),
            hihat: Box::new(Drum::new(Metallic::hihat(sample_rate), sample_rate)),
            click: Box::new(ClickVoice::new(sample_rate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Pitch;
    use crate::sequencer::timeline::NoteValue;
    use crate::voice::VoiceKind;

    const SAMPLE_RATE: f32 = 44100.0;

    fn note(time: f64, pitch: u8) -> NoteTrigger {
        NoteTrigger {
            pitch: Some(Pitch(pitch)),
            duration: NoteValue::Measure,
            time,
            velocity: 0.8,
        }
    }

    #[test]
    fn test_plays_queued_note() {
        let mut guitar = SynthInstrument::guitar(SAMPLE_RATE);
        guitar.trigger(note(0.0, 52));
        let mut out = vec![0.0; 512];
        guitar.render(0.0, &mut out);
        assert_eq!(guitar.active_voices(), 1);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_release_all_waits_for_render_position() {
        let mut guitar = SynthInstrument::guitar(SAMPLE_RATE);
        guitar.trigger(note(0.0, 52));
        guitar.trigger(note(0.5, 55));
        guitar.release_all(0.01);
        assert_eq!(guitar.pending(), 1);

        let mut out = vec![0.0; 256];
        guitar.render(0.0, &mut out);
        assert!(guitar.release_at.is_some());

        // Released at sample 441, the tail is still ringing
        let mut out = vec![0.0; 256];
        guitar.render(256.0 / SAMPLE_RATE as f64, &mut out);
        assert!(guitar.release_at.is_none());
        assert_eq!(guitar.active_voices(), 1);
        assert!(guitar.voices.active_voice_count() == 1 && out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_out_of_range_pitch_is_dropped() {
        let mut bass = SynthInstrument::bass(SAMPLE_RATE);
        bass.trigger(note(0.0, 2));
        let mut out = vec![0.0; 64];
        bass.render(0.0, &mut out);
        assert_eq!(bass.active_voices(), 0);
        assert_eq!(bass.pending(), 0);
    }

    #[test]
    fn test_note_after_release_point_still_plays() {
        let mut bass = SynthInstrument::bass(SAMPLE_RATE);
        bass.trigger(note(0.0, 40));
        bass.release_all(0.005);
        bass.trigger(note(0.005, 43));
        let mut out = vec![0.0; 512];
        bass.render(0.0, &mut out);
        assert_eq!(bass.active_voices(), 1);
        assert_eq!(bass.pending(), 0);
        assert!(!bass.voices.all_releasing());
    }

    #[test]
    fn test_synthesized_band_renders_every_voice() {
        let mut voices = VoiceSet::synthesized(SAMPLE_RATE);
        voices.set_tempo(120.0);
        for kind in VoiceKind::ALL {
            let pitch = if kind == VoiceKind::Snare || kind == VoiceKind::HiHat {
                None
            } else {
                Some(Pitch(48))
            };
            voices.trigger(kind, NoteTrigger { pitch, ..note(0.0, 0) });
        }
        for kind in VoiceKind::ALL {
            let mut out = vec![0.0; 1024];
            voices.get_mut(kind).render(0.0, &mut out);
            assert!(out.iter().any(|s| *s != 0.0), "{} was silent", kind);
        }
    }
}
