// Metronome - Click selection and the click voice
// The chord's first beat gets an accented high click, other beats a softer low one

use std::f32::consts::PI;

use crate::chord::Pitch;
use crate::sequencer::timeline::NoteValue;
use crate::synth::schedule::{NoteQueue, ScheduledSource, render_scheduled};
use crate::voice::{Instrument, NoteTrigger};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// First beat of a chord
    Accent,
    /// Any other beat
    Regular,
}

impl ClickType {
    /// Length of every click
    pub const DURATION: NoteValue = NoteValue::ThirtySecond;

    pub fn for_beat(beat_in_chord: u32) -> Self {
        if beat_in_chord == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }

    pub fn pitch(&self) -> Pitch {
        match self {
            ClickType::Accent => Pitch::C6,
            ClickType::Regular => Pitch::C5,
        }
    }

    pub fn velocity(&self) -> f32 {
        match self {
            ClickType::Accent => 1.0,
            ClickType::Regular => 0.6,
        }
    }

    /// The trigger sent to the click voice
    pub fn trigger(&self, time: f64) -> NoteTrigger {
        NoteTrigger {
            pitch: Some(self.pitch()),
            duration: Self::DURATION,
            time,
            velocity: self.velocity(),
        }
    }
}

/// Pre-generated click waveform for a given pitch
#[derive(Debug, Clone)]
pub struct ClickSound {
    samples: Vec<f32>,
}

impl ClickSound {
    /// Clicks are short blips regardless of the 32n duration token
    const CLICK_DURATION_MS: f32 = 10.0;

    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        let len = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate) as usize;
        let phase_increment = 2.0 * PI * frequency / sample_rate;
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / len as f32;
                (i as f32 * phase_increment).sin() * (-t * 8.0).exp()
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct ClickPlayback {
    accent: bool,
    position: usize,
    gain: f32,
}

/// Click voice: two cached waveforms, one playback at a time
#[derive(Debug, Clone)]
pub struct ClickVoice {
    accent: ClickSound,
    regular: ClickSound,
    queue: NoteQueue,
    current: Option<ClickPlayback>,
    sample_rate: f32,
}

impl ClickVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            accent: ClickSound::new(ClickType::Accent.pitch().frequency(), sample_rate),
            regular: ClickSound::new(ClickType::Regular.pitch().frequency(), sample_rate),
            queue: NoteQueue::new(),
            current: None,
            sample_rate,
        }
    }

    pub fn is_sounding(&self) -> bool {
        self.current.is_some()
    }
}

impl ScheduledSource for ClickVoice {
    fn queue_mut(&mut self) -> &mut NoteQueue {
        &mut self.queue
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn start_note(&mut self, trigger: NoteTrigger) {
        // Anything at or above C6 is an accent
        let accent = trigger.pitch.is_some_and(|p| p >= ClickType::Accent.pitch());
        self.current = Some(ClickPlayback {
            accent,
            position: 0,
            gain: trigger.velocity,
        });
    }

    fn next_sample(&mut self) -> f32 {
        let Some(playback) = self.current.as_mut() else {
            return 0.0;
        };
        let sound = if playback.accent {
            &self.accent
        } else {
            &self.regular
        };
        match sound.samples().get(playback.position) {
            Some(&sample) => {
                playback.position += 1;
                sample * playback.gain
            }
            None => {
                self.current = None;
                0.0
            }
        }
    }
}

impl Instrument for ClickVoice {
    fn trigger(&mut self, trigger: NoteTrigger) {
        self.queue.push(trigger);
    }

    fn release_all(&mut self, at: f64) {
        self.queue.drop_after(at);
        self.current = None;
    }

    fn render(&mut self, start: f64, out: &mut [f32]) {
        render_scheduled(self, start, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_on_first_beat_only() {
        assert_eq!(ClickType::for_beat(0), ClickType::Accent);
        assert_eq!(ClickType::for_beat(1), ClickType::Regular);
        assert_eq!(ClickType::for_beat(7), ClickType::Regular);
    }

    #[test]
    fn test_click_triggers() {
        let accent = ClickType::Accent.trigger(1.0);
        assert_eq!(accent.pitch, Some(Pitch::C6));
        assert_eq!(accent.velocity, 1.0);
        assert_eq!(accent.duration, NoteValue::ThirtySecond);

        let regular = ClickType::Regular.trigger(2.0);
        assert_eq!(regular.pitch, Some(Pitch::C5));
        assert_eq!(regular.velocity, 0.6);
    }

    #[test]
    fn test_click_sound_generation() {
        let sound = ClickSound::new(1046.5, 48000.0);
        // 10ms at 48kHz
        assert_eq!(sound.len(), 480);
        assert!(sound.samples().iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_click_voice_renders_at_trigger_time() {
        let mut voice = ClickVoice::new(1000.0);
        voice.trigger(ClickType::Accent.trigger(0.05));
        let mut out = vec![0.0f32; 100];
        voice.render(0.0, &mut out);

        assert!(out[..50].iter().all(|&s| s == 0.0));
        assert!(out[50..].iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_release_drops_future_clicks() {
        let mut voice = ClickVoice::new(1000.0);
        voice.trigger(ClickType::Regular.trigger(0.5));
        voice.release_all(0.1);
        let mut out = vec![0.0f32; 1000];
        voice.render(0.0, &mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!voice.is_sounding());
    }
}
