// Strum engine - Turns a chord shape into a timed sweep of string triggers
// Humanization comes from an injectable random source so tests can switch it off

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::chord::{Fingering, Pitch, STRING_COUNT, fretted_pitch};
use crate::config::HumanizeConfig;
use crate::sequencer::timeline::NoteValue;
use crate::voice::{Instrument, NoteTrigger};

/// Random source for timing/velocity variation
///
/// A disabled humanizer returns zero offsets and never wins a coin flip,
/// which makes every performance exactly reproducible.
pub struct Humanizer {
    rng: Option<Box<dyn RngCore + Send>>,
}

impl Humanizer {
    /// Seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Any random generator
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Some(Box::new(rng)),
        }
    }

    /// Zero-jitter mode
    pub fn disabled() -> Self {
        Self { rng: None }
    }

    pub fn from_config(config: &HumanizeConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rng.is_some()
    }

    /// Uniform offset in `[0, max)`
    pub fn offset(&mut self, max: f64) -> f64 {
        match self.rng.as_mut() {
            Some(rng) if max > 0.0 => rng.gen_range(0.0..max),
            _ => 0.0,
        }
    }

    /// Uniform deviation in `[-spread, spread)`
    pub fn spread(&mut self, spread: f32) -> f32 {
        match self.rng.as_mut() {
            Some(rng) if spread > 0.0 => rng.gen_range(-spread..spread),
            _ => 0.0,
        }
    }

    /// True with probability `p`; always false when disabled
    pub fn chance(&mut self, p: f64) -> bool {
        match self.rng.as_mut() {
            Some(rng) => rng.gen_bool(p.clamp(0.0, 1.0)),
            None => false,
        }
    }
}

impl fmt::Debug for Humanizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Humanizer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Strum direction across the strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrumDirection {
    /// Low E to high e
    Down,
    /// High e to low E
    Up,
}

impl StrumDirection {
    /// String indices in strike order
    pub fn order(&self) -> [usize; STRING_COUNT] {
        match self {
            StrumDirection::Down => [0, 1, 2, 3, 4, 5],
            StrumDirection::Up => [5, 4, 3, 2, 1, 0],
        }
    }
}

/// One string struck by a strum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrumNote {
    pub string: usize,
    pub fret: i8,
    pub pitch: Pitch,
    pub time: f64,
    pub velocity: f32,
}

/// Velocity bounds after humanization
pub const MIN_VELOCITY: f32 = 0.1;
pub const MAX_VELOCITY: f32 = 1.0;

/// Realizes strum events as per-string triggers
#[derive(Debug, Clone)]
pub struct StrumEngine {
    step: f64,
    timing_jitter: f64,
    velocity_spread: f32,
    preview_stagger: f64,
    preview_jitter: f64,
    preview_velocity_spread: f32,
}

impl StrumEngine {
    /// Note length of a strummed string
    pub const STRUM_DURATION: NoteValue = NoteValue::Quarter;
    /// Note length of a previewed chord
    pub const PREVIEW_DURATION: NoteValue = NoteValue::Half;

    pub fn new(config: &HumanizeConfig) -> Self {
        Self {
            step: config.strum_step_secs,
            timing_jitter: config.timing_jitter_secs,
            velocity_spread: config.velocity_spread,
            preview_stagger: config.preview_stagger_secs,
            preview_jitter: config.preview_jitter_secs,
            preview_velocity_spread: config.preview_velocity_spread,
        }
    }

    /// Seconds between consecutive sounding strings
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Compute the sweep for one strum without triggering anything
    ///
    /// Muted strings are skipped and do not consume a step.
    pub fn plan(
        &self,
        fingering: &Fingering,
        capo: u8,
        time: f64,
        direction: StrumDirection,
        velocity: f32,
        humanizer: &mut Humanizer,
    ) -> Vec<StrumNote> {
        let mut notes = Vec::with_capacity(STRING_COUNT);
        let mut step = 0usize;
        for string in direction.order() {
            let Some(fret) = fingering.fret(string) else {
                continue;
            };
            let Some(pitch) = fretted_pitch(string, fret, capo) else {
                continue;
            };
            let offset = step as f64 * self.step + humanizer.offset(self.timing_jitter);
            let velocity = (velocity + humanizer.spread(self.velocity_spread))
                .clamp(MIN_VELOCITY, MAX_VELOCITY);
            notes.push(StrumNote {
                string,
                fret,
                pitch,
                time: time + offset,
                velocity,
            });
            step += 1;
        }
        notes
    }

    /// Plan a strum and send it to the guitar voice
    #[allow(clippy::too_many_arguments)]
    pub fn strum(
        &self,
        fingering: &Fingering,
        capo: u8,
        time: f64,
        direction: StrumDirection,
        velocity: f32,
        humanizer: &mut Humanizer,
        guitar: &mut dyn Instrument,
    ) -> Vec<StrumNote> {
        let notes = self.plan(fingering, capo, time, direction, velocity, humanizer);
        for note in &notes {
            guitar.trigger(NoteTrigger {
                pitch: Some(note.pitch),
                duration: Self::STRUM_DURATION,
                time: note.time,
                velocity: note.velocity,
            });
        }
        notes
    }

    /// Click-to-audition chord: a loose down sweep staggered by string index
    pub fn preview(
        &self,
        fingering: &Fingering,
        capo: u8,
        time: f64,
        velocity: f32,
        humanizer: &mut Humanizer,
        guitar: &mut dyn Instrument,
    ) -> Vec<StrumNote> {
        let mut notes = Vec::with_capacity(STRING_COUNT);
        for (string, &fret) in fingering.frets().iter().enumerate() {
            let Some(pitch) = fretted_pitch(string, fret, capo) else {
                continue;
            };
            let time = time
                + string as f64 * self.preview_stagger
                + humanizer.offset(self.preview_jitter);
            let velocity = (velocity + humanizer.spread(self.preview_velocity_spread))
                .clamp(MIN_VELOCITY, MAX_VELOCITY);
            guitar.trigger(NoteTrigger {
                pitch: Some(pitch),
                duration: Self::PREVIEW_DURATION,
                time,
                velocity,
            });
            notes.push(StrumNote {
                string,
                fret,
                pitch,
                time,
                velocity,
            });
        }
        notes
    }
}

impl Default for StrumEngine {
    fn default() -> Self {
        Self::new(&HumanizeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::{TriggerLog, VoiceKind};

    const C_MAJOR: Fingering = Fingering([-1, 3, 2, 0, 1, 0]);

    #[test]
    fn test_down_strum_order_and_exact_timing() {
        let engine = StrumEngine::default();
        let mut humanizer = Humanizer::disabled();
        let notes = engine.plan(&C_MAJOR, 0, 1.0, StrumDirection::Down, 0.7, &mut humanizer);

        let strings: Vec<usize> = notes.iter().map(|n| n.string).collect();
        assert_eq!(strings, vec![1, 2, 3, 4, 5]);
        for (step, note) in notes.iter().enumerate() {
            assert!((note.time - (1.0 + step as f64 * 0.015)).abs() < 1e-12);
            assert_eq!(note.velocity, 0.7);
        }
        let pitches: Vec<String> = notes.iter().map(|n| n.pitch.to_string()).collect();
        assert_eq!(pitches, vec!["C3", "E3", "G3", "C4", "E4"]);
    }

    #[test]
    fn test_up_strum_reverses_strings_not_time() {
        let engine = StrumEngine::default();
        let mut humanizer = Humanizer::seeded(7);
        let notes = engine.plan(&C_MAJOR, 0, 0.0, StrumDirection::Up, 0.5, &mut humanizer);

        let strings: Vec<usize> = notes.iter().map(|n| n.string).collect();
        assert_eq!(strings, vec![5, 4, 3, 2, 1]);
        assert!(notes.windows(2).all(|w| w[1].time > w[0].time));
    }

    #[test]
    fn test_humanized_bounds() {
        let engine = StrumEngine::default();
        let mut humanizer = Humanizer::seeded(42);
        for _ in 0..200 {
            let notes = engine.plan(
                &Fingering([0, 2, 2, 1, 0, 0]),
                0,
                0.0,
                StrumDirection::Down,
                0.95,
                &mut humanizer,
            );
            for (step, note) in notes.iter().enumerate() {
                let base = step as f64 * 0.015;
                assert!(note.time >= base && note.time < base + 0.005);
                assert!(note.velocity >= MIN_VELOCITY && note.velocity <= MAX_VELOCITY);
                assert!(note.velocity >= 0.95 - 0.075);
            }
        }
    }

    #[test]
    fn test_muted_strings_never_trigger() {
        let engine = StrumEngine::default();
        let log = TriggerLog::new();
        let mut guitar = log.voice(VoiceKind::Guitar);
        let mut humanizer = Humanizer::disabled();
        let shape = Fingering([-1, -1, 0, 2, 3, 2]);

        engine.strum(&shape, 0, 0.0, StrumDirection::Down, 0.7, &mut humanizer, &mut guitar);
        engine.strum(&shape, 0, 1.0, StrumDirection::Up, 0.5, &mut humanizer, &mut guitar);

        assert_eq!(log.len(), 8);
        let open_e = Pitch(40);
        let open_a = Pitch(45);
        assert!(log.records().iter().all(|r| {
            let pitch = r.trigger.pitch;
            pitch != Some(open_e) && pitch != Some(open_a)
        }));
    }

    #[test]
    fn test_silent_chord_produces_nothing() {
        let engine = StrumEngine::default();
        let mut humanizer = Humanizer::disabled();
        let notes = engine.plan(&Fingering::silent(), 0, 0.0, StrumDirection::Down, 0.7, &mut humanizer);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_capo_shifts_every_string() {
        let engine = StrumEngine::default();
        let mut humanizer = Humanizer::disabled();
        let open = engine.plan(&C_MAJOR, 0, 0.0, StrumDirection::Down, 0.7, &mut humanizer);
        let capo = engine.plan(&C_MAJOR, 2, 0.0, StrumDirection::Down, 0.7, &mut humanizer);
        for (a, b) in open.iter().zip(&capo) {
            assert_eq!(a.pitch.transpose(2), Some(b.pitch));
        }
    }

    #[test]
    fn test_preview_staggers_by_string_index() {
        let engine = StrumEngine::default();
        let log = TriggerLog::new();
        let mut guitar = log.voice(VoiceKind::Guitar);
        let mut humanizer = Humanizer::disabled();

        let notes = engine.preview(&C_MAJOR, 0, 2.0, 0.8, &mut humanizer, &mut guitar);
        assert_eq!(notes.len(), 5);
        // String 1 is the first sounding string but keeps its index-based offset
        assert!((notes[0].time - 2.03).abs() < 1e-12);
        assert!(log.records().iter().all(|r| r.trigger.duration == NoteValue::Half));
    }

    #[test]
    fn test_seeded_humanizer_is_reproducible() {
        let mut a = Humanizer::seeded(99);
        let mut b = Humanizer::seeded(99);
        for _ in 0..10 {
            assert_eq!(a.offset(1.0), b.offset(1.0));
            assert_eq!(a.spread(0.5), b.spread(0.5));
        }
        let mut off = Humanizer::disabled();
        assert_eq!(off.offset(1.0), 0.0);
        assert!(!off.chance(1.0));
    }
}
