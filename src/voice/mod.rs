// Instrument voices - Sound sources the scheduler triggers
// Each voice accepts (pitch-or-none, duration, absolute time, velocity) and nothing else

pub mod recorder;

use std::fmt;

use crate::chord::Pitch;
use crate::sequencer::timeline::NoteValue;

pub use recorder::{TriggerLog, TriggerRecord};

/// Which voice of the band a trigger is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoiceKind {
    Guitar,
    Bass,
    Kick,
    Snare,
    HiHat,
    Click,
}

impl VoiceKind {
    pub const ALL: [VoiceKind; 6] = [
        VoiceKind::Guitar,
        VoiceKind::Bass,
        VoiceKind::Kick,
        VoiceKind::Snare,
        VoiceKind::HiHat,
        VoiceKind::Click,
    ];

    /// Drum kit voices share the drum bus
    pub fn is_drum(&self) -> bool {
        matches!(self, VoiceKind::Kick | VoiceKind::Snare | VoiceKind::HiHat)
    }
}

impl fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoiceKind::Guitar => "guitar",
            VoiceKind::Bass => "bass",
            VoiceKind::Kick => "kick",
            VoiceKind::Snare => "snare",
            VoiceKind::HiHat => "hihat",
            VoiceKind::Click => "click",
        };
        f.write_str(name)
    }
}

/// One note request sent to a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteTrigger {
    /// None for unpitched voices (snare, hi-hat)
    pub pitch: Option<Pitch>,
    pub duration: NoteValue,
    /// Absolute start time in seconds on the transport clock
    pub time: f64,
    /// 0.0 - 1.0
    pub velocity: f32,
}

/// A sound source
///
/// Triggers never fail from the caller's point of view: a voice that cannot
/// play a note drops it.
pub trait Instrument: Send {
    /// Queue a note; `trigger.time` may be in the future
    fn trigger(&mut self, trigger: NoteTrigger);

    /// All notes off at `at`: queued notes starting after `at` are dropped
    /// and sounding notes are released
    fn release_all(&mut self, at: f64);

    /// Duration conversions for this voice follow the session tempo
    fn set_tempo(&mut self, _bpm: f64) {}

    /// Add this voice's output for `[start, start + out.len() / sample_rate)` into `out`
    fn render(&mut self, _start: f64, _out: &mut [f32]) {}
}

/// The band: one instrument per voice kind
pub struct VoiceSet {
    pub guitar: Box<dyn Instrument>,
    pub bass: Box<dyn Instrument>,
    pub kick: Box<dyn Instrument>,
    pub snare: Box<dyn Instrument>,
    pub hihat: Box<dyn Instrument>,
    pub click: Box<dyn Instrument>,
}

impl VoiceSet {
    /// Voices that only record what they were asked to play
    pub fn recording() -> (Self, TriggerLog) {
        let log = TriggerLog::new();
        let set = Self {
            guitar: Box::new(log.voice(VoiceKind::Guitar)),
            bass: Box::new(log.voice(VoiceKind::Bass)),
            kick: Box::new(log.voice(VoiceKind::Kick)),
            snare: Box::new(log.voice(VoiceKind::Snare)),
            hihat: Box::new(log.voice(VoiceKind::HiHat)),
            click: Box::new(log.voice(VoiceKind::Click)),
        };
        (set, log)
    }

    pub fn get_mut(&mut self, kind: VoiceKind) -> &mut dyn Instrument {
        match kind {
            VoiceKind::Guitar => self.guitar.as_mut(),
            VoiceKind::Bass => self.bass.as_mut(),
            VoiceKind::Kick => self.kick.as_mut(),
            VoiceKind::Snare => self.snare.as_mut(),
            VoiceKind::HiHat => self.hihat.as_mut(),
            VoiceKind::Click => self.click.as_mut(),
        }
    }

    pub fn trigger(&mut self, kind: VoiceKind, trigger: NoteTrigger) {
        self.get_mut(kind).trigger(trigger);
    }

    pub fn release_all(&mut self, at: f64) {
        for kind in VoiceKind::ALL {
            self.get_mut(kind).release_all(at);
        }
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        for kind in VoiceKind::ALL {
            self.get_mut(kind).set_tempo(bpm);
        }
    }
}

impl Default for VoiceSet {
    fn default() -> Self {
        Self::recording().0
    }
}
