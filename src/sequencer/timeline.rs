// Timeline - Musical time representation
// Handles conversion between ticks, beats, note values and real time

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per quarter note (PPQN - Pulses Per Quarter Note)
/// Standard MIDI resolution
pub const TICKS_PER_QUARTER: u64 = 480;

/// Beats per bar; backing patterns are written on a 4/4 bar
pub const BEATS_PER_BAR: u64 = 4;

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub const MAX_BPM: f64 = 999.0;

    /// Creates a new tempo
    /// BPM must be finite and in range (0.0, 999.0]
    pub fn new(bpm: f64) -> Option<Self> {
        if bpm.is_finite() && bpm > 0.0 && bpm <= Self::MAX_BPM {
            Some(Self { bpm })
        } else {
            None
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat (quarter note) in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Convert ticks to seconds
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 * self.beat_duration_seconds() / TICKS_PER_QUARTER as f64
    }

    /// Convert seconds to (fractional) ticks
    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        seconds * TICKS_PER_QUARTER as f64 / self.beat_duration_seconds()
    }

    /// Duration of one bar in seconds
    pub fn bar_duration_seconds(&self) -> f64 {
        self.beat_duration_seconds() * BEATS_PER_BAR as f64
    }

    /// Duration of one beat in samples at given sample rate
    pub fn beat_duration_samples(&self, sample_rate: f64) -> f64 {
        self.beat_duration_seconds() * sample_rate
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Convert a beat count to ticks (fractional beats are rounded to the nearest tick)
pub fn beats_to_ticks(beats: f64) -> u64 {
    (beats * TICKS_PER_QUARTER as f64).round().max(0.0) as u64
}

/// Note value used both as a duration and as a sub-beat offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteValue {
    /// "32n"
    ThirtySecond,
    /// "16n"
    Sixteenth,
    /// "8n"
    Eighth,
    /// Eighth stretched by 1.3 (blues swing)
    SwungEighth,
    /// "8n."
    DottedEighth,
    /// "4n"
    Quarter,
    /// "4n."
    DottedQuarter,
    /// "2n"
    Half,
    /// "1m"
    Measure,
}

impl NoteValue {
    /// Length in ticks at 480 PPQN
    pub const fn ticks(&self) -> u64 {
        match self {
            NoteValue::ThirtySecond => TICKS_PER_QUARTER / 8,
            NoteValue::Sixteenth => TICKS_PER_QUARTER / 4,
            NoteValue::Eighth => TICKS_PER_QUARTER / 2,
            NoteValue::SwungEighth => TICKS_PER_QUARTER * 13 / 20,
            NoteValue::DottedEighth => TICKS_PER_QUARTER * 3 / 4,
            NoteValue::Quarter => TICKS_PER_QUARTER,
            NoteValue::DottedQuarter => TICKS_PER_QUARTER * 3 / 2,
            NoteValue::Half => TICKS_PER_QUARTER * 2,
            NoteValue::Measure => TICKS_PER_QUARTER * BEATS_PER_BAR,
        }
    }

    /// Length in seconds at the given tempo
    pub fn seconds(&self, tempo: &Tempo) -> f64 {
        tempo.ticks_to_seconds(self.ticks())
    }

    /// Token used in the original notation ("8n", "4n.", "1m")
    pub fn token(&self) -> &'static str {
        match self {
            NoteValue::ThirtySecond => "32n",
            NoteValue::Sixteenth => "16n",
            NoteValue::Eighth => "8n",
            NoteValue::SwungEighth => "8n*1.3",
            NoteValue::DottedEighth => "8n.",
            NoteValue::Quarter => "4n",
            NoteValue::DottedQuarter => "4n.",
            NoteValue::Half => "2n",
            NoteValue::Measure => "1m",
        }
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
