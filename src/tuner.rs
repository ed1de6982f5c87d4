// Tuner - Nearest note, cents offset and target string for a detected frequency
//
// Detection itself lives behind `PitchSource`; this module only interprets
// the frequencies it reports.

use crate::chord::{Pitch, STANDARD_TUNING};

/// Frequencies outside this band are treated as noise
pub const MIN_FREQUENCY: f32 = 50.0;
pub const MAX_FREQUENCY: f32 = 1000.0;

/// Offset under which a string counts as in tune
pub const IN_TUNE_CENTS: f32 = 5.0;

/// Weight of a new reading in the smoothed display value
const DISPLAY_SMOOTHING: f32 = 0.2;

/// Fractional MIDI note number of a frequency
fn midi_of(frequency: f32) -> f32 {
    69.0 + 12.0 * (frequency / 440.0).log2()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunerReading {
    pub frequency: f32,
    /// Nearest equal-tempered note
    pub pitch: Pitch,
    /// Offset from `pitch`, -50..=50
    pub cents: f32,
}

impl TunerReading {
    /// None outside 50-1000 Hz
    pub fn from_frequency(frequency: f32) -> Option<Self> {
        if !frequency.is_finite() || !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency) {
            return None;
        }
        let midi = midi_of(frequency);
        let nearest = midi.round();
        Some(Self {
            frequency,
            pitch: Pitch(nearest as u8),
            cents: (midi - nearest) * 100.0,
        })
    }

    pub fn note_name(&self) -> &'static str {
        self.pitch.name()
    }

    pub fn octave(&self) -> i8 {
        self.pitch.octave()
    }

    pub fn is_in_tune(&self) -> bool {
        self.cents.abs() < IN_TUNE_CENTS
    }

    /// Open string closest to the reading, with the signed offset to it in cents
    pub fn nearest_string(&self) -> (usize, Pitch, f32) {
        let midi = midi_of(self.frequency);
        STANDARD_TUNING
            .iter()
            .enumerate()
            .map(|(string, pitch)| (string, *pitch, (midi - pitch.0 as f32) * 100.0))
            .min_by(|a, b| a.2.abs().total_cmp(&b.2.abs()))
            .unwrap_or((0, STANDARD_TUNING[0], 0.0))
    }
}

/// Anything that can report the fundamental frequency currently heard
pub trait PitchSource {
    /// Latest detected frequency in Hz, None when nothing is detected
    fn detect(&mut self) -> Option<f32>;

    fn reading(&mut self) -> Option<TunerReading> {
        self.detect().and_then(TunerReading::from_frequency)
    }
}

impl<F> PitchSource for F
where
    F: FnMut() -> Option<f32>,
{
    fn detect(&mut self) -> Option<f32> {
        self()
    }
}

/// Smoothed needle for a tuner display
#[derive(Debug, Clone, Default)]
pub struct TunerDisplay {
    last: Option<TunerReading>,
    cents: f32,
}

impl TunerDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull one reading; the needle keeps its position when nothing is heard
    pub fn update(&mut self, source: &mut impl PitchSource) -> Option<TunerReading> {
        let reading = source.reading()?;
        self.cents += (reading.cents - self.cents) * DISPLAY_SMOOTHING;
        self.last = Some(reading);
        Some(reading)
    }

    pub fn last(&self) -> Option<&TunerReading> {
        self.last.as_ref()
    }

    pub fn cents(&self) -> f32 {
        self.cents
    }

    /// Needle angle, -90..=90 degrees for -50..=50 cents
    pub fn needle_degrees(&self) -> f32 {
        self.cents.clamp(-50.0, 50.0) * 1.8
    }
}
