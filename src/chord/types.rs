// Chord model - The atomic musical unit read by the scheduler
// Chords are immutable values: edits produce new chords, playback snapshots them

use serde::{Deserialize, Serialize};
use std::fmt;

use super::pitch::{MAX_FRET, Pitch, STRING_COUNT, fretted_pitch};
use crate::error::PlaybackError;

/// Opaque chord identifier, stable across edits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordId(pub String);

impl ChordId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ChordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fret per string, low E (index 0) to high e (index 5)
///
/// `-1` mutes the string, `0` is the open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingering(pub [i8; STRING_COUNT]);

impl Fingering {
    pub const MUTED: i8 = -1;

    /// All strings muted
    pub fn silent() -> Self {
        Self([Self::MUTED; STRING_COUNT])
    }

    pub fn frets(&self) -> &[i8; STRING_COUNT] {
        &self.0
    }

    pub fn fret(&self, string: usize) -> Option<i8> {
        self.0.get(string).copied()
    }

    /// Number of strings that sound
    pub fn sounding_count(&self) -> usize {
        self.0.iter().filter(|&&f| f != Self::MUTED).count()
    }

    /// Sounding pitch of each string (None for muted strings)
    pub fn pitches(&self, capo: u8) -> [Option<Pitch>; STRING_COUNT] {
        let mut out = [None; STRING_COUNT];
        for (string, &fret) in self.0.iter().enumerate() {
            out[string] = fretted_pitch(string, fret, capo);
        }
        out
    }

    /// First string whose fret is neither muted nor on the neck
    pub fn first_invalid(&self) -> Option<(usize, i8)> {
        self.0
            .iter()
            .enumerate()
            .find(|&(_, &f)| f < Self::MUTED || f > MAX_FRET)
            .map(|(s, &f)| (s, f))
    }
}

impl From<[i8; STRING_COUNT]> for Fingering {
    fn from(frets: [i8; STRING_COUNT]) -> Self {
        Self(frets)
    }
}

/// How a chord is strummed across its beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrummingPattern {
    /// One down strum at the chord's start
    #[default]
    Once,
    /// One down strum per beat
    Down,
    /// Down on the beat, up on the following eighth
    #[serde(rename = "DU")]
    DownUp,
    /// Down, softer down on the sixteenth, up on the eighth
    #[serde(rename = "DDU")]
    DownDownUp,
    /// Four-beat cycle: down / down-up / up / down-up
    Folk,
}

impl StrummingPattern {
    pub fn all() -> [StrummingPattern; 5] {
        [
            StrummingPattern::Once,
            StrummingPattern::Down,
            StrummingPattern::DownUp,
            StrummingPattern::DownDownUp,
            StrummingPattern::Folk,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrummingPattern::Once => "ONCE",
            StrummingPattern::Down => "DOWN",
            StrummingPattern::DownUp => "DU",
            StrummingPattern::DownDownUp => "DDU",
            StrummingPattern::Folk => "FOLK",
        }
    }
}

impl fmt::Display for StrummingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Longest chord accepted for playback, in beats (every beat is registered up front)
pub const MAX_BEATS: u32 = 1024;

/// A chord card in a progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    #[serde(default)]
    pub id: ChordId,
    /// Display name, e.g. "Am7"; the root is parsed from its prefix
    pub name: String,
    /// Duration in quarter-note beats
    pub beats: u32,
    pub fingering: Fingering,
    /// Finger labels per string, presentational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingers: Option<[Option<String>; STRING_COUNT]>,
    #[serde(default)]
    pub strumming_pattern: StrummingPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Chord {
    /// Creates a chord with a fresh id and the ONCE pattern
    pub fn new(name: impl Into<String>, beats: u32, fingering: impl Into<Fingering>) -> Self {
        Self {
            id: ChordId::new(),
            name: name.into(),
            beats,
            fingering: fingering.into(),
            fingers: None,
            strumming_pattern: StrummingPattern::Once,
            section: None,
        }
    }

    pub fn with_pattern(mut self, pattern: StrummingPattern) -> Self {
        self.strumming_pattern = pattern;
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ChordId(id.into());
        self
    }

    /// Check that the chord can be scheduled
    ///
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<(), PlaybackError> {
        if self.beats == 0 {
            return Err(PlaybackError::InvalidChordData {
                index,
                reason: "beats must be at least 1".to_string(),
            });
        }
        if self.beats > MAX_BEATS {
            return Err(PlaybackError::InvalidChordData {
                index,
                reason: format!("{} beats exceeds the {} beat limit", self.beats, MAX_BEATS),
            });
        }
        if let Some((string, fret)) = self.fingering.first_invalid() {
            return Err(PlaybackError::InvalidChordData {
                index,
                reason: format!("string {} has fret {} (expected -1..={})", string, fret, MAX_FRET),
            });
        }
        Ok(())
    }
}

/// Validate a whole progression; nothing is scheduled unless every chord passes
pub fn validate_progression(chords: &[Chord]) -> Result<(), PlaybackError> {
    chords
        .iter()
        .enumerate()
        .try_for_each(|(index, chord)| chord.validate(index))
}

/// Total length of a progression in beats
pub fn total_beats(chords: &[Chord]) -> u64 {
    chords.iter().map(|c| c.beats as u64).sum()
}

/// Beat offset at which each chord starts
pub fn chord_offsets(chords: &[Chord]) -> Vec<u64> {
    let mut offset = 0u64;
    chords
        .iter()
        .map(|c| {
            let start = offset;
            offset += c.beats as u64;
            start
        })
        .collect()
}

/// Starter progression: C then G, one bar each
pub fn demo_progression() -> Vec<Chord> {
    let mut c = Chord::new("C", 4, [-1, 3, 2, 0, 1, 0])
        .with_id("1")
        .with_pattern(StrummingPattern::Down)
        .with_section("Intro");
    c.fingers = Some(finger_labels([None, Some("3"), Some("2"), None, Some("1"), None]));

    let mut g = Chord::new("G", 4, [3, 2, 0, 0, 0, 3])
        .with_id("2")
        .with_pattern(StrummingPattern::DownUp)
        .with_section("Intro");
    g.fingers = Some(finger_labels([Some("3"), Some("2"), None, None, None, Some("4")]));

    vec![c, g]
}

fn finger_labels(labels: [Option<&str>; STRING_COUNT]) -> [Option<String>; STRING_COUNT] {
    labels.map(|l| l.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_json_shape() {
        let json = r#"{
            "id": "abc",
            "name": "Am7",
            "beats": 2,
            "fingering": [-1, 0, 2, 0, 1, 0],
            "strummingPattern": "DDU",
            "section": "Chorus"
        }"#;
        let chord: Chord = serde_json::from_str(json).unwrap();
        assert_eq!(chord.id, ChordId("abc".to_string()));
        assert_eq!(chord.beats, 2);
        assert_eq!(chord.strumming_pattern, StrummingPattern::DownDownUp);
        assert_eq!(chord.fingering.sounding_count(), 5);
        assert_eq!(chord.section.as_deref(), Some("Chorus"));
    }

    #[test]
    fn test_missing_pattern_defaults_to_once() {
        let json = r#"{"name": "C", "beats": 4, "fingering": [-1, 3, 2, 0, 1, 0]}"#;
        let chord: Chord = serde_json::from_str(json).unwrap();
        assert_eq!(chord.strumming_pattern, StrummingPattern::Once);
        assert!(!chord.id.0.is_empty());
    }

    #[test]
    fn test_wrong_fingering_length_rejected() {
        let json = r#"{"name": "C", "beats": 4, "fingering": [3, 2, 0, 1, 0]}"#;
        assert!(serde_json::from_str::<Chord>(json).is_err());
    }

    #[test]
    fn test_validate() {
        let chord = Chord::new("C", 4, [-1, 3, 2, 0, 1, 0]);
        assert!(chord.validate(0).is_ok());

        let zero = Chord::new("C", 0, [-1, 3, 2, 0, 1, 0]);
        assert!(matches!(
            zero.validate(3),
            Err(PlaybackError::InvalidChordData { index: 3, .. })
        ));

        let bad_fret = Chord::new("C", 4, [-2, 3, 2, 0, 1, 0]);
        assert!(bad_fret.validate(0).is_err());

        let silent = Chord::new("N.C.", 1, Fingering::silent());
        assert!(silent.validate(0).is_ok());
    }

    #[test]
    fn test_validate_caps_beats() {
        let longest = Chord::new("E", MAX_BEATS, [0, 2, 2, 1, 0, 0]);
        assert!(longest.validate(0).is_ok());

        let huge = Chord::new("E", u32::MAX, [0, 2, 2, 1, 0, 0]);
        assert!(matches!(
            huge.validate(2),
            Err(PlaybackError::InvalidChordData { index: 2, .. })
        ));
    }

    #[test]
    fn test_validate_progression_reports_first_bad_chord() {
        let chords = vec![
            Chord::new("C", 4, [-1, 3, 2, 0, 1, 0]),
            Chord::new("G", 0, [3, 2, 0, 0, 0, 3]),
        ];
        match validate_progression(&chords) {
            Err(PlaybackError::InvalidChordData { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_offsets_and_total() {
        let chords = vec![
            Chord::new("C", 4, Fingering::silent()),
            Chord::new("G", 2, Fingering::silent()),
            Chord::new("Am", 3, Fingering::silent()),
        ];
        assert_eq!(chord_offsets(&chords), vec![0, 4, 6]);
        assert_eq!(total_beats(&chords), 9);
    }

    #[test]
    fn test_pattern_labels() {
        for pattern in StrummingPattern::all() {
            let json = serde_json::to_string(&pattern).unwrap();
            assert_eq!(json, format!("\"{}\"", pattern.label()));
        }
    }

    #[test]
    fn test_demo_progression() {
        let demo = demo_progression();
        assert_eq!(demo.len(), 2);
        assert_eq!(demo[0].name, "C");
        assert_eq!(demo[1].strumming_pattern, StrummingPattern::DownUp);
        assert!(validate_progression(&demo).is_ok());
    }
}
