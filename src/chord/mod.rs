// Chord module - Chord data model, pitches and theory helpers

pub mod pitch;
pub mod theory;
pub mod types;
pub mod voicings;

pub use pitch::{MAX_CAPO, MAX_FRET, Pitch, STANDARD_TUNING, STRING_COUNT, fretted_pitch};
pub use theory::{bass_fifth, bass_root, transpose_chord};
pub use types::{
    Chord, ChordId, Fingering, MAX_BEATS, StrummingPattern, chord_offsets, demo_progression,
    total_beats, validate_progression,
};
