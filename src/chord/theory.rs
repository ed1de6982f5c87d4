// Chord theory - Root parsing, transposition and the theory helpers used by the editor
// Everything here works on chord names and fingerings only; nothing needs audio

use super::pitch::{MAX_FRET, NOTE_NAMES, Pitch, STANDARD_TUNING, STRING_COUNT, pitch_class};
use super::types::{Chord, Fingering};

/// Highest fret shown on the fretboard map
pub const FRETBOARD_FRETS: i8 = 15;

/// Split a chord name into its root spelling and suffix ("F#m7" -> ("F#", "m7"))
pub fn split_root(name: &str) -> Option<(&str, &str)> {
    let first = name.chars().next()?;
    if !('A'..='G').contains(&first) {
        return None;
    }
    let root_len = match name[1..].chars().next() {
        Some('#') | Some('b') => 2,
        _ => 1,
    };
    Some(name.split_at(root_len))
}

/// Pitch class of the chord's root
pub fn chord_root(name: &str) -> Option<u8> {
    split_root(name).and_then(|(root, _)| pitch_class(root))
}

/// Minor quality: suffix mentions "m" but is not a "maj" chord
pub fn is_minor(name: &str) -> bool {
    let suffix = split_root(name).map(|(_, s)| s).unwrap_or(name);
    suffix.contains('m') && !suffix.contains("maj")
}

/// Bass root in octave 2, C2 when the name has no recognizable root
pub fn bass_root(name: &str) -> Pitch {
    chord_root(name)
        .and_then(|class| Pitch::from_class_octave(class, 2))
        .unwrap_or(Pitch::C2)
}

/// Perfect fifth above the bass root
pub fn bass_fifth(root: Pitch) -> Pitch {
    root.transpose(7).unwrap_or(root)
}

/// Rename the root of a chord name, spelling with sharps
pub fn transpose_name(name: &str, semitones: i32) -> String {
    match split_root(name) {
        Some((root, suffix)) => match pitch_class(root) {
            Some(class) => {
                let shifted = (class as i32 + semitones).rem_euclid(12) as usize;
                format!("{}{}", NOTE_NAMES[shifted], suffix)
            }
            None => name.to_string(),
        },
        None => name.to_string(),
    }
}

/// Transpose a chord's fingering and name by semitones
///
/// Muted strings stay muted. Returns None when any fret would leave the neck.
pub fn transpose_chord(chord: &Chord, semitones: i32) -> Option<Chord> {
    let mut frets = [Fingering::MUTED; STRING_COUNT];
    for (string, &fret) in chord.fingering.frets().iter().enumerate() {
        if fret == Fingering::MUTED {
            continue;
        }
        let moved = fret as i32 + semitones;
        if moved < 0 || moved > MAX_FRET as i32 {
            return None;
        }
        frets[string] = moved as i8;
    }

    Some(Chord {
        name: transpose_name(&chord.name, semitones),
        fingering: Fingering(frets),
        ..chord.clone()
    })
}

/// Roman numeral of a chord relative to a key root ("Am" in "C" = "vi")
pub fn roman_numeral(chord_name: &str, key_name: &str) -> Option<String> {
    const NUMERALS: [&str; 12] = [
        "I", "bII", "II", "bIII", "III", "IV", "bV", "V", "bVI", "VI", "bVII", "VII",
    ];
    let root = chord_root(chord_name)?;
    let key = chord_root(key_name)?;
    let degree = (root as i32 - key as i32).rem_euclid(12) as usize;
    let numeral = NUMERALS[degree];
    Some(if is_minor(chord_name) {
        numeral.to_lowercase()
    } else {
        numeral.to_string()
    })
}

/// Which note set the fretboard overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleKind {
    #[default]
    ChordTones,
    Pentatonic,
}

impl ScaleKind {
    fn intervals(&self, chord_name: &str) -> Vec<u8> {
        let minor = is_minor(chord_name);
        match self {
            ScaleKind::ChordTones => {
                let suffix = split_root(chord_name).map(|(_, s)| s).unwrap_or("");
                let mut tones = vec![0, if minor { 3 } else { 4 }, 7];
                if suffix.contains("maj7") {
                    tones.push(11);
                } else if suffix.contains('7') {
                    tones.push(10);
                }
                tones
            }
            ScaleKind::Pentatonic if minor => vec![0, 3, 5, 7, 10],
            ScaleKind::Pentatonic => vec![0, 2, 4, 7, 9],
        }
    }
}

/// Display name of the overlay for a chord
pub fn scale_name(chord_name: &str, kind: ScaleKind) -> Option<String> {
    let (root, _) = split_root(chord_name)?;
    Some(match kind {
        ScaleKind::Pentatonic => format!(
            "{} {} Pentatonic",
            root,
            if is_minor(chord_name) { "Minor" } else { "Major" }
        ),
        ScaleKind::ChordTones => format!("{} Arpeggio", chord_name),
    })
}

/// One highlighted position on the neck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FretPosition {
    pub string: usize,
    pub fret: i8,
    pub note: &'static str,
    /// Interval label relative to the root: R, b3, 3, 5, b7, 7 (empty otherwise)
    pub interval: &'static str,
    pub is_chord_tone: bool,
}

fn interval_label(distance: u8) -> &'static str {
    match distance {
        0 => "R",
        3 => "b3",
        4 => "3",
        7 => "5",
        10 => "b7",
        11 => "7",
        _ => "",
    }
}

/// Every position on frets 0..=15 that belongs to the chord's overlay
pub fn fretboard_map(chord_name: &str, kind: ScaleKind) -> Vec<FretPosition> {
    let Some(root) = chord_root(chord_name) else {
        return Vec::new();
    };
    let intervals = kind.intervals(chord_name);

    let mut positions = Vec::new();
    for (string, open) in STANDARD_TUNING.iter().enumerate() {
        for fret in 0..=FRETBOARD_FRETS {
            let class = (open.class() + fret as u8) % 12;
            let distance = (class + 12 - root) % 12;
            if intervals.contains(&distance) {
                positions.push(FretPosition {
                    string,
                    fret,
                    note: NOTE_NAMES[class as usize],
                    interval: interval_label(distance),
                    is_chord_tone: matches!(distance, 0 | 3 | 4 | 7 | 10 | 11),
                });
            }
        }
    }
    positions
}

/// Rough playing difficulty of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Open,
    Barre,
    Wide,
}

pub fn difficulty(fingering: &Fingering) -> Difficulty {
    let fretted: Vec<i8> = fingering.frets().iter().copied().filter(|&f| f > 0).collect();
    let (Some(&min), Some(&max)) = (fretted.iter().min(), fretted.iter().max()) else {
        return Difficulty::Open;
    };
    let open_strings = fingering.frets().iter().filter(|&&f| f == 0).count();
    if open_strings == 0 && fretted.len() >= 4 {
        Difficulty::Barre
    } else if max - min >= 4 {
        Difficulty::Wide
    } else {
        Difficulty::Open
    }
}
