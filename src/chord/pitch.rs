// Pitch - MIDI note numbers, note names and the guitar's standard tuning

use std::fmt;

/// Sharp spellings, index = pitch class
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Number of strings on the neck
pub const STRING_COUNT: usize = 6;

/// Highest fret accepted anywhere a pitch is derived
pub const MAX_FRET: i8 = 24;

/// Highest capo position
pub const MAX_CAPO: u8 = 12;

/// Standard tuning, low E to high e: E2 A2 D3 G3 B3 E4
pub const STANDARD_TUNING: [Pitch; STRING_COUNT] = [
    Pitch(40),
    Pitch(45),
    Pitch(50),
    Pitch(55),
    Pitch(59),
    Pitch(64),
];

/// A pitch as a MIDI note number (60 = C4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pitch(pub u8);

impl Pitch {
    pub const C1: Pitch = Pitch(24);
    pub const C2: Pitch = Pitch(36);
    pub const C5: Pitch = Pitch(72);
    pub const C6: Pitch = Pitch(84);

    /// Build from a pitch class (0 = C) and a scientific octave (4 = middle C octave)
    pub fn from_class_octave(class: u8, octave: i8) -> Option<Self> {
        let midi = (octave as i16 + 1) * 12 + (class % 12) as i16;
        if (0..=127).contains(&midi) {
            Some(Pitch(midi as u8))
        } else {
            None
        }
    }

    /// Parse a note like "E2", "C#4" or "Bb3"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '-')
            .map(|(i, _)| i)?;
        let (name, octave) = s.split_at(split);
        let class = pitch_class(name)?;
        let octave: i8 = octave.parse().ok()?;
        Self::from_class_octave(class, octave)
    }

    /// Pitch class 0-11
    pub fn class(&self) -> u8 {
        self.0 % 12
    }

    /// Scientific octave number
    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Sharp spelling without octave
    pub fn name(&self) -> &'static str {
        NOTE_NAMES[self.class() as usize]
    }

    /// Shift by semitones, None if the result leaves the MIDI range
    pub fn transpose(&self, semitones: i16) -> Option<Self> {
        let midi = self.0 as i16 + semitones;
        if (0..=127).contains(&midi) {
            Some(Pitch(midi as u8))
        } else {
            None
        }
    }

    /// Equal temperament frequency (A4 = 440 Hz)
    pub fn frequency(&self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave())
    }
}

/// Pitch class of a note name, accepting sharps and flats ("Bb" = 10)
pub fn pitch_class(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i8 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let shift: i8 = match chars.as_str() {
        "" => 0,
        "#" | "♯" => 1,
        "b" | "♭" => -1,
        _ => return None,
    };
    Some((base + shift).rem_euclid(12) as u8)
}

/// Sounding pitch of `fret` on `string` with the capo at `capo`
///
/// Returns None for muted strings (fret -1) or positions off the neck.
pub fn fretted_pitch(string: usize, fret: i8, capo: u8) -> Option<Pitch> {
    if fret < 0 || fret > MAX_FRET {
        return None;
    }
    let open = STANDARD_TUNING.get(string)?;
    open.transpose(fret as i16 + capo as i16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Pitch::parse("E2"), Some(Pitch(40)));
        assert_eq!(Pitch::parse("C#4"), Some(Pitch(61)));
        assert_eq!(Pitch::parse("Bb3"), Some(Pitch(58)));
        assert_eq!(Pitch::parse("C-1"), Some(Pitch(0)));
        assert_eq!(Pitch::parse("H2"), None);
        assert_eq!(Pitch::parse("E"), None);

        assert_eq!(Pitch(40).to_string(), "E2");
        assert_eq!(Pitch::C6.to_string(), "C6");
    }

    #[test]
    fn test_standard_tuning() {
        let names: Vec<String> = STANDARD_TUNING.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["E2", "A2", "D3", "G3", "B3", "E4"]);
    }

    #[test]
    fn test_fretted_pitch() {
        // A string, 3rd fret = C3
        assert_eq!(fretted_pitch(1, 3, 0), Some(Pitch(48)));
        // Muted
        assert_eq!(fretted_pitch(1, -1, 0), None);
        // Off the neck
        assert_eq!(fretted_pitch(6, 0, 0), None);
        assert_eq!(fretted_pitch(0, 25, 0), None);
    }

    #[test]
    fn test_capo_additivity() {
        for string in 0..STRING_COUNT {
            for capo in 0..=MAX_CAPO {
                for fret in 0..=(MAX_FRET - capo as i8) {
                    assert_eq!(
                        fretted_pitch(string, fret, capo),
                        fretted_pitch(string, fret + capo as i8, 0),
                        "string {} fret {} capo {}",
                        string,
                        fret,
                        capo
                    );
                }
            }
        }
    }

    #[test]
    fn test_frequency() {
        assert!((Pitch(69).frequency() - 440.0).abs() < 1e-3);
        assert!((Pitch(57).frequency() - 220.0).abs() < 1e-3);
    }
}
