// Voicing dictionary - Common chord shapes grouped for the chord browser

use super::pitch::STRING_COUNT;
use super::types::Fingering;

/// A named shape from the dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTemplate {
    pub name: &'static str,
    pub fingering: [i8; STRING_COUNT],
}

/// A titled group of shapes
#[derive(Debug, Clone, Copy)]
pub struct ChordCategory {
    pub title: &'static str,
    pub chords: &'static [ChordTemplate],
}

const fn t(name: &'static str, fingering: [i8; STRING_COUNT]) -> ChordTemplate {
    ChordTemplate { name, fingering }
}

pub const CHORD_CATEGORIES: [ChordCategory; 5] = [
    ChordCategory {
        title: "Major",
        chords: &[
            t("C", [-1, 3, 2, 0, 1, 0]),
            t("D", [-1, -1, 0, 2, 3, 2]),
            t("E", [0, 2, 2, 1, 0, 0]),
            t("F", [1, 3, 3, 2, 1, 1]),
            t("G", [3, 2, 0, 0, 0, 3]),
            t("A", [-1, 0, 2, 2, 2, 0]),
            t("B", [-1, 2, 4, 4, 4, 2]),
        ],
    },
    ChordCategory {
        title: "Minor",
        chords: &[
            t("Cm", [-1, 3, 5, 5, 4, 3]),
            t("Dm", [-1, -1, 0, 2, 3, 1]),
            t("Em", [0, 2, 2, 0, 0, 0]),
            t("Fm", [1, 3, 3, 1, 1, 1]),
            t("Gm", [3, 5, 5, 3, 3, 3]),
            t("Am", [-1, 0, 2, 2, 1, 0]),
            t("Bm", [-1, 2, 4, 4, 3, 2]),
        ],
    },
    ChordCategory {
        title: "7th / Dom",
        chords: &[
            t("C7", [-1, 3, 2, 3, 1, 0]),
            t("D7", [-1, -1, 0, 2, 1, 2]),
            t("E7", [0, 2, 0, 1, 0, 0]),
            t("G7", [3, 2, 0, 0, 0, 1]),
            t("A7", [-1, 0, 2, 0, 2, 0]),
            t("B7", [-1, 2, 1, 2, 0, 2]),
        ],
    },
    ChordCategory {
        title: "Maj7 / m7",
        chords: &[
            t("Cmaj7", [-1, 3, 2, 0, 0, 0]),
            t("Gmaj7", [3, -1, 0, 0, 0, 2]),
            t("Fmaj7", [-1, -1, 3, 2, 1, 0]),
            t("Am7", [-1, 0, 2, 0, 1, 0]),
            t("Dm7", [-1, -1, 0, 2, 1, 1]),
            t("Em7", [0, 2, 0, 0, 0, 0]),
        ],
    },
    ChordCategory {
        title: "Sus & Add",
        chords: &[
            t("Csus4", [-1, 3, 3, 0, 1, -1]),
            t("Dsus4", [-1, -1, 0, 2, 3, 3]),
            t("Esus4", [0, 2, 2, 2, 0, 0]),
            t("Asus4", [-1, 0, 2, 2, 3, 0]),
            t("Cadd9", [-1, 3, 2, 0, 3, 0]),
            t("Dadd9", [-1, -1, 0, 2, 5, 2]),
        ],
    },
];

// Open, barre, then a higher shape where one exists
const VOICINGS: &[(&str, &[[i8; STRING_COUNT]])] = &[
    ("C", &[[-1, 3, 2, 0, 1, 0], [8, 10, 10, 9, 8, 8], [-1, -1, 10, 9, 8, 8]]),
    ("D", &[[-1, -1, 0, 2, 3, 2], [5, 5, 7, 7, 7, 5], [-1, 5, 7, 7, 7, 5]]),
    ("E", &[[0, 2, 2, 1, 0, 0], [7, 7, 9, 9, 9, 7], [-1, 7, 9, 9, 9, 7]]),
    ("F", &[[1, 3, 3, 2, 1, 1], [8, 8, 10, 10, 10, 8], [-1, -1, 3, 2, 1, 1]]),
    ("G", &[[3, 2, 0, 0, 0, 3], [3, 5, 5, 4, 3, 3], [10, 12, 12, 12, 10, 10]]),
    ("A", &[[-1, 0, 2, 2, 2, 0], [5, 7, 7, 6, 5, 5], [-1, -1, 7, 6, 5, 5]]),
    ("B", &[[-1, 2, 4, 4, 4, 2], [7, 9, 9, 8, 7, 7], [-1, -1, 4, 4, 4, 2]]),
    ("Am", &[[-1, 0, 2, 2, 1, 0], [5, 7, 7, 5, 5, 5], [-1, -1, 7, 5, 5, 5]]),
    ("Em", &[[0, 2, 2, 0, 0, 0], [7, 7, 9, 9, 8, 7], [-1, 7, 9, 9, 8, 7]]),
    ("Dm", &[[-1, -1, 0, 2, 3, 1], [5, 5, 7, 7, 6, 5], [10, 12, 12, 10, 10, 10]]),
    ("G7", &[[3, 2, 0, 0, 0, 1], [3, 5, 3, 4, 3, 3]]),
    ("C7", &[[-1, 3, 2, 3, 1, 0], [8, 10, 8, 9, 8, 8]]),
];

/// Look up a category by title, case-insensitively
pub fn category(title: &str) -> Option<&'static ChordCategory> {
    CHORD_CATEGORIES
        .iter()
        .find(|c| c.title.eq_ignore_ascii_case(title.trim()))
}

/// Dictionary shape for a chord name, case-insensitive
pub fn fingering_for(name: &str) -> Option<Fingering> {
    let wanted = name.trim();
    if wanted.is_empty() {
        return None;
    }
    CHORD_CATEGORIES
        .iter()
        .flat_map(|c| c.chords.iter())
        .find(|t| t.name.eq_ignore_ascii_case(wanted))
        .map(|t| Fingering(t.fingering))
}

// Longest prefix of the form [A-G][#b]?m?7?
fn voicing_key(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.is_empty() || !(b'A'..=b'G').contains(&bytes[0]) {
        return name;
    }
    let mut end = 1;
    if matches!(bytes.get(end), Some(b'#') | Some(b'b')) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'm') {
        end += 1;
    }
    if bytes.get(end) == Some(&b'7') {
        end += 1;
    }
    &name[..end]
}

/// Next alternate shape for a chord, cycling through its voicings
///
/// An unknown current shape yields the first voicing.
pub fn next_voicing(name: &str, current: &Fingering) -> Option<Fingering> {
    let key = voicing_key(name);
    let options = VOICINGS
        .iter()
        .find(|(k, _)| *k == key)
        .or_else(|| VOICINGS.iter().find(|(k, _)| *k == name))
        .map(|(_, v)| *v)?;

    let next = match options.iter().position(|v| v == current.frets()) {
        Some(idx) => options[(idx + 1) % options.len()],
        None => options[0],
    };
    Some(Fingering(next))
}
