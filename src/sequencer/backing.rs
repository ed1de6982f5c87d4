// Backing track - Per-style drum and bass patterns on a 4/4 bar
// Each style is a pure function of the beat position and the chord's bass notes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chord::Pitch;
use crate::sequencer::timeline::{NoteValue, TICKS_PER_QUARTER};
use crate::voice::VoiceKind;

/// Supported backing styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackingStyle {
    Rock,
    Blues,
    Reggae,
    Funk,
    Lofi,
    Metal,
    Country,
    Jazz,
    Latin,
}

impl BackingStyle {
    pub const ALL: [BackingStyle; 9] = [
        BackingStyle::Rock,
        BackingStyle::Blues,
        BackingStyle::Reggae,
        BackingStyle::Funk,
        BackingStyle::Lofi,
        BackingStyle::Metal,
        BackingStyle::Country,
        BackingStyle::Jazz,
        BackingStyle::Latin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackingStyle::Rock => "ROCK",
            BackingStyle::Blues => "BLUES",
            BackingStyle::Reggae => "REGGAE",
            BackingStyle::Funk => "FUNK",
            BackingStyle::Lofi => "LOFI",
            BackingStyle::Metal => "METAL",
            BackingStyle::Country => "COUNTRY",
            BackingStyle::Jazz => "JAZZ",
            BackingStyle::Latin => "LATIN",
        }
    }

    /// Case-insensitive lookup; None for styles this engine does not know
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Whether the pattern consumes a random ghost-note decision
    pub fn uses_ghost_notes(&self) -> bool {
        matches!(self, BackingStyle::Funk)
    }

    fn pattern(&self) -> PatternFn {
        match self {
            BackingStyle::Rock => rock,
            BackingStyle::Blues => blues,
            BackingStyle::Reggae => reggae,
            BackingStyle::Funk => funk,
            BackingStyle::Lofi => lofi,
            BackingStyle::Metal => metal,
            BackingStyle::Country => country,
            BackingStyle::Jazz => jazz,
            BackingStyle::Latin => latin,
        }
    }

    /// Hits for one beat of this style
    pub fn hits(&self, ctx: &PatternContext) -> Vec<BackingHit> {
        let mut hits = Vec::with_capacity(8);
        (self.pattern())(ctx, &mut hits);
        hits
    }
}

impl fmt::Display for BackingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown backing style: {}", s))
    }
}

/// Hits for a style given by name; unknown names produce silence
pub fn hits_for_name(style: &str, ctx: &PatternContext) -> Vec<BackingHit> {
    BackingStyle::from_name(style)
        .map(|s| s.hits(ctx))
        .unwrap_or_default()
}

/// Position of a hit inside its beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubBeat {
    /// On the beat
    Onset,
    /// The "e"
    Sixteenth,
    /// The "and"
    Eighth,
    /// A lazy "and" (8th x 1.3)
    SwungEighth,
    /// The "a"
    DottedEighth,
}

impl SubBeat {
    pub const fn ticks(&self) -> u64 {
        match self {
            SubBeat::Onset => 0,
            SubBeat::Sixteenth => NoteValue::Sixteenth.ticks(),
            SubBeat::Eighth => NoteValue::Eighth.ticks(),
            SubBeat::SwungEighth => NoteValue::SwungEighth.ticks(),
            SubBeat::DottedEighth => NoteValue::DottedEighth.ticks(),
        }
    }

    /// Fraction of a beat
    pub fn beats(&self) -> f64 {
        self.ticks() as f64 / TICKS_PER_QUARTER as f64
    }
}

/// Inputs of a pattern for one beat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternContext {
    /// Beat within the bar, 0-3
    pub local_beat: u8,
    pub root: Pitch,
    pub fifth: Pitch,
    /// Outcome of the random ghost-note decision (FUNK only)
    pub ghost: bool,
}

impl PatternContext {
    pub fn new(beat: u64, root: Pitch, fifth: Pitch) -> Self {
        Self {
            local_beat: (beat % 4) as u8,
            root,
            fifth,
            ghost: false,
        }
    }

    pub fn with_ghost(mut self, ghost: bool) -> Self {
        self.ghost = ghost;
        self
    }
}

/// One drum or bass note emitted by a pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackingHit {
    pub voice: VoiceKind,
    pub pitch: Option<Pitch>,
    pub offset: SubBeat,
    pub duration: NoteValue,
    pub velocity: f32,
}

type PatternFn = fn(&PatternContext, &mut Vec<BackingHit>);

const KICK_PITCH: Pitch = Pitch::C1;

fn kick(out: &mut Vec<BackingHit>, offset: SubBeat, duration: NoteValue) {
    out.push(BackingHit {
        voice: VoiceKind::Kick,
        pitch: Some(KICK_PITCH),
        offset,
        duration,
        velocity: 1.0,
    });
}

fn snare(out: &mut Vec<BackingHit>, offset: SubBeat, duration: NoteValue, velocity: f32) {
    out.push(BackingHit {
        voice: VoiceKind::Snare,
        pitch: None,
        offset,
        duration,
        velocity,
    });
}

fn hat(out: &mut Vec<BackingHit>, offset: SubBeat, duration: NoteValue, velocity: f32) {
    out.push(BackingHit {
        voice: VoiceKind::HiHat,
        pitch: None,
        offset,
        duration,
        velocity,
    });
}

fn bass(out: &mut Vec<BackingHit>, pitch: Pitch, offset: SubBeat, duration: NoteValue) {
    out.push(BackingHit {
        voice: VoiceKind::Bass,
        pitch: Some(pitch),
        offset,
        duration,
        velocity: 1.0,
    });
}

fn backbeat(beat: u8) -> bool {
    beat == 1 || beat == 3
}

fn downbeat(beat: u8) -> bool {
    beat == 0 || beat == 2
}

fn rock(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    if downbeat(ctx.local_beat) {
        kick(out, SubBeat::Onset, NoteValue::Eighth);
    }
    if backbeat(ctx.local_beat) {
        snare(out, SubBeat::Onset, NoteValue::Sixteenth, 1.0);
    }
    hat(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.5);
    hat(out, SubBeat::Eighth, NoteValue::ThirtySecond, 0.3);
    bass(out, ctx.root, SubBeat::Onset, NoteValue::Eighth);
    bass(out, ctx.root, SubBeat::Eighth, NoteValue::Eighth);
}

fn blues(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    if downbeat(ctx.local_beat) {
        kick(out, SubBeat::Onset, NoteValue::Eighth);
    }
    if backbeat(ctx.local_beat) {
        snare(out, SubBeat::Onset, NoteValue::Sixteenth, 1.0);
    }
    hat(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.6);
    hat(out, SubBeat::SwungEighth, NoteValue::ThirtySecond, 0.4);
    let note = if ctx.local_beat % 2 == 0 { ctx.root } else { ctx.fifth };
    bass(out, note, SubBeat::Onset, NoteValue::Quarter);
}

fn reggae(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    // One drop: kick and snare together on beat 3 of the bar
    if ctx.local_beat == 2 {
        kick(out, SubBeat::Onset, NoteValue::Eighth);
        snare(out, SubBeat::Onset, NoteValue::Sixteenth, 0.8);
    }
    hat(out, SubBeat::Eighth, NoteValue::ThirtySecond, 0.6);
    match ctx.local_beat {
        0 | 2 => bass(out, ctx.root, SubBeat::Onset, NoteValue::Eighth),
        1 => bass(out, ctx.root, SubBeat::Eighth, NoteValue::Eighth),
        _ => {}
    }
}

fn funk(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    if ctx.local_beat == 0 {
        kick(out, SubBeat::Onset, NoteValue::Eighth);
    }
    if ctx.local_beat == 2 && ctx.ghost {
        kick(out, SubBeat::Eighth, NoteValue::Sixteenth);
    }
    if backbeat(ctx.local_beat) {
        snare(out, SubBeat::Onset, NoteValue::Sixteenth, 1.0);
    }
    hat(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.7);
    hat(out, SubBeat::Sixteenth, NoteValue::ThirtySecond, 0.3);
    hat(out, SubBeat::Eighth, NoteValue::ThirtySecond, 0.5);
    hat(out, SubBeat::DottedEighth, NoteValue::ThirtySecond, 0.3);
    if ctx.local_beat == 0 {
        bass(out, ctx.root, SubBeat::Onset, NoteValue::Sixteenth);
        bass(out, ctx.root, SubBeat::DottedEighth, NoteValue::Sixteenth);
    }
}

fn lofi(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    match ctx.local_beat {
        0 => kick(out, SubBeat::Onset, NoteValue::Eighth),
        1 => kick(out, SubBeat::Eighth, NoteValue::Eighth),
        3 => snare(out, SubBeat::Onset, NoteValue::Eighth, 1.0),
        _ => {}
    }
    hat(out, SubBeat::Onset, NoteValue::Eighth, 0.3);
    if ctx.local_beat == 0 {
        bass(out, ctx.root, SubBeat::Onset, NoteValue::Measure);
    }
}

fn metal(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    kick(out, SubBeat::Onset, NoteValue::Sixteenth);
    kick(out, SubBeat::Eighth, NoteValue::Sixteenth);
    if backbeat(ctx.local_beat) {
        snare(out, SubBeat::Onset, NoteValue::Sixteenth, 1.0);
    }
    hat(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.8);
    hat(out, SubBeat::Eighth, NoteValue::ThirtySecond, 0.8);
    bass(out, ctx.root, SubBeat::Onset, NoteValue::Eighth);
    bass(out, ctx.root, SubBeat::Eighth, NoteValue::Eighth);
}

fn country(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    if downbeat(ctx.local_beat) {
        kick(out, SubBeat::Onset, NoteValue::Eighth);
    }
    let accent = if backbeat(ctx.local_beat) { 0.8 } else { 0.3 };
    snare(out, SubBeat::Onset, NoteValue::ThirtySecond, accent);
    snare(out, SubBeat::Eighth, NoteValue::ThirtySecond, 0.3);
    match ctx.local_beat {
        0 => bass(out, ctx.root, SubBeat::Onset, NoteValue::Quarter),
        2 => bass(out, ctx.fifth, SubBeat::Onset, NoteValue::Quarter),
        _ => {}
    }
}

fn jazz(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    hat(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.3);
    if backbeat(ctx.local_beat) {
        hat(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.2);
    }
    bass(out, ctx.root, SubBeat::Onset, NoteValue::Quarter);
}

fn latin(ctx: &PatternContext, out: &mut Vec<BackingHit>) {
    if downbeat(ctx.local_beat) {
        kick(out, SubBeat::Onset, NoteValue::Eighth);
    }
    // Rim clicks approximating a clave
    match ctx.local_beat {
        0 => snare(out, SubBeat::Onset, NoteValue::ThirtySecond, 0.6),
        1 | 3 => snare(out, SubBeat::Eighth, NoteValue::ThirtySecond, 0.6),
        _ => {}
    }
    match ctx.local_beat {
        0 => bass(out, ctx.root, SubBeat::Onset, NoteValue::DottedQuarter),
        2 => bass(out, ctx.fifth, SubBeat::Onset, NoteValue::Quarter),
        _ => {}
    }
}
