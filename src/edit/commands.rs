// Concrete edit commands

use log::debug;

use crate::chord::{Chord, transpose_chord};
use crate::edit::state::ProgressionState;
use crate::edit::trait_def::{EditCommand, EditError, EditResult};

fn not_executed() -> EditError {
    EditError::UndoFailed("Command was never executed".into())
}

/// Transpose every chord, keeping those that would leave the neck
fn transpose_all(chords: &[Chord], semitones: i32) -> (Vec<Chord>, usize) {
    let mut kept = 0;
    let transposed = chords
        .iter()
        .map(|chord| {
            transpose_chord(chord, semitones).unwrap_or_else(|| {
                kept += 1;
                chord.clone()
            })
        })
        .collect();
    (transposed, kept)
}

/// Insert a chord (append when no index is given)
pub struct AddChord {
    chord: Chord,
    index: Option<usize>,
    inserted_at: Option<usize>,
}

impl AddChord {
    pub fn append(chord: Chord) -> Self {
        Self {
            chord,
            index: None,
            inserted_at: None,
        }
    }

    pub fn insert(index: usize, chord: Chord) -> Self {
        Self {
            chord,
            index: Some(index),
            inserted_at: None,
        }
    }
}

impl EditCommand for AddChord {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let len = state.chords.len();
        let index = self.index.unwrap_or(len);
        if index > len {
            return Err(EditError::IndexOutOfRange { index, len });
        }
        state.chords.insert(index, self.chord.clone());
        self.inserted_at = Some(index);
        Ok(())
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let index = self.inserted_at.ok_or_else(not_executed)?;
        state.check_index(index)?;
        state.chords.remove(index);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add chord {}", self.chord.name)
    }
}

pub struct RemoveChord {
    index: usize,
    removed: Option<Chord>,
    loop_before: Option<(usize, usize)>,
}

impl RemoveChord {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            removed: None,
            loop_before: None,
        }
    }
}

impl EditCommand for RemoveChord {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        state.check_index(self.index)?;
        self.loop_before = state.loop_range;
        self.removed = Some(state.chords.remove(self.index));
        Ok(())
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let chord = self.removed.take().ok_or_else(not_executed)?;
        let index = self.index.min(state.chords.len());
        state.chords.insert(index, chord);
        state.loop_range = self.loop_before;
        Ok(())
    }

    fn description(&self) -> String {
        match &self.removed {
            Some(chord) => format!("Remove chord {}", chord.name),
            None => format!("Remove chord #{}", self.index + 1),
        }
    }
}

/// Swap the chord at `index` for an edited version (name, fingering, beats, pattern)
pub struct ReplaceChord {
    index: usize,
    chord: Chord,
    previous: Option<Chord>,
}

impl ReplaceChord {
    pub fn new(index: usize, chord: Chord) -> Self {
        Self {
            index,
            chord,
            previous: None,
        }
    }
}

impl EditCommand for ReplaceChord {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        state.check_index(self.index)?;
        self.previous = Some(std::mem::replace(
            &mut state.chords[self.index],
            self.chord.clone(),
        ));
        Ok(())
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let previous = self.previous.take().ok_or_else(not_executed)?;
        state.check_index(self.index)?;
        state.chords[self.index] = previous;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Edit chord {}", self.chord.name)
    }
}

/// Drag a chord to a new position
pub struct MoveChord {
    from: usize,
    to: usize,
}

impl MoveChord {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    fn shift(state: &mut ProgressionState, from: usize, to: usize) -> EditResult<()> {
        state.check_index(from)?;
        state.check_index(to)?;
        let chord = state.chords.remove(from);
        state.chords.insert(to, chord);
        Ok(())
    }
}

impl EditCommand for MoveChord {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        Self::shift(state, self.from, self.to)
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        Self::shift(state, self.to, self.from)
    }

    fn description(&self) -> String {
        format!("Move chord {} to {}", self.from + 1, self.to + 1)
    }
}

/// Transpose the whole progression by semitones
pub struct TransposeAll {
    semitones: i32,
    previous: Option<Vec<Chord>>,
}

impl TransposeAll {
    pub fn new(semitones: i32) -> Self {
        Self {
            semitones,
            previous: None,
        }
    }
}

impl EditCommand for TransposeAll {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let (transposed, kept) = transpose_all(&state.chords, self.semitones);
        if kept > 0 {
            debug!("{} chords left untransposed (off the neck)", kept);
        }
        self.previous = Some(std::mem::replace(&mut state.chords, transposed));
        Ok(())
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        state.chords = self.previous.take().ok_or_else(not_executed)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Transpose {:+}", self.semitones)
    }
}

/// Move the capo (clamped to 0..=12)
///
/// With pitch lock on, chords are transposed against the capo change so the
/// progression keeps sounding in the same key.
pub struct SetCapo {
    capo: u8,
    previous: Option<(u8, Vec<Chord>)>,
}

impl SetCapo {
    pub fn new(capo: u8) -> Self {
        Self { capo, previous: None }
    }
}

impl EditCommand for SetCapo {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let old_capo = state.capo;
        let old_chords = state.chords.clone();
        state.set_capo_clamped(self.capo);

        let diff = state.capo as i32 - old_capo as i32;
        if state.pitch_lock && diff != 0 {
            let (transposed, kept) = transpose_all(&state.chords, -diff);
            if kept > 0 {
                debug!("Pitch lock: {} chords could not follow the capo", kept);
            }
            state.chords = transposed;
        }
        self.previous = Some((old_capo, old_chords));
        Ok(())
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let (capo, chords) = self.previous.take().ok_or_else(not_executed)?;
        state.capo = capo;
        state.chords = chords;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Capo {}", self.capo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEdit {
    Start(usize),
    End(usize),
    Range(usize, usize),
    Clear,
}

/// Change the looped section
pub struct SetLoopRange {
    edit: LoopEdit,
    previous: Option<Option<(usize, usize)>>,
}

impl SetLoopRange {
    /// Loop from `index`; the end stays (or becomes the last chord)
    pub fn start_at(index: usize) -> Self {
        Self::from_edit(LoopEdit::Start(index))
    }

    /// Loop up to `index`; the start stays (or becomes the first chord)
    pub fn end_at(index: usize) -> Self {
        Self::from_edit(LoopEdit::End(index))
    }

    pub fn range(start: usize, end: usize) -> Self {
        Self::from_edit(LoopEdit::Range(start, end))
    }

    pub fn clear() -> Self {
        Self::from_edit(LoopEdit::Clear)
    }

    fn from_edit(edit: LoopEdit) -> Self {
        Self { edit, previous: None }
    }
}

impl EditCommand for SetLoopRange {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        let current = state.loop_range;
        let next = match self.edit {
            LoopEdit::Start(index) => {
                state.check_index(index)?;
                let end = current.map_or(state.len() - 1, |(_, end)| end.max(index));
                Some((index, end))
            }
            LoopEdit::End(index) => {
                state.check_index(index)?;
                let start = current.map_or(0, |(start, _)| start.min(index));
                Some((start, index))
            }
            LoopEdit::Range(start, end) => {
                if start > end {
                    return Err(EditError::InvalidLoopRange { start, end });
                }
                state.check_index(end)?;
                Some((start, end))
            }
            LoopEdit::Clear => None,
        };
        self.previous = Some(current);
        state.loop_range = next;
        Ok(())
    }

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
        state.loop_range = self.previous.take().ok_or_else(not_executed)?;
        Ok(())
    }

    fn description(&self) -> String {
        match self.edit {
            LoopEdit::Start(i) => format!("Loop start at {}", i + 1),
            LoopEdit::End(i) => format!("Loop end at {}", i + 1),
            LoopEdit::Range(s, e) => format!("Loop {}-{}", s + 1, e + 1),
            LoopEdit::Clear => "Clear loop".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Fingering;

    fn state() -> ProgressionState {
        ProgressionState::default()
    }

    #[test]
    fn test_add_and_undo() {
        let mut state = state();
        let mut cmd = AddChord::insert(1, Chord::new("Am", 4, [-1, 0, 2, 2, 1, 0]));
        cmd.execute(&mut state).unwrap();
        assert_eq!(state.chords[1].name, "Am");
        cmd.undo(&mut state).unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.chords[1].name, "G");

        let mut bad = AddChord::insert(5, Chord::new("D", 4, Fingering::silent()));
        assert_eq!(
            bad.execute(&mut state),
            Err(EditError::IndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_remove_restores_position_and_loop() {
        let mut state = state();
        state.loop_range = Some((0, 1));
        let mut cmd = RemoveChord::new(0);
        cmd.execute(&mut state).unwrap();
        state.clamp_loop_range();
        assert!(state.loop_range.is_none());
        assert_eq!(cmd.description(), "Remove chord C");

        cmd.undo(&mut state).unwrap();
        assert_eq!(state.chords[0].name, "C");
        assert_eq!(state.loop_range, Some((0, 1)));
    }

    #[test]
    fn test_replace_and_move() {
        let mut state = state();
        let edited = Chord::new("Cmaj7", 2, [-1, 3, 2, 0, 0, 0]);
        let mut replace = ReplaceChord::new(0, edited);
        replace.execute(&mut state).unwrap();
        assert_eq!(state.chords[0].beats, 2);

        let mut mv = MoveChord::new(0, 1);
        mv.execute(&mut state).unwrap();
        assert_eq!(state.chords[1].name, "Cmaj7");
        mv.undo(&mut state).unwrap();
        replace.undo(&mut state).unwrap();
        assert_eq!(state.chords[0].name, "C");
        assert_eq!(state.chords[0].beats, 4);
    }

    #[test]
    fn test_transpose_all_keeps_chords_off_the_neck() {
        let mut state = state();
        let mut cmd = TransposeAll::new(-1);
        cmd.execute(&mut state).unwrap();
        // C has open strings and cannot go down; G cannot either
        assert_eq!(state.chords[0].name, "C");

        let mut up = TransposeAll::new(2);
        up.execute(&mut state).unwrap();
        assert_eq!(state.chords[0].name, "D");
        assert_eq!(state.chords[0].fingering, Fingering([-1, 5, 4, 2, 3, 2]));
        up.undo(&mut state).unwrap();
        assert_eq!(state.chords[0].name, "C");
    }

    #[test]
    fn test_capo_with_pitch_lock() {
        let mut state = ProgressionState::new(vec![Chord::new("D", 4, [-1, -1, 0, 2, 3, 2])]);
        state.pitch_lock = true;
        let mut cmd = SetCapo::new(2);
        cmd.execute(&mut state).unwrap();
        assert_eq!(state.capo, 2);
        // Open D cannot move down two frets, so it is kept as is
        assert_eq!(state.chords[0].name, "D");

        let mut state = ProgressionState::new(vec![Chord::new("E", 4, [7, 7, 9, 9, 9, 7])]);
        state.pitch_lock = true;
        let mut cmd = SetCapo::new(2);
        cmd.execute(&mut state).unwrap();
        assert_eq!(state.chords[0].name, "D");
        assert_eq!(state.chords[0].fingering, Fingering([5, 5, 7, 7, 7, 5]));
        cmd.undo(&mut state).unwrap();
        assert_eq!(state.capo, 0);
        assert_eq!(state.chords[0].name, "E");
    }

    #[test]
    fn test_capo_is_clamped() {
        let mut state = state();
        let mut cmd = SetCapo::new(20);
        cmd.execute(&mut state).unwrap();
        assert_eq!(state.capo, 12);
        // Pitch lock off: chords untouched
        assert_eq!(state.chords[0].name, "C");
    }

    #[test]
    fn test_loop_start_and_end() {
        let mut state = state();
        let mut start = SetLoopRange::start_at(1);
        start.execute(&mut state).unwrap();
        assert_eq!(state.loop_range, Some((1, 1)));

        let mut end = SetLoopRange::end_at(0);
        end.execute(&mut state).unwrap();
        assert_eq!(state.loop_range, Some((0, 0)));

        end.undo(&mut state).unwrap();
        start.undo(&mut state).unwrap();
        assert!(state.loop_range.is_none());

        let mut reversed = SetLoopRange::range(1, 0);
        assert_eq!(
            reversed.execute(&mut state),
            Err(EditError::InvalidLoopRange { start: 1, end: 0 })
        );
    }

    #[test]
    fn test_undo_before_execute_fails() {
        let mut state = state();
        assert!(matches!(
            TransposeAll::new(1).undo(&mut state),
            Err(EditError::UndoFailed(_))
        ));
    }
}
