// EditCommand trait definition

use thiserror::Error;

use crate::edit::state::ProgressionState;

pub type EditResult<T> = Result<T, EditError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Chord index {index} out of range (progression has {len} chords)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid loop range {start}..={end}")]
    InvalidLoopRange { start: usize, end: usize },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    /// Undo called on a command that never ran
    #[error("Undo failed: {0}")]
    UndoFailed(String),
}

/// A reversible change to a progression
///
/// `execute` stores whatever `undo` needs; calling `execute` again after an
/// undo must reapply the same change.
///
/// # Example
/// ```
/// use vibechord::edit::{EditCommand, EditError, EditResult, ProgressionState};
///
/// struct ToggleLock {
///     before: Option<bool>,
/// }
///
/// impl EditCommand for ToggleLock {
///     fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()> {
///         self.before = Some(state.pitch_lock);
///         state.pitch_lock = !state.pitch_lock;
///         Ok(())
///     }
///
///     fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()> {
///         state.pitch_lock = self.before.ok_or(EditError::UndoFailed("not executed".into()))?;
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         "Toggle pitch lock".to_string()
///     }
/// }
/// ```
pub trait EditCommand: Send {
    fn execute(&mut self, state: &mut ProgressionState) -> EditResult<()>;

    fn undo(&mut self, state: &mut ProgressionState) -> EditResult<()>;

    /// Human-readable label, e.g. for an "Undo: ..." menu entry
    fn description(&self) -> String;
}
