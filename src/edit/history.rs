// EditHistory - Undo/redo stacks over a ProgressionState

use log::debug;
use std::collections::VecDeque;

use crate::edit::state::ProgressionState;
use crate::edit::trait_def::{EditCommand, EditError, EditResult};

/// Default maximum number of edits kept for undo
const DEFAULT_MAX_HISTORY: usize = 50;

/// Executes edits and keeps them for undo/redo
///
/// A new edit clears the redo stack. Past the history limit the oldest edit
/// is forgotten.
pub struct EditHistory {
    /// Most recent at the back
    undo_stack: VecDeque<Box<dyn EditCommand>>,
    redo_stack: VecDeque<Box<dyn EditCommand>>,
    max_history: usize,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::new(),
            max_history,
        }
    }

    /// Apply `command` and record it; a failed command leaves no trace
    pub fn execute(
        &mut self,
        mut command: Box<dyn EditCommand>,
        state: &mut ProgressionState,
    ) -> EditResult<()> {
        command.execute(state)?;
        state.clamp_loop_range();
        debug!("Edit: {}", command.description());

        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Revert the last edit, returning its description
    pub fn undo(&mut self, state: &mut ProgressionState) -> EditResult<String> {
        let mut command = self.undo_stack.pop_back().ok_or(EditError::NothingToUndo)?;
        let description = command.description();
        if let Err(e) = command.undo(state) {
            self.undo_stack.push_back(command);
            return Err(e);
        }
        self.redo_stack.push_back(command);
        Ok(description)
    }

    /// Reapply the last undone edit, returning its description
    pub fn redo(&mut self, state: &mut ProgressionState) -> EditResult<String> {
        let mut command = self.redo_stack.pop_back().ok_or(EditError::NothingToRedo)?;
        let description = command.description();
        if let Err(e) = command.execute(state) {
            self.redo_stack.push_back(command);
            return Err(e);
        }
        state.clamp_loop_range();
        self.undo_stack.push_back(command);
        Ok(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|cmd| cmd.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|cmd| cmd.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}
