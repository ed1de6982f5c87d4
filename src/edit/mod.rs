// Progression editing with undo/redo
//
// Every change to the chord list, capo or loop range goes through an
// `EditCommand`. Commands remember what they replaced so `EditHistory` can
// step back and forth. Playback reads a snapshot of the state, so edits
// never touch a running session.

pub mod commands;
pub mod history;
pub mod state;
pub mod trait_def;

pub use commands::{
    AddChord, MoveChord, RemoveChord, ReplaceChord, SetCapo, SetLoopRange, TransposeAll,
};
pub use history::EditHistory;
pub use state::ProgressionState;
pub use trait_def::{EditCommand, EditError, EditResult};
