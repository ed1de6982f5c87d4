// ProgressionState - The editable song: chords, capo and loop range

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, MAX_CAPO, demo_progression};
use crate::edit::trait_def::{EditError, EditResult};
use crate::sequencer::scheduler::PlayOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionState {
    pub chords: Vec<Chord>,
    pub capo: u8,
    /// Capo changes transpose the chords so the sounding pitch stays put
    pub pitch_lock: bool,
    /// Inclusive chord range played when looping a section
    pub loop_range: Option<(usize, usize)>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new(demo_progression())
    }
}

impl ProgressionState {
    pub fn new(chords: Vec<Chord>) -> Self {
        Self {
            chords,
            capo: 0,
            pitch_lock: false,
            loop_range: None,
        }
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub(crate) fn check_index(&self, index: usize) -> EditResult<()> {
        if index < self.chords.len() {
            Ok(())
        } else {
            Err(EditError::IndexOutOfRange {
                index,
                len: self.chords.len(),
            })
        }
    }

    /// Drop the loop range once it no longer fits the progression
    pub fn clamp_loop_range(&mut self) {
        if let Some((start, end)) = self.loop_range
            && (start >= self.chords.len() || end >= self.chords.len() || start > end)
        {
            self.loop_range = None;
        }
    }

    pub(crate) fn set_capo_clamped(&mut self, capo: u8) {
        self.capo = capo.min(MAX_CAPO);
    }

    /// Options for playing this state: capo and loop range applied on top of `base`
    pub fn play_options(&self, base: PlayOptions) -> PlayOptions {
        let options = base.with_capo(self.capo);
        match self.loop_range {
            Some((start, end)) => options.with_range(start, end),
            None => options,
        }
    }
}
