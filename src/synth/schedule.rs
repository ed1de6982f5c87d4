// Scheduled notes - Time-stamped trigger queue shared by every synthesized voice
// Triggers arrive ahead of the audio clock and start at their exact sample

use log::trace;

use crate::sequencer::timeline::{NoteValue, Tempo};
use crate::voice::NoteTrigger;

/// Pending triggers ordered by start time
#[derive(Debug, Clone, Default)]
pub struct NoteQueue {
    pending: Vec<NoteTrigger>,
    tempo: Tempo,
}

impl NoteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping time order; equal times keep arrival order
    pub fn push(&mut self, trigger: NoteTrigger) {
        let index = self.pending.partition_point(|p| p.time <= trigger.time);
        self.pending.insert(index, trigger);
    }

    /// Drop every trigger starting after `at`, returns how many were dropped
    pub fn drop_after(&mut self, at: f64) -> usize {
        let keep = self.pending.partition_point(|p| p.time <= at);
        let dropped = self.pending.len() - keep;
        self.pending.truncate(keep);
        dropped
    }

    /// Next trigger starting before `before`
    pub fn pop_due(&mut self, before: f64) -> Option<NoteTrigger> {
        if self.pending.first().is_some_and(|p| p.time < before) {
            Some(self.pending.remove(0))
        } else {
            None
        }
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        if let Some(tempo) = Tempo::new(bpm) {
            self.tempo = tempo;
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Length of a duration token at the current tempo
    pub fn duration_secs(&self, value: NoteValue) -> f64 {
        value.seconds(&self.tempo)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Sample index inside a block starting at `start`; late triggers start at 0
pub fn block_offset(time: f64, start: f64, sample_rate: f32) -> usize {
    let offset = (time - start) * sample_rate as f64;
    if offset <= 0.0 {
        if offset < -1.0 {
            trace!("Late trigger at {:.4}s, block starts at {:.4}s", time, start);
        }
        0
    } else {
        offset.round() as usize
    }
}

/// A voice that consumes a `NoteQueue` sample by sample
pub trait ScheduledSource {
    fn queue_mut(&mut self) -> &mut NoteQueue;
    fn sample_rate(&self) -> f32;
    /// Begin sounding a trigger now
    fn start_note(&mut self, trigger: NoteTrigger);
    fn next_sample(&mut self) -> f32;
}

/// Add a source's output for the block starting at `start` into `out`
pub fn render_scheduled<S: ScheduledSource + ?Sized>(source: &mut S, start: f64, out: &mut [f32]) {
    let sample_rate = source.sample_rate();
    let end = start + out.len() as f64 / sample_rate as f64;
    let mut next = source.queue_mut().pop_due(end);

    for (i, sample) in out.iter_mut().enumerate() {
        while let Some(trigger) = next {
            if block_offset(trigger.time, start, sample_rate) > i {
                break;
            }
            source.start_note(trigger);
            next = source.queue_mut().pop_due(end);
        }
        *sample += source.next_sample();
    }

    // Rounding can leave a trigger for the very end of the block
    if let Some(trigger) = next {
        source.queue_mut().push(trigger);
    }
}
