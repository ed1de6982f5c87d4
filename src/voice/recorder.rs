// Recording voices - Capture triggers instead of producing sound
// Used by tests and by the CLI's dry-run listing

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Instrument, NoteTrigger, VoiceKind};

/// One captured trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerRecord {
    pub voice: VoiceKind,
    pub trigger: NoteTrigger,
}

/// Shared log of every trigger that will sound
///
/// Cloning shares the same log. `release_all` prunes triggers scheduled
/// after the release time, so the log only ever holds notes that actually play.
#[derive(Debug, Clone, Default)]
pub struct TriggerLog {
    records: Arc<Mutex<Vec<TriggerRecord>>>,
}

impl TriggerLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A voice writing into this log
    pub fn voice(&self, kind: VoiceKind) -> RecordingVoice {
        RecordingVoice {
            kind,
            log: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TriggerRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of all records in trigger order
    pub fn records(&self) -> Vec<TriggerRecord> {
        self.lock().clone()
    }

    /// Records for one voice
    pub fn for_voice(&self, kind: VoiceKind) -> Vec<TriggerRecord> {
        self.lock().iter().filter(|r| r.voice == kind).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Instrument that appends to a `TriggerLog`
#[derive(Debug, Clone)]
pub struct RecordingVoice {
    kind: VoiceKind,
    log: TriggerLog,
}

impl Instrument for RecordingVoice {
    fn trigger(&mut self, trigger: NoteTrigger) {
        self.log.lock().push(TriggerRecord {
            voice: self.kind,
            trigger,
        });
    }

    fn release_all(&mut self, at: f64) {
        let kind = self.kind;
        self.log
            .lock()
            .retain(|r| r.voice != kind || r.trigger.time <= at);
    }
}
