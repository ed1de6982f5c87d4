// Atomic parameters - Lock-free communication UI -> audio thread
// f32 values are stored as their u32 bits

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::audio::mixer::{Bus, MixerConfig};

/// Thread-safe f32 parameter
#[derive(Debug, Clone)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Called from the UI thread
    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Called from the audio thread
    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Mixer volumes (dB) shared with the audio callback; cloning shares them
#[derive(Debug, Clone)]
pub struct MixerControls {
    master_db: AtomicF32,
    buses: [AtomicF32; 4],
}

impl MixerControls {
    pub fn new(config: &MixerConfig) -> Self {
        Self {
            master_db: AtomicF32::new(config.master_db),
            buses: Bus::ALL.map(|bus| AtomicF32::new(config.bus_db(bus))),
        }
    }

    pub fn set_master(&self, db: f32) {
        self.master_db.set(db);
    }

    pub fn set_volume(&self, bus: Bus, db: f32) {
        self.buses[bus.index()].set(db);
    }

    /// Current values as a config
    pub fn snapshot(&self) -> MixerConfig {
        let mut config = MixerConfig {
            master_db: self.master_db.get(),
            ..MixerConfig::default()
        };
        for (bus, value) in Bus::ALL.iter().zip(&self.buses) {
            config.set_bus_db(*bus, value.get());
        }
        config
    }
}
