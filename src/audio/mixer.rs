// Mixer - Per-instrument buses summed into the master output
//
// Volumes are stored in dB. Gains are recomputed when the config changes,
// so a new volume applies from the next rendered block.

use serde::{Deserialize, Serialize};

use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, soft_clip};
use crate::voice::VoiceKind;

/// dB to linear gain; anything at or below -100 dB is silence
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    if db <= -100.0 { 0.0 } else { 10f32.powf(db / 20.0) }
}

/// Linear gain to dB, floored at -100
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 1e-5 { -100.0 } else { 20.0 * gain.log10() }
}

/// Instrument volumes in dB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    pub master_db: f32,
    pub guitar_db: f32,
    pub bass_db: f32,
    pub drums_db: f32,
    pub metronome_db: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            master_db: -2.0,
            guitar_db: -3.0,
            bass_db: -4.0,
            drums_db: -2.0,
            metronome_db: -12.0,
        }
    }
}

impl MixerConfig {
    pub fn bus_db(&self, bus: Bus) -> f32 {
        match bus {
            Bus::Guitar => self.guitar_db,
            Bus::Bass => self.bass_db,
            Bus::Drums => self.drums_db,
            Bus::Metronome => self.metronome_db,
        }
    }

    pub fn set_bus_db(&mut self, bus: Bus, db: f32) {
        match bus {
            Bus::Guitar => self.guitar_db = db,
            Bus::Bass => self.bass_db = db,
            Bus::Drums => self.drums_db = db,
            Bus::Metronome => self.metronome_db = db,
        }
    }
}

/// Mixer channel a voice feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    Guitar,
    Bass,
    Drums,
    Metronome,
}

impl Bus {
    pub const ALL: [Bus; 4] = [Bus::Guitar, Bus::Bass, Bus::Drums, Bus::Metronome];

    pub(crate) fn index(self) -> usize {
        match self {
            Bus::Guitar => 0,
            Bus::Bass => 1,
            Bus::Drums => 2,
            Bus::Metronome => 3,
        }
    }
}

impl From<VoiceKind> for Bus {
    fn from(kind: VoiceKind) -> Self {
        match kind {
            VoiceKind::Guitar => Bus::Guitar,
            VoiceKind::Bass => Bus::Bass,
            VoiceKind::Kick | VoiceKind::Snare | VoiceKind::HiHat => Bus::Drums,
            VoiceKind::Click => Bus::Metronome,
        }
    }
}

pub struct Mixer {
    config: MixerConfig,
    bus_gains: [f32; 4],
    master_gain: f32,
    master_smoother: OnePoleSmoother,
}

impl Mixer {
    pub fn new(config: MixerConfig, sample_rate: f32) -> Self {
        let master_gain = db_to_gain(config.master_db);
        let mut mixer = Self {
            bus_gains: [0.0; 4],
            master_gain,
            master_smoother: OnePoleSmoother::new(master_gain, 10.0, sample_rate),
            config,
        };
        mixer.update_gains();
        mixer
    }

    fn update_gains(&mut self) {
        for bus in Bus::ALL {
            self.bus_gains[bus.index()] = db_to_gain(self.config.bus_db(bus));
        }
        self.master_gain = db_to_gain(self.config.master_db);
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MixerConfig) {
        if config != self.config {
            self.config = config;
            self.update_gains();
        }
    }

    pub fn set_volume(&mut self, bus: Bus, db: f32) {
        self.config.set_bus_db(bus, db);
        self.update_gains();
    }

    pub fn set_master(&mut self, db: f32) {
        self.config.master_db = db;
        self.update_gains();
    }

    pub fn gain(&self, bus: Bus) -> f32 {
        self.bus_gains[bus.index()]
    }

    /// Add `input` scaled by the bus gain into `out`
    pub fn accumulate(&self, bus: Bus, input: &[f32], out: &mut [f32]) {
        let gain = self.gain(bus);
        for (o, i) in out.iter_mut().zip(input) {
            *o += i * gain;
        }
    }

    /// Apply the master gain and saturate the summed block in place
    pub fn master(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let gain = self.master_smoother.process(self.master_gain);
            *sample = soft_clip(flush_denormals_to_zero(*sample) * gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conversions() {
        assert_eq!(db_to_gain(0.0), 1.0);
        assert!((db_to_gain(-6.0) - 0.501).abs() < 0.001);
        assert!((db_to_gain(6.0) - 1.995).abs() < 0.001);
        assert_eq!(db_to_gain(-120.0), 0.0);
        assert!((gain_to_db(0.5) + 6.02).abs() < 0.01);
        assert_eq!(gain_to_db(0.0), -100.0);
    }

    #[test]
    fn test_default_volumes() {
        let config = MixerConfig::default();
        assert_eq!(config.master_db, -2.0);
        assert_eq!(config.bus_db(Bus::Guitar), -3.0);
        assert_eq!(config.bus_db(Bus::Bass), -4.0);
        assert_eq!(config.bus_db(Bus::Drums), -2.0);
        assert_eq!(config.bus_db(Bus::Metronome), -12.0);
    }

    #[test]
    fn test_voice_routing() {
        assert_eq!(Bus::from(VoiceKind::Snare), Bus::Drums);
        assert_eq!(Bus::from(VoiceKind::Click), Bus::Metronome);
        assert_eq!(Bus::from(VoiceKind::Guitar), Bus::Guitar);
    }

    #[test]
    fn test_volume_change_updates_gain() {
        let mut mixer = Mixer::new(MixerConfig::default(), 44100.0);
        mixer.set_volume(Bus::Bass, 0.0);
        assert_eq!(mixer.gain(Bus::Bass), 1.0);
        let mut out = [0.0; 4];
        mixer.accumulate(Bus::Bass, &[0.5; 4], &mut out);
        assert_eq!(out, [0.5; 4]);
    }

    #[test]
    fn test_master_saturates() {
        let mut config = MixerConfig::default();
        config.master_db = 0.0;
        let mut mixer = Mixer::new(config, 44100.0);
        let mut block = [4.0, -4.0, 0.0];
        mixer.master(&mut block);
        assert!(block[0] < 1.0 && block[0] > 0.99);
        assert!(block[1] > -1.0);
        assert_eq!(block[2], 0.0);
    }

    #[test]
    fn test_config_deserializes_partial() {
        let config: MixerConfig = serde_json::from_str(r#"{"guitar_db": -6.0}"#).unwrap();
        assert_eq!(config.guitar_db, -6.0);
        assert_eq!(config.metronome_db, -12.0);
    }
}
