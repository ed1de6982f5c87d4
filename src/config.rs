// Studio configuration - Playback defaults, humanization, mixer and render settings
// Stored as RON (preferred) or JSON, picked by file extension

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::audio::mixer::MixerConfig;
use crate::error::ConfigError;
use crate::synth::amp::GuitarEffects;

/// Session defaults used when the caller does not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub bpm: f64,
    /// How far ahead of the audio clock events are handed to voices
    pub lookahead_secs: f64,
    pub metronome: bool,
    pub backing: bool,
    /// Backing style name; unknown names play no backing
    pub style: String,
    pub capo: u8,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            bpm: 100.0,
            lookahead_secs: 0.1,
            metronome: false,
            backing: false,
            style: "ROCK".to_string(),
            capo: 0,
        }
    }
}

/// Human feel of the strum engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizeConfig {
    /// Delay between consecutive strings of a strum
    pub strum_step_secs: f64,
    /// Maximum random delay added to each string
    pub timing_jitter_secs: f64,
    /// Maximum random velocity deviation, either direction
    pub velocity_spread: f32,
    pub preview_stagger_secs: f64,
    pub preview_jitter_secs: f64,
    pub preview_velocity_spread: f32,
    /// Fixed seed for reproducible performances
    pub seed: Option<u64>,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            strum_step_secs: 0.015,
            timing_jitter_secs: 0.005,
            velocity_spread: 0.075,
            preview_stagger_secs: 0.03,
            preview_jitter_secs: 0.01,
            preview_velocity_spread: 0.05,
            seed: None,
        }
    }
}

/// Offline render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub block_size: usize,
    /// Seconds rendered after completion so tails ring out
    pub tail_secs: f64,
    /// Cycles rendered when exporting a looping session
    pub loop_cycles: u32,
    /// 32-bit float WAV instead of 16-bit PCM
    pub float_output: bool,
    /// Longest render accepted before giving up
    pub max_secs: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 512,
            tail_secs: 1.5,
            loop_cycles: 1,
            float_output: false,
            max_secs: 600.0,
        }
    }
}

/// Whole studio configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub playback: PlaybackConfig,
    pub humanize: HumanizeConfig,
    pub mixer: MixerConfig,
    pub render: RenderConfig,
    pub guitar: GuitarEffects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Ron,
    Json,
}

fn format_of(path: &Path) -> Result<ConfigFormat, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(ConfigFormat::Ron),
        Some("json") => Ok(ConfigFormat::Json),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl StudioConfig {
    /// Load from a `.ron` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = format_of(path)?;
        let text = fs::read_to_string(path)?;
        let config = match format {
            ConfigFormat::Ron => Self::from_ron(&text)?,
            ConfigFormat::Json => serde_json::from_str(&text)?,
        };
        log::debug!("Loaded studio config from {}", path.display());
        Ok(config)
    }

    /// Save to a `.ron` or `.json` file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match format_of(path)? {
            ConfigFormat::Ron => self.to_ron()?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        fs::write(path, text)?;
        Ok(())
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}
