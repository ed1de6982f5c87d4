// Amp - Guitar amp models, pedalboard presets and the guitar bus effect rig
//
// Signal flow: gate -> drive -> EQ -> chorus -> delay -> reverb -> volume
//
// `GuitarEffects` is what the user edits (and what the config stores).
// Resolving it against the amp model gives the values the rig actually runs.

use log::debug;
use serde::{Deserialize, Serialize};

use super::chorus::{Chorus, ChorusParams};
use super::delay::{DelayParams, FeedbackDelay};
use super::effect::{Drive, Effect, NoiseGate, Volume, process_stage};
use super::filter::{EqBands, ThreeBandEq};
use super::reverb::{Reverb, ReverbParams};
use crate::sequencer::timeline::{NoteValue, Tempo};

pub const DEFAULT_GATE_DB: f32 = -40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmpModel {
    #[default]
    Clean,
    Tweed,
    Citrus,
    Metal,
    British,
    Plexi,
    Boutique,
    AcousticSim,
}

impl AmpModel {
    pub const ALL: [AmpModel; 8] = [
        AmpModel::Clean,
        AmpModel::Tweed,
        AmpModel::Citrus,
        AmpModel::Metal,
        AmpModel::British,
        AmpModel::Plexi,
        AmpModel::Boutique,
        AmpModel::AcousticSim,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AmpModel::Clean => "CLEAN",
            AmpModel::Tweed => "TWEED",
            AmpModel::Citrus => "CITRUS",
            AmpModel::Metal => "METAL",
            AmpModel::British => "BRITISH",
            AmpModel::Plexi => "PLEXI",
            AmpModel::Boutique => "BOUTIQUE",
            AmpModel::AcousticSim => "ACOUSTIC_SIM",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|model| model.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Fixed tone adjustment of this model applied to drive and EQ
    pub fn adjust(&self, drive: f32, eq: EqBands) -> (f32, EqBands) {
        let EqBands { low, mid, high } = eq;
        match self {
            AmpModel::Citrus => ((drive * 1.2 + 0.1).min(1.0), EqBands::new(low, mid + 4.0, high)),
            AmpModel::Metal => ((drive * 1.5 + 0.3).min(1.0), EqBands::new(low + 4.0, mid - 6.0, high)),
            AmpModel::British => (drive, EqBands::new(low, mid + 2.0, high + 3.0)),
            AmpModel::Plexi => (drive.max(0.2), EqBands::new(low + 2.0, mid + 5.0, high)),
            AmpModel::Boutique => (drive, EqBands::new(low + 1.0, mid + 1.0, high)),
            AmpModel::AcousticSim => (0.0, EqBands::new(low + 2.0, mid, high + 5.0)),
            AmpModel::Clean | AmpModel::Tweed => (drive, eq),
        }
    }
}

/// User-facing guitar tone: amp, pedals and output level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuitarEffects {
    pub amp_model: AmpModel,
    /// Gains in dB
    pub eq: EqBands,
    /// 0.0 - 1.0
    pub distortion: f32,
    /// Wet amounts, 0.0 - 1.0
    pub chorus: f32,
    pub reverb: f32,
    pub delay: f32,
    /// Guitar bus output in dB
    pub master_gain: f32,
    /// None keeps the default threshold
    pub noise_gate_threshold: Option<f32>,
}

impl GuitarEffects {
    pub const PRESET_NAMES: [&'static str; 7] =
        ["ACOUSTIC", "CLEAN", "CHIME", "BLUES", "BOUTIQUE", "ROCK", "METAL"];

    #[allow(clippy::too_many_arguments)]
    fn preset_values(
        amp_model: AmpModel,
        eq: (f32, f32, f32),
        distortion: f32,
        chorus: f32,
        reverb: f32,
        delay: f32,
        master_gain: f32,
    ) -> Self {
        Self {
            amp_model,
            eq: EqBands::new(eq.0, eq.1, eq.2),
            distortion,
            chorus,
            reverb,
            delay,
            master_gain,
            noise_gate_threshold: None,
        }
    }

    /// Named pedalboard preset, case-insensitive
    pub fn preset(name: &str) -> Option<Self> {
        let preset = match name.to_ascii_uppercase().as_str() {
            "ACOUSTIC" => Self::preset_values(AmpModel::AcousticSim, (2.0, 0.0, 4.0), 0.0, 0.0, 0.15, 0.0, 0.0),
            "CLEAN" => Self::preset_values(AmpModel::Clean, (0.0, 0.0, 2.0), 0.0, 0.2, 0.3, 0.1, 0.0),
            "CHIME" => Self::preset_values(AmpModel::British, (0.0, 2.0, 5.0), 0.1, 0.0, 0.2, 0.1, -1.0),
            "BLUES" => Self::preset_values(AmpModel::Tweed, (2.0, 1.0, 2.0), 0.3, 0.0, 0.15, 0.0, 0.0),
            "BOUTIQUE" => Self::preset_values(AmpModel::Boutique, (1.0, 3.0, 1.0), 0.4, 0.1, 0.25, 0.2, -1.0),
            "ROCK" => Self::preset_values(AmpModel::Plexi, (2.0, 4.0, 3.0), 0.6, 0.0, 0.2, 0.0, -2.0),
            "METAL" => Self::preset_values(AmpModel::Metal, (5.0, -5.0, 4.0), 0.9, 0.0, 0.1, 0.0, -3.0),
            _ => return None,
        };
        Some(preset)
    }

    /// Values after the amp model's adjustment, clamped to their ranges
    pub fn resolve(&self) -> ToneSettings {
        let (drive, eq) = self.amp_model.adjust(self.distortion.clamp(0.0, 1.0), self.eq);
        ToneSettings {
            drive,
            eq,
            chorus: self.chorus.clamp(0.0, 1.0),
            reverb: self.reverb.clamp(0.0, 1.0),
            delay: self.delay.clamp(0.0, 1.0),
            master_gain: self.master_gain,
            gate_threshold: self.noise_gate_threshold.unwrap_or(DEFAULT_GATE_DB),
        }
    }
}

impl Default for GuitarEffects {
    fn default() -> Self {
        Self::preset_values(AmpModel::Clean, (0.0, 0.0, 2.0), 0.0, 0.2, 0.3, 0.1, 0.0)
    }
}

/// Resolved guitar bus settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSettings {
    pub drive: f32,
    pub eq: EqBands,
    pub chorus: f32,
    pub reverb: f32,
    pub delay: f32,
    pub master_gain: f32,
    pub gate_threshold: f32,
}

/// The guitar bus effect chain
pub struct GuitarRig {
    gate: NoiseGate,
    drive: Drive,
    eq: ThreeBandEq,
    chorus: Chorus,
    delay: FeedbackDelay,
    reverb: Reverb,
    volume: Volume,
    settings: ToneSettings,
    tempo: Tempo,
}

impl GuitarRig {
    const DELAY_FEEDBACK: f32 = 0.3;
    const REVERB_DECAY_SECS: f32 = 2.5;
    const MAX_DELAY_SECS: f32 = 3.0;

    pub fn new(effects: &GuitarEffects, sample_rate: f32) -> Self {
        let settings = effects.resolve();
        let tempo = Tempo::default();
        Self {
            gate: NoiseGate::new(Some(settings.gate_threshold), sample_rate),
            drive: Drive::new(settings.drive),
            eq: ThreeBandEq::new(settings.eq, sample_rate),
            chorus: Chorus::new(ChorusParams::with_mix(settings.chorus), sample_rate),
            delay: FeedbackDelay::new(
                Self::delay_params(&tempo, settings.delay),
                sample_rate,
                Self::MAX_DELAY_SECS,
            ),
            reverb: Reverb::new(
                ReverbParams::new(Self::REVERB_DECAY_SECS, 0.5, settings.reverb),
                sample_rate,
            ),
            volume: Volume::new(settings.master_gain, sample_rate),
            settings,
            tempo,
        }
    }

    fn delay_params(tempo: &Tempo, mix: f32) -> DelayParams {
        DelayParams::synced(NoteValue::DottedEighth, tempo, Self::DELAY_FEEDBACK, mix)
    }

    /// Swap parameters in place; buffers and tails are kept
    pub fn apply(&mut self, effects: &GuitarEffects) {
        let settings = effects.resolve();
        self.gate.set_threshold(Some(settings.gate_threshold));
        self.drive.set_amount(settings.drive);
        self.eq.set_bands(settings.eq);
        self.chorus.set_params(ChorusParams::with_mix(settings.chorus));
        self.delay.set_params(Self::delay_params(&self.tempo, settings.delay));
        let mut reverb = self.reverb.params();
        reverb.mix = settings.reverb;
        self.reverb.set_params(reverb);
        self.volume.set_db(settings.master_gain);
        self.settings = settings;
        debug!("Guitar rig updated: {:?} drive {:.2}", effects.amp_model, settings.drive);
    }

    /// Keeps the delay on a dotted eighth
    pub fn set_tempo(&mut self, bpm: f64) {
        if let Some(tempo) = Tempo::new(bpm) {
            self.tempo = tempo;
            self.delay.set_params(Self::delay_params(&tempo, self.settings.delay));
        }
    }

    pub fn settings(&self) -> ToneSettings {
        self.settings
    }

    pub fn delay_time_secs(&self) -> f32 {
        self.delay.params().time_secs
    }

    pub fn reset(&mut self) {
        let stages: [&mut dyn Effect; 7] = [
            &mut self.gate,
            &mut self.drive,
            &mut self.eq,
            &mut self.chorus,
            &mut self.delay,
            &mut self.reverb,
            &mut self.volume,
        ];
        for stage in stages {
            stage.reset();
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let stages: [&mut dyn Effect; 7] = [
            &mut self.gate,
            &mut self.drive,
            &mut self.eq,
            &mut self.chorus,
            &mut self.delay,
            &mut self.reverb,
            &mut self.volume,
        ];
        stages.into_iter().fold(input, |sample, stage| process_stage(stage, sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_resolves() {
        for name in GuitarEffects::PRESET_NAMES {
            let preset = GuitarEffects::preset(name).unwrap();
            let tone = preset.resolve();
            assert!((0.0..=1.0).contains(&tone.drive), "{}", name);
        }
        assert!(GuitarEffects::preset("nope").is_none());
        assert_eq!(GuitarEffects::preset("clean"), Some(GuitarEffects::default()));
    }

    #[test]
    fn test_amp_model_adjustments() {
        let eq = EqBands::new(0.0, 0.0, 0.0);
        let (drive, bands) = AmpModel::Citrus.adjust(0.5, eq);
        assert!((drive - 0.7).abs() < 1e-6);
        assert_eq!(bands, EqBands::new(0.0, 4.0, 0.0));
        assert_eq!(AmpModel::Metal.adjust(0.9, eq).0, 1.0);
        assert_eq!(AmpModel::Metal.adjust(0.0, eq).1, EqBands::new(4.0, -6.0, 0.0));
        assert_eq!(AmpModel::Plexi.adjust(0.0, eq).0, 0.2);
        assert_eq!(AmpModel::AcousticSim.adjust(0.8, eq), (0.0, EqBands::new(2.0, 0.0, 5.0)));
        assert_eq!(AmpModel::Tweed.adjust(0.3, eq), (0.3, eq));
    }

    #[test]
    fn test_gate_threshold_defaults() {
        let mut effects = GuitarEffects::default();
        assert_eq!(effects.resolve().gate_threshold, -40.0);
        effects.noise_gate_threshold = Some(-55.0);
        assert_eq!(effects.resolve().gate_threshold, -55.0);
    }

    #[test]
    fn test_amp_model_serde_names() {
        let json = serde_json::to_string(&AmpModel::AcousticSim).unwrap();
        assert_eq!(json, "\"ACOUSTIC_SIM\"");
        let effects: GuitarEffects = serde_json::from_str(r#"{"amp_model":"PLEXI","distortion":0.6}"#).unwrap();
        assert_eq!(effects.amp_model, AmpModel::Plexi);
        assert_eq!(effects.chorus, GuitarEffects::default().chorus);

        for model in AmpModel::ALL {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json.trim_matches('"'), model.name());
            assert_eq!(AmpModel::from_name(&model.name().to_lowercase()), Some(model));
        }
        assert!(AmpModel::from_name("FUZZ").is_none());
    }

    #[test]
    fn test_delay_follows_tempo() {
        let mut rig = GuitarRig::new(&GuitarEffects::default(), 44100.0);
        rig.set_tempo(100.0);
        assert!((rig.delay_time_secs() - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_apply_mid_stream() {
        let mut rig = GuitarRig::new(&GuitarEffects::default(), 44100.0);
        for i in 0..1000 {
            rig.process((i as f32 * 0.05).sin() * 0.5);
        }
        rig.apply(&GuitarEffects::preset("METAL").unwrap());
        assert_eq!(rig.settings().drive, 1.0);
        for i in 0..1000 {
            assert!(rig.process((i as f32 * 0.05).sin() * 0.5).is_finite());
        }
    }
}
