// Effect - Common interface for the guitar bus processors
//
// Every stage processes one mono sample and can be bypassed. The gain stages
// (noise gate, drive, volume) live here; time-based stages have their own
// modules and implement the trait below.

use super::chorus::Chorus;
use super::delay::FeedbackDelay;
use super::filter::ThreeBandEq;
use super::reverb::Reverb;
use crate::audio::dsp_utils::{OnePoleSmoother, soft_clip};
use crate::audio::mixer::db_to_gain;

/// Generic effect trait
///
/// Implementations must be real-time safe: no allocation or blocking in
/// `process()`.
pub trait Effect: Send {
    fn process(&mut self, input: f32) -> f32;

    /// Clear delay lines and filter states
    fn reset(&mut self);

    /// Disabled effects are skipped by the caller
    fn is_enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Run `input` through an effect unless it is bypassed
#[inline]
pub fn process_stage(effect: &mut dyn Effect, input: f32) -> f32 {
    if effect.is_enabled() {
        effect.process(input)
    } else {
        input
    }
}

/// Downward gate: closes when the input envelope stays under the threshold
pub struct NoiseGate {
    threshold: Option<f32>,
    envelope: f32,
    release_coefficient: f32,
    gain: OnePoleSmoother,
}

impl NoiseGate {
    /// `threshold_db`: None leaves the gate open
    pub fn new(threshold_db: Option<f32>, sample_rate: f32) -> Self {
        Self {
            threshold: threshold_db.map(db_to_gain),
            envelope: 0.0,
            // ~50ms envelope release
            release_coefficient: (-1.0 / (0.05 * sample_rate)).exp(),
            gain: OnePoleSmoother::new(1.0, 2.0, sample_rate),
        }
    }

    pub fn set_threshold(&mut self, threshold_db: Option<f32>) {
        self.threshold = threshold_db.map(db_to_gain);
    }

    pub fn is_open(&self) -> bool {
        self.threshold.is_none_or(|t| self.envelope >= t)
    }
}

impl Effect for NoiseGate {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        self.envelope = if level > self.envelope {
            level
        } else {
            level + (self.envelope - level) * self.release_coefficient
        };
        let target = if self.is_open() { 1.0 } else { 0.0 };
        input * self.gain.process(target)
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain.reset(1.0);
    }

    fn is_enabled(&self) -> bool {
        self.threshold.is_some()
    }

    fn name(&self) -> &str {
        "Noise Gate"
    }
}

/// tanh waveshaper; amount 0 is clean, 1 is heavily saturated
pub struct Drive {
    amount: f32,
}

impl Drive {
    const MAX_PRE_GAIN: f32 = 30.0;

    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(0.0, 1.0),
        }
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }
}

impl Effect for Drive {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let pre = 1.0 + self.amount * Self::MAX_PRE_GAIN;
        // Normalised so a full-scale input stays at full scale
        soft_clip(input * pre) / soft_clip(pre)
    }

    fn reset(&mut self) {}

    fn is_enabled(&self) -> bool {
        self.amount > 0.0
    }

    fn name(&self) -> &str {
        "Distortion"
    }
}

/// Output level in dB, smoothed
pub struct Volume {
    target: f32,
    gain: OnePoleSmoother,
}

impl Volume {
    pub fn new(db: f32, sample_rate: f32) -> Self {
        let target = db_to_gain(db);
        Self {
            target,
            gain: OnePoleSmoother::new(target, 10.0, sample_rate),
        }
    }

    pub fn set_db(&mut self, db: f32) {
        self.target = db_to_gain(db);
    }

    pub fn gain(&self) -> f32 {
        self.target
    }
}

impl Effect for Volume {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain.process(self.target)
    }

    fn reset(&mut self) {
        self.gain.reset(self.target);
    }

    fn name(&self) -> &str {
        "Volume"
    }
}

impl Effect for ThreeBandEq {
    fn process(&mut self, input: f32) -> f32 {
        ThreeBandEq::process(self, input)
    }

    fn reset(&mut self) {
        ThreeBandEq::reset(self);
    }

    fn name(&self) -> &str {
        "EQ"
    }
}

impl Effect for Chorus {
    fn process(&mut self, input: f32) -> f32 {
        Chorus::process(self, input)
    }

    fn reset(&mut self) {
        Chorus::reset(self);
    }

    fn is_enabled(&self) -> bool {
        self.params().mix > 0.0
    }

    fn name(&self) -> &str {
        "Chorus"
    }
}

impl Effect for FeedbackDelay {
    fn process(&mut self, input: f32) -> f32 {
        FeedbackDelay::process(self, input)
    }

    fn reset(&mut self) {
        FeedbackDelay::reset(self);
    }

    fn is_enabled(&self) -> bool {
        self.params().mix > 0.0
    }

    fn name(&self) -> &str {
        "Delay"
    }
}

impl Effect for Reverb {
    fn process(&mut self, input: f32) -> f32 {
        Reverb::process(self, input)
    }

    fn reset(&mut self) {
        Reverb::reset(self);
    }

    fn is_enabled(&self) -> bool {
        self.params().mix > 0.0
    }

    fn name(&self) -> &str {
        "Reverb"
    }
}
