// Filter - State Variable Filter (Chamberlin) and a 3-band EQ built from it
//
// The SVF keeps two states (low, band) and produces low/high/band/notch at once.
// - 12dB/octave slope
// - Cutoff clamped to Fs/6 for stability
// - Cutoff and resonance are smoothed to avoid zipper noise

use crate::audio::dsp_utils::OnePoleSmoother;
use std::f32::consts::PI;

/// Filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Cutoff frequency in Hz
    pub cutoff: f32,
    /// Q factor (0.5 - 20.0)
    pub resonance: f32,
    pub filter_type: FilterType,
    pub enabled: bool,
}

impl FilterParams {
    pub fn new(filter_type: FilterType, cutoff: f32, resonance: f32) -> Self {
        Self {
            cutoff,
            resonance,
            filter_type,
            enabled: true,
        }
    }

    pub fn low_pass(cutoff: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff, 0.707)
    }

    pub fn high_pass(cutoff: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff, 0.707)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::low_pass(1000.0)
    }
}

/// Chamberlin state variable filter
pub struct StateVariableFilter {
    params: FilterParams,
    sample_rate: f32,
    low: f32,
    band: f32,
    f: f32,
    q: f32,
    cutoff_smoother: OnePoleSmoother,
    resonance_smoother: OnePoleSmoother,
}

impl StateVariableFilter {
    pub fn new(params: FilterParams, sample_rate: f32) -> Self {
        let mut filter = Self {
            params,
            sample_rate,
            low: 0.0,
            band: 0.0,
            f: 0.0,
            q: 0.0,
            cutoff_smoother: OnePoleSmoother::new(params.cutoff, 5.0, sample_rate),
            resonance_smoother: OnePoleSmoother::new(params.resonance, 5.0, sample_rate),
        };
        filter.update_coefficients(params.cutoff, params.resonance);
        filter
    }

    /// Takes effect gradually through the smoothers
    pub fn set_params(&mut self, params: FilterParams) {
        self.params = params;
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    // f = 2 sin(pi fc / Fs), q = 1 / Q
    fn update_coefficients(&mut self, cutoff: f32, resonance: f32) {
        let safe_cutoff = cutoff.clamp(20.0, self.sample_rate / 6.0);
        self.f = 2.0 * (PI * safe_cutoff / self.sample_rate).sin();
        self.q = (1.0 / resonance.clamp(0.5, 20.0)).clamp(0.01, 2.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if !self.params.enabled {
            return input;
        }

        let cutoff = self.cutoff_smoother.process(self.params.cutoff);
        let resonance = self.resonance_smoother.process(self.params.resonance);
        self.update_coefficients(cutoff, resonance);

        let high = input - self.low - self.q * self.band;
        self.band += self.f * high;
        self.low += self.f * self.band;

        match self.params.filter_type {
            FilterType::LowPass => self.low,
            FilterType::HighPass => high,
            FilterType::BandPass => self.band,
            FilterType::Notch => input - self.q * self.band,
        }
    }
}

/// Gains of a 3-band EQ, in dB
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EqBands {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl EqBands {
    pub fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }
}

/// Three-band equalizer: split at 400 Hz and 2.5 kHz, gain per band
pub struct ThreeBandEq {
    low_split: StateVariableFilter,
    high_split: StateVariableFilter,
    gains: [OnePoleSmoother; 3],
    targets: [f32; 3],
}

impl ThreeBandEq {
    pub const LOW_FREQUENCY: f32 = 400.0;
    pub const HIGH_FREQUENCY: f32 = 2500.0;

    pub fn new(bands: EqBands, sample_rate: f32) -> Self {
        let targets = Self::linear(bands);
        Self {
            low_split: StateVariableFilter::new(FilterParams::low_pass(Self::LOW_FREQUENCY), sample_rate),
            high_split: StateVariableFilter::new(FilterParams::high_pass(Self::HIGH_FREQUENCY), sample_rate),
            gains: targets.map(|g| OnePoleSmoother::new(g, 10.0, sample_rate)),
            targets,
        }
    }

    fn linear(bands: EqBands) -> [f32; 3] {
        [bands.low, bands.mid, bands.high].map(crate::audio::mixer::db_to_gain)
    }

    pub fn set_bands(&mut self, bands: EqBands) {
        self.targets = Self::linear(bands);
    }

    pub fn reset(&mut self) {
        self.low_split.reset();
        self.high_split.reset();
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let low = self.low_split.process(input);
        let high = self.high_split.process(input);
        let mid = input - low - high;
        let [gl, gm, gh] = self.targets;
        low * self.gains[0].process(gl) + mid * self.gains[1].process(gm) + high * self.gains[2].process(gh)
    }
}
