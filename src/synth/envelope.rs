// Envelopes - ADSR for pitched voices, one-shot exponential decay for drums
//
// Both return a gain in [0, 1] per sample.

/// ADSR Envelope parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    /// Attack time in seconds (0.001 to 5.0)
    pub attack: f32,
    /// Decay time in seconds (0.001 to 5.0)
    pub decay: f32,
    /// Sustain level (0.0 to 1.0)
    pub sustain: f32,
    /// Release time in seconds (0.001 to 5.0)
    pub release: f32,
}

impl AdsrParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.clamp(0.001, 5.0),
            decay: decay.clamp(0.001, 5.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.clamp(0.001, 5.0),
        }
    }

    /// Fast attack, long fall to a low sustain: a plucked string
    pub fn pluck() -> Self {
        Self::new(0.005, 1.2, 0.15, 0.4)
    }

    /// Soft attack, low sustain and a long release for bass lines
    pub fn bass() -> Self {
        Self::new(0.05, 0.2, 0.4, 1.0)
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR envelope generator
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    params: AdsrParams,
    state: EnvelopeState,
    current_value: f32,
    sample_rate: f32,
    /// Level when release began
    release_from: f32,
    current_sample: f32,
}

impl AdsrEnvelope {
    pub fn new(params: AdsrParams, sample_rate: f32) -> Self {
        Self {
            params,
            state: EnvelopeState::Idle,
            current_value: 0.0,
            sample_rate,
            release_from: 0.0,
            current_sample: 0.0,
        }
    }

    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = params;
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    /// Start the attack; retriggering rises from the current level
    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.current_sample = self.current_value * self.params.attack * self.sample_rate;
    }

    pub fn note_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
            self.release_from = self.current_value;
            self.current_sample = 0.0;
        }
    }

    pub fn process(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => self.current_value = 0.0,
            EnvelopeState::Attack => {
                let len = self.params.attack * self.sample_rate;
                self.current_value = (self.current_sample / len).min(1.0);
                self.current_sample += 1.0;
                if self.current_sample >= len {
                    self.state = EnvelopeState::Decay;
                    self.current_sample = 0.0;
                }
            }
            EnvelopeState::Decay => {
                let len = self.params.decay * self.sample_rate;
                let progress = (self.current_sample / len).min(1.0);
                self.current_value = 1.0 - progress * (1.0 - self.params.sustain);
                self.current_sample += 1.0;
                if self.current_sample >= len {
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => self.current_value = self.params.sustain,
            EnvelopeState::Release => {
                let len = self.params.release * self.sample_rate;
                let progress = (self.current_sample / len).min(1.0);
                self.current_value = self.release_from * (1.0 - progress);
                self.current_sample += 1.0;
                if self.current_sample >= len {
                    self.state = EnvelopeState::Idle;
                    self.current_value = 0.0;
                }
            }
        }
        self.current_value
    }

    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    pub fn is_releasing(&self) -> bool {
        self.state == EnvelopeState::Release
    }

    pub fn current_value(&self) -> f32 {
        self.current_value
    }

    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.current_value = 0.0;
        self.current_sample = 0.0;
    }
}

/// One-shot exponential decay, reaching -60 dB after `decay` seconds
#[derive(Debug, Clone)]
pub struct DecayEnvelope {
    coefficient: f32,
    value: f32,
}

impl DecayEnvelope {
    const FLOOR: f32 = 0.001;

    pub fn new(decay_secs: f32, sample_rate: f32) -> Self {
        let samples = (decay_secs.max(0.001) * sample_rate).max(1.0);
        Self {
            coefficient: (Self::FLOOR.ln() / samples).exp(),
            value: 0.0,
        }
    }

    pub fn trigger(&mut self, level: f32) {
        self.value = level.clamp(0.0, 1.0);
    }

    pub fn process(&mut self) -> f32 {
        let out = self.value;
        self.value *= self.coefficient;
        if self.value < Self::FLOOR * 0.1 {
            self.value = 0.0;
        }
        out
    }

    pub fn is_active(&self) -> bool {
        self.value > 0.0
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SAMPLE_RATE: f32 = 48000.0;

    #[test]
    fn test_adsr_params_clamping() {
        let params = AdsrParams::new(-1.0, 10.0, 1.5, 0.0001);
        assert_eq!(params.attack, 0.001);
        assert_eq!(params.decay, 5.0);
        assert_eq!(params.sustain, 1.0);
        assert_eq!(params.release, 0.001);
    }

    #[test]
    fn test_envelope_starts_idle() {
        let mut envelope = AdsrEnvelope::new(AdsrParams::default(), TEST_SAMPLE_RATE);
        assert!(!envelope.is_active());
        assert_eq!(envelope.process(), 0.0);
    }

    #[test]
    fn test_attack_reaches_peak_then_sustains() {
        let params = AdsrParams::new(0.01, 0.01, 0.5, 0.1);
        let mut envelope = AdsrEnvelope::new(params, TEST_SAMPLE_RATE);
        envelope.note_on();

        let mut peak: f32 = 0.0;
        for _ in 0..(0.011 * TEST_SAMPLE_RATE) as usize {
            peak = peak.max(envelope.process());
        }
        assert!((peak - 1.0).abs() < 0.01);

        for _ in 0..(0.02 * TEST_SAMPLE_RATE) as usize {
            envelope.process();
        }
        assert!((envelope.current_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_release_reaches_idle() {
        let params = AdsrParams::new(0.001, 0.001, 0.8, 0.05);
        let mut envelope = AdsrEnvelope::new(params, TEST_SAMPLE_RATE);
        envelope.note_on();
        for _ in 0..1000 {
            envelope.process();
        }
        envelope.note_off();
        assert!(envelope.is_releasing());

        let mut previous = envelope.current_value();
        for _ in 0..(0.05 * TEST_SAMPLE_RATE) as usize + 1 {
            let value = envelope.process();
            assert!(value <= previous);
            previous = value;
        }
        assert!(!envelope.is_active());
    }

    #[test]
    fn test_note_off_when_idle_stays_idle() {
        let mut envelope = AdsrEnvelope::new(AdsrParams::default(), TEST_SAMPLE_RATE);
        envelope.note_off();
        assert!(!envelope.is_active());
    }

    #[test]
    fn test_decay_envelope_reaches_floor() {
        let mut envelope = DecayEnvelope::new(0.2, 1000.0);
        envelope.trigger(1.0);
        assert_eq!(envelope.process(), 1.0);
        for _ in 0..199 {
            envelope.process();
        }
        assert!((envelope.process() - 0.001).abs() < 1e-4);
        for _ in 0..1000 {
            envelope.process();
        }
        assert!(!envelope.is_active());
    }
}
