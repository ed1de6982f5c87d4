// DSP utilities - Audio hygiene and parameter smoothing for the render path
//
// Everything here runs per sample and must not allocate.

/// Flush denormals to zero
///
/// Denormal floats (very close to 0) can slow some CPUs down badly inside
/// feedback loops. Threshold: 1e-15, far below 32-bit float noise.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh
///
/// Near-linear around 0, saturates asymptotically towards [-1, 1].
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Strict clamp into [-1, 1], used before integer conversion
#[inline]
pub fn hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// One-pole smoother: y[n] = y[n-1] + a * (x[n] - y[n-1])
///
/// Smooths parameter jumps (gains, mix amounts, cutoffs) to avoid clicks.
///
/// # Example
/// ```
/// use vibechord::audio::dsp_utils::OnePoleSmoother;
/// // 10ms smoothing at 44.1kHz
/// let mut smoother = OnePoleSmoother::new(0.0, 10.0, 44100.0);
/// let value = smoother.process(1.0);
/// assert!(value > 0.0 && value < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// `time_constant_ms`: time to reach ~63% of a new target
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = (time_constant_ms * 0.001 * sample_rate).max(1.0);
        Self {
            current: initial_value,
            coefficient: (1.0 / time_constant_samples).min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }

    /// Jump to `value` without smoothing
    #[inline]
    pub fn reset(&mut self, value: f32) {
        self.current = value;
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }
}
