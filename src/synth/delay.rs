// Delay - Feedback delay on a circular buffer
//
// Delay time can follow the session tempo (a dotted eighth by default).
// Buffer is allocated once for the maximum time; processing never allocates.

use crate::audio::dsp_utils::OnePoleSmoother;
use crate::sequencer::timeline::{NoteValue, Tempo};

/// Delay parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    /// Delay time in seconds
    pub time_secs: f32,
    /// 0.0 - 0.99
    pub feedback: f32,
    /// Dry/Wet mix (0.0 = fully dry, 1.0 = fully wet)
    pub mix: f32,
}

impl DelayParams {
    pub fn new(time_secs: f32, feedback: f32, mix: f32) -> Self {
        Self {
            time_secs: time_secs.max(0.0),
            feedback: feedback.clamp(0.0, 0.99),
            mix: mix.clamp(0.0, 1.0),
        }
    }

    /// Delay time locked to a note value at `tempo`
    pub fn synced(value: NoteValue, tempo: &Tempo, feedback: f32, mix: f32) -> Self {
        Self::new(value.seconds(tempo) as f32, feedback, mix)
    }
}

impl Default for DelayParams {
    fn default() -> Self {
        Self::synced(NoteValue::DottedEighth, &Tempo::default(), 0.3, 0.0)
    }
}

pub struct FeedbackDelay {
    params: DelayParams,
    sample_rate: f32,
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    feedback_smoother: OnePoleSmoother,
    mix_smoother: OnePoleSmoother,
}

impl FeedbackDelay {
    pub fn new(params: DelayParams, sample_rate: f32, max_time_secs: f32) -> Self {
        let max_samples = (max_time_secs.max(0.001) * sample_rate) as usize + 1;
        let mut delay = Self {
            params,
            sample_rate,
            buffer: vec![0.0; max_samples],
            write_pos: 0,
            delay_samples: 0,
            feedback_smoother: OnePoleSmoother::new(params.feedback, 10.0, sample_rate),
            mix_smoother: OnePoleSmoother::new(params.mix, 10.0, sample_rate),
        };
        delay.set_params(params);
        delay
    }

    /// Times beyond the buffer are clamped to its length
    pub fn set_params(&mut self, params: DelayParams) {
        self.params = DelayParams::new(params.time_secs, params.feedback, params.mix);
        let samples = (self.params.time_secs * self.sample_rate) as usize;
        self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
    }

    pub fn params(&self) -> DelayParams {
        self.params
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let feedback = self.feedback_smoother.process(self.params.feedback);
        let mix = self.mix_smoother.process(self.params.mix);

        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - self.delay_samples) % len;
        let delayed = self.buffer[read_pos];

        self.buffer[self.write_pos] = (input + feedback * delayed).clamp(-2.0, 2.0);
        self.write_pos = (self.write_pos + 1) % len;

        input * (1.0 - mix) + delayed * mix
    }
}
