// Renderer - Drives a PlaybackEngine block by block and mixes the band
//
// The sample counter is the clock: each block pumps the scheduler at the
// block's start time, renders every voice into its bus, runs the guitar bus
// through the effect rig and sums into a mono output.

use crate::audio::mixer::{Bus, Mixer};
use crate::audio::parameters::MixerControls;
use crate::chord::Chord;
use crate::config::StudioConfig;
use crate::error::PlaybackError;
use crate::sequencer::scheduler::{PlayOptions, PlaybackEngine};
use crate::synth::amp::{GuitarEffects, GuitarRig};
use crate::voice::{VoiceKind, VoiceSet};

pub struct Renderer {
    engine: PlaybackEngine,
    mixer: Mixer,
    rig: GuitarRig,
    controls: Option<MixerControls>,
    sample_rate: f32,
    position: u64,
    scratch: Vec<f32>,
}

impl Renderer {
    /// Renderer with the built-in synthesized voices
    pub fn new(config: &StudioConfig, sample_rate: f32) -> Self {
        let engine = PlaybackEngine::new(VoiceSet::synthesized(sample_rate), config);
        Self::with_engine(engine, config, sample_rate)
    }

    pub fn with_engine(engine: PlaybackEngine, config: &StudioConfig, sample_rate: f32) -> Self {
        Self {
            engine,
            mixer: Mixer::new(config.mixer.clone(), sample_rate),
            rig: GuitarRig::new(&config.guitar, sample_rate),
            controls: None,
            sample_rate,
            position: 0,
            scratch: Vec::with_capacity(config.render.block_size),
        }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    /// Volumes are read from `controls` at the start of every block
    pub fn attach_controls(&mut self, controls: MixerControls) {
        self.controls = Some(controls);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds rendered so far
    pub fn time(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Start a session; the delay follows the new tempo
    pub fn play(&mut self, progression: &[Chord], options: PlayOptions) -> Result<(), PlaybackError> {
        let bpm = options.bpm;
        self.engine.play(progression, options)?;
        self.rig.set_tempo(bpm);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Swap the guitar tone without interrupting playback
    pub fn apply_guitar_effects(&mut self, effects: &GuitarEffects) {
        self.rig.apply(effects);
    }

    /// Render the next block into `out` (mono)
    pub fn process(&mut self, out: &mut [f32]) {
        if let Some(controls) = &self.controls {
            self.mixer.set_config(controls.snapshot());
        }

        let start = self.time();
        let block_secs = out.len() as f64 / self.sample_rate as f64;
        if self.engine.lookahead() < block_secs {
            self.engine.set_lookahead(block_secs);
        }
        self.engine.pump(start);

        if self.scratch.len() < out.len() {
            self.scratch.resize(out.len(), 0.0);
        }
        out.fill(0.0);
        for kind in VoiceKind::ALL {
            let scratch = &mut self.scratch[..out.len()];
            scratch.fill(0.0);
            self.engine.voices_mut().get_mut(kind).render(start, scratch);
            if kind == VoiceKind::Guitar {
                for sample in scratch.iter_mut() {
                    *sample = self.rig.process(*sample);
                }
            }
            self.mixer.accumulate(Bus::from(kind), scratch, out);
        }
        self.mixer.master(out);
        self.position += out.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::demo_progression;
    use crate::sequencer::strum::Humanizer;
    use crate::sequencer::scheduler::PlaybackPhase;

    fn renderer() -> Renderer {
        let mut renderer = Renderer::new(&StudioConfig::default(), 8000.0);
        renderer.engine_mut().set_humanizer(Humanizer::disabled());
        renderer
    }

    #[test]
    fn test_silence_when_idle() {
        let mut renderer = renderer();
        let mut block = vec![1.0; 256];
        renderer.process(&mut block);
        assert!(block.iter().all(|s| *s == 0.0));
        assert_eq!(renderer.position(), 256);
    }

    #[test]
    fn test_renders_progression_to_completion() {
        let mut renderer = renderer();
        renderer.play(&demo_progression(), PlayOptions::new(120.0)).unwrap();
        let mut block = vec![0.0; 400];
        let mut peak: f32 = 0.0;
        // 8 beats at 120 BPM = 4s
        for _ in 0..90 {
            renderer.process(&mut block);
            peak = peak.max(block.iter().fold(0.0f32, |m, s| m.max(s.abs())));
        }
        assert!(peak > 0.0 && peak <= 1.0);
        assert_eq!(renderer.engine().phase(), PlaybackPhase::Completed);
    }

    #[test]
    fn test_lookahead_covers_block() {
        let mut renderer = renderer();
        let mut block = vec![0.0; 4000];
        renderer.process(&mut block);
        assert!(renderer.engine().lookahead() >= 0.5);
    }
}
