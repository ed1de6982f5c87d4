// Audio Export - Offline rendering of a progression to a WAV file
//
// The renderer runs as fast as possible with no device attached. A
// non-looping session renders until its last beat plus a release tail; a
// looping one renders the requested number of cycles, then stops and rings
// out the same way.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;

use crate::audio::dsp_utils::hard_clip;
use crate::audio::format_conversion::f32_to_i16;
use crate::audio::renderer::Renderer;
use crate::chord::{Chord, total_beats};
use crate::config::{RenderConfig, StudioConfig};
use crate::error::ExportError;
use crate::sequencer::scheduler::PlayOptions;

/// Sample encoding of the written file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDepth {
    Int16,
    Float32,
}

impl SampleDepth {
    pub fn bits(&self) -> u16 {
        match self {
            SampleDepth::Int16 => 16,
            SampleDepth::Float32 => 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub sample_rate: u32,
    pub block_size: usize,
    pub depth: SampleDepth,
    /// Cycles to render when the session loops
    pub loop_cycles: u32,
    pub tail_secs: f64,
    pub max_secs: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl ExportSettings {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            sample_rate: config.sample_rate.max(1),
            block_size: config.block_size.max(1),
            depth: if config.float_output {
                SampleDepth::Float32
            } else {
                SampleDepth::Int16
            },
            loop_cycles: config.loop_cycles.max(1),
            tail_secs: config.tail_secs.max(0.0),
            max_secs: config.max_secs,
        }
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: self.depth.bits(),
            sample_format: match self.depth {
                SampleDepth::Int16 => SampleFormat::Int,
                SampleDepth::Float32 => SampleFormat::Float,
            },
        }
    }
}

/// Progress callback for export (reports 0.0 to 1.0)
pub type ProgressCallback = Box<dyn FnMut(f32) + Send>;

/// What was written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportReport {
    pub frames: u64,
    pub duration_secs: f64,
}

pub struct AudioExporter {
    settings: ExportSettings,
    config: StudioConfig,
    progress: Option<ProgressCallback>,
}

impl AudioExporter {
    pub fn new(config: &StudioConfig) -> Self {
        Self {
            settings: ExportSettings::from_config(&config.render),
            config: config.clone(),
            progress: None,
        }
    }

    pub fn with_settings(mut self, settings: ExportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Seconds of audio a session will produce, tail included
    pub fn planned_duration(&self, progression: &[Chord], options: &PlayOptions) -> f64 {
        self.music_duration(progression, options) + self.settings.tail_secs
    }

    fn music_duration(&self, progression: &[Chord], options: &PlayOptions) -> f64 {
        let slice = match options.range {
            Some((start, end)) if start <= end && end < progression.len() => &progression[start..=end],
            _ => progression,
        };
        let beats = total_beats(slice) as f64;
        let cycles = if options.looping { self.settings.loop_cycles.max(1) } else { 1 };
        beats * 60.0 / options.bpm * cycles as f64
    }

    /// Render the session, handing each finished block to `sink`
    pub fn render<F>(
        &mut self,
        progression: &[Chord],
        options: PlayOptions,
        mut sink: F,
    ) -> Result<ExportReport, ExportError>
    where
        F: FnMut(&[f32]) -> Result<(), ExportError>,
    {
        let sample_rate = self.settings.sample_rate as f32;
        let mut renderer = Renderer::new(&self.config, sample_rate);
        let looping = options.looping;
        renderer.play(progression, options.clone())?;

        let music_end = renderer.engine().session_start() + self.music_duration(progression, &options);
        let total = music_end + self.settings.tail_secs;
        if total > self.settings.max_secs {
            return Err(ExportError::Timeout(self.settings.max_secs));
        }
        let total_frames = (total * sample_rate as f64).ceil() as u64;
        let music_frames = (music_end * sample_rate as f64).ceil() as u64;
        info!(
            "Rendering {:.2}s ({} frames) at {} Hz",
            total, total_frames, self.settings.sample_rate
        );

        let mut block = vec![0.0f32; self.settings.block_size];
        let progress_interval = self.settings.sample_rate as u64;
        let mut next_progress = progress_interval;
        let mut stopped = false;

        while renderer.position() < total_frames {
            let position = renderer.position();
            // Blocks end exactly on the last beat so the next cycle never leaks in
            let boundary = if position < music_frames { music_frames } else { total_frames };
            let len = (self.settings.block_size as u64).min(boundary - position) as usize;
            let chunk = &mut block[..len];
            renderer.process(chunk);
            sink(chunk)?;

            if looping && !stopped && renderer.position() >= music_frames {
                renderer.stop();
                stopped = true;
            }
            if renderer.position() >= next_progress {
                next_progress += progress_interval;
                if let Some(callback) = self.progress.as_mut() {
                    callback(renderer.position() as f32 / total_frames as f32);
                }
            }
        }

        if let Some(callback) = self.progress.as_mut() {
            callback(1.0);
        }
        Ok(ExportReport {
            frames: renderer.position(),
            duration_secs: renderer.time(),
        })
    }

    /// Render the session to a mono WAV file
    pub fn export(
        &mut self,
        progression: &[Chord],
        options: PlayOptions,
        path: impl AsRef<Path>,
    ) -> Result<ExportReport, ExportError> {
        let path = path.as_ref();
        let depth = self.settings.depth;
        let mut writer = WavWriter::create(path, self.settings.spec())?;
        let report = self.render(progression, options, |block| {
            for &sample in block {
                match depth {
                    SampleDepth::Int16 => writer.write_sample(f32_to_i16(hard_clip(sample)))?,
                    SampleDepth::Float32 => writer.write_sample(hard_clip(sample))?,
                }
            }
            Ok(())
        })?;
        writer.finalize()?;
        info!(
            "Exported {:.2}s to {}",
            report.duration_secs,
            path.display()
        );
        Ok(report)
    }
}

/// Render `progression` with `config` and write it to `path`
pub fn export_wav(
    progression: &[Chord],
    options: PlayOptions,
    config: &StudioConfig,
    path: impl AsRef<Path>,
) -> Result<ExportReport, ExportError> {
    AudioExporter::new(config).export(progression, options, path)
}

/// Render into memory; handy for analysis and tests
pub fn render_to_vec(
    progression: &[Chord],
    options: PlayOptions,
    config: &StudioConfig,
) -> Result<Vec<f32>, ExportError> {
    let mut samples = Vec::new();
    AudioExporter::new(config).render(progression, options, |block| {
        samples.extend_from_slice(block);
        Ok(())
    })?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::demo_progression;
    use crate::error::PlaybackError;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn config() -> StudioConfig {
        let mut config = StudioConfig::default();
        config.render.sample_rate = 8000;
        config.render.tail_secs = 0.5;
        config.humanize.seed = Some(1);
        config
    }

    #[test]
    fn test_settings_from_config() {
        let mut render = RenderConfig::default();
        render.float_output = true;
        render.loop_cycles = 0;
        let settings = ExportSettings::from_config(&render);
        assert_eq!(settings.depth, SampleDepth::Float32);
        assert_eq!(settings.loop_cycles, 1);
        assert_eq!(ExportSettings::default().depth.bits(), 16);
    }

    #[test]
    fn test_planned_duration() {
        let exporter = AudioExporter::new(&config());
        let chords = demo_progression();
        // 8 beats at 120 BPM + 0.5s tail
        assert!((exporter.planned_duration(&chords, &PlayOptions::new(120.0)) - 4.5).abs() < 1e-9);
        let looped = PlayOptions::new(120.0).looping(true);
        let exporter = exporter.with_settings(ExportSettings {
            loop_cycles: 3,
            ..ExportSettings::from_config(&config().render)
        });
        assert!((exporter.planned_duration(&chords, &looped) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_length_and_content() {
        let samples = render_to_vec(&demo_progression(), PlayOptions::new(120.0), &config()).unwrap();
        assert_eq!(samples.len(), 36_000);
        assert!(samples.iter().any(|s| s.abs() > 0.01));
        assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    }

    #[test]
    fn test_invalid_tempo_fails_before_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let result = export_wav(&demo_progression(), PlayOptions::new(0.0), &config(), &path);
        assert!(matches!(
            result,
            Err(ExportError::Playback(PlaybackError::InvalidTempo(_)))
        ));
    }

    #[test]
    fn test_too_long_render_times_out() {
        let mut config = config();
        config.render.max_secs = 2.0;
        let result = render_to_vec(&demo_progression(), PlayOptions::new(120.0), &config);
        assert!(matches!(result, Err(ExportError::Timeout(_))));
    }

    #[test]
    fn test_progress_reaches_one() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut exporter = AudioExporter::new(&config()).with_progress(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));
        exporter
            .render(&demo_progression(), PlayOptions::new(120.0), |_| Ok(()))
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().copied(), Some(1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_export_writes_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("demo.wav");
        let report = export_wav(&demo_progression(), PlayOptions::new(120.0), &config(), &path).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len() as u64, report.frames);
    }
}
