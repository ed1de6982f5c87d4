// Integration test: Offline rendering and WAV export
//
// Renders real sessions through the synthesized band and checks the files
// and buffers that come out.

use hound::{SampleFormat, WavReader};
use tempfile::tempdir;

use vibechord::audio::export::{AudioExporter, render_to_vec};
use vibechord::sequencer::BackingStyle;
use vibechord::synth::amp::GuitarEffects;
use vibechord::{PlayOptions, Renderer, StudioConfig, demo_progression, export_wav};

const SAMPLE_RATE: u32 = 8000;

fn config() -> StudioConfig {
    let mut config = StudioConfig::default();
    config.render.sample_rate = SAMPLE_RATE;
    config.render.block_size = 256;
    config.render.tail_secs = 0.5;
    config.humanize.seed = Some(11);
    config
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn test_export_float_wav() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.wav");
    let mut config = config();
    config.render.float_output = true;

    let report = export_wav(
        &demo_progression(),
        PlayOptions::new(120.0).with_backing(BackingStyle::Rock),
        &config,
        &path,
    )
    .unwrap();
    assert_eq!(report.frames, 36_000);
    assert!((report.duration_secs - 4.5).abs() < 1e-6);

    let mut reader = WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.sample_format, SampleFormat::Float);
    assert_eq!(spec.bits_per_sample, 32);
    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 36_000);
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
    assert!(rms(&samples) > 0.001);
}

#[test]
fn test_export_pcm_wav() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo16.wav");
    AudioExporter::new(&config())
        .export(&demo_progression(), PlayOptions::new(90.0), &path)
        .unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_format, SampleFormat::Int);
    assert_eq!(reader.spec().bits_per_sample, 16);
    // 8 beats at 90 BPM plus the tail
    let expected = ((8.0 * 60.0 / 90.0 + 0.5) * SAMPLE_RATE as f64).ceil() as usize;
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), expected);
    assert!(samples.iter().any(|s| s.unsigned_abs() > 100));
}

#[test]
fn test_looped_export_renders_every_cycle_then_rings_out() {
    let mut config = config();
    config.render.loop_cycles = 2;
    let samples = render_to_vec(
        &demo_progression(),
        PlayOptions::new(120.0).looping(true).with_metronome(true),
        &config,
    )
    .unwrap();
    // Two 4-second cycles and the tail
    assert_eq!(samples.len(), 68_000);

    let second = SAMPLE_RATE as usize;
    let first_cycle = rms(&samples[..4 * second]);
    let second_cycle = rms(&samples[4 * second..8 * second]);
    assert!(second_cycle > first_cycle * 0.5);
    let last = rms(&samples[samples.len() - second / 10..]);
    assert!(last < second_cycle);
}

#[test]
fn test_sub_range_export_is_shorter() {
    let progression = demo_progression();
    let whole = render_to_vec(&progression, PlayOptions::new(120.0), &config()).unwrap();
    let first = render_to_vec(&progression, PlayOptions::new(120.0).with_range(0, 0), &config()).unwrap();
    assert_eq!(whole.len(), 36_000);
    assert_eq!(first.len(), 20_000);
}

#[test]
fn test_same_seed_same_audio() {
    let options = PlayOptions::new(100.0).with_backing(BackingStyle::Funk);
    let a = render_to_vec(&demo_progression(), options.clone(), &config()).unwrap();
    let b = render_to_vec(&demo_progression(), options, &config()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_pedalboard_changes_the_sound() {
    let options = PlayOptions::new(120.0);
    let mut clean = config();
    clean.guitar = GuitarEffects::preset("ACOUSTIC").unwrap();
    let mut metal = config();
    metal.guitar = GuitarEffects::preset("METAL").unwrap();

    let clean = render_to_vec(&demo_progression(), options.clone(), &clean).unwrap();
    let metal = render_to_vec(&demo_progression(), options, &metal).unwrap();
    assert_eq!(clean.len(), metal.len());
    assert_ne!(clean, metal);
}

#[test]
fn test_renderer_preview_outside_session() {
    let mut renderer = Renderer::new(&config(), SAMPLE_RATE as f32);
    let mut block = vec![0.0f32; 400];
    renderer.process(&mut block);
    assert!(block.iter().all(|s| *s == 0.0));

    let chord = demo_progression()[1].clone();
    let notes = renderer.engine_mut().preview_chord(&chord, 0).unwrap();
    assert_eq!(notes.len(), 6);
    let mut heard = 0.0f32;
    for _ in 0..20 {
        renderer.process(&mut block);
        heard = heard.max(rms(&block));
    }
    assert!(heard > 0.001);
    assert!(!renderer.engine().is_playing());
}
