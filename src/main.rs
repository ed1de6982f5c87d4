// VibeChord CLI - Play, render, tune and browse chords from the terminal

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use ringbuf::traits::Consumer;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use vibechord::audio::export::AudioExporter;
use vibechord::chord::theory::difficulty;
use vibechord::chord::voicings::{CHORD_CATEGORIES, category};
use vibechord::edit::ProgressionState;
use vibechord::messaging::NotificationLevel;
use vibechord::synth::amp::{AmpModel, GuitarEffects};
use vibechord::tuner::TunerReading;
use vibechord::{AudioEngine, Chord, ChannelObserver, PlayOptions, PlaybackEvent, StudioConfig};

// Sized for a few seconds of beat and note events between UI polls
const EVENT_CHANNEL_CAPACITY: usize = 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "vibechord", version, about = "Guitar chord progression player")]
struct Cli {
    /// Studio configuration (.ron or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a progression on the default audio device
    Play {
        /// Progression JSON (chord array or saved state); the demo when omitted
        progression: Option<PathBuf>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Render a progression to a WAV file
    Render {
        progression: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// Write 32-bit float samples instead of 16-bit
        #[arg(long)]
        float: bool,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Show the note and nearest string for a frequency
    Tune { hz: f32 },
    /// List dictionary shapes, optionally for one category
    Chords { category: Option<String> },
}

#[derive(Args)]
struct SessionArgs {
    #[arg(long)]
    bpm: Option<f64>,
    /// Backing style (ROCK, BLUES, REGGAE, FUNK, LOFI, METAL, COUNTRY, JAZZ, LATIN)
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    backing: bool,
    #[arg(long)]
    metronome: bool,
    #[arg(long)]
    capo: Option<u8>,
    /// Loop the progression this many times
    #[arg(long)]
    loop_cycles: Option<u32>,
    /// Inclusive chord range, e.g. 0..2
    #[arg(long, value_parser = parse_range)]
    range: Option<(usize, usize)>,
    /// Pedalboard preset (ACOUSTIC, CLEAN, CHIME, BLUES, BOUTIQUE, ROCK, METAL)
    #[arg(long)]
    preset: Option<String>,
    /// Amp model override
    #[arg(long)]
    amp: Option<String>,
}

fn parse_range(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = s
        .split_once("..=")
        .or_else(|| s.split_once(".."))
        .ok_or_else(|| format!("expected a..b, got '{}'", s))?;
    let start = start.trim().parse().map_err(|e| format!("bad range start: {}", e))?;
    let end = end.trim().parse().map_err(|e| format!("bad range end: {}", e))?;
    Ok((start, end))
}

impl SessionArgs {
    /// Fold the flags into the config and build the play options
    fn apply(&self, config: &mut StudioConfig, state: &ProgressionState) -> Result<PlayOptions, String> {
        let playback = &mut config.playback;
        if let Some(bpm) = self.bpm {
            playback.bpm = bpm;
        }
        if let Some(style) = &self.style {
            playback.style = style.clone();
        }
        playback.backing |= self.backing || self.style.is_some();
        playback.metronome |= self.metronome;
        if let Some(capo) = self.capo {
            playback.capo = capo;
        }
        if let Some(cycles) = self.loop_cycles {
            config.render.loop_cycles = cycles;
        }

        if let Some(name) = &self.preset {
            config.guitar = GuitarEffects::preset(name).ok_or_else(|| {
                format!("unknown preset '{}' (try {})", name, GuitarEffects::PRESET_NAMES.join(", "))
            })?;
        }
        if let Some(name) = &self.amp {
            config.guitar.amp_model = AmpModel::from_name(name).ok_or_else(|| {
                let names: Vec<_> = AmpModel::ALL.iter().map(AmpModel::name).collect();
                format!("unknown amp '{}' (try {})", name, names.join(", "))
            })?;
        }

        let mut options = state.play_options(PlayOptions::from_config(&config.playback));
        // A saved capo wins over the config default, never over the flag
        if self.capo.is_some() || state.capo == 0 {
            options.capo = config.playback.capo;
        }
        if let Some((start, end)) = self.range {
            options = options.with_range(start, end);
        }
        Ok(options.looping(self.loop_cycles.is_some()))
    }
}

fn load_progression(path: Option<&Path>) -> Result<ProgressionState, String> {
    let Some(path) = path else {
        return Ok(ProgressionState::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if let Ok(chords) = serde_json::from_str::<Vec<Chord>>(&text) {
        return Ok(ProgressionState::new(chords));
    }
    serde_json::from_str::<ProgressionState>(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn load_config(path: Option<&Path>) -> Result<StudioConfig, String> {
    match path {
        Some(path) => StudioConfig::load(path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => Ok(StudioConfig::default()),
    }
}

fn play(mut config: StudioConfig, state: ProgressionState, session: &SessionArgs) -> Result<(), String> {
    let options = session.apply(&mut config, &state)?;
    let cycles = session.loop_cycles.map(u64::from);

    let mut engine = AudioEngine::new(&config).map_err(|e| e.to_string())?;
    let (observer, mut events) = ChannelObserver::new(EVENT_CHANNEL_CAPACITY);
    engine.subscribe(Box::new(observer));
    engine.play(&state.chords, options).map_err(|e| e.to_string())?;

    loop {
        thread::sleep(POLL_INTERVAL);
        for notification in engine.drain_notifications() {
            match notification.level {
                NotificationLevel::Error => error!("{}", notification.message),
                NotificationLevel::Warning => warn!("{}", notification.message),
                NotificationLevel::Info => info!("{}", notification.message),
            }
        }

        let mut finished = false;
        while let Some(event) = events.try_pop() {
            match event {
                PlaybackEvent::ChordChanged(index) => {
                    if let Some(chord) = state.chords.get(index) {
                        println!("[{}] {}", index + 1, chord.name);
                    }
                }
                PlaybackEvent::Completed | PlaybackEvent::Stopped => finished = true,
                _ => {}
            }
        }
        if finished {
            break;
        }

        if let Some(cycles) = cycles
            && engine.with_renderer(|r| r.engine().loop_count()) >= cycles
        {
            engine.stop();
        }
    }

    // Let the last notes ring out
    thread::sleep(Duration::from_secs_f64(config.render.tail_secs.max(0.0)));
    Ok(())
}

fn render(
    mut config: StudioConfig,
    state: ProgressionState,
    session: &SessionArgs,
    output: &Path,
    float: bool,
) -> Result<(), String> {
    let options = session.apply(&mut config, &state)?;
    config.render.float_output |= float;
    let report = AudioExporter::new(&config)
        .with_progress(Box::new(|p| info!("Rendering... {:.0}%", p * 100.0)))
        .export(&state.chords, options, output)
        .map_err(|e| e.to_string())?;
    println!(
        "Wrote {} ({:.2}s, {} frames)",
        output.display(),
        report.duration_secs,
        report.frames
    );
    Ok(())
}

fn tune(hz: f32) -> Result<(), String> {
    let reading = TunerReading::from_frequency(hz)
        .ok_or_else(|| format!("{} Hz is outside the tuner range (50-1000 Hz)", hz))?;
    let (string, open, cents) = reading.nearest_string();
    println!(
        "{}{} {:+.1} cents{}",
        reading.note_name(),
        reading.octave(),
        reading.cents,
        if reading.is_in_tune() { " (in tune)" } else { "" }
    );
    println!("Nearest string: {} ({}), {:+.1} cents", 6 - string, open, cents);
    Ok(())
}

fn chords(filter: Option<&str>) -> Result<(), String> {
    let categories: Vec<_> = match filter {
        Some(title) => vec![category(title).ok_or_else(|| format!("unknown category '{}'", title))?],
        None => CHORD_CATEGORIES.iter().collect(),
    };
    for cat in categories {
        println!("{}", cat.title);
        for template in cat.chords {
            let fingering = vibechord::Fingering(template.fingering);
            let frets: Vec<String> = template
                .fingering
                .iter()
                .map(|f| if *f < 0 { "x".to_string() } else { f.to_string() })
                .collect();
            println!(
                "  {:<8} {:<20} {:?}",
                template.name,
                frets.join(" "),
                difficulty(&fingering)
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Command::Play { progression, session } => {
            play(config, load_progression(progression.as_deref())?, session)
        }
        Command::Render {
            progression,
            output,
            float,
            session,
        } => render(config, load_progression(progression.as_deref())?, session, output, *float),
        Command::Tune { hz } => tune(*hz),
        Command::Chords { category } => chords(category.as_deref()),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
