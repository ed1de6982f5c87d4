// VibeChord - Guitar progression playback: library exports for the CLI, tests and benchmarks

pub mod audio;
pub mod chord;
pub mod config;
pub mod edit;
pub mod error;
pub mod messaging;
pub mod sequencer;
pub mod synth;
pub mod tuner;
pub mod voice;

// Re-export commonly used types for convenience
pub use audio::engine::AudioEngine;
pub use audio::export::export_wav;
pub use audio::renderer::Renderer;
pub use chord::{Chord, Fingering, Pitch, StrummingPattern, demo_progression};
pub use config::StudioConfig;
pub use edit::{EditHistory, ProgressionState};
pub use error::{ConfigError, ExportError, PlaybackError};
pub use sequencer::{
    BackingStyle, ChannelObserver, PlayOptions, PlaybackEngine, PlaybackEvent, PlaybackObserver,
    PlaybackPhase, Transport,
};
pub use tuner::{PitchSource, TunerReading};
pub use voice::{Instrument, NoteTrigger, TriggerLog, VoiceKind, VoiceSet};
