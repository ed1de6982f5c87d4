// Errors - Failure taxonomy for playback, configuration and export
// Validation errors are returned synchronously from play() before any voice fires

use thiserror::Error;

/// Errors surfaced by the playback core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// A chord in the progression cannot be scheduled
    #[error("Invalid chord data at index {index}: {reason}")]
    InvalidChordData { index: usize, reason: String },

    /// Tempo must be a finite, positive BPM no larger than 999
    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    /// Capo must be between 0 and 12
    #[error("Invalid capo position: {0} (expected 0-12)")]
    InvalidCapo(u8),

    /// Sub-range does not fit the progression
    #[error("Invalid chord range {start}..={end} for a progression of {len} chords")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// Preview of a string/fret that does not exist on the neck
    #[error("Invalid fret position: string {string}, fret {fret}")]
    InvalidFret { string: usize, fret: i8 },

    /// Audio output could not be opened
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Errors while loading or saving a studio configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Errors while rendering a progression to disk
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render did not complete within {0:.1} seconds")]
    Timeout(f64),
}
