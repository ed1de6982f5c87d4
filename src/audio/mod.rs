// Module audio - Mixing, offline rendering, WAV export and the cpal output stream

pub mod dsp_utils;
pub mod engine;
pub mod export;
pub mod format_conversion;
pub mod mixer;
pub mod parameters;
pub mod renderer;

pub use export::{AudioExporter, ExportReport, ExportSettings, SampleDepth, export_wav};
pub use mixer::{Bus, Mixer, MixerConfig};
pub use renderer::Renderer;
