// Synth module - Synthesized band voices and the guitar effect rig

pub mod amp;
pub mod chorus;
pub mod delay;
pub mod drums;
pub mod effect;
pub mod envelope;
pub mod filter;
pub mod instrument;
pub mod lfo;
pub mod oscillator;
pub mod reverb;
pub mod schedule;
pub mod voice;
pub mod voice_manager;

pub use amp::{AmpModel, GuitarEffects, GuitarRig};
pub use instrument::SynthInstrument;
