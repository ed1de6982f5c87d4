// Sequencer module - Musical time, transport and the progression scheduler
// Everything here is deterministic given a clock reading and a random source

pub mod backing;
pub mod metronome;
pub mod observer;
pub mod scheduler;
pub mod strum;
pub mod timeline;
pub mod transport;

pub use backing::{BackingHit, BackingStyle, PatternContext, SubBeat};
pub use metronome::ClickType;
pub use observer::{ChannelObserver, PlaybackEvent, PlaybackObserver};
pub use scheduler::{Cue, PlayOptions, PlaybackEngine, PlaybackPhase};
pub use strum::{Humanizer, StrumDirection, StrumEngine, StrumNote};
pub use timeline::{NoteValue, Tempo};
pub use transport::{Fired, Transport, TransportClock, TransportState};
