// Playback observers - Visual synchronization events published by the scheduler
// Zero, one or many observers may listen; playback never depends on them

use log::warn;
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Events released to observers at their scheduled time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Index into the full progression, even when a sub-range plays
    ChordChanged(usize),
    /// Beat within the current chord
    Beat(u32),
    /// A string lights up on the fretboard
    NoteVisual { string: usize, fret: i8 },
    /// Non-looping playback reached its end
    Completed,
    /// `stop()` ended an active session
    Stopped,
}

pub trait PlaybackObserver: Send {
    fn on_event(&mut self, event: PlaybackEvent);
}

impl<F> PlaybackObserver for F
where
    F: FnMut(PlaybackEvent) + Send,
{
    fn on_event(&mut self, event: PlaybackEvent) {
        self(event)
    }
}

pub type EventProducer = HeapProd<PlaybackEvent>;
pub type EventConsumer = HeapCons<PlaybackEvent>;

/// Observer forwarding events into a lock-free ring buffer for another thread
pub struct ChannelObserver {
    tx: EventProducer,
    dropped: u64,
}

impl ChannelObserver {
    /// Observer plus the consumer end the UI drains
    pub fn new(capacity: usize) -> (Self, EventConsumer) {
        let (tx, rx) = create_event_channel(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

    /// Events lost because the consumer fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl PlaybackObserver for ChannelObserver {
    fn on_event(&mut self, event: PlaybackEvent) {
        if self.tx.try_push(event).is_err() {
            self.dropped += 1;
            warn!("Playback event channel full, dropped {:?}", event);
        }
    }
}

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<PlaybackEvent>::new(capacity);
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Consumer;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut observer = move |e: PlaybackEvent| sink.lock().unwrap().push(e);
        observer.on_event(PlaybackEvent::Beat(2));
        assert_eq!(*seen.lock().unwrap(), vec![PlaybackEvent::Beat(2)]);
    }

    #[test]
    fn test_channel_observer_delivers_in_order() {
        let (mut observer, mut rx) = ChannelObserver::new(8);
        observer.on_event(PlaybackEvent::ChordChanged(0));
        observer.on_event(PlaybackEvent::Beat(0));

        assert_eq!(rx.try_pop(), Some(PlaybackEvent::ChordChanged(0)));
        assert_eq!(rx.try_pop(), Some(PlaybackEvent::Beat(0)));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_channel_observer_drops_when_full() {
        let (mut observer, _rx) = ChannelObserver::new(2);
        for beat in 0..5 {
            observer.on_event(PlaybackEvent::Beat(beat));
        }
        assert_eq!(observer.dropped(), 3);
    }
}
