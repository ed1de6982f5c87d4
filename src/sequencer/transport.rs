// Transport - Playback clock and scheduled event store
// Converts beat offsets into absolute times, fires due events, wraps loop regions

use std::collections::BTreeMap;

use log::{debug, trace};

use super::timeline::{Tempo, beats_to_ticks};

// Slack for float comparisons between computed event times and the clock horizon
const TIME_EPSILON: f64 = 1e-9;

/// Transport state (play/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

impl TransportState {
    /// Check if transport is advancing
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    /// Check if transport is stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped)
    }
}

/// An event released by the clock
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub event: E,
    /// Offset from the start of the timeline, in ticks
    pub tick: u64,
    /// Absolute time on the driving clock, in seconds
    pub time: f64,
    /// Loop cycle the event fired in (0 for the first pass)
    pub cycle: u64,
}

/// Musical clock abstraction the scheduler runs against
///
/// The clock does not keep time by itself: whoever drives it (audio callback,
/// offline renderer, test) calls `advance_to` with the current horizon.
pub trait TransportClock<E> {
    fn set_tempo(&mut self, tempo: Tempo);
    fn tempo(&self) -> Tempo;

    /// Register an event at an offset in ticks from timeline start
    fn schedule_at_ticks(&mut self, ticks: u64, event: E);

    /// Register an event at an offset in beats from timeline start
    ///
    /// Negative offsets are clamped to 0.
    fn schedule_at(&mut self, beats: f64, event: E) {
        if beats < 0.0 {
            debug!("Clamping negative schedule offset {} to 0", beats);
        }
        self.schedule_at_ticks(beats_to_ticks(beats), event);
    }

    /// Start advancing from 0 (or the loop start); restarts if already running
    fn start(&mut self);

    /// Halt and drop every pending event
    fn stop(&mut self);

    /// Drop every pending event, keep running
    fn cancel_all(&mut self);

    /// Loop over `[start_ticks, end_ticks)`
    fn set_loop_region(&mut self, start_ticks: u64, end_ticks: u64);

    /// Loop over `[0, end_beats)`
    fn set_loop(&mut self, end_beats: f64) {
        self.set_loop_region(0, beats_to_ticks(end_beats));
    }

    fn clear_loop(&mut self);

    /// Move the clock to `horizon` (absolute seconds) and return everything due
    fn advance_to(&mut self, horizon: f64) -> Vec<Fired<E>>;

    /// Latest clock reading
    fn now(&self) -> f64;

    fn state(&self) -> TransportState;

    /// Number of registered events
    fn scheduled_len(&self) -> usize;

    /// Completed loop wraps since start
    fn loop_count(&self) -> u64;
}

/// Deterministic transport driven by explicit clock readings
///
/// Events live in a tick-ordered store and are replayed on every loop cycle,
/// so looping never re-registers anything.
#[derive(Debug)]
pub struct Transport<E> {
    events: BTreeMap<u64, Vec<E>>,
    event_count: usize,
    tempo: Tempo,
    state: TransportState,
    now: f64,
    /// Absolute time of `cycle_start_tick` in the current cycle
    cycle_origin: f64,
    cycle_start_tick: u64,
    /// Next tick to consider in the current cycle
    cursor: u64,
    cycle: u64,
    loop_enabled: bool,
    loop_start: u64,
    loop_end: u64,
}

impl<E: Clone> Transport<E> {
    /// Create new transport
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            event_count: 0,
            tempo: Tempo::default(),
            state: TransportState::Stopped,
            now: 0.0,
            cycle_origin: 0.0,
            cycle_start_tick: 0,
            cursor: 0,
            cycle: 0,
            loop_enabled: false,
            loop_start: 0,
            loop_end: 0,
        }
    }

    /// Check if loop is enabled
    pub fn is_loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// Get loop region (start, end) in ticks
    pub fn loop_region(&self) -> (u64, u64) {
        (self.loop_start, self.loop_end)
    }

    /// Current playhead in ticks (0 when stopped)
    pub fn position_ticks(&self) -> u64 {
        if self.state.is_stopped() {
            return 0;
        }
        let elapsed = (self.now - self.cycle_origin).max(0.0);
        self.cycle_start_tick + (self.tempo.seconds_to_ticks(elapsed) + TIME_EPSILON).floor() as u64
    }

    fn looping(&self) -> bool {
        self.loop_enabled && self.loop_end > self.loop_start
    }

    fn time_of(&self, tick: u64) -> f64 {
        self.cycle_origin + self.tempo.ticks_to_seconds(tick.saturating_sub(self.cycle_start_tick))
    }

    fn rewind(&mut self) {
        let start = if self.looping() { self.loop_start } else { 0 };
        self.cycle_origin = self.now;
        self.cycle_start_tick = start;
        self.cursor = start;
        self.cycle = 0;
    }
}

impl<E: Clone> Default for Transport<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> TransportClock<E> for Transport<E> {
    fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    fn tempo(&self) -> Tempo {
        self.tempo
    }

    fn schedule_at_ticks(&mut self, ticks: u64, event: E) {
        self.events.entry(ticks).or_default().push(event);
        self.event_count += 1;
    }

    fn start(&mut self) {
        if self.state.is_playing() {
            debug!("Transport already running, restarting from the top");
        }
        self.state = TransportState::Playing;
        self.rewind();
    }

    fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.cancel_all();
        self.cursor = 0;
        self.cycle = 0;
    }

    fn cancel_all(&mut self) {
        self.events.clear();
        self.event_count = 0;
    }

    fn set_loop_region(&mut self, start_ticks: u64, end_ticks: u64) {
        if end_ticks <= start_ticks {
            debug!(
                "Ignoring empty loop region {}..{}, looping disabled",
                start_ticks, end_ticks
            );
            self.loop_enabled = false;
            return;
        }
        self.loop_start = start_ticks;
        self.loop_end = end_ticks;
        self.loop_enabled = true;
    }

    fn clear_loop(&mut self) {
        self.loop_enabled = false;
    }

    fn advance_to(&mut self, horizon: f64) -> Vec<Fired<E>> {
        if horizon > self.now {
            self.now = horizon;
        }
        let mut fired = Vec::new();
        if self.state.is_stopped() {
            return fired;
        }

        loop {
            let looping = self.looping();
            let end = if looping { self.loop_end } else { u64::MAX };
            let mut next_cursor = self.cursor;
            let mut reached_end = true;

            if self.cursor < end {
                for (&tick, events) in self.events.range(self.cursor..end) {
                    let time = self.time_of(tick);
                    if time > self.now + TIME_EPSILON {
                        reached_end = false;
                        break;
                    }
                    for event in events {
                        fired.push(Fired {
                            event: event.clone(),
                            tick,
                            time,
                            cycle: self.cycle,
                        });
                    }
                    next_cursor = tick + 1;
                }
            }
            self.cursor = next_cursor;

            if !looping || !reached_end {
                break;
            }

            // Every event of this cycle has fired; wrap once the loop end is due
            let wrap_time = self.time_of(self.loop_end);
            if wrap_time > self.now + TIME_EPSILON {
                break;
            }
            self.cycle_origin = wrap_time;
            self.cycle_start_tick = self.loop_start;
            self.cursor = self.loop_start;
            self.cycle += 1;
            trace!("Transport wrapped to tick {} (cycle {})", self.loop_start, self.cycle);
        }

        fired
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn state(&self) -> TransportState {
        self.state
    }

    fn scheduled_len(&self) -> usize {
        self.event_count
    }

    fn loop_count(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_at(bpm: f64) -> Transport<&'static str> {
        let mut transport = Transport::new();
        transport.set_tempo(Tempo::new(bpm).unwrap());
        transport
    }

    #[test]
    fn test_transport_state() {
        let state = TransportState::Playing;
        assert!(state.is_playing());
        assert!(!state.is_stopped());

        let state2 = TransportState::Stopped;
        assert!(!state2.is_playing());
        assert!(state2.is_stopped());
    }

    #[test]
    fn test_beat_offsets_to_absolute_time() {
        let mut transport = transport_at(60.0);
        transport.schedule_at(0.0, "a");
        transport.schedule_at(1.5, "b");
        transport.schedule_at(4.0, "c");
        transport.start();

        let fired = transport.advance_to(2.0);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].event, "a");
        assert_eq!(fired[0].time, 0.0);
        assert_eq!(fired[1].event, "b");
        assert!((fired[1].time - 1.5).abs() < 1e-12);

        let fired = transport.advance_to(4.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event, "c");

        assert!(transport.advance_to(10.0).is_empty());
    }

    #[test]
    fn test_same_offset_keeps_registration_order() {
        let mut transport = transport_at(120.0);
        transport.schedule_at(1.0, "first");
        transport.schedule_at(1.0, "second");
        transport.schedule_at(1.0, "third");
        transport.start();

        let fired: Vec<_> = transport.advance_to(1.0).into_iter().map(|f| f.event).collect();
        assert_eq!(fired, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let mut transport = transport_at(120.0);
        transport.schedule_at(-2.0, "early");
        transport.start();
        let fired = transport.advance_to(0.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].tick, 0);
    }

    #[test]
    fn test_origin_is_clock_reading_at_start() {
        let mut transport = transport_at(60.0);
        transport.advance_to(10.0);
        transport.schedule_at(1.0, "x");
        transport.start();

        assert!(transport.advance_to(10.5).is_empty());
        let fired = transport.advance_to(11.0);
        assert_eq!(fired.len(), 1);
        assert!((fired[0].time - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_stop_cancels_everything() {
        let mut transport = transport_at(60.0);
        transport.schedule_at(0.0, "a");
        transport.schedule_at(1.0, "b");
        transport.start();
        transport.stop();

        assert_eq!(transport.scheduled_len(), 0);
        assert!(transport.advance_to(100.0).is_empty());

        // Restarting does not resurrect cancelled events
        transport.start();
        assert!(transport.advance_to(200.0).is_empty());
    }

    #[test]
    fn test_restart_does_not_double_fire() {
        let mut transport = transport_at(60.0);
        transport.schedule_at(0.0, "a");
        transport.start();
        transport.start();

        let fired = transport.advance_to(0.5);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn test_looping_refires_without_reregistration() {
        let mut transport = transport_at(60.0);
        transport.schedule_at(0.0, "down");
        transport.schedule_at(1.0, "up");
        transport.set_loop(2.0);
        transport.start();

        let fired = transport.advance_to(5.9);
        let events: Vec<_> = fired.iter().map(|f| (f.event, f.time, f.cycle)).collect();
        assert_eq!(
            events,
            vec![
                ("down", 0.0, 0),
                ("up", 1.0, 0),
                ("down", 2.0, 1),
                ("up", 3.0, 1),
                ("down", 4.0, 2),
                ("up", 5.0, 2),
            ]
        );
        assert_eq!(transport.scheduled_len(), 2);
        assert_eq!(transport.loop_count(), 2);
    }

    #[test]
    fn test_loop_region_with_start_offset() {
        let mut transport = transport_at(60.0);
        transport.schedule_at(0.0, "intro");
        transport.schedule_at(1.0, "a");
        transport.schedule_at(2.0, "b");
        transport.schedule_at(3.0, "outside");
        transport.set_loop_region(480, 1440);
        transport.start();

        let events: Vec<_> = transport
            .advance_to(4.5)
            .into_iter()
            .map(|f| (f.event, f.time))
            .collect();
        // Playback begins at the loop start
        assert_eq!(events, vec![("a", 0.0), ("b", 1.0), ("a", 2.0), ("b", 3.0), ("a", 4.0)]);
    }

    #[test]
    fn test_position_advance() {
        let mut transport = transport_at(60.0);
        assert_eq!(transport.position_ticks(), 0);
        transport.start();
        transport.advance_to(1.5);
        assert_eq!(transport.position_ticks(), 720);
    }

    #[test]
    fn test_empty_loop_region_disables_looping() {
        let mut transport = transport_at(60.0);
        transport.set_loop_region(960, 960);
        assert!(!transport.is_loop_enabled());
        transport.set_loop_region(0, 960);
        assert!(transport.is_loop_enabled());
        assert_eq!(transport.loop_region(), (0, 960));
        transport.clear_loop();
        assert!(!transport.is_loop_enabled());
    }
}
