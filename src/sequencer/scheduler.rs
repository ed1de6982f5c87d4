// Progression scheduler - Turns a chord progression into a timed band performance
// Guitar strums, backing band, metronome and visual events against one transport clock

use log::{debug, info, warn};

use crate::chord::{
    Chord, MAX_CAPO, MAX_FRET, STRING_COUNT, StrummingPattern, bass_fifth, bass_root,
    fretted_pitch, validate_progression,
};
use crate::config::{PlaybackConfig, StudioConfig};
use crate::error::PlaybackError;
use crate::sequencer::backing::{BackingStyle, PatternContext};
use crate::sequencer::metronome::ClickType;
use crate::sequencer::observer::{PlaybackEvent, PlaybackObserver};
use crate::sequencer::strum::{Humanizer, StrumDirection, StrumEngine, StrumNote};
use crate::sequencer::timeline::{NoteValue, TICKS_PER_QUARTER, Tempo};
use crate::sequencer::transport::{Fired, Transport, TransportClock};
use crate::voice::{NoteTrigger, VoiceKind, VoiceSet};

// Slack when comparing draw times with the clock
const TIME_EPSILON: f64 = 1e-9;

/// Base velocity of a single-note preview, before the random lift
const PREVIEW_NOTE_VELOCITY: f32 = 0.7;
const PREVIEW_NOTE_LIFT: f64 = 0.1;
const PREVIEW_CHORD_VELOCITY: f32 = 0.8;

/// Events stored in the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// First beat of the chord at `slot` in the played slice
    ChordStart { slot: usize },
    /// Beat `beat` (0-based, within the chord) of the chord at `slot`
    Beat { slot: usize, beat: u32 },
    /// End of a non-looping performance
    End,
}

/// Session life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Scheduling,
    Playing,
    Stopped,
    Completed,
}

impl PlaybackPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackPhase::Scheduling | PlaybackPhase::Playing)
    }
}

/// Everything `play` needs besides the chords
#[derive(Debug, Clone, PartialEq)]
pub struct PlayOptions {
    pub bpm: f64,
    pub looping: bool,
    pub backing: bool,
    /// None plays no backing even when `backing` is set
    pub style: Option<BackingStyle>,
    pub metronome: bool,
    pub capo: u8,
    /// Inclusive chord index range to play instead of the whole progression
    pub range: Option<(usize, usize)>,
}

impl PlayOptions {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            ..Self::default()
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            bpm: config.bpm,
            backing: config.backing,
            metronome: config.metronome,
            capo: config.capo,
            ..Self::default()
        }
        .with_style_name(&config.style)
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_backing(mut self, style: BackingStyle) -> Self {
        self.backing = true;
        self.style = Some(style);
        self
    }

    /// Unknown names leave the style unset, which plays no backing
    pub fn with_style_name(mut self, name: &str) -> Self {
        self.style = BackingStyle::from_name(name);
        if self.style.is_none() {
            warn!("Unknown backing style '{}', backing track disabled", name);
        }
        self
    }

    pub fn with_metronome(mut self, metronome: bool) -> Self {
        self.metronome = metronome;
        self
    }

    pub fn with_capo(mut self, capo: u8) -> Self {
        self.capo = capo;
        self
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Check tempo, capo and range against a progression of `len` chords
    pub fn validate(&self, len: usize) -> Result<Tempo, PlaybackError> {
        let tempo = Tempo::new(self.bpm).ok_or(PlaybackError::InvalidTempo(self.bpm))?;
        if self.capo > MAX_CAPO {
            return Err(PlaybackError::InvalidCapo(self.capo));
        }
        if let Some((start, end)) = self.range
            && (start > end || end >= len)
        {
            return Err(PlaybackError::InvalidRange { start, end, len });
        }
        Ok(tempo)
    }
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            looping: false,
            backing: false,
            style: None,
            metronome: false,
            capo: 0,
            range: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    chords: Vec<Chord>,
    /// Index of `chords[0]` in the full progression
    first_index: usize,
    capo: u8,
    backing: Option<BackingStyle>,
    metronome: bool,
    tempo: Tempo,
    last_cycle: u64,
}

/// The playback context: transport, voices, observers and humanization
///
/// Nothing here keeps time on its own. The driver (audio callback, offline
/// renderer or test) calls `pump` with the current clock reading; voices get
/// their triggers `lookahead` seconds early with exact timestamps, while
/// observer events are held back until the clock reaches them.
pub struct PlaybackEngine<T: TransportClock<Cue> = Transport<Cue>> {
    transport: T,
    voices: VoiceSet,
    observers: Vec<Box<dyn PlaybackObserver>>,
    humanizer: Humanizer,
    strum: StrumEngine,
    lookahead: f64,
    session: Option<Session>,
    /// Observer events waiting for their time, ordered by time
    draw_queue: Vec<(f64, PlaybackEvent)>,
    phase: PlaybackPhase,
    active_chord: Option<usize>,
    active_beat: Option<u32>,
    clock: f64,
    session_start: f64,
}

impl PlaybackEngine<Transport<Cue>> {
    pub fn new(voices: VoiceSet, config: &StudioConfig) -> Self {
        Self::with_transport(Transport::new(), voices, config)
    }
}

impl Default for PlaybackEngine<Transport<Cue>> {
    fn default() -> Self {
        Self::new(VoiceSet::default(), &StudioConfig::default())
    }
}

impl<T: TransportClock<Cue>> PlaybackEngine<T> {
    pub fn with_transport(transport: T, voices: VoiceSet, config: &StudioConfig) -> Self {
        Self {
            transport,
            voices,
            observers: Vec::new(),
            humanizer: Humanizer::from_config(&config.humanize),
            strum: StrumEngine::new(&config.humanize),
            lookahead: config.playback.lookahead_secs.max(0.0),
            session: None,
            draw_queue: Vec::new(),
            phase: PlaybackPhase::Idle,
            active_chord: None,
            active_beat: None,
            clock: 0.0,
            session_start: 0.0,
        }
    }

    /// Replace the random source (e.g. `Humanizer::disabled()` for exact timing)
    pub fn with_humanizer(mut self, humanizer: Humanizer) -> Self {
        self.humanizer = humanizer;
        self
    }

    pub fn set_humanizer(&mut self, humanizer: Humanizer) {
        self.humanizer = humanizer;
    }

    pub fn subscribe(&mut self, observer: Box<dyn PlaybackObserver>) {
        self.observers.push(observer);
    }

    pub fn set_lookahead(&mut self, seconds: f64) {
        self.lookahead = seconds.max(0.0);
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_active()
    }

    /// Chord currently highlighted, as an index into the full progression
    pub fn active_chord(&self) -> Option<usize> {
        self.active_chord
    }

    pub fn active_beat(&self) -> Option<u32> {
        self.active_beat
    }

    pub fn loop_count(&self) -> u64 {
        self.transport.loop_count()
    }

    /// Latest clock reading passed to `pump`
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Absolute time of beat 0 of the current session
    pub fn session_start(&self) -> f64 {
        self.session_start
    }

    pub fn tempo(&self) -> Tempo {
        self.transport.tempo()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn voices_mut(&mut self) -> &mut VoiceSet {
        &mut self.voices
    }

    /// Schedule a whole performance and start the transport
    ///
    /// Any running session is stopped first. Nothing is scheduled unless
    /// every check passes.
    pub fn play(&mut self, progression: &[Chord], options: PlayOptions) -> Result<(), PlaybackError> {
        let tempo = options.validate(progression.len())?;
        validate_progression(progression)?;

        self.stop();
        self.phase = PlaybackPhase::Scheduling;
        self.transport.set_tempo(tempo);
        self.voices.set_tempo(tempo.bpm());

        let (first_index, chords) = match options.range {
            Some((start, end)) => (start, progression[start..=end].to_vec()),
            None => (0, progression.to_vec()),
        };

        if chords.is_empty() {
            info!("Empty progression, nothing to play");
            self.phase = PlaybackPhase::Completed;
            self.notify(PlaybackEvent::Completed);
            return Ok(());
        }

        let mut offset = 0u64;
        for (slot, chord) in chords.iter().enumerate() {
            let start = offset * TICKS_PER_QUARTER;
            self.transport.schedule_at_ticks(start, Cue::ChordStart { slot });
            for beat in 0..chord.beats {
                self.transport.schedule_at_ticks(
                    start + beat as u64 * TICKS_PER_QUARTER,
                    Cue::Beat { slot, beat },
                );
            }
            offset += chord.beats as u64;
        }
        let end = offset * TICKS_PER_QUARTER;
        if options.looping {
            self.transport.set_loop_region(0, end);
        } else {
            self.transport.clear_loop();
            self.transport.schedule_at_ticks(end, Cue::End);
        }
        debug!(
            "Scheduled {} cues over {} beats",
            self.transport.scheduled_len(),
            offset
        );

        self.session = Some(Session {
            chords,
            first_index,
            capo: options.capo,
            backing: if options.backing { options.style } else { None },
            metronome: options.metronome,
            tempo,
            last_cycle: 0,
        });
        self.transport.start();
        self.session_start = self.transport.now();
        self.phase = PlaybackPhase::Playing;
        info!(
            "Playing {} beats at {} (loop: {}, backing: {:?}, metronome: {})",
            offset, tempo, options.looping, options.style, options.metronome
        );
        Ok(())
    }

    /// Halt playback and cancel everything pending; safe to call at any time
    pub fn stop(&mut self) {
        let was_active = self.phase.is_active();
        self.transport.stop();
        self.draw_queue.clear();
        self.voices.release_all(self.clock);
        self.session = None;
        self.active_chord = None;
        self.active_beat = None;
        if was_active {
            self.phase = PlaybackPhase::Stopped;
            info!("Playback stopped at {:.3}s", self.clock);
            self.notify(PlaybackEvent::Stopped);
        }
    }

    /// Advance to `now`: hand voices everything due before `now + lookahead`
    /// and release observer events that are due
    pub fn pump(&mut self, now: f64) {
        if now > self.clock {
            self.clock = now;
        }
        let fired = self.transport.advance_to(self.clock + self.lookahead);
        for cue in fired {
            self.dispatch(cue);
        }
        self.release_draws();
    }

    /// Audition a chord right now, outside any session
    pub fn preview_chord(&mut self, chord: &Chord, capo: u8) -> Result<Vec<StrumNote>, PlaybackError> {
        if capo > MAX_CAPO {
            return Err(PlaybackError::InvalidCapo(capo));
        }
        if let Some((string, fret)) = chord.fingering.first_invalid() {
            return Err(PlaybackError::InvalidFret { string, fret });
        }
        let notes = self.strum.preview(
            &chord.fingering,
            capo,
            self.clock,
            PREVIEW_CHORD_VELOCITY,
            &mut self.humanizer,
            self.voices.guitar.as_mut(),
        );
        for note in &notes {
            self.queue_draw(note.time, PlaybackEvent::NoteVisual {
                string: note.string,
                fret: note.fret,
            });
        }
        Ok(notes)
    }

    /// Audition one string/fret right now
    pub fn preview_note(&mut self, string: usize, fret: i8, capo: u8) -> Result<NoteTrigger, PlaybackError> {
        if capo > MAX_CAPO {
            return Err(PlaybackError::InvalidCapo(capo));
        }
        if string >= STRING_COUNT || !(0..=MAX_FRET).contains(&fret) {
            return Err(PlaybackError::InvalidFret { string, fret });
        }
        let pitch = fretted_pitch(string, fret, capo)
            .ok_or(PlaybackError::InvalidFret { string, fret })?;
        let trigger = NoteTrigger {
            pitch: Some(pitch),
            duration: NoteValue::Quarter,
            time: self.clock,
            velocity: PREVIEW_NOTE_VELOCITY + self.humanizer.offset(PREVIEW_NOTE_LIFT) as f32,
        };
        self.voices.guitar.trigger(trigger);
        self.queue_draw(trigger.time, PlaybackEvent::NoteVisual { string, fret });
        Ok(trigger)
    }

    fn dispatch(&mut self, fired: Fired<Cue>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if fired.cycle > session.last_cycle {
            session.last_cycle = fired.cycle;
            info!("Loop wrapped (cycle {})", fired.cycle);
        }
        match fired.event {
            Cue::ChordStart { slot } => self.on_chord_start(slot, fired.time),
            Cue::Beat { slot, beat } => self.on_beat(slot, beat, fired.time),
            Cue::End => self.on_end(fired.time),
        }
    }

    fn on_chord_start(&mut self, slot: usize, time: f64) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(chord) = session.chords.get(slot) else {
            return;
        };
        let index = session.first_index + slot;
        let once = chord.strumming_pattern == StrummingPattern::Once;
        self.queue_draw(time, PlaybackEvent::ChordChanged(index));
        if once {
            self.strum_at(slot, time, StrumDirection::Down, 0.8);
        }
    }

    fn on_beat(&mut self, slot: usize, beat: u32, time: f64) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(chord) = session.chords.get(slot) else {
            return;
        };
        let tempo = session.tempo;
        let metronome = session.metronome;
        let backing = session.backing;
        let pattern = chord.strumming_pattern;
        let root = bass_root(&chord.name);

        self.queue_draw(time, PlaybackEvent::Beat(beat));

        if metronome {
            self.voices
                .trigger(VoiceKind::Click, ClickType::for_beat(beat).trigger(time));
        }

        if let Some(style) = backing {
            let ghost = style.uses_ghost_notes() && self.humanizer.chance(0.5);
            let ctx = PatternContext::new(beat as u64, root, bass_fifth(root)).with_ghost(ghost);
            for hit in style.hits(&ctx) {
                self.voices.trigger(hit.voice, NoteTrigger {
                    pitch: hit.pitch,
                    duration: hit.duration,
                    time: time + tempo.ticks_to_seconds(hit.offset.ticks()),
                    velocity: hit.velocity,
                });
            }
        }

        let eighth = tempo.ticks_to_seconds(NoteValue::Eighth.ticks());
        let sixteenth = tempo.ticks_to_seconds(NoteValue::Sixteenth.ticks());
        match pattern {
            StrummingPattern::Once => {}
            StrummingPattern::Down => {
                self.strum_at(slot, time, StrumDirection::Down, 0.7);
            }
            StrummingPattern::DownUp => {
                self.strum_at(slot, time, StrumDirection::Down, 0.7);
                self.strum_at(slot, time + eighth, StrumDirection::Up, 0.5);
            }
            StrummingPattern::DownDownUp => {
                self.strum_at(slot, time, StrumDirection::Down, 0.7);
                self.strum_at(slot, time + sixteenth, StrumDirection::Down, 0.6);
                self.strum_at(slot, time + eighth, StrumDirection::Up, 0.5);
            }
            StrummingPattern::Folk => match beat % 4 {
                0 => {
                    self.strum_at(slot, time, StrumDirection::Down, 0.8);
                }
                2 => {
                    self.strum_at(slot, time + eighth, StrumDirection::Up, 0.6);
                }
                _ => {
                    self.strum_at(slot, time, StrumDirection::Down, 0.7);
                    self.strum_at(slot, time + eighth, StrumDirection::Up, 0.6);
                }
            },
        }
    }

    fn on_end(&mut self, time: f64) {
        self.transport.stop();
        self.voices.release_all(time);
        self.queue_draw(time, PlaybackEvent::Completed);
        debug!("Performance ends at {:.3}s", time);
    }

    fn strum_at(&mut self, slot: usize, time: f64, direction: StrumDirection, velocity: f32) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(chord) = session.chords.get(slot) else {
            return;
        };
        let notes = self.strum.strum(
            &chord.fingering,
            session.capo,
            time,
            direction,
            velocity,
            &mut self.humanizer,
            self.voices.guitar.as_mut(),
        );
        for note in notes {
            self.queue_draw(note.time, PlaybackEvent::NoteVisual {
                string: note.string,
                fret: note.fret,
            });
        }
    }

    fn queue_draw(&mut self, time: f64, event: PlaybackEvent) {
        let index = self.draw_queue.partition_point(|(t, _)| *t <= time);
        self.draw_queue.insert(index, (time, event));
    }

    fn release_draws(&mut self) {
        let due = self
            .draw_queue
            .partition_point(|(t, _)| *t <= self.clock + TIME_EPSILON);
        if due == 0 {
            return;
        }
        let released: Vec<(f64, PlaybackEvent)> = self.draw_queue.drain(..due).collect();
        for (_, event) in released {
            match event {
                PlaybackEvent::ChordChanged(index) => self.active_chord = Some(index),
                PlaybackEvent::Beat(beat) => self.active_beat = Some(beat),
                PlaybackEvent::Completed => {
                    self.session = None;
                    self.active_chord = None;
                    self.active_beat = None;
                    self.phase = PlaybackPhase::Completed;
                    info!("Playback completed at {:.3}s", self.clock);
                }
                _ => {}
            }
            self.notify(event);
        }
    }

    fn notify(&mut self, event: PlaybackEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Fingering;
    use crate::voice::TriggerLog;
    use std::sync::{Arc, Mutex};

    fn engine() -> (PlaybackEngine, TriggerLog, Arc<Mutex<Vec<PlaybackEvent>>>) {
        let (voices, log) = VoiceSet::recording();
        let mut engine = PlaybackEngine::new(voices, &StudioConfig::default())
            .with_humanizer(Humanizer::disabled());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.subscribe(Box::new(move |e: PlaybackEvent| sink.lock().unwrap().push(e)));
        (engine, log, events)
    }

    fn c_major(beats: u32) -> Chord {
        Chord::new("C", beats, [-1, 3, 2, 0, 1, 0]).with_pattern(StrummingPattern::Down)
    }

    #[test]
    fn test_validation_order() {
        let (mut engine, _, _) = engine();
        let bad = vec![Chord::new("C", 0, [0; 6])];
        let opts = PlayOptions::new(0.0).with_capo(13).with_range(3, 1);
        assert_eq!(engine.play(&bad, opts.clone()), Err(PlaybackError::InvalidTempo(0.0)));
        let opts = PlayOptions { bpm: 90.0, ..opts };
        assert_eq!(engine.play(&bad, opts.clone()), Err(PlaybackError::InvalidCapo(13)));
        let opts = opts.with_capo(0);
        assert!(matches!(engine.play(&bad, opts.clone()), Err(PlaybackError::InvalidRange { .. })));
        let opts = PlayOptions { range: None, ..opts };
        assert!(matches!(
            engine.play(&bad, opts),
            Err(PlaybackError::InvalidChordData { index: 0, .. })
        ));
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn test_empty_progression_completes_immediately() {
        let (mut engine, log, events) = engine();
        engine.play(&[], PlayOptions::new(120.0)).unwrap();
        assert_eq!(engine.phase(), PlaybackPhase::Completed);
        assert_eq!(*events.lock().unwrap(), vec![PlaybackEvent::Completed]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_chord_change_precedes_first_beat() {
        let (mut engine, _, events) = engine();
        engine.play(&[c_major(2)], PlayOptions::new(60.0)).unwrap();
        engine.pump(0.0);
        let events = events.lock().unwrap();
        assert_eq!(events[0], PlaybackEvent::ChordChanged(0));
        assert_eq!(events[1], PlaybackEvent::Beat(0));
    }

    #[test]
    fn test_triggers_arrive_ahead_but_draws_wait() {
        let (mut engine, log, events) = engine();
        engine.set_lookahead(0.5);
        engine.play(&[c_major(2)], PlayOptions::new(60.0)).unwrap();
        engine.pump(0.6);
        // Beat 1 at t=1.0 is inside the lookahead window
        assert_eq!(log.len(), 10);
        assert!(!events.lock().unwrap().contains(&PlaybackEvent::Beat(1)));
        engine.pump(1.0);
        assert!(events.lock().unwrap().contains(&PlaybackEvent::Beat(1)));
        assert_eq!(engine.active_beat(), Some(1));
    }

    #[test]
    fn test_stop_is_idempotent_and_resets_activity() {
        let (mut engine, _, events) = engine();
        engine.stop();
        assert_eq!(engine.phase(), PlaybackPhase::Idle);

        engine.play(&[c_major(4)], PlayOptions::new(120.0)).unwrap();
        engine.pump(0.0);
        assert_eq!(engine.active_chord(), Some(0));
        engine.stop();
        engine.stop();
        assert_eq!(engine.phase(), PlaybackPhase::Stopped);
        assert_eq!(engine.active_chord(), None);
        assert_eq!(engine.active_beat(), None);
        let stopped = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == PlaybackEvent::Stopped)
            .count();
        assert_eq!(stopped, 1);
    }

    #[test]
    fn test_once_strums_single_time() {
        let (mut engine, log, _) = engine();
        let chord = c_major(4).with_pattern(StrummingPattern::Once);
        engine.play(&[chord], PlayOptions::new(120.0)).unwrap();
        engine.pump(10.0);
        let guitar = log.for_voice(VoiceKind::Guitar);
        assert_eq!(guitar.len(), 5);
        assert!(guitar.iter().all(|r| r.trigger.velocity == 0.8));
        assert_eq!(engine.phase(), PlaybackPhase::Completed);
    }

    #[test]
    fn test_folk_meta_pattern() {
        let (mut engine, log, _) = engine();
        let chord = Chord::new("Em", 4, [0, 2, 2, 0, 0, 0]).with_pattern(StrummingPattern::Folk);
        engine.play(&[chord], PlayOptions::new(60.0)).unwrap();
        engine.pump(10.0);
        // down / down-up / up / down-up = 6 strums of 6 strings
        assert_eq!(log.for_voice(VoiceKind::Guitar).len(), 36);
        let beat_two: Vec<_> = log
            .for_voice(VoiceKind::Guitar)
            .into_iter()
            .filter(|r| r.trigger.time >= 2.0 && r.trigger.time < 3.0)
            .collect();
        assert_eq!(beat_two.len(), 6);
        assert!(beat_two.iter().all(|r| r.trigger.time >= 2.5));
    }

    #[test]
    fn test_metronome_accents_chord_start() {
        let (mut engine, log, _) = engine();
        engine
            .play(&[c_major(3)], PlayOptions::new(60.0).with_metronome(true))
            .unwrap();
        engine.pump(10.0);
        let clicks = log.for_voice(VoiceKind::Click);
        assert_eq!(clicks.len(), 3);
        assert_eq!(clicks[0].trigger.velocity, 1.0);
        assert_eq!(clicks[1].trigger.velocity, 0.6);
        assert_eq!(clicks[2].trigger.duration, NoteValue::ThirtySecond);
    }

    #[test]
    fn test_backing_uses_chord_bass_notes() {
        let (mut engine, log, _) = engine();
        let chord = Chord::new("G", 2, [3, 2, 0, 0, 0, 3]).with_pattern(StrummingPattern::Once);
        engine
            .play(&[chord], PlayOptions::new(60.0).with_backing(BackingStyle::Blues))
            .unwrap();
        engine.pump(10.0);
        let bass: Vec<String> = log
            .for_voice(VoiceKind::Bass)
            .iter()
            .filter_map(|r| r.trigger.pitch.map(|p| p.to_string()))
            .collect();
        assert_eq!(bass, vec!["G2", "D3"]);
    }

    #[test]
    fn test_backing_needs_enable_flag() {
        let (mut engine, log, _) = engine();
        let mut options = PlayOptions::new(60.0).with_backing(BackingStyle::Rock);
        options.backing = false;
        engine.play(&[c_major(2)], options).unwrap();
        engine.pump(10.0);
        assert!(log.for_voice(VoiceKind::Kick).is_empty());
    }

    #[test]
    fn test_preview_note_validation() {
        let (mut engine, log, _) = engine();
        assert_eq!(
            engine.preview_note(6, 0, 0),
            Err(PlaybackError::InvalidFret { string: 6, fret: 0 })
        );
        assert_eq!(
            engine.preview_note(0, 25, 0),
            Err(PlaybackError::InvalidFret { string: 0, fret: 25 })
        );
        assert_eq!(engine.preview_note(0, 0, 13), Err(PlaybackError::InvalidCapo(13)));

        let trigger = engine.preview_note(0, 3, 2).unwrap();
        assert_eq!(trigger.pitch.map(|p| p.to_string()), Some("A2".to_string()));
        assert_eq!(trigger.velocity, 0.7);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_preview_chord_rejects_bad_fret() {
        let (mut engine, _, _) = engine();
        let chord = Chord::new("X", 4, Fingering([0, 0, 30, 0, 0, 0]));
        assert_eq!(
            engine.preview_chord(&chord, 0),
            Err(PlaybackError::InvalidFret { string: 2, fret: 30 })
        );
    }

    #[test]
    fn test_preview_emits_visuals_when_idle() {
        let (mut engine, _, events) = engine();
        engine.preview_chord(&c_major(1), 0).unwrap();
        engine.pump(1.0);
        let visuals = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::NoteVisual { .. }))
            .count();
        assert_eq!(visuals, 5);
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
    }
}
