//! Real-time player: drives a [`StepSequencer`] from a timer thread.
//!
//! The player owns its timer thread, the step cursor, and the audio backend.
//! `start` and `stop` are the only mutators. Ticks never overlap: the thread
//! performs one tick, then waits on its stop channel until the next step's
//! deadline. Deadlines accumulate from the start instant, so scheduling jitter
//! does not add up into drift.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::dsl::document::{Document, DEFAULT_TEMPO};

use super::sequencer::StepSequencer;
use super::types::Event;

/// Receives events as they are scheduled.
///
/// `start` is the event's time measured from the moment playback started.
pub trait AudioBackend: Send + 'static {
    fn render(&mut self, event: &Event, start: Duration);
}

/// Supplies the latest pattern text on every tick.
pub trait TextSource: Send + Sync + 'static {
    fn text(&self) -> String;
}

/// Shared in-memory text; clones see each other's edits.
#[derive(Debug, Clone, Default)]
pub struct LiveText(Arc<RwLock<String>>);

impl LiveText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(text.into())))
    }

    /// Replace the text; the next tick plays the new version.
    pub fn set(&self, text: impl Into<String>) {
        let mut guard = self.0.write().unwrap_or_else(|e| e.into_inner());
        *guard = text.into();
    }
}

impl TextSource for LiveText {
    fn text(&self) -> String {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// A pattern file re-read on every tick. Unreadable files play as empty.
#[derive(Debug, Clone)]
pub struct FileText {
    path: PathBuf,
}

impl FileText {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for FileText {
    fn text(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_else(|err| {
            debug!(path = %self.path.display(), %err, "pattern file unreadable");
            String::new()
        })
    }
}

/// Player failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// A previous playback thread panicked and took the backend with it.
    BackendLost,
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendLost => write!(f, "audio backend lost after a playback thread panic"),
        }
    }
}

impl std::error::Error for PlayerError {}

struct Running<B> {
    stop: Sender<()>,
    handle: JoinHandle<B>,
}

/// Plays the first pattern of a live text source in real time.
pub struct Player<B: AudioBackend> {
    source: Arc<dyn TextSource>,
    backend: Option<B>,
    running: Option<Running<B>>,
    cursor: Arc<AtomicUsize>,
}

impl<B: AudioBackend> Player<B> {
    pub fn new(source: impl TextSource, backend: B) -> Self {
        Self {
            source: Arc::new(source),
            backend: Some(backend),
            running: None,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start playback from step zero, ticking once immediately.
    ///
    /// Starting while running restarts from step zero.
    pub fn start(&mut self) -> Result<(), PlayerError> {
        if self.running.is_some() {
            self.stop();
        }
        let backend = self.backend.take().ok_or(PlayerError::BackendLost)?;

        let (stop_tx, stop_rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let cursor = Arc::clone(&self.cursor);
        cursor.store(0, Ordering::Relaxed);

        let handle = thread::spawn(move || run(source, backend, stop_rx, cursor));
        self.running = Some(Running {
            stop: stop_tx,
            handle,
        });
        info!("playback started");
        Ok(())
    }

    /// Stop playback and rewind to step zero. Does nothing when stopped.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.stop.send(());
        match running.handle.join() {
            Ok(backend) => self.backend = Some(backend),
            Err(_) => error!("playback thread panicked; backend dropped"),
        }
        self.cursor.store(0, Ordering::Relaxed);
        info!("playback stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The step the next tick will play; zero while stopped.
    pub fn current_step(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    /// The backend, available while stopped.
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Stop and hand back the backend.
    pub fn into_backend(mut self) -> Option<B> {
        self.stop();
        self.backend.take()
    }
}

impl<B: AudioBackend> Drop for Player<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Longest step the timer waits before re-reading the source.
pub const MAX_STEP: Duration = Duration::from_secs(60);

/// Step length as a timer duration. Steps longer than [`MAX_STEP`], or too
/// large to represent, wait [`MAX_STEP`].
pub fn step_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).map_or(MAX_STEP, |step| step.min(MAX_STEP))
}

fn run<B: AudioBackend>(
    source: Arc<dyn TextSource>,
    mut backend: B,
    stop: Receiver<()>,
    cursor: Arc<AtomicUsize>,
) -> B {
    let mut sequencer = StepSequencer::new();
    sequencer.start();

    let origin = Instant::now();
    let mut deadline = origin;
    let mut step = step_duration(Document::step_seconds(DEFAULT_TEMPO));

    loop {
        let text = source.text();
        if let Some(tick) = sequencer.tick(&text) {
            let at = deadline.duration_since(origin);
            for event in &tick.events {
                let offset = Duration::try_from_secs_f64(event.time_offset_seconds.max(0.0))
                    .unwrap_or_default();
                backend.render(event, at.saturating_add(offset));
            }
            if let Some(seconds) = tick.step_seconds {
                step = step_duration(seconds);
            }
        }
        cursor.store(sequencer.current_step(), Ordering::Relaxed);

        let now = Instant::now();
        deadline = match deadline.checked_add(step) {
            Some(next) if next >= now => next,
            Some(next) => {
                debug!(behind = ?now.duration_since(next), "tick overran its step");
                now
            }
            None => now + step,
        };

        match stop.recv_timeout(deadline.saturating_duration_since(now)) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    sequencer.stop();
    backend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::Hit;

    #[derive(Default)]
    struct Recorder {
        events: Vec<(Event, Duration)>,
    }

    impl AudioBackend for Recorder {
        fn render(&mut self, event: &Event, start: Duration) {
            self.events.push((event.clone(), start));
        }
    }

    // 6000 BPM → 2.5 ms steps
    const FAST: &str = "---\ntempo: 6000\n---\n# P\nKick: X.x.\n";

    #[test]
    fn start_ticks_immediately() {
        let mut player = Player::new(LiveText::new(FAST), Recorder::default());
        player.start().unwrap();
        thread::sleep(Duration::from_millis(20));
        player.stop();

        let recorder = player.backend().unwrap();
        let (first, at) = &recorder.events[0];
        assert_eq!(first.track_name, "Kick");
        assert_eq!(first.hit, Hit::Drum { accent: true });
        assert_eq!(*at, Duration::ZERO);
    }

    #[test]
    fn event_times_are_monotonic() {
        let mut player = Player::new(LiveText::new(FAST), Recorder::default());
        player.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        let recorder = player.into_backend().unwrap();

        assert!(recorder.events.len() >= 2);
        for pair in recorder.events.windows(2) {
            assert!(pair[1].1 >= pair[0].1);
        }
    }

    #[test]
    fn stop_is_idempotent_and_rewinds() {
        let mut player = Player::new(LiveText::new(FAST), Recorder::default());
        player.stop();
        assert!(!player.is_running());

        player.start().unwrap();
        assert!(player.is_running());
        thread::sleep(Duration::from_millis(10));
        player.stop();
        player.stop();
        assert!(!player.is_running());
        assert_eq!(player.current_step(), 0);
    }

    #[test]
    fn live_edits_reach_the_running_thread() {
        let text = LiveText::new(FAST);
        let mut player = Player::new(text.clone(), Recorder::default());
        player.start().unwrap();
        thread::sleep(Duration::from_millis(10));
        text.set("---\ntempo: 6000\n---\n# P\nSnare: X\n");
        thread::sleep(Duration::from_millis(50));
        let recorder = player.into_backend().unwrap();

        assert!(recorder.events.iter().any(|(e, _)| e.track_name == "Snare"));
    }

    #[test]
    fn empty_source_keeps_running() {
        let text = LiveText::new("");
        let mut player = Player::new(text.clone(), Recorder::default());
        player.start().unwrap();
        thread::sleep(Duration::from_millis(10));
        assert!(player.is_running());
        player.stop();
        assert!(player.backend().unwrap().events.is_empty());
    }

    #[test]
    fn extreme_tempo_keeps_the_thread_alive() {
        let text = LiveText::new("---\ntempo: 0.00000000000000000001\n---\n# P\nKick: X\n");
        let mut player = Player::new(text, Recorder::default());
        player.start().unwrap();
        thread::sleep(Duration::from_millis(20));
        player.stop();

        assert!(player.backend().unwrap().events.is_empty());
        assert!(player.start().is_ok());
        player.stop();
    }

    #[test]
    fn step_durations_are_capped() {
        assert_eq!(step_duration(0.125), Duration::from_millis(125));
        assert_eq!(step_duration(1.5e20), MAX_STEP);
        assert_eq!(step_duration(f64::INFINITY), MAX_STEP);
        assert_eq!(step_duration(f64::NAN), MAX_STEP);
        assert_eq!(step_duration(3600.0), MAX_STEP);
    }

    #[test]
    fn file_source_reads_latest_contents() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "# P\nKick: X\n").unwrap();
        let source = FileText::new(file.path());
        assert_eq!(source.text(), "# P\nKick: X\n");
        std::fs::write(file.path(), "# P\nSnare: X\n").unwrap();
        assert_eq!(source.text(), "# P\nSnare: X\n");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let source = FileText::new("/nonexistent/beatmark/pattern.md");
        assert_eq!(source.text(), "");
    }
}
