// src/scheduler.rs

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{PlayerConfig, PlayerControls};
use crate::device::AudioDevice;
use crate::error::PlaybackError;
use crate::metronome::{ClickScheduler, Metronome};
use crate::render::Renderer;
use crate::state::{PlaybackReadback, PlaybackSession, ProgressionItem, SharedProgression};
use crate::transport::TempoState;

/// Everything the per-item callback gets to know about the item it plays.
pub struct Cue<'a> {
    pub item: &'a ProgressionItem,
    pub index: usize,

    /// Rendering strategy chosen when the session started.
    pub renderer: Renderer,

    /// Id of the running session.
    pub session: u64,

    /// The player, for tempo, device access and `stop()`.
    pub player: &'a ProgressionPlayer,
}

/// Plays one item and returns once the item's time is up.
pub type ItemCallback = Box<dyn FnMut(Cue<'_>) -> Result<(), PlaybackError> + Send>;

/// Session hook (start or stop).
pub type Hook = Box<dyn Fn() + Send + Sync>;

/// How a `play()` call ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Another session was already running; nothing happened.
    AlreadyPlaying,

    /// The progression ran out with looping off.
    Finished,

    /// `stop()` was called.
    Stopped,

    /// An item failed; the session was stopped.
    Failed(PlaybackError),
}

/// Progression playback scheduler.
///
/// Walks the progression item by item, schedules metronome clicks for each
/// item and hands the item to the per-item callback, which sounds it and
/// waits out its duration.
///
/// `play()` runs the whole session on the calling thread. Everything else
/// (`stop()`, readback, tempo and control changes) may be called from any
/// thread, including from inside the callback. Cancellation is polled at
/// the start of every item and before every click; a callback that wants
/// to react faster must watch [`ProgressionPlayer::is_session_active`]
/// itself.
pub struct ProgressionPlayer {
    device: Arc<dyn AudioDevice>,
    clicks: Box<dyn ClickScheduler>,
    tempo: Arc<TempoState>,
    progression: SharedProgression,
    controls: Arc<PlayerControls>,
    session: PlaybackSession,
    on_item: Mutex<ItemCallback>,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
}

/// Builder for [`ProgressionPlayer`].
pub struct PlayerBuilder {
    device: Arc<dyn AudioDevice>,
    tempo: Arc<TempoState>,
    progression: SharedProgression,
    config: PlayerConfig,
    clicks: Option<Box<dyn ClickScheduler>>,
    on_item: Option<ItemCallback>,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
}

impl PlayerBuilder {
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Click delivery. Defaults to a [`Metronome`] on the player's device.
    pub fn clicks(mut self, clicks: impl ClickScheduler + 'static) -> Self {
        self.clicks = Some(Box::new(clicks));
        self
    }

    /// Per-item callback. Defaults to one that does nothing.
    pub fn on_item<F>(mut self, f: F) -> Self
    where
        F: FnMut(Cue<'_>) -> Result<(), PlaybackError> + Send + 'static,
    {
        self.on_item = Some(Box::new(f));
        self
    }

    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_stop(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    pub fn build(self) -> ProgressionPlayer {
        let clicks = self
            .clicks
            .unwrap_or_else(|| Box::new(Metronome::new(Arc::clone(&self.device))));
        let on_item = self.on_item.unwrap_or_else(|| Box::new(|_| Ok(())));

        ProgressionPlayer {
            device: self.device,
            clicks,
            tempo: self.tempo,
            progression: self.progression,
            controls: Arc::new(PlayerControls::from(self.config)),
            session: PlaybackSession::new(),
            on_item: Mutex::new(on_item),
            on_start: self.on_start,
            on_stop: self.on_stop,
        }
    }
}

/// Stops its session when dropped, whatever way `play()` is left.
///
/// A session that was already stopped (and possibly replaced by a newer
/// one) leaves the player alone.
struct StopGuard<'a> {
    player: &'a ProgressionPlayer,
    session: u64,
}

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.player.stop_session(self.session);
    }
}

/// Result of one pass over the progression.
enum Pass {
    /// Reached the end; `played` items were handed to the callback.
    Completed { played: usize },
    Cancelled,
}

impl ProgressionPlayer {
    pub fn builder(
        device: Arc<dyn AudioDevice>,
        tempo: Arc<TempoState>,
        progression: SharedProgression,
    ) -> PlayerBuilder {
        PlayerBuilder {
            device,
            tempo,
            progression,
            config: PlayerConfig::default(),
            clicks: None,
            on_item: None,
            on_start: None,
            on_stop: None,
        }
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.session.is_playing()
    }

    /// Whether `session` is still the running session.
    ///
    /// Long-running callbacks poll this with their cue's session id rather
    /// than [`ProgressionPlayer::is_playing`], which stays true once a newer
    /// session has started.
    #[inline]
    pub fn is_session_active(&self, session: u64) -> bool {
        self.session.is_active(session)
    }

    /// Item being played, for highlighting.
    #[inline]
    pub fn current_index(&self) -> Option<usize> {
        self.session.current_index()
    }

    pub fn readback(&self) -> PlaybackReadback {
        self.session.readback()
    }

    pub fn device(&self) -> &Arc<dyn AudioDevice> {
        &self.device
    }

    pub fn tempo(&self) -> &Arc<TempoState> {
        &self.tempo
    }

    pub fn controls(&self) -> &Arc<PlayerControls> {
        &self.controls
    }

    pub fn progression(&self) -> &SharedProgression {
        &self.progression
    }

    // -------------------------------
    // MARK: Session control
    // -------------------------------

    /// Run a session to its end.
    ///
    /// Returns `Err` only when the audio context could not be started, in
    /// which case no session began. Failures inside the session are logged,
    /// stop the player and come back as [`SessionEnd::Failed`].
    pub fn play(&self) -> Result<SessionEnd, PlaybackError> {
        if self.is_playing() {
            log::debug!("play() ignored: already playing");
            return Ok(SessionEnd::AlreadyPlaying);
        }

        if !self.device.is_running() {
            self.device.resume()?;
        }

        let Some(session) = self.session.begin() else {
            log::debug!("play() ignored: another session started first");
            return Ok(SessionEnd::AlreadyPlaying);
        };
        let renderer = Renderer::from(self.controls.play_mode());
        log::debug!("Session {} started ({:?})", session, renderer);

        let _guard = StopGuard {
            player: self,
            session,
        };
        if let Some(on_start) = &self.on_start {
            on_start();
        }

        match self.run(session, renderer) {
            Ok(()) if self.is_session_active(session) => {
                log::debug!("Session {} finished", session);
                Ok(SessionEnd::Finished)
            }
            Ok(()) => {
                log::debug!("Session {} stopped", session);
                Ok(SessionEnd::Stopped)
            }
            Err(e) => {
                log::error!("Session {} failed: {}", session, e);
                Ok(SessionEnd::Failed(e))
            }
        }
    }

    /// End the running session. No-op when idle.
    ///
    /// Clears the playing flag first, then runs `on_stop`, then releases
    /// every note on the device.
    pub fn stop(&self) {
        if self.session.end() {
            self.stopped();
        }
    }

    /// End `session` if it is still the running one.
    fn stop_session(&self, session: u64) {
        if self.session.end_session(session) {
            self.stopped();
        }
    }

    fn stopped(&self) {
        if let Some(on_stop) = &self.on_stop {
            on_stop();
        }
        self.device.release_all();
    }

    // -------------------------------
    // MARK: Iteration
    // -------------------------------

    fn run(&self, session: u64, renderer: Renderer) -> Result<(), PlaybackError> {
        let mut on_item = self.on_item.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let progression = self.progression.snapshot();
            let pass = self.play_pass(&progression.items, session, renderer, &mut on_item)?;

            // A pass with nothing to play would loop without ever yielding.
            match pass {
                Pass::Completed { played }
                    if played > 0 && self.controls.looping() && self.is_session_active(session) =>
                {
                    self.session.reset_beats();
                }
                _ => return Ok(()),
            }
        }
    }

    fn play_pass(
        &self,
        items: &[ProgressionItem],
        session: u64,
        renderer: Renderer,
        on_item: &mut ItemCallback,
    ) -> Result<Pass, PlaybackError> {
        let mut played = 0;
        for (index, item) in items.iter().enumerate() {
            if !self.is_session_active(session) {
                return Ok(Pass::Cancelled);
            }
            if item.is_placeholder() {
                continue;
            }

            self.session.set_current_index(index);

            if self.controls.metronome() {
                self.schedule_clicks(item.duration, session);
            }

            on_item(Cue {
                item,
                index,
                renderer,
                session,
                player: self,
            })?;
            played += 1;
        }
        Ok(Pass::Completed { played })
    }

    /// Schedule one click per beat of the item, relative to the moment the
    /// item starts.
    fn schedule_clicks(&self, duration: u32, session: u64) {
        let beat_secs = self.tempo.beat_duration_secs();
        let beats_per_measure = self.controls.beats_per_measure();
        let start = self.device.now();

        for local_beat in 0..duration {
            if !self.is_session_active(session) {
                break;
            }
            let at = start + local_beat as f64 * beat_secs;
            self.clicks
                .click(self.session.next_beat(), beats_per_measure, at);
        }
    }
}
