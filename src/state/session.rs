// src/state/session.rs
//
// Playback session state.
//
// One session spans a play() call from start to stop. Its state is kept in
// atomics so the UI can poll it from any thread while the player runs.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Index value meaning "nothing is playing".
pub const IDLE_INDEX: i64 = -1;

/// `active` value while no session runs.
const IDLE_SESSION: u64 = 0;

/// `active` value between winning `begin()` and publishing the new id.
const STARTING_SESSION: u64 = u64::MAX;

/// Live state of the current (or last) session.
///
/// `active` holds the id of the running session. A session that was
/// stopped keeps polling with its own id and sees it is no longer active,
/// even if a newer session has started in the meantime.
#[derive(Debug)]
pub struct PlaybackSession {
    active: AtomicU64,
    current_index: AtomicI64,
    global_beat: AtomicU64,
    sessions_started: AtomicU64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            active: AtomicU64::new(IDLE_SESSION),
            current_index: AtomicI64::new(IDLE_INDEX),
            global_beat: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::Acquire) != IDLE_SESSION
    }

    /// Whether `session` is the one running right now.
    #[inline]
    pub fn is_active(&self, session: u64) -> bool {
        session != IDLE_SESSION
            && session != STARTING_SESSION
            && self.active.load(Ordering::Acquire) == session
    }

    /// Index of the item being played, or `None` when idle.
    #[inline]
    pub fn current_index(&self) -> Option<usize> {
        usize::try_from(self.current_index.load(Ordering::Acquire)).ok()
    }

    /// Next global beat index the metronome will use.
    #[inline]
    pub fn global_beat(&self) -> u64 {
        self.global_beat.load(Ordering::Acquire)
    }

    /// Number of sessions started so far; also the id of the latest one.
    #[inline]
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Acquire)
    }

    /// Enter the playing state. Returns the new session id, or `None` if a
    /// session is already running.
    ///
    /// A `stop()` racing with this call may end the new session before it
    /// is published; the id is still returned and is simply never active.
    pub(crate) fn begin(&self) -> Option<u64> {
        self.active
            .compare_exchange(
                IDLE_SESSION,
                STARTING_SESSION,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()?;
        self.current_index.store(IDLE_INDEX, Ordering::Release);
        self.global_beat.store(0, Ordering::Release);
        let session = self.sessions_started.fetch_add(1, Ordering::AcqRel) + 1;
        let _ = self.active.compare_exchange(
            STARTING_SESSION,
            session,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Some(session)
    }

    /// Leave the playing state, whichever session runs. Returns `false` if
    /// already idle.
    ///
    /// The session is cleared before the index so a poll racing with this
    /// call sees the stop first.
    pub(crate) fn end(&self) -> bool {
        if self.active.swap(IDLE_SESSION, Ordering::AcqRel) == IDLE_SESSION {
            return false;
        }
        self.current_index.store(IDLE_INDEX, Ordering::Release);
        true
    }

    /// Leave the playing state only if `session` is still the running one.
    pub(crate) fn end_session(&self, session: u64) -> bool {
        if !self.is_active(session) {
            return false;
        }
        if self
            .active
            .compare_exchange(session, IDLE_SESSION, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.current_index.store(IDLE_INDEX, Ordering::Release);
        true
    }

    pub(crate) fn set_current_index(&self, index: usize) {
        self.current_index.store(index as i64, Ordering::Release);
    }

    /// Return the current beat index and advance it.
    pub(crate) fn next_beat(&self) -> u64 {
        self.global_beat.fetch_add(1, Ordering::AcqRel)
    }

    pub(crate) fn reset_beats(&self) {
        self.global_beat.store(0, Ordering::Release);
    }

    pub fn readback(&self) -> PlaybackReadback {
        PlaybackReadback {
            playing: self.is_playing(),
            current_index: self.current_index(),
            global_beat: self.global_beat(),
            session: self.sessions_started(),
        }
    }
}

/// Read-only snapshot of the session for UI display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReadback {
    pub playing: bool,

    /// Item to highlight.
    pub current_index: Option<usize>,

    pub global_beat: u64,

    /// Id of the latest session.
    pub session: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_end() {
        let session = PlaybackSession::new();
        assert!(!session.end());

        assert_eq!(session.begin(), Some(1));
        assert_eq!(session.begin(), None);
        session.set_current_index(2);
        assert_eq!(session.current_index(), Some(2));

        assert!(session.end());
        assert!(!session.is_playing());
        assert_eq!(session.current_index(), None);
        assert!(!session.end());

        assert_eq!(session.begin(), Some(2));
    }

    #[test]
    fn test_end_session_only_ends_its_own() {
        let session = PlaybackSession::new();
        let first = session.begin().unwrap();
        assert!(session.is_active(first));
        assert!(session.end());

        let second = session.begin().unwrap();
        assert!(!session.is_active(first));
        assert!(session.is_active(second));

        // A stale session cannot end the new one.
        assert!(!session.end_session(first));
        assert!(session.is_playing());

        assert!(session.end_session(second));
        assert!(!session.is_playing());
        assert!(!session.end_session(second));
    }

    #[test]
    fn test_beat_counter() {
        let session = PlaybackSession::new();
        session.begin();
        assert_eq!(session.next_beat(), 0);
        assert_eq!(session.next_beat(), 1);
        assert_eq!(session.global_beat(), 2);
        session.reset_beats();
        assert_eq!(session.next_beat(), 0);
    }

    #[test]
    fn test_readback() {
        let session = PlaybackSession::new();
        assert_eq!(session.readback(), PlaybackReadback::default());

        session.begin();
        session.set_current_index(0);
        session.next_beat();
        assert_eq!(
            session.readback(),
            PlaybackReadback {
                playing: true,
                current_index: Some(0),
                global_beat: 1,
                session: 1,
            }
        );
    }
}
