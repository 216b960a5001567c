// src/event.rs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::device::{AudioDevice, EffectSend, OfflineClock};
use crate::error::DeviceError;
use crate::pitch::Note;

/// ===============================
/// Device-side events
/// ===============================

/// One call made on an audio device, stamped with device time.
///
/// These events:
/// - are produced by [`EventLog`] only
/// - carry the device clock at the moment of the call (`at`)
/// - are what offline rendering and the tests inspect
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Attack {
        at: f64,
        notes: Vec<Note>,
        send: EffectSend,
    },

    AttackRelease {
        at: f64,
        note: Note,
        duration: f64,
        time: f64,
        velocity: f32,
        send: EffectSend,
    },

    ReleaseAll {
        at: f64,
    },

    Resume {
        at: f64,
    },
}

/// ===============================
/// Recording device
/// ===============================

/// Offline [`AudioDevice`] that records every call.
///
/// Time comes from a shared [`OfflineClock`], which an offline pacer
/// advances while a progression renders.
#[derive(Debug)]
pub struct EventLog {
    clock: Arc<OfflineClock>,
    running: AtomicBool,
    events: Mutex<Vec<DeviceEvent>>,
    /// Remaining triggers before the device starts failing (usize::MAX = never).
    triggers_until_failure: AtomicUsize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(Arc::new(OfflineClock::new()))
    }
}

impl EventLog {
    pub fn new(clock: Arc<OfflineClock>) -> Self {
        Self {
            clock,
            running: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            triggers_until_failure: AtomicUsize::new(usize::MAX),
        }
    }

    /// A device whose context is already running.
    pub fn running(clock: Arc<OfflineClock>) -> Self {
        let log = Self::new(clock);
        log.running.store(true, Ordering::Release);
        log
    }

    pub fn clock(&self) -> &Arc<OfflineClock> {
        &self.clock
    }

    /// Make every trigger after the next `count` fail.
    pub fn fail_after(&self, count: usize) {
        self.triggers_until_failure.store(count, Ordering::Release);
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.lock().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<DeviceEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Notes of every `Attack`, in order.
    pub fn attacks(&self) -> Vec<Vec<Note>> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::Attack { notes, .. } => Some(notes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn release_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, DeviceEvent::ReleaseAll { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: DeviceEvent) {
        self.lock().push(event);
    }

    fn check_trigger(&self) -> Result<(), DeviceError> {
        let remaining = self.triggers_until_failure.load(Ordering::Acquire);
        if remaining == 0 {
            return Err(DeviceError::Trigger("device failure injected".into()));
        }
        if remaining != usize::MAX {
            self.triggers_until_failure
                .store(remaining - 1, Ordering::Release);
        }
        Ok(())
    }
}

impl AudioDevice for EventLog {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn resume(&self) -> Result<(), DeviceError> {
        self.running.store(true, Ordering::Release);
        self.record(DeviceEvent::Resume { at: self.now() });
        Ok(())
    }

    fn trigger_attack(&self, notes: &[Note], send: EffectSend) -> Result<(), DeviceError> {
        self.check_trigger()?;
        self.record(DeviceEvent::Attack {
            at: self.now(),
            notes: notes.to_vec(),
            send,
        });
        Ok(())
    }

    fn trigger_attack_release(
        &self,
        note: Note,
        duration: f64,
        time: f64,
        velocity: f32,
        send: EffectSend,
    ) -> Result<(), DeviceError> {
        self.check_trigger()?;
        self.record(DeviceEvent::AttackRelease {
            at: self.now(),
            note,
            duration,
            time,
            velocity,
            send,
        });
        Ok(())
    }

    fn release_all(&self) {
        self.record(DeviceEvent::ReleaseAll { at: self.now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_with_clock() {
        let clock = Arc::new(OfflineClock::new());
        let log = EventLog::new(Arc::clone(&clock));
        assert!(!log.is_running());

        log.resume().unwrap();
        clock.advance(1.0);
        let notes = vec![Note::from_absolute(36)];
        log.trigger_attack(&notes, EffectSend::CHORD).unwrap();
        log.release_all();

        assert!(log.is_running());
        assert_eq!(
            log.events(),
            vec![
                DeviceEvent::Resume { at: 0.0 },
                DeviceEvent::Attack {
                    at: 1.0,
                    notes,
                    send: EffectSend::CHORD
                },
                DeviceEvent::ReleaseAll { at: 1.0 },
            ]
        );
        assert_eq!(log.release_count(), 1);
    }

    #[test]
    fn test_injected_failure() {
        let log = EventLog::default();
        log.fail_after(1);
        assert!(log.trigger_attack(&[], EffectSend::CHORD).is_ok());
        assert!(log.trigger_attack(&[], EffectSend::CHORD).is_err());
        // release never fails
        log.release_all();
        assert_eq!(log.take().len(), 2);
        assert!(log.events().is_empty());
    }
}
