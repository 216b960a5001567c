// src/performer.rs
//
// The standard per-item callback.
//
// For every item the performer voices the chord against the previous
// voicing, sounds it through the session's renderer and then waits out the
// item's duration. Waiting is delegated to a Pacer so the same performer
// drives a real device in real time or renders offline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chord::{ChordFormulas, ChordSpec};
use crate::device::{AudioDevice, OfflineClock};
use crate::error::{DeviceError, PlaybackError};
use crate::pitch::Note;
use crate::render::{PlayMode, Renderer};
use crate::scheduler::{Cue, ProgressionPlayer};
use crate::transport::TempoState;
use crate::voicing::voice_with;

// ═══════════════════════════════════════════════════════════════════════════
// Pacing
// ═══════════════════════════════════════════════════════════════════════════

/// Waits out an item's duration.
pub trait Pacer: Send {
    /// Wait `seconds` on behalf of `session`.
    fn wait(&mut self, seconds: f64, player: &ProgressionPlayer, session: u64);
}

/// Sleeps in short slices and returns early once its session stops.
#[derive(Debug, Clone, Copy)]
pub struct RealTimePacer {
    pub poll_interval: Duration,
}

impl Default for RealTimePacer {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl Pacer for RealTimePacer {
    fn wait(&mut self, seconds: f64, player: &ProgressionPlayer, session: u64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        let deadline = Instant::now() + Duration::from_secs_f64(seconds);
        while player.is_session_active(session) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(self.poll_interval));
        }
    }
}

/// Advances an offline clock instead of sleeping.
#[derive(Debug, Clone)]
pub struct OfflinePacer {
    clock: Arc<OfflineClock>,
}

impl OfflinePacer {
    pub fn new(clock: Arc<OfflineClock>) -> Self {
        Self { clock }
    }
}

impl Pacer for OfflinePacer {
    fn wait(&mut self, seconds: f64, _player: &ProgressionPlayer, _session: u64) {
        if seconds > 0.0 {
            self.clock.advance(seconds);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Performer
// ═══════════════════════════════════════════════════════════════════════════

/// Voices, sounds and paces progression items.
///
/// Install it with `builder.on_item(performer.into_callback())`.
pub struct Performer<P: Pacer> {
    formulas: ChordFormulas,
    pacer: P,
    previous: Vec<Note>,
    session: u64,
}

impl<P: Pacer> Performer<P> {
    pub fn new(pacer: P) -> Self {
        Self::with_formulas(ChordFormulas::standard(), pacer)
    }

    pub fn with_formulas(formulas: ChordFormulas, pacer: P) -> Self {
        Self {
            formulas,
            pacer,
            previous: Vec::new(),
            session: 0,
        }
    }

    /// Voicing of the last chord played.
    pub fn previous(&self) -> &[Note] {
        &self.previous
    }

    /// Play one item. Rests only wait.
    pub fn perform(&mut self, cue: Cue<'_>) -> Result<(), PlaybackError> {
        if cue.session != self.session {
            self.session = cue.session;
            self.previous.clear();
        }

        let player = cue.player;
        if let Some(chord) = &cue.item.chord {
            let notes = voice_with(&self.formulas, chord, &self.previous);
            if notes.is_empty() {
                log::warn!(
                    "Item {}: no voicing for {}{}",
                    cue.index,
                    chord.root,
                    chord.quality
                );
            }
            cue.renderer
                .render(player.device().as_ref(), &notes, player.tempo())?;
            if !notes.is_empty() {
                self.previous = notes;
            }
        }

        let seconds = player.tempo().beats_to_secs(cue.item.duration as f64);
        self.pacer.wait(seconds, player, cue.session);
        Ok(())
    }

    pub fn into_callback(
        mut self,
    ) -> impl FnMut(Cue<'_>) -> Result<(), PlaybackError> + Send + 'static
    where
        P: 'static,
    {
        move |cue: Cue<'_>| self.perform(cue)
    }
}

/// Sound a single chord outside any progression.
///
/// Returns the voicing that was played (root position anchor, no previous
/// chord).
pub fn audition(
    device: &dyn AudioDevice,
    chord: &ChordSpec,
    mode: PlayMode,
    tempo: &TempoState,
) -> Result<Vec<Note>, DeviceError> {
    let notes = crate::voicing::voice(chord, &[]);
    Renderer::from(mode).render(device, &notes, tempo)?;
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::PlayerConfig;
    use crate::event::{DeviceEvent, EventLog};
    use crate::state::{Progression, ProgressionItem, SharedProgression};

    fn offline() -> (Arc<OfflineClock>, Arc<EventLog>) {
        let clock = Arc::new(OfflineClock::new());
        let log = Arc::new(EventLog::running(Arc::clone(&clock)));
        (clock, log)
    }

    fn two_five_one() -> SharedProgression {
        SharedProgression::new(Progression::new(vec![
            ProgressionItem::chord(ChordSpec::new("D", "m7"), 2),
            ProgressionItem::chord(ChordSpec::new("G", "7"), 2),
            ProgressionItem::chord(ChordSpec::new("C", "maj7"), 4),
        ]))
    }

    fn names(notes: &[Note]) -> Vec<String> {
        notes.iter().map(Note::to_string).collect()
    }

    #[test]
    fn test_offline_performance_voice_leads() {
        let (clock, log) = offline();
        let player = ProgressionPlayer::builder(log.clone(), Default::default(), two_five_one())
            .config(PlayerConfig::default().with_looping(false).with_metronome(false))
            .on_item(Performer::new(OfflinePacer::new(Arc::clone(&clock))).into_callback())
            .build();

        player.play().unwrap();

        let attacks = log.attacks();
        assert_eq!(attacks.len(), 3);
        assert_eq!(names(&attacks[0]), ["D3", "F3", "A3", "C4"]);
        // G centered on D3: G2 is 7 below, G3 is 5 above.
        assert_eq!(names(&attacks[1]), ["G3", "B3", "D4", "F4"]);
        // C centered on G3: C4 is 5 above, C3 is 7 below.
        assert_eq!(names(&attacks[2]), ["C4", "E4", "G4", "B4"]);

        // 8 beats at 120 bpm
        assert_eq!(clock.now(), 4.0);
    }

    #[test]
    fn test_attacks_land_on_item_boundaries() {
        let (clock, log) = offline();
        let player = ProgressionPlayer::builder(log.clone(), Default::default(), two_five_one())
            .config(PlayerConfig::default().with_looping(false))
            .on_item(Performer::new(OfflinePacer::new(clock)).into_callback())
            .build();

        player.play().unwrap();

        let attack_times: Vec<f64> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::Attack { at, .. } => Some(*at),
                _ => None,
            })
            .collect();
        assert_eq!(attack_times, vec![0.0, 1.0, 2.0]);

        let click_times: Vec<f64> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::AttackRelease { time, .. } => Some(*time),
                _ => None,
            })
            .collect();
        assert_eq!(
            click_times,
            vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]
        );
    }

    #[test]
    fn test_rest_waits_without_sounding() {
        let (clock, log) = offline();
        let shared = SharedProgression::new(Progression::new(vec![
            ProgressionItem::rest(2),
            ProgressionItem::chord(ChordSpec::new("C", "major"), 1),
        ]));
        let player = ProgressionPlayer::builder(log.clone(), Default::default(), shared)
            .config(PlayerConfig::default().with_looping(false).with_metronome(false))
            .on_item(Performer::new(OfflinePacer::new(Arc::clone(&clock))).into_callback())
            .build();

        player.play().unwrap();
        assert_eq!(log.attacks().len(), 1);
        assert_eq!(clock.now(), 1.5);
    }

    #[test]
    fn test_voice_leading_restarts_each_session() {
        let (clock, log) = offline();
        let player = ProgressionPlayer::builder(log.clone(), Default::default(), two_five_one())
            .config(PlayerConfig::default().with_looping(false).with_metronome(false))
            .on_item(Performer::new(OfflinePacer::new(clock)).into_callback())
            .build();

        player.play().unwrap();
        player.play().unwrap();

        let attacks = log.attacks();
        assert_eq!(attacks.len(), 6);
        assert_eq!(attacks[0], attacks[3]);
    }

    #[test]
    fn test_device_failure_aborts_session() {
        let (clock, log) = offline();
        log.fail_after(1);
        let player = ProgressionPlayer::builder(log.clone(), Default::default(), two_five_one())
            .config(PlayerConfig::default().with_metronome(false))
            .on_item(Performer::new(OfflinePacer::new(clock)).into_callback())
            .build();

        let end = player.play().unwrap();
        assert!(matches!(
            end,
            crate::scheduler::SessionEnd::Failed(PlaybackError::Device(DeviceError::Trigger(_)))
        ));
        assert_eq!(log.attacks().len(), 1);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_real_time_pacer_returns_on_stop() {
        let log = Arc::new(EventLog::running(Arc::new(OfflineClock::new())));
        let started = Arc::new(Mutex::new(None));
        let waited = Arc::clone(&started);
        let shared = SharedProgression::new(Progression::new(vec![ProgressionItem::chord(
            ChordSpec::new("C", "major"),
            16,
        )]));
        let mut performer = Performer::new(RealTimePacer::default());

        let player = Arc::new(
            ProgressionPlayer::builder(log, Arc::new(TempoState::new(20, Default::default())), shared)
                .config(PlayerConfig::default().with_metronome(false))
                .on_item(move |cue| {
                    *waited.lock().unwrap() = Some(Instant::now());
                    performer.perform(cue)
                })
                .build(),
        );

        let runner = Arc::clone(&player);
        let handle = std::thread::spawn(move || runner.play());
        while player.current_index().is_none() {
            std::thread::yield_now();
        }
        player.stop();
        handle.join().unwrap().unwrap();

        // 16 beats at 20 bpm would be 48 s.
        let began = started.lock().unwrap().unwrap();
        assert!(began.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_real_time_pacer_ignores_other_sessions() {
        let log = Arc::new(EventLog::running(Arc::new(OfflineClock::new())));
        let player = ProgressionPlayer::builder(log, Default::default(), two_five_one()).build();
        let mut pacer = RealTimePacer::default();

        // Not the running session: returns without sleeping.
        let began = Instant::now();
        pacer.wait(30.0, &player, 1);
        assert!(began.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_audition_single_chord() {
        let log = EventLog::default();
        let notes = audition(
            &log,
            &ChordSpec::new("Eb", "major").with_inversion(1),
            PlayMode::Arpeggio,
            &TempoState::default(),
        )
        .unwrap();

        assert_eq!(names(&notes), ["G3", "Bb3", "Eb4"]);
        let events = log.events();
        assert!(matches!(events[0], DeviceEvent::ReleaseAll { .. }));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_single_note_formula_in_arpeggio_mode() {
        let (clock, log) = offline();
        let mut formulas = ChordFormulas::standard();
        formulas.insert("unison", vec![0]);
        let shared = SharedProgression::new(Progression::new(vec![ProgressionItem::chord(
            ChordSpec::new("A", "unison"),
            1,
        )]));
        let player = ProgressionPlayer::builder(log.clone(), Default::default(), shared)
            .config(
                PlayerConfig::default()
                    .with_looping(false)
                    .with_metronome(false)
                    .with_play_mode(PlayMode::Arpeggio),
            )
            .on_item(Performer::with_formulas(formulas, OfflinePacer::new(clock)).into_callback())
            .build();

        assert!(matches!(
            player.play().unwrap(),
            crate::scheduler::SessionEnd::Finished
        ));
        let notes: Vec<(Note, f64)> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::AttackRelease { note, duration, .. } => Some((*note, *duration)),
                _ => None,
            })
            .collect();
        assert_eq!(notes, vec![(Note::from_absolute(45), 0.5)]);
    }
}
