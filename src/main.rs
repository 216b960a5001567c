// src/main.rs

use std::sync::Arc;

use chordbox::{
    ChordSpec, DeviceEvent, EventLog, OfflineClock, OfflinePacer, Performer, PlayMode,
    PlayerConfig, Progression, ProgressionItem, ProgressionPlayer, SessionEnd, TempoState,
    TimeSignature,
};

/// ===============================
/// Main
/// ===============================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mode = match std::env::args().nth(1).as_deref() {
        Some("arpeggio") => PlayMode::Arpeggio,
        _ => PlayMode::Chord,
    };

    // --------------------------------
    // Progression: ii-V-I in C, then a bar of rest
    // --------------------------------

    let progression: Progression = [
        ProgressionItem::chord(ChordSpec::new("D", "m7"), 2),
        ProgressionItem::chord(ChordSpec::new("G", "7"), 2),
        ProgressionItem::chord(ChordSpec::new("C", "maj7"), 4),
        ProgressionItem::rest(4),
    ]
    .into_iter()
    .collect();

    // --------------------------------
    // Offline device + player
    // --------------------------------

    let clock = Arc::new(OfflineClock::new());
    let device = Arc::new(EventLog::new(Arc::clone(&clock)));
    let tempo = Arc::new(TempoState::default());

    let player = ProgressionPlayer::builder(device.clone(), tempo, progression.into())
        .config(
            PlayerConfig::default()
                .with_looping(false)
                .with_time_signature(TimeSignature::COMMON)
                .with_play_mode(mode),
        )
        .on_item(Performer::new(OfflinePacer::new(Arc::clone(&clock))).into_callback())
        .on_start(|| println!("Rendering progression..."))
        .build();

    match player.play() {
        Ok(SessionEnd::Failed(e)) => println!("Session failed: {}", e),
        Ok(end) => println!("Session ended: {:?}", end),
        Err(e) => {
            eprintln!("Could not start audio: {}", e);
            return;
        }
    }

    // --------------------------------
    // Dump the device log
    // --------------------------------

    for event in device.events() {
        match event {
            DeviceEvent::Resume { at } => println!("{:>6.3}  resume", at),
            DeviceEvent::Attack { at, notes, send } => {
                let names: Vec<String> = notes.iter().map(ToString::to_string).collect();
                println!(
                    "{:>6.3}  chord    {} (reverb {:.1})",
                    at,
                    names.join(" "),
                    send.reverb_wet
                );
            }
            DeviceEvent::AttackRelease {
                note,
                duration,
                time,
                velocity,
                ..
            } => println!(
                "{:>6.3}  note     {:<4} for {:.3}s vel {:.2}",
                time, note, duration, velocity
            ),
            DeviceEvent::ReleaseAll { at } => println!("{:>6.3}  release", at),
        }
    }

    println!("Rendered {:.2}s of audio.", clock.now());
}
