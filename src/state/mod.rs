// src/state/mod.rs
//
// State shared between the editor UI and the player.
//
// Key principles:
// - Progression data is plain, serializable values
// - The player only ever reads a snapshot of the progression
// - Session state is atomic and observable from any thread

mod progression;
mod session;

pub use progression::*;
pub use session::*;
