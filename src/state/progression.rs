// src/state/progression.rs
//
// Progression data as the editor builds it.
//
// Key concepts:
// - ProgressionItem: a chord (or rest) lasting a whole number of beats
// - Progression: items in playback order
// - SharedProgression: the editor's live copy, snapshotted by the player

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::chord::ChordSpec;

/// Extra beats of grid shown after the last chord.
pub const GRID_MARGIN_BEATS: u32 = 4;

// ═══════════════════════════════════════════════════════════════════════════
// Items
// ═══════════════════════════════════════════════════════════════════════════

/// One slot of a progression.
///
/// - chord + duration: sounded and clicked
/// - no chord + duration: a rest, clicked but silent
/// - no chord + zero duration: a placeholder, skipped entirely
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionItem {
    #[serde(default)]
    pub chord: Option<ChordSpec>,

    /// Length in beats.
    #[serde(default)]
    pub duration: u32,
}

impl ProgressionItem {
    pub fn chord(chord: ChordSpec, duration: u32) -> Self {
        Self {
            chord: Some(chord),
            duration,
        }
    }

    pub fn rest(duration: u32) -> Self {
        Self {
            chord: None,
            duration,
        }
    }

    /// Neither a chord nor any beats: skipped during playback.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.chord.is_none() && self.duration == 0
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Progression
// ═══════════════════════════════════════════════════════════════════════════

/// Ordered chord progression. Order is playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progression {
    pub items: Vec<ProgressionItem>,
}

impl Progression {
    pub fn new(items: Vec<ProgressionItem>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: ProgressionItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProgressionItem> {
        self.items.iter()
    }

    /// Sum of all item durations.
    pub fn total_beats(&self) -> u32 {
        self.items.iter().map(|item| item.duration).sum()
    }

    /// Length of the editor grid in beats.
    ///
    /// One empty measure when there are no beats, otherwise the total plus
    /// a margin, rounded up to whole measures.
    pub fn grid_beats(&self, beats_per_measure: u32) -> u32 {
        let total = self.total_beats();
        if total == 0 {
            return beats_per_measure;
        }
        let with_margin = total + GRID_MARGIN_BEATS;
        if beats_per_measure == 0 {
            return with_margin;
        }
        with_margin.div_ceil(beats_per_measure) * beats_per_measure
    }
}

impl FromIterator<ProgressionItem> for Progression {
    fn from_iter<T: IntoIterator<Item = ProgressionItem>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Progression {
    type Item = &'a ProgressionItem;
    type IntoIter = std::slice::Iter<'a, ProgressionItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared progression
// ═══════════════════════════════════════════════════════════════════════════

/// The editor's progression, shared with the player.
///
/// The player copies it at the start of every pass, so edits made while a
/// pass is running take effect on the next loop repetition.
#[derive(Debug, Clone, Default)]
pub struct SharedProgression {
    inner: Arc<RwLock<Progression>>,
}

impl SharedProgression {
    pub fn new(progression: Progression) -> Self {
        Self {
            inner: Arc::new(RwLock::new(progression)),
        }
    }

    /// Copy of the current progression.
    ///
    /// Like [`SharedProgression::write`], a lock poisoned by a panicking
    /// writer is recovered.
    pub fn snapshot(&self) -> Progression {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write access for the editor.
    ///
    /// A poisoned lock is recovered: the data is plain values and stays
    /// usable.
    pub fn write(&self) -> RwLockWriteGuard<'_, Progression> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole progression.
    pub fn replace(&self, progression: Progression) {
        *self.write() = progression;
    }
}

impl From<Progression> for SharedProgression {
    fn from(progression: Progression) -> Self {
        Self::new(progression)
    }
}
