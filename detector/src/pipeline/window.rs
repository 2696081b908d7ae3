//! Fixed-length feature window fed to the classifier.
//!
//! Ring arena indexed by a write cursor modulo capacity.  The window is
//! pre-filled with zero vectors, so it always holds exactly `capacity`
//! steps and inference can run from the very first real feature (cold-start
//! padding is part of the model's input contract, not an error).

use super::features::{FeatureVector, FEATURE_COUNT};

/// Sequence length the bundled model expects.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Rolling window of the most recent feature vectors.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    /// Arena of `capacity` steps; oldest step lives at `write_index`.
    slots: Vec<[f32; FEATURE_COUNT]>,
    /// Next slot to overwrite.
    write_index: usize,
    /// Real (non-padding) steps currently held, saturating at capacity.
    real_count: usize,
}

impl FeatureWindow {
    /// Create a zero-padded window. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![[0.0; FEATURE_COUNT]; capacity],
            write_index: 0,
            real_count: 0,
        }
    }

    /// Evict the oldest step and append `feature` as the newest.
    pub fn push(&mut self, feature: FeatureVector) {
        self.slots[self.write_index] = feature.to_array();
        self.write_index = (self.write_index + 1) % self.slots.len();
        if self.real_count < self.slots.len() {
            self.real_count += 1;
        }
    }

    /// Number of steps held. Always equals `capacity()`.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Steps holding real features rather than cold-start padding.
    pub fn real_count(&self) -> usize {
        self.real_count
    }

    /// Whether every slot holds a real feature.
    pub fn is_warm(&self) -> bool {
        self.real_count == self.slots.len()
    }

    /// Steps oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &[f32; FEATURE_COUNT]> + '_ {
        let (newer, older) = self.slots.split_at(self.write_index);
        older.iter().chain(newer.iter())
    }

    /// Flatten oldest-first into a fresh buffer of `capacity * FEATURE_COUNT`
    /// floats, each step's features contiguous.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.slots.len() * FEATURE_COUNT);
        self.snapshot_into(&mut out);
        out
    }

    /// Same as `snapshot`, reusing `out`'s allocation.
    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        out.clear();
        for step in self.iter() {
            out.extend_from_slice(step);
        }
    }

    /// Back to all-zero padding.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = [0.0; FEATURE_COUNT];
        }
        self.write_index = 0;
        self.real_count = 0;
    }
}

impl Default for FeatureWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

// ── Tests ──────────────────────────────────────────────────
