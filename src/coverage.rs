use std::ops::{Deref, DerefMut};

use crate::alignment::Span;

/// Target positions claimed along the current extraction path.
///
/// Reservations are only made through [`CoverageTracker::reserve`], whose
/// guard flips the same ranges back when dropped, so every return path out of
/// a search branch leaves the tracker as it found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageTracker {
    cover: Vec<bool>,
}

impl CoverageTracker {
    pub fn new(target_len: usize) -> Self {
        CoverageTracker {
            cover: vec![false; target_len],
        }
    }

    /// Number of target positions tracked.
    pub fn target_len(&self) -> usize {
        self.cover.len()
    }

    /// True iff nothing in `[lo, hi]` is reserved. Empty ranges pass.
    pub fn check(&self, lo: usize, hi: usize) -> bool {
        lo > hi || !self.cover[lo..=hi].iter().any(|&c| c)
    }

    /// Toggles every position in `[lo, hi]`.
    pub fn flip(&mut self, lo: usize, hi: usize) {
        if lo > hi {
            return;
        }
        for c in &mut self.cover[lo..=hi] {
            *c = !*c;
        }
    }

    /// True when no position is reserved.
    pub fn is_clear(&self) -> bool {
        !self.cover.iter().any(|&c| c)
    }

    /// Checks all `spans` and, if none collides, reserves them until the
    /// returned guard is dropped. The spans must not overlap each other.
    pub fn reserve(&mut self, spans: &[Span]) -> Option<Reservation<'_>> {
        if !spans.iter().all(|&(lo, hi)| self.check(lo, hi)) {
            return None;
        }
        for &(lo, hi) in spans {
            self.flip(lo, hi);
        }
        Some(Reservation {
            tracker: self,
            spans: spans.to_vec(),
        })
    }
}

/// Scoped reservation on a [`CoverageTracker`]. Derefs to the tracker so
/// nested branches can reserve further positions through it.
#[derive(Debug)]
pub struct Reservation<'a> {
    tracker: &'a mut CoverageTracker,
    spans: Vec<Span>,
}

impl Deref for Reservation<'_> {
    type Target = CoverageTracker;

    fn deref(&self) -> &CoverageTracker {
        self.tracker
    }
}

impl DerefMut for Reservation<'_> {
    fn deref_mut(&mut self) -> &mut CoverageTracker {
        self.tracker
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        for &(lo, hi) in &self.spans {
            self.tracker.flip(lo, hi);
        }
    }
}
