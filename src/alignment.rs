use crate::error::{ExtractError, Result};
use crate::structs::Link;

/// Inclusive `(start, end)` index range.
pub type Span = (usize, usize);

/// Per-position alignment lookups for one sentence pair, built once and
/// never mutated while rules are extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentIndex {
    aligned_targets: Vec<Vec<usize>>,
    span_of: Vec<Option<Span>>,
}

fn widen(span: Option<Span>, pos: usize) -> Option<Span> {
    Some(match span {
        Some((lo, hi)) => (lo.min(pos), hi.max(pos)),
        None => (pos, pos),
    })
}

impl AlignmentIndex {
    /// Fails on the first link that points outside either sentence.
    pub fn new(links: &[Link], source_len: usize, target_len: usize) -> Result<Self> {
        let mut aligned_targets = vec![Vec::new(); source_len];
        let mut span_of = vec![None; source_len];

        for link in links {
            if link.source >= source_len || link.target >= target_len {
                return Err(ExtractError::LinkOutOfRange {
                    source_index: link.source,
                    target_index: link.target,
                    source_len,
                    target_len,
                });
            }
            aligned_targets[link.source].push(link.target);
            span_of[link.source] = widen(span_of[link.source], link.target);
        }

        for targets in &mut aligned_targets {
            targets.sort_unstable();
            targets.dedup();
        }

        Ok(AlignmentIndex {
            aligned_targets,
            span_of,
        })
    }

    pub fn source_len(&self) -> usize {
        self.aligned_targets.len()
    }

    /// Sorted, duplicate-free target positions aligned to `source`.
    pub fn aligned_targets(&self, source: usize) -> &[usize] {
        &self.aligned_targets[source]
    }

    pub fn is_aligned(&self, source: usize) -> bool {
        !self.aligned_targets[source].is_empty()
    }

    /// `(min, max)` over the targets aligned to `source`, `None` if unaligned.
    pub fn span_of(&self, source: usize) -> Option<Span> {
        self.span_of[source]
    }
}
