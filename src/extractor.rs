use std::collections::BTreeSet;

use log::{debug, info};
use rayon::prelude::*;

use crate::alignment::{AlignmentIndex, Span};
use crate::config::ExtractorConfig;
use crate::coverage::CoverageTracker;
use crate::error::{ExtractError, Result};
use crate::nonterminal::{NonTerminal, NonTerminalStack};
use crate::rules::{RuleCandidate, RuleFormatter};
use crate::structs::{Link, SentencePair};

/// Extracts Hiero rules from single sentence pairs. Holds no per-sentence
/// state, so one extractor can serve many threads.
#[derive(Debug, Clone)]
pub struct RuleExtractor {
    config: ExtractorConfig,
}

impl RuleExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(RuleExtractor { config })
    }

    /// All rules for `pair`, deduplicated and sorted.
    pub fn extract(&self, pair: &SentencePair) -> Result<Vec<String>> {
        let mut cover = CoverageTracker::new(pair.target.len());
        let rules = self.extract_with(pair, &mut cover)?;
        Ok(rules.into_iter().collect())
    }

    /// Runs the search with a caller-owned coverage tracker, which must
    /// span the target sentence and is handed back as it was passed in.
    pub fn extract_with(
        &self,
        pair: &SentencePair,
        cover: &mut CoverageTracker,
    ) -> Result<BTreeSet<String>> {
        let index = AlignmentIndex::new(&pair.alignment, pair.source.len(), pair.target.len())?;
        if cover.target_len() != pair.target.len() {
            return Err(ExtractError::Config(format!(
                "coverage tracker of length {} for target sentence of length {}",
                cover.target_len(),
                pair.target.len()
            )));
        }

        let mut search = Search {
            config: &self.config,
            pair,
            index: &index,
            formatter: RuleFormatter::new(&self.config),
            gaps: NonTerminalStack::with_capacity(self.config.max_nonterminals),
            links: Vec::with_capacity(self.config.max_length),
            rules: BTreeSet::new(),
        };

        // Rules never start on an unaligned word.
        for src_i in (0..pair.source.len()).filter(|&i| index.is_aligned(i)) {
            search.extend(cover, Frontier::start(src_i));
        }

        Ok(search.rules)
    }

    /// Extracts `pairs` in parallel, keeping input order. `first_line` counts
    /// the input lines before `pairs[0]` so errors and progress name the
    /// absolute line.
    pub fn extract_batch(&self, pairs: &[SentencePair], first_line: usize) -> Result<Vec<Vec<String>>> {
        pairs
            .par_iter()
            .enumerate()
            .map(|(n, pair)| {
                let line = first_line + n + 1;
                let rules = self.extract(pair).map_err(|e| ExtractError::Sentence {
                    line,
                    source: Box::new(e),
                })?;
                debug!("Sentence {}: {} rules", line, rules.len());
                if line % 10000 == 0 {
                    info!("Processed sentence pair {}", line);
                }
                Ok(rules)
            })
            .collect()
    }

    /// Reads `pairs` in batches of `batch_size`, extracting each in parallel
    /// and passing its grammars to `sink` with the 0-based index of the
    /// batch's first pair. Returns the number of pairs read.
    pub fn extract_stream<I, F>(&self, pairs: I, batch_size: usize, mut sink: F) -> Result<usize>
    where
        I: IntoIterator<Item = Result<SentencePair>>,
        F: FnMut(usize, Vec<Vec<String>>) -> Result<()>,
    {
        let mut pairs = pairs.into_iter();
        let mut done = 0;
        loop {
            let batch = pairs
                .by_ref()
                .take(batch_size.max(1))
                .collect::<Result<Vec<_>>>()?;
            if batch.is_empty() {
                return Ok(done);
            }
            sink(done, self.extract_batch(&batch, done)?)?;
            done += batch.len();
        }
    }
}

/// Extracts every pair in parallel. Result `n` belongs to `pairs[n]`.
pub fn extract_corpus(pairs: &[SentencePair], config: &ExtractorConfig) -> Result<Vec<Vec<String>>> {
    RuleExtractor::new(config.clone())?.extract_batch(pairs, 0)
}

// --- Search ---

/// Position of one in-flight recursive call.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    src_i: usize,
    /// Next source position to fold in.
    src_j: usize,
    /// Minimal target span covering everything aligned so far.
    tgt: Option<Span>,
    /// Terminals so far, plus one.
    word_count: usize,
    /// The top gap is still absorbing unaligned words.
    gap_open: bool,
}

impl Frontier {
    fn start(src_i: usize) -> Self {
        Frontier {
            src_i,
            src_j: src_i,
            tgt: None,
            word_count: 1,
            gap_open: false,
        }
    }

    fn advance(&self, tgt: Span, word_count: usize, gap_open: bool) -> Self {
        Frontier {
            src_j: self.src_j + 1,
            tgt: Some(tgt),
            word_count,
            gap_open,
            ..*self
        }
    }
}

struct Search<'a> {
    config: &'a ExtractorConfig,
    pair: &'a SentencePair,
    index: &'a AlignmentIndex,
    formatter: RuleFormatter<'a>,
    gaps: NonTerminalStack,
    links: Vec<Vec<Link>>,
    rules: BTreeSet<String>,
}

impl Search<'_> {
    fn exhausted(&self, at: &Frontier) -> bool {
        at.word_count + self.gaps.depth() > self.config.max_length
            || at.src_j >= self.index.source_len()
            || at.src_j - at.src_i + 1 > self.config.max_span
            || self.gaps.depth() > self.config.max_nonterminals
    }

    fn extend(&mut self, cover: &mut CoverageTracker, at: Frontier) {
        if self.exhausted(&at) {
            return;
        }
        let Some(link) = self.index.span_of(at.src_j) else {
            self.extend_unaligned(cover, at);
            return;
        };
        let tgt = match at.tgt {
            Some((lo, hi)) => (lo.min(link.0), hi.max(link.1)),
            None => link,
        };

        // An open gap must take this word; the closed alternatives were
        // explored when the gap was opened.
        if at.gap_open {
            self.grow_gap(cover, &at, link, tgt);
            return;
        }

        self.extend_terminal(cover, &at, tgt);
        if self.gaps.top().is_some_and(|nt| nt.src_end + 1 == at.src_j) {
            self.grow_gap(cover, &at, link, tgt);
        }
        if self.may_open_gap(at.src_j) {
            self.open_gap(cover, &at, link, tgt);
        }
    }

    fn extend_unaligned(&mut self, cover: &mut CoverageTracker, at: Frontier) {
        let next = Frontier {
            src_j: at.src_j + 1,
            ..at
        };
        if !at.gap_open {
            self.extend(
                cover,
                Frontier {
                    word_count: at.word_count + 1,
                    ..next
                },
            );
            return;
        }
        let Some(top) = self.gaps.top_mut() else {
            return;
        };
        let saved = top.src_end;
        top.src_end = at.src_j;
        self.extend(cover, next);
        if let Some(top) = self.gaps.top_mut() {
            top.src_end = saved;
        }
    }

    fn extend_terminal(&mut self, cover: &mut CoverageTracker, at: &Frontier, tgt: Span) {
        let index = self.index;
        let targets = index.aligned_targets(at.src_j);
        let spans: Vec<Span> = targets.iter().map(|&t| (t, t)).collect();
        let Some(mut reserved) = cover.reserve(&spans) else {
            return;
        };

        self.links
            .push(targets.iter().map(|&t| Link::new(at.src_j, t)).collect());
        self.emit(at.src_i, at.src_j, tgt);
        self.extend(&mut reserved, at.advance(tgt, at.word_count + 1, false));
        self.links.pop();
    }

    /// Folds `src_j` into the top gap, reserving only the target positions
    /// the gap newly spans.
    fn grow_gap(&mut self, cover: &mut CoverageTracker, at: &Frontier, link: Span, tgt: Span) {
        let Some(&saved) = self.gaps.top() else {
            return;
        };
        let mut delta = Vec::with_capacity(2);
        if link.0 < saved.tgt_start {
            delta.push((link.0, saved.tgt_start - 1));
        }
        if link.1 > saved.tgt_end {
            delta.push((saved.tgt_end + 1, link.1));
        }
        let Some(mut reserved) = cover.reserve(&delta) else {
            return;
        };

        if let Some(top) = self.gaps.top_mut() {
            top.src_end = at.src_j;
            top.tgt_start = saved.tgt_start.min(link.0);
            top.tgt_end = saved.tgt_end.max(link.1);
        }
        self.emit(at.src_i, at.src_j, tgt);
        self.extend(&mut reserved, at.advance(tgt, at.word_count, false));
        if let Some(top) = self.gaps.top_mut() {
            *top = saved;
        }
    }

    fn may_open_gap(&self, src_j: usize) -> bool {
        self.gaps.depth() < self.config.max_nonterminals
            && self
                .gaps
                .top()
                .map_or(true, |nt| src_j - nt.src_end > self.config.min_gap_size)
    }

    fn open_gap(&mut self, cover: &mut CoverageTracker, at: &Frontier, link: Span, tgt: Span) {
        let Some(mut reserved) = cover.reserve(&[link]) else {
            return;
        };
        self.gaps.push(NonTerminal {
            index: self.gaps.next_index(),
            src_start: at.src_j,
            src_end: at.src_j,
            tgt_start: link.0,
            tgt_end: link.1,
        });
        self.emit(at.src_i, at.src_j, tgt);

        let next = at.advance(tgt, at.word_count, false);
        self.extend(&mut reserved, next);
        // Let the gap swallow following unaligned words too.
        if next.src_j < self.index.source_len() && !self.index.is_aligned(next.src_j) {
            self.extend(&mut reserved, Frontier { gap_open: true, ..next });
        }
        self.gaps.pop();
    }

    /// Forms and records the rules for `[src_i, src_j]` / `tgt`. Phrases with
    /// no terminal link are skipped; target positions shared with words
    /// outside the phrase were already settled by coverage.
    fn emit(&mut self, src_i: usize, src_j: usize, tgt: Span) {
        if self.links.is_empty() {
            return;
        }
        let candidate = RuleCandidate {
            src_i,
            tgt_i: tgt.0,
            source: &self.pair.source[src_i..=src_j],
            target: &self.pair.target[tgt.0..=tgt.1],
            nonterminals: self.gaps.as_slice(),
            links: &self.links,
        };
        let formed: Vec<String> = self
            .formatter
            .form_rules(&candidate)
            .iter()
            .map(ToString::to_string)
            .collect();
        self.rules.extend(formed);
    }
}
