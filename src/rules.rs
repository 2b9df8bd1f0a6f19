use crate::alignment::Span;
use crate::config::ExtractorConfig;
use crate::nonterminal::{sorted_by_target, NonTerminal};
use crate::structs::{Link, Rule, Symbol};

// --- Rule Formation ---

/// A phrase reached by the search, in sentence coordinates.
#[derive(Debug, Clone, Copy)]
pub struct RuleCandidate<'a> {
    pub src_i: usize,
    pub tgt_i: usize,
    /// Source words `src_i..=src_j`.
    pub source: &'a [String],
    /// Target words `tgt_i..=tgt_j`.
    pub target: &'a [String],
    /// Gaps in source order.
    pub nonterminals: &'a [NonTerminal],
    /// Terminal links, grouped per source word, in source order.
    pub links: &'a [Vec<Link>],
}

/// Maps sentence positions to rule-local positions once each gap in `gaps`
/// (sorted by start, inclusive) collapses to a single symbol. Positions are
/// walked in ascending order; none may fall inside a gap.
pub fn collapse_positions(positions: &[usize], base: usize, gaps: &[Span]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by_key(|&i| positions[i]);

    let mut local = vec![0; positions.len()];
    let mut offset = base;
    let mut next_gap = 0;
    for i in order {
        while next_gap < gaps.len() && positions[i] > gaps[next_gap].0 {
            offset += gaps[next_gap].1 - gaps[next_gap].0;
            next_gap += 1;
        }
        local[i] = positions[i] - offset;
    }
    local
}

/// Rule-local source index of every link.
pub fn source_offsets(links: &[Link], src_i: usize, nonterminals: &[NonTerminal]) -> Vec<usize> {
    let positions: Vec<usize> = links.iter().map(|l| l.source).collect();
    let gaps: Vec<Span> = nonterminals.iter().map(|nt| (nt.src_start, nt.src_end)).collect();
    collapse_positions(&positions, src_i, &gaps)
}

/// Rule-local target index of every link; `by_target` is sorted by `tgt_start`.
pub fn target_offsets(links: &[Link], tgt_i: usize, by_target: &[NonTerminal]) -> Vec<usize> {
    let positions: Vec<usize> = links.iter().map(|l| l.target).collect();
    let gaps: Vec<Span> = by_target.iter().map(|nt| (nt.tgt_start, nt.tgt_end)).collect();
    collapse_positions(&positions, tgt_i, &gaps)
}

// Replaces each gap span (sorted by start) with its marker.
fn substitute<'a>(words: &'a [String], base: usize, gaps: &[(Span, usize)]) -> Vec<Symbol<'a>> {
    let mut symbols = Vec::with_capacity(words.len());
    let mut gaps = gaps.iter().peekable();
    let mut pos = base;
    while pos < base + words.len() {
        match gaps.peek() {
            Some(&&((start, end), index)) if start == pos => {
                symbols.push(Symbol::Gap(index));
                pos = end + 1;
                gaps.next();
            }
            _ => {
                symbols.push(Symbol::Terminal(&words[pos - base]));
                pos += 1;
            }
        }
    }
    symbols
}

// [C,1] for the new leading gap means every existing index moves up by one.
fn shift_right(rule: &mut Rule<'_>) {
    for sym in rule.source.iter_mut().chain(rule.target.iter_mut()) {
        if let Symbol::Gap(index) = sym {
            *index += 1;
        }
    }
    for link in &mut rule.links {
        link.source += 1;
        link.target += 1;
    }
    rule.source.insert(0, Symbol::Gap(1));
    rule.target.insert(0, Symbol::Gap(1));
}

/// Turns a candidate phrase into its rule plus the gap-extended variants.
#[derive(Debug, Clone, Copy)]
pub struct RuleFormatter<'c> {
    config: &'c ExtractorConfig,
}

impl<'c> RuleFormatter<'c> {
    pub fn new(config: &'c ExtractorConfig) -> Self {
        RuleFormatter { config }
    }

    /// The collapsed rule for `candidate` alone, without added gaps.
    pub fn collapse<'a>(&'a self, candidate: &RuleCandidate<'a>) -> Rule<'a> {
        let by_target = sorted_by_target(candidate.nonterminals);
        let source_gaps: Vec<(Span, usize)> = candidate
            .nonterminals
            .iter()
            .map(|nt| ((nt.src_start, nt.src_end), nt.index))
            .collect();
        let target_gaps: Vec<(Span, usize)> = by_target
            .iter()
            .map(|nt| ((nt.tgt_start, nt.tgt_end), nt.index))
            .collect();

        let links: Vec<Link> = candidate.links.iter().flatten().copied().collect();
        let local_source = source_offsets(&links, candidate.src_i, candidate.nonterminals);
        let local_target = target_offsets(&links, candidate.tgt_i, &by_target);

        Rule {
            category: &self.config.category,
            source: substitute(candidate.source, candidate.src_i, &source_gaps),
            target: substitute(candidate.target, candidate.tgt_i, &target_gaps),
            links: local_source
                .into_iter()
                .zip(local_target)
                .map(|(s, t)| Link::new(s, t))
                .collect(),
        }
    }

    /// Up to four rules: the plain rule, `rule [C]`, `[C] rule` and
    /// `[C] rule [C]`, each within the length and gap limits.
    pub fn form_rules<'a>(&'a self, candidate: &RuleCandidate<'a>) -> Vec<Rule<'a>> {
        let max_length = self.config.max_length;
        let max_nonterminals = self.config.max_nonterminals;

        let mut rule = self.collapse(candidate);
        let gap_count = rule.gap_count();
        let mut rules = vec![rule.clone()];
        if rule.source.len() >= max_length || gap_count >= max_nonterminals {
            return rules;
        }

        let last_index = candidate.nonterminals.last().map_or(0, |nt| nt.index);
        let trailing = !rule.source.last().is_some_and(|s| s.is_gap());
        if trailing {
            let mut extended = rule.clone();
            extended.source.push(Symbol::Gap(last_index + 1));
            extended.target.push(Symbol::Gap(last_index + 1));
            rules.push(extended);
        }

        if rule.source.first().is_some_and(|s| s.is_gap()) {
            return rules;
        }
        shift_right(&mut rule);
        rules.push(rule.clone());

        if !trailing || rule.source.len() >= max_length || gap_count + 1 >= max_nonterminals {
            return rules;
        }
        rule.source.push(Symbol::Gap(last_index + 2));
        rule.target.push(Symbol::Gap(last_index + 2));
        rules.push(rule);
        rules
    }
}
