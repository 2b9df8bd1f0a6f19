/// A gap in the current phrase: its 1-based ordinal and the inclusive source
/// and target spans it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonTerminal {
    pub index: usize,
    pub src_start: usize,
    pub src_end: usize,
    pub tgt_start: usize,
    pub tgt_end: usize,
}

/// Gaps opened along the current search path, in source (opening) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonTerminalStack {
    items: Vec<NonTerminal>,
}

impl NonTerminalStack {
    pub fn with_capacity(max_nonterminals: usize) -> Self {
        NonTerminalStack {
            items: Vec::with_capacity(max_nonterminals),
        }
    }

    /// Gaps currently open or closed on the path.
    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, nt: NonTerminal) {
        self.items.push(nt);
    }

    pub fn pop(&mut self) -> Option<NonTerminal> {
        self.items.pop()
    }

    pub fn top(&self) -> Option<&NonTerminal> {
        self.items.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut NonTerminal> {
        self.items.last_mut()
    }

    /// Ordinal for the next gap to open.
    pub fn next_index(&self) -> usize {
        self.top().map_or(1, |nt| nt.index + 1)
    }

    pub fn as_slice(&self) -> &[NonTerminal] {
        &self.items
    }
}

/// Stable copy ordered by `tgt_start`; target order may permute source order.
pub fn sorted_by_target(nts: &[NonTerminal]) -> Vec<NonTerminal> {
    let mut sorted = nts.to_vec();
    sorted.sort_by_key(|nt| nt.tgt_start);
    sorted
}
