//! Parse chart: memoized net matches.
//!
//! ```text
//! (net, start) ──> end ──> [MatchTree, MatchTree, ...]
//!                  end ──> [MatchTree]
//! ```
//!
//! An entry for `(net, start)` exists iff a match of `net` was attempted at
//! `start`; a non-empty entry means the attempt succeeded. The parser
//! registers the entry *before* expanding the net, so a recursive request for
//! the same pair sees "attempted, nothing yet" instead of recursing forever.
//!
//! Matches are shared (`Arc`) between the chart, parent matches that embed
//! them as children and the final parses.
//!
//! ## Invariants
//!
//! - Every stored tree is finalized and filed under its own `start..end`.
//! - Within an end bucket, trees keep insertion order; ends iterate ascending.

use crate::error::ChartError;
use crate::grammar::NetId;
use crate::Span;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A piece of a match, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPart {
    /// A word consumed by one of the net's own word arcs.
    Word(String),
    /// A sub-net match consumed by a call arc.
    Child(Arc<MatchTree>),
}

/// One candidate match of one net starting at one position.
///
/// Built incrementally while the matcher walks a net and frozen by
/// `finalize` when a final node is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTree {
    net: NetId,
    start: usize,
    /// Next token to consume.
    cursor: usize,
    /// Exclusive end, set when finalized.
    end: Option<usize>,
    parts: Vec<MatchPart>,
    features: BTreeMap<String, String>,
}

impl MatchTree {
    pub(crate) fn new(net: NetId, start: usize) -> Self {
        MatchTree {
            net,
            start,
            cursor: start,
            end: None,
            parts: Vec::new(),
            features: BTreeMap::new(),
        }
    }

    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    pub fn span(&self) -> Option<Span> {
        self.end.map(|end| Span::new(self.start, end))
    }

    pub fn is_finalized(&self) -> bool {
        self.end.is_some()
    }

    pub fn parts(&self) -> &[MatchPart] {
        &self.parts
    }

    pub fn children(&self) -> impl Iterator<Item = &Arc<MatchTree>> {
        self.parts.iter().filter_map(|part| match part {
            MatchPart::Child(child) => Some(child),
            MatchPart::Word(_) => None,
        })
    }

    /// Words consumed by this net's own word arcs (not by children).
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            MatchPart::Word(word) => Some(word.as_str()),
            MatchPart::Child(_) => None,
        })
    }

    /// Every word covered by the match, children included, in input order.
    pub fn all_words(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for part in &self.parts {
            match part {
                MatchPart::Word(word) => out.push(word.as_str()),
                MatchPart::Child(child) => out.extend(child.all_words()),
            }
        }
        out
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    pub(crate) fn consume_word(&mut self, word: &str) {
        self.cursor += 1;
        self.parts.push(MatchPart::Word(word.to_string()));
    }

    pub(crate) fn append_child(&mut self, child: Arc<MatchTree>) {
        self.cursor = child.end.unwrap_or(child.cursor);
        self.parts.push(MatchPart::Child(child));
    }

    pub(crate) fn set_features(&mut self, features: BTreeMap<String, String>) {
        self.features = features;
    }

    pub(crate) fn finalize(&mut self) {
        self.end = Some(self.cursor);
    }

    /// A finalized copy; `self` stays open for longer matches.
    pub(crate) fn finalized(&self) -> MatchTree {
        let mut done = self.clone();
        done.finalize();
        done
    }
}

/// A finalized chart match, as handed to the trellis and to parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartCell {
    tree: Arc<MatchTree>,
    span: Span,
}

impl ChartCell {
    fn new(tree: Arc<MatchTree>) -> Self {
        let span = Span::new(tree.start, tree.end.unwrap_or(tree.cursor));
        ChartCell { tree, span }
    }

    pub fn net(&self) -> NetId {
        self.tree.net
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn tree(&self) -> &Arc<MatchTree> {
        &self.tree
    }
}

#[derive(Debug, Default)]
pub struct ParseChart {
    entries: HashMap<(NetId, usize), BTreeMap<usize, Vec<Arc<MatchTree>>>>,
    match_count: usize,
}

impl ParseChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_count = 0;
    }

    /// Record that `net` is being tried at `start`.
    pub fn register_entry(&mut self, net: NetId, start: usize) {
        self.entries.entry((net, start)).or_default();
    }

    /// File a finalized match under `start..end`.
    pub fn add_match(&mut self, tree: MatchTree, start: usize, end: usize) -> Result<Arc<MatchTree>, ChartError> {
        if tree.start != start || tree.end != Some(end) {
            return Err(ChartError::InconsistentInsertion {
                start,
                end,
                actual_start: tree.start,
                actual_end: tree.end,
            });
        }
        let tree = Arc::new(tree);
        self.entries.entry((tree.net, start)).or_default().entry(end).or_default().push(Arc::clone(&tree));
        self.match_count += 1;
        Ok(tree)
    }

    pub fn was_attempted(&self, net: NetId, start: usize) -> bool {
        self.entries.contains_key(&(net, start))
    }

    fn entry(&self, net: NetId, start: usize) -> Result<&BTreeMap<usize, Vec<Arc<MatchTree>>>, ChartError> {
        self.entries.get(&(net, start)).ok_or(ChartError::NoAttemptRegistered { net, start })
    }

    pub fn succeeded(&self, net: NetId, start: usize) -> Result<bool, ChartError> {
        Ok(!self.entry(net, start)?.is_empty())
    }

    /// All matches of `net` at `start`, by ascending end position.
    pub fn matches_at(&self, net: NetId, start: usize) -> Result<Vec<Arc<MatchTree>>, ChartError> {
        Ok(self.entry(net, start)?.values().flatten().cloned().collect())
    }

    /// One representative (the first stored) match per distinct end position.
    pub fn non_empty_cells(&self, net: NetId, start: usize) -> Result<Vec<ChartCell>, ChartError> {
        Ok(self.entry(net, start)?.values().filter_map(|bucket| bucket.first()).cloned().map(ChartCell::new).collect())
    }

    /// Number of `(net, start)` pairs attempted.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of matches stored across all entries.
    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// Representative cells of every successful entry, ordered by span then net.
    pub fn cells(&self) -> Vec<ChartCell> {
        let mut cells: Vec<ChartCell> = self
            .entries
            .values()
            .flat_map(|ends| ends.values().filter_map(|bucket| bucket.first()).cloned().map(ChartCell::new))
            .collect();
        cells.sort_by_key(|cell| (cell.span, cell.net()));
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(net: usize, start: usize, words: &[&str]) -> MatchTree {
        let mut tree = MatchTree::new(NetId(net), start);
        for w in words {
            tree.consume_word(w);
        }
        tree.finalized()
    }

    #[test]
    fn queries_before_an_attempt_are_errors() {
        let chart = ParseChart::new();
        assert!(!chart.was_attempted(NetId(0), 3));
        assert_eq!(chart.succeeded(NetId(0), 3), Err(ChartError::NoAttemptRegistered { net: NetId(0), start: 3 }));
        assert!(chart.matches_at(NetId(0), 3).is_err());
        assert!(chart.non_empty_cells(NetId(0), 3).is_err());
    }

    #[test]
    fn registered_entry_without_matches_is_a_failed_attempt() {
        let mut chart = ParseChart::new();
        chart.register_entry(NetId(1), 2);
        assert!(chart.was_attempted(NetId(1), 2));
        assert_eq!(chart.succeeded(NetId(1), 2), Ok(false));
        assert_eq!(chart.matches_at(NetId(1), 2), Ok(Vec::new()));
        assert_eq!(chart.non_empty_cells(NetId(1), 2), Ok(Vec::new()));
    }

    #[test]
    fn add_match_checks_bounds_and_auto_registers() {
        let mut chart = ParseChart::new();
        let tree = finished(0, 1, &["A", "B"]);

        let err = chart.add_match(tree.clone(), 1, 2).unwrap_err();
        assert_eq!(err, ChartError::InconsistentInsertion { start: 1, end: 2, actual_start: 1, actual_end: Some(3) });

        let open = MatchTree::new(NetId(0), 1);
        assert!(chart.add_match(open, 1, 1).is_err());
        assert!(!chart.was_attempted(NetId(0), 1));

        chart.add_match(tree, 1, 3).unwrap();
        assert_eq!(chart.succeeded(NetId(0), 1), Ok(true));
        assert_eq!(chart.match_count(), 1);
    }

    #[test]
    fn cells_are_one_per_end_position() {
        let mut chart = ParseChart::new();
        chart.register_entry(NetId(0), 1);
        chart.add_match(finished(0, 1, &["A", "B"]), 1, 3).unwrap();
        chart.add_match(finished(0, 1, &["A"]), 1, 2).unwrap();
        chart.add_match(finished(0, 1, &["X"]), 1, 2).unwrap();

        let all = chart.matches_at(NetId(0), 1).unwrap();
        let ends: Vec<Option<usize>> = all.iter().map(|t| t.end()).collect();
        assert_eq!(ends, vec![Some(2), Some(2), Some(3)]);

        let cells = chart.non_empty_cells(NetId(0), 1).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].span(), Span::new(1, 2));
        assert_eq!(cells[0].tree().words().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(cells[1].span(), Span::new(1, 3));
        assert_eq!(chart.cells().len(), 2);
    }

    #[test]
    fn children_move_the_cursor_to_their_end() {
        let child = Arc::new(finished(3, 2, &["X", "Y"]));
        let mut parent = MatchTree::new(NetId(1), 2);
        parent.append_child(child);
        parent.consume_word("Z");
        let done = parent.finalized();
        assert_eq!(done.span(), Some(Span::new(2, 5)));
        assert_eq!(done.all_words(), vec!["X", "Y", "Z"]);
        assert_eq!(done.children().count(), 1);
        assert!(!parent.is_finalized());
    }
}
