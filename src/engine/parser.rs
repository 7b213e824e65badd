//! Net matching and the per-utterance driver.
//!
//! This module is the operational core of the engine:
//!
//! - Prepare the utterance (see `utterance.rs`).
//! - At every token position, try every slot net of the grammar. Each try is
//!   a depth-first walk over the net's nodes that records every way the net
//!   can end, memoized per `(net, position)` in the chart (see `chart.rs`).
//! - Feed each successful slot's matches to the trellis (see `trellis.rs`)
//!   and ask it for the best slot sequences.
//!
//! ## Walking a net
//!
//! ```text
//! match_net(net, pos)
//!   ├─ attempted before? ──yes──> answer from the chart
//!   └─ register entry, expand_path(start node, empty match)
//!        for each arc of the node on top of the walk stack:
//!          Word  ── token matches? ──> clone, consume one token ─┐
//!          Null  ───────────────────> clone ─────────────────────┤
//!          Call  ── match_net(arg, cursor), for every arg match:  │
//!                   clone, attach child ─────────────────────────┤
//!                                                                v
//!                                    if the destination is final, file a
//!                                    finalized copy in the chart; push
//!                                    the destination on the walk stack
//! ```
//!
//! A branch that cannot continue just ends; that is not an error.
//!
//! ## Guards
//!
//! - The chart entry is registered before expansion, so a net that calls
//!   itself at the same position sees "attempted, nothing yet" and stops.
//! - A walk that returns to the same node without consuming anything is cut
//!   off (`ParseStats::pruned_cycles`).
//! - Net calls nested deeper than `Options::max_depth` abort with
//!   `ParseError::DepthLimit`. Words consumed inside one net do not count:
//!   the walk within a net uses an explicit stack.

use super::chart::{MatchTree, ParseChart};
use super::metrics::{ParseStats, RunMetrics};
use super::trellis::SlotTrellis;
use super::utterance::{Token, Utterance};
use crate::error::ParseError;
use crate::grammar::{FeatureSet, Grammar, Net, NetArc, NetId, NodeId};
use crate::morphology::Morphology;
use crate::parse::{Parse, ParseMode};
use crate::Options;
use std::time::Instant;

/// Outcome of one `parse_line` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStatus {
    Success,
    #[default]
    NoParse,
}

/// Expansion context for one utterance: everything the walk reads or
/// mutates, bundled so it can be threaded through nested net calls.
struct Matcher<'a> {
    grammar: &'a Grammar,
    utterance: &'a Utterance,
    chart: &'a mut ParseChart,
    stats: &'a mut ParseStats,
    max_depth: usize,
    cycle_reported: bool,
}

/// A node being walked inside one net.
///
/// The walk keeps these on a heap stack, so a net that loops over many
/// tokens costs no native stack per token. Only nested net calls recurse.
struct WalkFrame {
    node: NodeId,
    path: MatchTree,
    /// Nodes entered since the cursor last moved.
    trail: Vec<NodeId>,
    next_arc: usize,
    /// Paths produced by the last arc, still to be walked in order.
    successors: std::vec::IntoIter<(NodeId, MatchTree)>,
}

impl<'a> Matcher<'a> {
    /// Whether `net` matches anything starting at `position`.
    ///
    /// `depth` counts the net calls enclosing this one.
    fn match_net(&mut self, net: NetId, position: usize, depth: usize) -> Result<bool, ParseError> {
        self.stats.net_calls += 1;
        if self.chart.was_attempted(net, position) {
            self.stats.chart_hits += 1;
            return Ok(self.chart.succeeded(net, position)?);
        }

        let name = self.grammar.net(net).name();
        if depth > self.max_depth {
            tracing::warn!(net = name, position, limit = self.max_depth, "depth limit reached");
            return Err(ParseError::DepthLimit { net: name.to_string(), position, limit: self.max_depth });
        }

        self.chart.register_entry(net, position);
        *self.stats.expansions.entry((net, position)).or_default() += 1;
        tracing::trace!(net = name, position, depth, "expanding net");

        self.expand_path(NodeId::START, MatchTree::new(net, position), depth)?;
        Ok(self.chart.succeeded(net, position)?)
    }

    /// Depth-first walk over every continuation of `path` from `node`.
    fn expand_path(&mut self, node: NodeId, path: MatchTree, depth: usize) -> Result<(), ParseError> {
        let grammar = self.grammar;
        let net = grammar.net(path.net());
        let mut stack = Vec::new();
        self.enter(net, node, path, Vec::new(), &mut stack);

        while let Some(frame) = stack.last_mut() {
            if let Some((to, next)) = frame.successors.next() {
                let trail = if next.cursor() == frame.path.cursor() { frame.trail.clone() } else { Vec::new() };
                self.record_if_final(net, to, &next)?;
                self.enter(net, to, next, trail, &mut stack);
                continue;
            }
            match net.node(frame.node).arcs().get(frame.next_arc) {
                Some(arc) => {
                    frame.next_arc += 1;
                    let successors = self.follow_arc(net, arc, &frame.path, depth)?;
                    frame.successors = successors.into_iter();
                }
                None => {
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Push `node` unless the walk already passed it without consuming input.
    fn enter(
        &mut self,
        net: &Net,
        node: NodeId,
        path: MatchTree,
        mut trail: Vec<NodeId>,
        stack: &mut Vec<WalkFrame>,
    ) {
        if trail.contains(&node) {
            self.stats.pruned_cycles += 1;
            if !self.cycle_reported {
                self.cycle_reported = true;
                tracing::warn!(
                    net = net.name(),
                    node = node.index(),
                    position = path.cursor(),
                    "net loops without consuming input; cycle pruned"
                );
            }
            return;
        }
        trail.push(node);
        stack.push(WalkFrame { node, path, trail, next_arc: 0, successors: Vec::new().into_iter() });
    }

    /// Paths that leave `path` through `arc`, in the order they are walked.
    fn follow_arc(
        &mut self,
        net: &Net,
        arc: &NetArc,
        path: &MatchTree,
        depth: usize,
    ) -> Result<Vec<(NodeId, MatchTree)>, ParseError> {
        // Destinations were range-checked at load time.
        let Some(to) = arc.destination().resolve(net) else {
            return Ok(Vec::new());
        };
        let position = path.cursor();

        match arc {
            NetArc::Null { .. } => Ok(vec![(to, path.clone())]),
            NetArc::Word { word, features, head, .. } => {
                if !self.match_word(word, features, position) {
                    return Ok(Vec::new());
                }
                let mut next = path.clone();
                if let Some(analysis) = self.utterance.token(position).and_then(Token::analysis) {
                    if *head || (net.node(to).is_final() && path.features().is_empty()) {
                        next.set_features(analysis.features().clone());
                    }
                }
                next.consume_word(word);
                Ok(vec![(to, next)])
            }
            NetArc::Call { net: link, features, head, .. } => {
                let Some(callee) = link.resolve(self.grammar) else {
                    return Ok(Vec::new());
                };
                if !self.match_net(callee, position, depth + 1)? {
                    return Ok(Vec::new());
                }
                let mut out = Vec::new();
                for child in self.chart.matches_at(callee, position)? {
                    if !features.requires_exact_form() && !features.admits_map(child.features()) {
                        continue;
                    }
                    let mut next = path.clone();
                    if *head {
                        next.set_features(child.features().clone());
                    }
                    next.append_child(child);
                    out.push((to, next));
                }
                Ok(out)
            }
        }
    }

    /// File a finalized copy of `path` when `to` is final.
    fn record_if_final(&mut self, net: &Net, to: NodeId, path: &MatchTree) -> Result<(), ParseError> {
        if net.node(to).is_final() {
            let (start, end) = (path.start(), path.cursor());
            self.chart.add_match(path.finalized(), start, end)?;
            tracing::trace!(net = net.name(), start, end, "net matched");
        }
        Ok(())
    }

    /// Does the token at `position` satisfy a word arc?
    ///
    /// ```text
    /// features empty or {=}   surface == word
    /// boundary marker         never, unless exact
    /// otherwise               lemma == word and some alternative admitted
    /// ```
    ///
    /// Tokens without analysis fall back to the surface comparison.
    fn match_word(&self, word: &str, features: &FeatureSet, position: usize) -> bool {
        let Some(token) = self.utterance.token(position) else {
            return false;
        };
        if features.requires_exact_form() {
            return token.surface() == word;
        }
        if token.is_boundary() {
            return false;
        }
        match token.analysis() {
            Some(analysis) => analysis.lemma() == word && features.admits(analysis.feature_values()),
            None => token.surface() == word,
        }
    }
}

/// Parses utterances against one grammar.
///
/// Usage: create with [`ParserEngine::new`], then call
/// [`parse_line`](Self::parse_line) once per utterance. Each call starts from
/// a clean chart and trellis; results stay readable until the next call.
///
/// ```text
/// parse_line() -> scan (match_net per position x slot net) -> rank (trellis)
/// ```
#[derive(Debug)]
pub struct ParserEngine<'g> {
    grammar: &'g Grammar,
    options: Options,
    morphology: Option<Morphology<'g>>,
    chart: ParseChart,
    trellis: SlotTrellis,
    utterance: Utterance,
    parses: Vec<Parse>,
    status: ParseStatus,
    metrics: RunMetrics,
}

impl<'g> ParserEngine<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_options(grammar, Options::default())
    }

    pub fn with_options(grammar: &'g Grammar, options: Options) -> Self {
        ParserEngine {
            grammar,
            options,
            morphology: None,
            chart: ParseChart::new(),
            trellis: SlotTrellis::new(),
            utterance: Utterance::default(),
            parses: Vec::new(),
            status: ParseStatus::NoParse,
            metrics: RunMetrics::default(),
        }
    }

    /// Attach the tokenizer/disambiguator pair used for inflected languages.
    pub fn with_morphology(mut self, morphology: Morphology<'g>) -> Self {
        self.morphology = Some(morphology);
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Parse one utterance.
    ///
    /// `Ok(ParseStatus::NoParse)` means nothing in the grammar explains the
    /// input; errors are grammar defects or guard violations.
    pub fn parse_line(&mut self, text: &str) -> Result<ParseStatus, ParseError> {
        let total_start = Instant::now();
        self.reset();

        self.utterance = match (&self.morphology, self.options.language.is_inflected()) {
            (Some(morphology), true) => Utterance::analysed(text, morphology),
            (None, true) => {
                tracing::warn!(
                    language = ?self.options.language,
                    "inflected language without morphology, matching surface forms"
                );
                Utterance::verbatim(text)
            }
            _ => Utterance::verbatim(text),
        };

        let scan_start = Instant::now();
        let mut stats = ParseStats::default();
        let mut matcher = Matcher {
            grammar: self.grammar,
            utterance: &self.utterance,
            chart: &mut self.chart,
            stats: &mut stats,
            max_depth: self.options.max_depth,
            cycle_reported: false,
        };
        for position in 0..self.utterance.len() {
            for &net in self.grammar.active_nets() {
                if matcher.match_net(net, position, 0)? {
                    let cells = matcher.chart.non_empty_cells(net, position)?;
                    self.trellis.add_slot(self.grammar, &cells)?;
                }
            }
        }
        let scan = scan_start.elapsed();

        let rank_start = Instant::now();
        self.parses = self.trellis.best_match(self.grammar, self.options.fragmentation_window);
        let rank = rank_start.elapsed();

        stats.decisions = self.trellis.decisions();
        self.status = if self.parses.is_empty() { ParseStatus::NoParse } else { ParseStatus::Success };
        self.metrics = RunMetrics { total: total_start.elapsed(), scan, rank, stats };

        tracing::debug!(
            tokens = self.utterance.len(),
            active_nets = self.grammar.active_nets().len(),
            chart_entries = self.chart.entry_count(),
            chart_matches = self.chart.match_count(),
            parses = self.parses.len(),
            "parsed utterance"
        );
        Ok(self.status)
    }

    /// Forget everything about the previous utterance.
    pub fn reset(&mut self) {
        self.chart.clear();
        self.trellis.clear();
        self.utterance = Utterance::default();
        self.parses.clear();
        self.status = ParseStatus::NoParse;
        self.metrics = RunMetrics::default();
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn all_parses(&self) -> &[Parse] {
        &self.parses
    }

    pub fn parse_count(&self) -> usize {
        self.parses.len()
    }

    pub fn parses_as_strings(&self, mode: ParseMode) -> Vec<String> {
        self.parses.iter().map(|parse| parse.render(self.grammar, mode)).collect()
    }

    /// Per parse, the words no slot covers.
    pub fn unparsed_sequences(&self) -> Vec<Vec<String>> {
        self.parses.iter().map(|parse| parse.unparsed_words(&self.utterance)).collect()
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> &ParseStats {
        &self.metrics.stats
    }

    pub fn chart(&self) -> &ParseChart {
        &self.chart
    }

    pub fn trellis(&self) -> &SlotTrellis {
        &self.trellis
    }

    pub fn utterance(&self) -> &Utterance {
        &self.utterance
    }
}
