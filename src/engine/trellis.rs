//! Slot trellis: ranking competing slot sequences.
//!
//! Each successful slot-net match is a candidate edge from its start position
//! to its end position. The trellis keeps, per end position ("step"), the
//! paths that reach it with the best score so far:
//!
//! ```text
//! step key:   0 ─────── 2 ─────── 4 ─── 5
//!             root      │         │
//!             [Greet]───┘         │
//!                       [City]────┘
//! ```
//!
//! ## Ranking key
//!
//! Compared lexicographically:
//!
//! 1. word score: covered tokens along the path (higher wins)
//! 2. slot count: matches used to cover them (lower wins)
//! 3. fragmentation: frame-label switches (lower wins, final selection only)
//!
//! A candidate ending at `e` either replaces everything stored at `e`
//! (`PruneOld`), is dropped (`PruneNew`) or joins the stored paths on an exact
//! tie of the first two keys (`Add`).
//!
//! ## Labels
//!
//! A slot net may belong to several frames, so every trellis node carries one
//! fragmentation value per admissible frame label. Extending a path keeps the
//! value for labels the previous node already had and charges one more switch
//! for the others. Final selection enumerates every label assignment along the
//! surviving chains and keeps those with the fewest label changes.
//!
//! ## Invariants
//!
//! - Step keys are exclusive end positions; key 0 is the root and holds no
//!   path.
//! - Candidates arrive in non-decreasing start order, so a step never gains
//!   paths after something has been attached to it.

use super::chart::ChartCell;
use super::metrics::DecisionCounts;
use crate::error::ParseError;
use crate::grammar::{FrameId, Grammar};
use crate::parse::Parse;
use crate::Span;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Verdict for a candidate at its end step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep the candidate next to the stored paths.
    Add,
    /// Replace the stored paths with the candidate.
    PruneOld,
    /// Discard the candidate.
    PruneNew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeIdx(usize);

#[derive(Debug, Clone)]
struct TrellisNode {
    cell: ChartCell,
    /// Fragmentation per admissible frame label.
    labels: BTreeMap<FrameId, usize>,
    previous: Option<NodeIdx>,
}

#[derive(Debug, Clone, Default)]
struct TrellisStep {
    paths: Vec<NodeIdx>,
    word_score: usize,
    slot_count: usize,
    fragmentation: usize,
}

/// Read-only view of one step, for reports and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub end: usize,
    pub paths: usize,
    pub word_score: usize,
    pub slot_count: usize,
    pub fragmentation: usize,
}

/// One node of a materialized chain; `next` indexes the same chain.
#[derive(Debug, Clone)]
struct ChainLink {
    cell: ChartCell,
    labels: Vec<FrameId>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct SlotTrellis {
    nodes: Vec<TrellisNode>,
    steps: BTreeMap<usize, TrellisStep>,
    decisions: DecisionCounts,
}

impl Default for SlotTrellis {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTrellis {
    pub fn new() -> Self {
        let mut steps = BTreeMap::new();
        steps.insert(0, TrellisStep::default());
        SlotTrellis { nodes: Vec::new(), steps, decisions: DecisionCounts::default() }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn decisions(&self) -> DecisionCounts {
        self.decisions
    }

    pub fn steps(&self) -> Vec<StepSummary> {
        self.steps
            .iter()
            .map(|(&end, step)| StepSummary {
                end,
                paths: step.paths.len(),
                word_score: step.word_score,
                slot_count: step.slot_count,
                fragmentation: step.fragmentation,
            })
            .collect()
    }

    /// Feed the cells of one successful slot net at one position.
    pub fn add_slot(&mut self, grammar: &Grammar, cells: &[ChartCell]) -> Result<(), ParseError> {
        for cell in cells {
            let span = cell.span();
            let net = grammar.net(cell.net());
            if span.is_empty() {
                tracing::warn!(net = net.name(), position = span.start, "slot net matched an empty span");
                return Err(ParseError::WildRule { net: net.name().to_string(), position: span.start });
            }
            if grammar.possible_frames_for_net(cell.net()).is_empty() {
                tracing::debug!(net = net.name(), "net belongs to no frame, skipping");
                continue;
            }

            let attach = self.attach_point(span.start);
            let decision = self.decide(attach, span);
            tracing::trace!(
                net = net.name(),
                start = span.start,
                end = span.end,
                attach,
                ?decision,
                "trellis candidate"
            );

            match decision {
                Decision::PruneNew => self.decisions.prune_new += 1,
                Decision::PruneOld => {
                    self.decisions.prune_old += 1;
                    self.steps.insert(span.end, TrellisStep::default());
                    self.append(grammar, cell, attach);
                }
                Decision::Add => {
                    self.decisions.add += 1;
                    self.append(grammar, cell, attach);
                }
            }
        }
        Ok(())
    }

    /// Latest step ending at or before `start`.
    fn attach_point(&self, start: usize) -> usize {
        self.steps.range(..=start).next_back().map(|(&key, _)| key).unwrap_or(0)
    }

    fn score_at(&self, key: usize) -> (usize, usize) {
        self.steps.get(&key).map(|s| (s.word_score, s.slot_count)).unwrap_or((0, 0))
    }

    fn decide(&self, attach: usize, span: Span) -> Decision {
        let (prev_words, prev_slots) = self.score_at(attach);
        let (new_words, new_slots) = (prev_words + span.len(), prev_slots + 1);
        let (old_words, old_slots) = self.score_at(span.end);

        match new_words.cmp(&old_words) {
            Ordering::Greater => Decision::PruneOld,
            Ordering::Less => Decision::PruneNew,
            Ordering::Equal => match new_slots.cmp(&old_slots) {
                Ordering::Less => Decision::PruneOld,
                Ordering::Greater => Decision::PruneNew,
                Ordering::Equal => Decision::Add,
            },
        }
    }

    fn append(&mut self, grammar: &Grammar, cell: &ChartCell, attach: usize) {
        let possible = grammar.possible_frames_for_net(cell.net());
        let (prev_words, prev_slots, prev_frag, prev_paths) = match self.steps.get(&attach) {
            Some(step) => (step.word_score, step.slot_count, step.fragmentation, step.paths.clone()),
            None => (0, 0, 0, Vec::new()),
        };

        let mut created = Vec::new();
        let mut min_frag = usize::MAX;

        if attach == 0 {
            let labels: BTreeMap<FrameId, usize> = possible.iter().map(|&f| (f, prev_frag + 1)).collect();
            min_frag = min_frag.min(prev_frag + 1);
            created.push(self.push_node(cell, labels, None));
        } else {
            for prev in prev_paths {
                let inherited = &self.nodes[prev.0].labels;
                let labels: BTreeMap<FrameId, usize> = possible
                    .iter()
                    .map(|&f| (f, inherited.get(&f).copied().unwrap_or(prev_frag + 1)))
                    .collect();
                if let Some(&lowest) = labels.values().min() {
                    min_frag = min_frag.min(lowest);
                }
                created.push(self.push_node(cell, labels, Some(prev)));
            }
        }

        let step = self.steps.entry(cell.end()).or_default();
        step.fragmentation = if step.paths.is_empty() { min_frag } else { step.fragmentation.min(min_frag) };
        step.paths.extend(created);
        step.word_score = prev_words + cell.span().len();
        step.slot_count = prev_slots + 1;
    }

    fn push_node(&mut self, cell: &ChartCell, labels: BTreeMap<FrameId, usize>, previous: Option<NodeIdx>) -> NodeIdx {
        self.nodes.push(TrellisNode { cell: cell.clone(), labels, previous });
        NodeIdx(self.nodes.len() - 1)
    }

    /// End step with the best (word score, slot count, fragmentation).
    fn best_end_step(&self) -> usize {
        let mut best = 0;
        let mut best_key = (0, 0, 0);
        for (&key, step) in &self.steps {
            let better = match step.word_score.cmp(&best_key.0) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => (step.slot_count, step.fragmentation) < (best_key.1, best_key.2),
            };
            if better {
                best = key;
                best_key = (step.word_score, step.slot_count, step.fragmentation);
            }
        }
        best
    }

    /// Walk back from `last` to the root and lay the chain out front to back.
    fn backtrack(&self, last: NodeIdx, final_labels: Vec<FrameId>) -> Vec<ChainLink> {
        let mut ids = Vec::new();
        let mut cursor = Some(last);
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.nodes[id.0].previous;
        }
        ids.reverse();

        let count = ids.len();
        let mut chain: Vec<ChainLink> = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let node = &self.nodes[id.0];
                ChainLink {
                    cell: node.cell.clone(),
                    labels: node.labels.keys().copied().collect(),
                    next: (i + 1 < count).then_some(i + 1),
                }
            })
            .collect();
        if let Some(tail) = chain.last_mut() {
            tail.labels = final_labels;
        }
        chain
    }

    /// Best interpretations, best first; empty when nothing was matched.
    pub fn best_match(&self, grammar: &Grammar, window: usize) -> Vec<Parse> {
        let best = self.best_end_step();
        if best == 0 {
            return Vec::new();
        }
        let Some(step) = self.steps.get(&best) else {
            return Vec::new();
        };

        let mut candidates: Vec<(Vec<FrameId>, Vec<ChartCell>)> = Vec::new();
        for &id in &step.paths {
            let kept: Vec<FrameId> = self.nodes[id.0]
                .labels
                .iter()
                .filter(|&(_, &frag)| frag == step.fragmentation)
                .map(|(&label, _)| label)
                .collect();
            if kept.is_empty() {
                continue;
            }
            let chain = self.backtrack(id, kept);
            let cells: Vec<ChartCell> = chain.iter().map(|link| link.cell.clone()).collect();
            let mut sequences = Vec::new();
            enumerate_labels(&chain, Some(0), &mut Vec::new(), &mut sequences);
            candidates.extend(sequences.into_iter().map(|labels| (labels, cells.clone())));
        }

        let scored: Vec<((usize, usize), Vec<FrameId>, Vec<ChartCell>)> =
            candidates.into_iter().map(|(labels, cells)| (inconsistency(&labels, window), labels, cells)).collect();
        let Some(lowest) = scored.iter().map(|(score, _, _)| *score).min() else {
            return Vec::new();
        };

        tracing::debug!(
            end = best,
            paths = step.paths.len(),
            combinations = scored.len(),
            changes = lowest.0,
            isolated = lowest.1,
            "selected best trellis step"
        );

        scored
            .into_iter()
            .filter(|(score, _, _)| *score == lowest)
            .map(|(_, labels, cells)| {
                let frames = labels.iter().map(|&id| grammar.frame(id).name().to_string()).collect();
                Parse::new(frames, cells)
            })
            .collect()
    }
}

/// Every label assignment along `chain`, starting at link `at`.
fn enumerate_labels(chain: &[ChainLink], at: Option<usize>, prefix: &mut Vec<FrameId>, out: &mut Vec<Vec<FrameId>>) {
    let Some(i) = at else {
        out.push(prefix.clone());
        return;
    };
    for &label in &chain[i].labels {
        prefix.push(label);
        enumerate_labels(chain, chain[i].next, prefix, out);
        prefix.pop();
    }
}

/// (adjacent label changes, short-range repetitions).
///
/// A position is a short-range repetition when exactly `window` other labels
/// lie between it and the previous occurrence of its label, or the start of
/// the chain. Single-slot sequences score (1, 1).
fn inconsistency(labels: &[FrameId], window: usize) -> (usize, usize) {
    if labels.len() <= 1 {
        return (1, 1);
    }
    let changes = labels.windows(2).filter(|pair| pair[0] != pair[1]).count();
    let isolated = (1..labels.len())
        .filter(|&i| labels[..i].iter().rev().take_while(|&&label| label != labels[i]).count() == window)
        .count();
    (changes, isolated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::chart::{MatchTree, ParseChart};
    use crate::grammar::NetId;

    // Three one-word nets: [A] and [B] belong to F1, [B] and [C] to F2.
    fn grammar() -> Grammar {
        Grammar::from_sources(
            "x 1\n",
            "Number of Nets=3\n\
             [A] 1 2 0\n0 1 0\n1 0 1\n1 0 1\n\
             [B] 2 2 0\n0 1 0\n1 0 1\n1 0 1\n\
             [C] 3 2 0\n0 1 0\n1 0 1\n1 0 1\n",
            "FUNCTION: F1\nNETS:\n[A]\n[B]\n;\nFUNCTION: F2\nNETS:\n[B]\n[C]\n;\n",
        )
        .unwrap()
    }

    fn cell(grammar: &Grammar, net: &str, start: usize, end: usize) -> ChartCell {
        let id: NetId = grammar.find_net_by_name(net).unwrap();
        let mut tree = MatchTree::new(id, start);
        for _ in start..end {
            tree.consume_word("X");
        }
        let done = tree.finalized();
        let mut chart = ParseChart::new();
        chart.add_match(done, start, end).unwrap();
        chart.non_empty_cells(id, start).unwrap().remove(0)
    }

    fn frames(parse: &Parse) -> Vec<&str> {
        parse.frame_sequence().iter().map(String::as_str).collect()
    }

    #[test]
    fn equal_scores_are_kept_side_by_side() {
        let g = grammar();
        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[A]", 1, 3)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[C]", 1, 3)]).unwrap();

        assert_eq!(t.decisions(), DecisionCounts { add: 1, prune_old: 1, prune_new: 0 });
        let step = t.steps().into_iter().find(|s| s.end == 3).unwrap();
        assert_eq!((step.paths, step.word_score, step.slot_count, step.fragmentation), (2, 2, 1, 1));
    }

    #[test]
    fn more_coverage_wins_regardless_of_slot_count() {
        let g = grammar();
        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[A]", 1, 3)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[A]", 3, 4)]).unwrap();
        // From the root this covers only two tokens against three.
        t.add_slot(&g, &[cell(&g, "[B]", 2, 4)]).unwrap();
        assert_eq!(t.decisions().prune_new, 1);

        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[C]", 1, 4)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[A]", 1, 2)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[B]", 2, 3)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[B]", 3, 5)]).unwrap();
        // Three short slots reach 5 covering four tokens.
        let step = t.steps().into_iter().find(|s| s.end == 5).unwrap();
        assert_eq!((step.word_score, step.slot_count), (4, 3));
    }

    #[test]
    fn fewer_slots_win_on_equal_coverage() {
        let g = grammar();
        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[A]", 1, 2)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[A]", 2, 3)]).unwrap();
        assert_eq!(t.steps().last().map(|s| (s.end, s.slot_count)), Some((3, 2)));

        t.add_slot(&g, &[cell(&g, "[C]", 1, 3)]).unwrap();
        assert_eq!(t.decisions().prune_old, 3);
        let step = t.steps().into_iter().find(|s| s.end == 3).unwrap();
        assert_eq!((step.paths, step.slot_count), (1, 1));

        // Arriving later does not change the verdict.
        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[C]", 1, 3), cell(&g, "[A]", 1, 2)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[A]", 2, 3)]).unwrap();
        assert_eq!(t.decisions().prune_new, 1);
    }

    #[test]
    fn uniform_labels_beat_alternating_ones() {
        let g = grammar();
        let mut t = SlotTrellis::new();
        // [A] is F1 only, [C] is F2 only, [B] is both.
        t.add_slot(&g, &[cell(&g, "[A]", 1, 2)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[C]", 1, 2)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[A]", 2, 3)]).unwrap();

        let parses = t.best_match(&g, 5);
        assert_eq!(parses.len(), 1);
        assert_eq!(frames(&parses[0]), vec!["F1", "F1"]);
        assert!(!parses[0].is_fragmented());
    }

    #[test]
    fn shared_labels_are_enumerated_and_ranked() {
        let g = grammar();
        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[B]", 1, 2)]).unwrap();
        t.add_slot(&g, &[cell(&g, "[C]", 2, 3)]).unwrap();

        // [B] could be F1 or F2; only F2 avoids a switch before [C].
        let parses = t.best_match(&g, 5);
        assert_eq!(parses.len(), 1);
        assert_eq!(frames(&parses[0]), vec!["F2", "F2"]);

        let mut t = SlotTrellis::new();
        t.add_slot(&g, &[cell(&g, "[B]", 1, 2)]).unwrap();
        let parses = t.best_match(&g, 5);
        let all: Vec<Vec<&str>> = parses.iter().map(frames).collect();
        assert_eq!(all, vec![vec!["F1"], vec!["F2"]]);
    }

    #[test]
    fn empty_matches_are_wild_rules() {
        let g = grammar();
        let mut t = SlotTrellis::new();
        let err = t.add_slot(&g, &[cell(&g, "[A]", 2, 2)]).unwrap_err();
        assert!(matches!(err, ParseError::WildRule { position: 2, .. }));
    }

    #[test]
    fn nothing_fed_means_no_parse() {
        let g = grammar();
        assert!(SlotTrellis::new().best_match(&g, 5).is_empty());
    }

    #[test]
    fn inconsistency_scores() {
        let f = |i| FrameId(i);
        assert_eq!(inconsistency(&[f(0)], 5), (1, 1));
        assert_eq!(inconsistency(&[f(0), f(0), f(0)], 5), (0, 0));
        assert_eq!(inconsistency(&[f(0), f(1), f(0)], 5), (2, 0));
        let long = [f(0), f(0), f(0), f(0), f(0), f(1)];
        assert_eq!(inconsistency(&long, 5), (1, 1));

        // Six labels back is farther than the window, so it does not count.
        let longer = [f(0), f(0), f(0), f(0), f(0), f(0), f(1)];
        assert_eq!(inconsistency(&longer, 5), (1, 0));
        // F0 returns after exactly five other labels.
        let returning = [f(0), f(1), f(1), f(1), f(1), f(1), f(0)];
        assert_eq!(inconsistency(&returning, 5), (2, 1));
        let nearby = [f(0), f(1), f(1), f(0), f(1), f(1), f(1)];
        assert_eq!(inconsistency(&nearby, 5), (3, 0));
    }
}
