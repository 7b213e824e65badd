//! Engine run metrics.
//!
//! Every `ParserEngine::parse_line` call refreshes one [`RunMetrics`]:
//! wall-clock timings of the two phases plus counters that make the
//! engine's guarantees observable from tests and the CLI report.
//!
//! - `ParseStats::expansions` counts how often each `(net, position)` pair was
//!   actually expanded by DFS. Memoization means every value is exactly 1.
//! - `ParseStats::chart_hits` counts requests answered from the chart.
//! - `DecisionCounts` tallies the trellis verdicts.

use crate::grammar::NetId;
use std::collections::HashMap;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for the last `parse_line`.
    pub total: Duration,
    /// Time spent scanning positions and matching nets.
    pub scan: Duration,
    /// Time spent picking the best trellis paths.
    pub rank: Duration,
    pub stats: ParseStats,
}

/// Counters gathered while matching one utterance.
#[derive(Debug, Default, Clone)]
pub struct ParseStats {
    /// DFS expansions per `(net, start position)`.
    pub expansions: HashMap<(NetId, usize), usize>,
    /// Calls to `match_net`, memoized or not.
    pub net_calls: usize,
    /// Calls answered from the chart.
    pub chart_hits: usize,
    /// Cycles that consumed no input and were cut off.
    pub pruned_cycles: usize,
    /// Trellis verdicts for the candidates fed to it.
    pub decisions: DecisionCounts,
}

impl ParseStats {
    /// Total number of DFS expansions.
    pub fn total_expansions(&self) -> usize {
        self.expansions.values().sum()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecisionCounts {
    pub add: usize,
    pub prune_old: usize,
    pub prune_new: usize,
}
