//! Parsing engine.
//!
//! This module is the entry point for turning an utterance into ranked slot
//! sequences. It is split into focused submodules under `src/engine/` while
//! keeping public paths stable (for example `crate::engine::ParserEngine`).
//!
//! ## How the parts work together
//!
//! ```text
//! text ── Utterance::verbatim / ::analysed      (utterance.rs)
//!                  │  <s> W1 W2 ... Wn <e>
//!                  v
//!        for each position, for each slot net:
//!          Matcher::match_net                    (parser.rs)
//!            - depth-first walk over net nodes
//!            - every match memoized per (net, start)
//!                  │                             (chart.rs)
//!                  v
//!          SlotTrellis::add_slot                 (trellis.rs)
//!            - add / prune per end position
//!                  │
//!                  v
//!        SlotTrellis::best_match
//!            - best end, label enumeration
//!                  │
//!                  v
//!             Vec<Parse>
//! ```
//!
//! ## Responsibilities by module
//!
//! - `utterance.rs`: uppercasing, tokenization, boundary markers, optional
//!   morphological analysis per token.
//! - `parser.rs`: `ParserEngine` (per-utterance driver) and the recursive
//!   matcher.
//! - `chart.rs`: `ParseChart`, `MatchTree`, `ChartCell`.
//! - `trellis.rs`: ranking of competing slot sequences.
//! - `metrics.rs`: timings and counters of the last run.
//!
//! ## Debugging
//!
//! Run with `RUST_LOG=phoenix_nlu=trace` to see every net expansion and
//! trellis decision.

#[path = "engine/chart.rs"]
mod chart;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;
#[path = "engine/trellis.rs"]
mod trellis;
#[path = "engine/utterance.rs"]
mod utterance;

#[allow(unused_imports)]
pub use chart::{ChartCell, MatchPart, MatchTree, ParseChart};
#[allow(unused_imports)]
pub use metrics::{DecisionCounts, ParseStats, RunMetrics};
#[allow(unused_imports)]
pub use parser::{ParseStatus, ParserEngine};
#[allow(unused_imports)]
pub use trellis::{Decision, SlotTrellis, StepSummary};
#[allow(unused_imports)]
pub use utterance::{Token, Utterance};
