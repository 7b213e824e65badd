//! Phoenix-style semantic frame parsing.
//!
//! A grammar is a set of recursive transition networks ("nets") plus a list
//! of frames, each frame naming the nets that may fill its slots. Parsing an
//! utterance finds every way each slot net matches at each token position,
//! memoizing sub-net matches in a chart, then threads non-overlapping slot
//! matches through a trellis that prefers more covered words, then fewer
//! slots, then fewer frame switches.
//!
//! ```no_run
//! use phoenix_nlu::{Grammar, ParseMode, ParseStatus, ParserEngine};
//!
//! let grammar = Grammar::load("travel.dic", "travel.net", "travel.frames")?;
//! let mut engine = ParserEngine::new(&grammar);
//! if engine.parse_line("fly from boston to denver")? == ParseStatus::Success {
//!     for line in engine.parses_as_strings(ParseMode::Concise) {
//!         println!("{line}");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod evaluate;
mod grammar;
mod morphology;
mod parse;

pub use api::{
    CellSummary, DEFAULT_FRAGMENTATION_WINDOW, DEFAULT_MAX_DEPTH, Options, ParseDetails, ParseResult,
    ParseResultVerbose, parse, parse_verbose, parse_verbose_with, parse_with,
};
pub use engine::{
    ChartCell, Decision, DecisionCounts, MatchPart, MatchTree, ParseChart, ParseStats, ParseStatus, ParserEngine,
    RunMetrics, SlotTrellis, StepSummary, Token, Utterance,
};
pub use error::{ChartError, EvaluatorError, GrammarFormatError, ParseError};
pub use evaluate::{Interpretation, NetEvaluator, SlotValue};
pub use grammar::{
    Dictionary, FeatureSet, Frame, FrameId, Grammar, MAX_WORD_ID, Net, NetArc, NetFlags, NetId, NetLink, NetResolver,
    NetType, Node, NodeId, NodeLink,
};
pub use morphology::{
    Disambiguator, Language, Morphology, TagInterpreter, TaggedToken, Tokenizer, WhitespaceTokenizer, Word,
    split_tag_label, tagset,
};
pub use parse::{Parse, ParseMode};

// --- Core types -------------------------------------------------------------

/// Marker token placed before the first word of a non-empty utterance.
pub const START_MARKER: &str = "<s>";
/// Marker token placed after the last word of a non-empty utterance.
pub const END_MARKER: &str = "<e>";

/// Half-open range of token positions, `start..end`, over the marker-wrapped
/// utterance. Position 0 is `<s>` whenever the utterance has any words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// First covered token (inclusive).
    pub start: usize,
    /// One past the last covered token (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Number of covered tokens.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }
}
