//! Error types.
//!
//! Load-time problems surface as [`GrammarFormatError`] and always name the
//! resource they came from. Misuse of the parse chart is a [`ChartError`].
//! Parse-time failures that are not simply "no interpretation" are
//! [`ParseError`]s; an utterance nothing matches is an `Ok` outcome.

use crate::grammar::NetId;
use thiserror::Error;

/// A grammar resource could not be read or is malformed.
#[derive(Debug, Error)]
pub enum GrammarFormatError {
    /// The file could not be opened or read.
    #[error("{file}: cannot read grammar resource: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// A line does not follow the expected layout.
    #[error("{file}:{line}: {reason}")]
    Malformed { file: String, line: usize, reason: String },

    /// A dictionary id outside `0..=MAX_WORD_ID`.
    #[error("{file}:{line}: word id {id} is outside the dictionary range")]
    WordIdOutOfRange { file: String, line: usize, id: i64 },

    /// Two frames share a name.
    #[error("{file}:{line}: frame `{name}` is defined twice")]
    DuplicateFrame { file: String, line: usize, name: String },

    /// A frame lists a slot net the grammar does not define.
    #[error("{file}:{line}: frame `{frame}` references unknown net `{net}`")]
    UnknownSlot { file: String, line: usize, frame: String, net: String },

    /// An arc points at a node or net that does not exist.
    #[error("{file}: net `{net}` has an arc to {target}, which does not exist")]
    DanglingReference { file: String, net: String, target: String },
}

impl GrammarFormatError {
    pub(crate) fn malformed(file: &str, line: usize, reason: impl Into<String>) -> Self {
        GrammarFormatError::Malformed { file: file.to_string(), line, reason: reason.into() }
    }
}

/// Contract violations of the parse chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// Match state was queried before any attempt was registered.
    #[error("no match attempt registered for net {net} at position {start}")]
    NoAttemptRegistered { net: NetId, start: usize },

    /// A match was filed under bounds that differ from its own.
    #[error("match spanning {actual_start}..{actual_end:?} cannot be stored under {start}..{end}")]
    InconsistentInsertion { start: usize, end: usize, actual_start: usize, actual_end: Option<usize> },
}

/// Failures while parsing one utterance.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// A slot net matched without consuming a single token.
    #[error("net `{net}` matches an empty span at position {position}; the rule accepts anything")]
    WildRule { net: String, position: usize },

    /// Net calls nested deeper than [`Options::max_depth`](crate::Options::max_depth).
    #[error("call of net `{net}` at position {position} exceeded the nesting limit of {limit}")]
    DepthLimit { net: String, position: usize, limit: usize },
}

/// Problems with a net interpretation table.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("{file}: cannot read interpretation table: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: expected `[NET]: value`")]
    Malformed { file: String, line: usize },

    #[error("{file}:{line}: `{net}` is already defined")]
    Redefinition { file: String, line: usize, net: String },
}
