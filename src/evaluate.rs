//! Slot evaluation: turning matched nets into values.
//!
//! An interpretation table maps net names to how their matches evaluate:
//!
//! ```text
//! [_city]:  $TERM_DICTIONARY     words the match consumed, space-joined
//! [Greet]:  greeting             constant
//! (absent)                       children's values, space-joined
//! ```

use crate::engine::MatchTree;
use crate::error::EvaluatorError;
use crate::grammar::Grammar;
use crate::parse::Parse;
use std::collections::HashMap;
use std::path::Path;

/// How matches of one net evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    Constant(String),
    /// The consumed dictionary words.
    DictionaryForm,
    /// The children's values.
    Compose,
}

impl Interpretation {
    pub const TERM_DICTIONARY: &'static str = "$TERM_DICTIONARY";

    fn from_value(value: &str) -> Self {
        match value {
            Self::TERM_DICTIONARY => Interpretation::DictionaryForm,
            v if v.starts_with('$') => {
                tracing::debug!(value = v, "unknown interpretation, composing children");
                Interpretation::Compose
            }
            v => Interpretation::Constant(v.to_string()),
        }
    }
}

/// Value of one slot of a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotValue {
    pub frame: String,
    pub net: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct NetEvaluator {
    table: HashMap<String, Interpretation>,
}

impl NetEvaluator {
    pub fn from_source(text: &str) -> Result<Self, EvaluatorError> {
        Self::read("<interpretations>", text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EvaluatorError> {
        let file = path.as_ref().display().to_string();
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|source| EvaluatorError::Io { file: file.clone(), source })?;
        Self::read(&file, &text)
    }

    fn read(file: &str, text: &str) -> Result<Self, EvaluatorError> {
        let mut table = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut halves = line.split(':');
            let (Some(net), Some(value), None) = (halves.next(), halves.next(), halves.next()) else {
                return Err(EvaluatorError::Malformed { file: file.to_string(), line: line_no });
            };
            let (net, value) = (net.trim(), value.trim());
            if net.is_empty() {
                return Err(EvaluatorError::Malformed { file: file.to_string(), line: line_no });
            }
            if table.contains_key(net) {
                return Err(EvaluatorError::Redefinition {
                    file: file.to_string(),
                    line: line_no,
                    net: net.to_string(),
                });
            }
            table.insert(net.to_string(), Interpretation::from_value(value));
        }
        Ok(NetEvaluator { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Interpretation of `net`; nets without an entry compose.
    pub fn interpretation(&self, net: &str) -> &Interpretation {
        self.table.get(net).unwrap_or(&Interpretation::Compose)
    }

    pub fn evaluate(&self, tree: &MatchTree, grammar: &Grammar) -> String {
        let name = grammar.net(tree.net()).name();
        match self.interpretation(name) {
            Interpretation::Constant(value) => value.clone(),
            Interpretation::DictionaryForm => tree.all_words().join(" "),
            Interpretation::Compose => tree
                .children()
                .map(|child| self.evaluate(child, grammar))
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// One value per slot of `parse`.
    pub fn evaluate_parse(&self, parse: &Parse, grammar: &Grammar) -> Vec<SlotValue> {
        parse
            .iter()
            .map(|(frame, slot)| SlotValue {
                frame: frame.to_string(),
                net: grammar.net(slot.net()).name().to_string(),
                value: self.evaluate(slot.tree(), grammar),
            })
            .collect()
    }
}
