//! Parse results and their textual forms.
//!
//! A [`Parse`] is the trellis' answer for one utterance: parallel sequences
//! of frame labels and slot matches.
//!
//! ```text
//! frames: [Flight,        Flight         ]
//! slots:  [[Depart] 1..3, [Arrive] 3..5  ]
//!
//! Full:     Flight:
//!           [Depart](FROM [City](BOSTON))
//!           [Arrive](TO [City](DENVER))
//!
//! Concise:  Flight:
//!           [Depart] (City BOSTON)
//!           [Arrive] (City DENVER)
//! ```
//!
//! A frame header is printed whenever the label changes along the sequence.

use crate::engine::{ChartCell, MatchPart, MatchTree, Utterance};
use crate::grammar::{Grammar, NetType};

/// Output form of [`Parse::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Every net of every slot match, with the words it consumed.
    #[default]
    Full,
    /// Named nets only; concept leaves show their words.
    Concise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    frames: Vec<String>,
    slots: Vec<ChartCell>,
}

impl Parse {
    pub(crate) fn new(frames: Vec<String>, slots: Vec<ChartCell>) -> Self {
        debug_assert_eq!(frames.len(), slots.len());
        Parse { frames, slots }
    }

    /// Frame label of each slot.
    pub fn frame_sequence(&self) -> &[String] {
        &self.frames
    }

    /// Slot matches in utterance order.
    pub fn slots(&self) -> &[ChartCell] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True iff more than one distinct frame label appears.
    pub fn is_fragmented(&self) -> bool {
        self.frames.iter().any(|frame| *frame != self.frames[0])
    }

    /// `(frame, slot)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChartCell)> {
        self.frames.iter().map(String::as_str).zip(self.slots.iter())
    }

    pub fn render(&self, grammar: &Grammar, mode: ParseMode) -> String {
        let mut out = String::new();
        let mut current: Option<&str> = None;
        for (frame, slot) in self.iter() {
            if current != Some(frame) {
                out.push_str(frame);
                out.push_str(":\n");
                current = Some(frame);
            }
            match mode {
                ParseMode::Full => out.push_str(&render_full(grammar, slot.tree())),
                ParseMode::Concise => {
                    let pieces = render_concise(grammar, slot.tree());
                    out.push_str(&strip_outer_parens(&pieces.join(" ")));
                }
            }
            out.push('\n');
        }
        out
    }

    /// Tokens no slot covers, boundary markers excluded.
    pub fn unparsed_words(&self, utterance: &Utterance) -> Vec<String> {
        utterance
            .tokens()
            .iter()
            .enumerate()
            .filter(|(position, token)| {
                !token.is_boundary() && !self.slots.iter().any(|slot| slot.span().contains(*position))
            })
            .map(|(_, token)| token.surface().to_string())
            .collect()
    }
}

fn render_full(grammar: &Grammar, tree: &MatchTree) -> String {
    let inner: Vec<String> = tree
        .parts()
        .iter()
        .map(|part| match part {
            MatchPart::Word(word) => word.clone(),
            MatchPart::Child(child) => render_full(grammar, child),
        })
        .collect();
    format!("{}({})", grammar.net(tree.net()).name(), inner.join(" "))
}

/// AUX nets dissolve into their contents.
fn render_concise(grammar: &Grammar, tree: &MatchTree) -> Vec<String> {
    let net = grammar.net(tree.net());
    let inner: Vec<String> = if net.is_concept_leaf() {
        tree.all_words().into_iter().map(str::to_string).collect()
    } else {
        tree.children().flat_map(|child| render_concise(grammar, child)).collect()
    };

    if net.net_type() == NetType::Aux {
        return inner;
    }
    let name = net.concise_name();
    if inner.is_empty() {
        vec![format!("({name})")]
    } else {
        vec![format!("({name} {})", inner.join(" "))]
    }
}

fn strip_outer_parens(text: &str) -> String {
    match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        // Only when the parens enclose the whole text.
        Some(inner) if balanced(inner) => inner.to_string(),
        _ => text.to_string(),
    }
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
