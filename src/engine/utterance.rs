//! Utterance preparation.
//!
//! Turns raw text into the token sequence the matcher walks:
//!
//! ```text
//! "  fly to Boston "
//!      │ trim + uppercase
//!      v
//! "FLY TO BOSTON"
//!      │ split on whitespace            (non-inflected languages)
//!      │ tokenize + disambiguate        (inflected languages)
//!      v
//! <s> FLY TO BOSTON <e>
//!  0   1   2    3    4
//! ```
//!
//! Text with no words at all produces an empty utterance, without markers, so
//! nothing can match it.

use crate::morphology::{Morphology, Word};
use crate::{END_MARKER, START_MARKER, Span};

/// One position of an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    surface: String,
    analysis: Option<Word>,
}

impl Token {
    fn marker(marker: &str) -> Self {
        Token { surface: marker.to_string(), analysis: None }
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Lemma and features, present only for analysed (inflected) input.
    pub fn analysis(&self) -> Option<&Word> {
        self.analysis.as_ref()
    }

    pub fn is_boundary(&self) -> bool {
        self.surface == START_MARKER || self.surface == END_MARKER
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utterance {
    tokens: Vec<Token>,
}

impl Utterance {
    /// Tokens taken verbatim from whitespace-separated text.
    pub fn verbatim(text: &str) -> Self {
        let text = text.trim().to_uppercase();
        let tokens = text.split_whitespace().map(|w| Token { surface: w.to_string(), analysis: None }).collect();
        Self::wrap(tokens)
    }

    /// Tokens produced and analysed by the morphology collaborators.
    pub fn analysed(text: &str, morphology: &Morphology<'_>) -> Self {
        let text = text.trim().to_uppercase();
        if text.is_empty() {
            return Utterance::default();
        }
        let tokens = morphology
            .analyse(&text)
            .into_iter()
            .map(|word| Token { surface: word.surface().to_string(), analysis: Some(word) })
            .collect();
        Self::wrap(tokens)
    }

    fn wrap(words: Vec<Token>) -> Self {
        if words.is_empty() {
            return Utterance::default();
        }
        let mut tokens = Vec::with_capacity(words.len() + 2);
        tokens.push(Token::marker(START_MARKER));
        tokens.extend(words);
        tokens.push(Token::marker(END_MARKER));
        Utterance { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, position: usize) -> Option<&Token> {
        self.tokens.get(position)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Surface forms covered by `span`; positions past the end are skipped.
    pub fn words(&self, span: Span) -> Vec<&str> {
        self.tokens.iter().skip(span.start).take(span.len()).map(Token::surface).collect()
    }
}
