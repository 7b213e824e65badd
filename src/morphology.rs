//! Morphological collaborators.
//!
//! Inflected languages need more than the raw token stream: word arcs compare
//! lemmas and grammatical features. That information comes from outside the
//! parser through two seams:
//!
//! - [`Tokenizer`]: `text -> tokens`
//! - [`Disambiguator`]: `tokens -> (surface, lemma, tag)` per token
//!
//! Raw tags are then mapped to canonical features by a [`TagInterpreter`], an
//! immutable lookup table built once and borrowed by every engine that needs
//! it. The resulting [`Word`]s are what `match_word` checks arc features
//! against.

#[path = "morphology/tagset.rs"]
pub mod tagset;

use std::collections::{BTreeMap, HashMap};
use tagset::category;
use tagset::syntagrus as tags;

/// Languages the engine knows how to prepare input for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// Tokens are taken verbatim; word arcs match surface forms.
    #[default]
    English,
    /// Tokens are analysed into lemma + features before matching.
    Russian,
}

impl Language {
    pub fn is_inflected(self) -> bool {
        matches!(self, Language::Russian)
    }
}

pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits on runs of whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        regex!(r"\S+").find_iter(text).map(|m| m.as_str().to_string()).collect()
    }
}

/// One analysed token as produced by a [`Disambiguator`].
///
/// `tag` is a `@`-joined list of raw tags, e.g. `S@ЖЕН@ЕД@ИМ@НЕОД`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub surface: String,
    pub lemma: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(surface: impl Into<String>, lemma: impl Into<String>, tag: impl Into<String>) -> Self {
        TaggedToken { surface: surface.into(), lemma: lemma.into(), tag: tag.into() }
    }
}

pub trait Disambiguator {
    fn disambiguate(&self, tokens: &[String]) -> Vec<TaggedToken>;
}

/// Everything an inflected-language engine needs besides the grammar.
pub struct Morphology<'a> {
    pub tokenizer: Box<dyn Tokenizer + 'a>,
    pub disambiguator: Box<dyn Disambiguator + 'a>,
    pub interpreter: &'a TagInterpreter,
}

impl<'a> Morphology<'a> {
    pub fn new(disambiguator: impl Disambiguator + 'a, interpreter: &'a TagInterpreter) -> Self {
        Morphology { tokenizer: Box::new(WhitespaceTokenizer), disambiguator: Box::new(disambiguator), interpreter }
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'a) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// Tokenize, disambiguate and interpret `text` (already uppercased).
    pub fn analyse(&self, text: &str) -> Vec<Word> {
        let tokens = self.tokenizer.tokenize(text);
        self.disambiguator.disambiguate(&tokens).iter().map(|t| Word::from_tagged(t, self.interpreter)).collect()
    }
}

impl std::fmt::Debug for Morphology<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Morphology")
            .field("tokenizer", &"<tokenizer>")
            .field("disambiguator", &"<disambiguator>")
            .field("interpreter", &self.interpreter)
            .finish()
    }
}

/// Split a disambiguator label into raw tags.
pub fn split_tag_label(label: &str) -> Vec<String> {
    let parts: Vec<String> = label.split('@').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect();
    if parts.first().is_none_or(|first| first == "UNKNOWN") {
        return vec![tags::POS_UNKN.to_string()];
    }
    parts
}

/// Raw tag → canonical category table.
#[derive(Debug, Clone)]
pub struct TagInterpreter {
    categories: HashMap<&'static str, &'static str>,
}

impl Default for TagInterpreter {
    fn default() -> Self {
        Self::syntagrus()
    }
}

impl TagInterpreter {
    pub fn syntagrus() -> Self {
        let table: &[(&[&'static str], &'static str)] = &[
            (
                &[
                    tags::POS_NOUN,
                    tags::POS_VERB,
                    tags::POS_ADJ,
                    tags::POS_NUMR,
                    tags::POS_ADVB,
                    tags::POS_PREP,
                    tags::POS_CONJ,
                    tags::POS_PRCL,
                    tags::POS_INTJ,
                    tags::POS_UNKN,
                    tags::POS_SENT,
                ],
                category::POS,
            ),
            (&[tags::ANIM_Y, tags::ANIM_N], category::ANIMACY),
            (
                &[tags::C_NOM, tags::C_DAT, tags::C_ACC, tags::C_ABL, tags::C_GEN1, tags::C_GEN2, tags::C_LOC1, tags::C_LOC2],
                category::CASE,
            ),
            (&[tags::N_SING, tags::N_PLUR], category::NUMBER),
            (&[tags::DEG_COMP, tags::DEG_SUPERL], category::ADJ_GRAD),
            (&[tags::A_PERF, tags::A_IMPRF], category::ASPECT),
            (&[tags::D_SHORT], category::ADJ_FORM),
            (&[tags::G_MASC, tags::G_FEMN, tags::G_NEUT], category::GENDER),
            (&[tags::VT_GRND, tags::VT_INF, tags::VT_PRT], category::VERB_FORM),
            (&[tags::M_IMPER, tags::M_INDC], category::MODE),
            (&[tags::TN_NONPAST, tags::TN_PAST, tags::TN_PRES], category::TENSE),
            (&[tags::P_1, tags::P_2, tags::P_3], category::PERSON),
            (&[tags::V_PASS], category::VOICE),
        ];

        let mut categories = HashMap::new();
        for (values, cat) in table {
            for value in *values {
                categories.insert(*value, *cat);
            }
        }
        TagInterpreter { categories }
    }

    pub fn category_of(&self, tag: &str) -> Option<&'static str> {
        self.categories.get(tag).copied()
    }

    /// Map raw tags to `category -> value`, dropping unknown tags and filling
    /// in the defaults verbs and adjectives imply.
    pub fn interpret(&self, raw: &[String]) -> BTreeMap<String, String> {
        let mut features = BTreeMap::new();
        for tag in raw {
            if let Some(cat) = self.category_of(tag) {
                features.insert(cat.to_string(), tag.clone());
            }
        }

        match features.get(category::POS).map(String::as_str) {
            Some(tags::POS_VERB) => complete_verb(&mut features),
            Some(tags::POS_ADJ) => complete_adjective(&mut features),
            _ => {}
        }
        features
    }
}

fn complete_verb(features: &mut BTreeMap<String, String>) {
    if features.get(category::MODE).map(String::as_str) == Some(tags::M_IMPER) {
        return;
    }
    let form = features.entry(category::VERB_FORM.to_string()).or_insert_with(|| tags::VT_FIN.to_string());
    if form.as_str() == tags::VT_INF {
        return;
    }

    let aspect = features.get(category::ASPECT).map(String::as_str);
    let tense = features.get(category::TENSE).map(String::as_str);
    let time = match (aspect, tense) {
        (_, Some(tags::TN_PRES)) => Some(tags::TIME_PRESENT),
        (_, Some(tags::TN_PAST)) => Some(tags::TIME_PAST),
        (Some(tags::A_PERF), Some(tags::TN_NONPAST)) => Some(tags::TIME_FUTURE),
        (Some(tags::A_IMPRF), Some(tags::TN_NONPAST)) => Some(tags::TIME_PRESENT),
        _ => None,
    };
    if let Some(time) = time {
        features.insert(category::TIME.to_string(), time.to_string());
    }
    features.entry(category::VOICE.to_string()).or_insert_with(|| tags::V_ACT.to_string());
}

fn complete_adjective(features: &mut BTreeMap<String, String>) {
    if !features.contains_key(category::ADJ_GRAD) && !features.contains_key(category::ADJ_FORM) {
        features.insert(category::ADJ_GRAD.to_string(), tags::DEG_POSITIVE.to_string());
    }
    features.entry(category::ADJ_FORM.to_string()).or_insert_with(|| tags::D_FULL.to_string());
}

/// An analysed token: surface form, lemma and canonical features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    surface: String,
    lemma: String,
    features: BTreeMap<String, String>,
}

impl Word {
    pub fn new(lemma: &str, raw_tags: &[String], surface: &str, interpreter: &TagInterpreter) -> Self {
        let surface = surface.to_uppercase();
        let mut features = interpreter.interpret(raw_tags);
        if tags::FUTURE_AUXILIARY.contains(&surface.as_str()) {
            features.insert(category::TIME.to_string(), tags::TIME_FUTURE.to_string());
        }
        Word { surface, lemma: lemma.to_uppercase(), features }
    }

    /// A token the disambiguator could not lemmatize keeps its surface form
    /// as lemma and is tagged as unknown.
    pub fn from_tagged(token: &TaggedToken, interpreter: &TagInterpreter) -> Self {
        let mut raw = split_tag_label(&token.tag);
        let lemma = if token.lemma.trim().is_empty() {
            if !raw.iter().any(|t| t == tags::POS_UNKN) {
                raw.push(tags::POS_UNKN.to_string());
            }
            token.surface.as_str()
        } else {
            token.lemma.as_str()
        };
        Word::new(lemma, &raw, &token.surface, interpreter)
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn feature(&self, category: &str) -> Option<&str> {
        self.features.get(category).map(String::as_str)
    }

    pub fn has_feature(&self, category: &str) -> bool {
        self.features.contains_key(category)
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    /// Feature values regardless of category, as used by arc constraints.
    pub fn feature_values(&self) -> impl Iterator<Item = &str> + Clone {
        self.features.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str) -> Vec<String> {
        split_tag_label(label)
    }

    #[test]
    fn labels_split_on_at_sign() {
        assert_eq!(raw("S@ЖЕН@ЕД@ИМ"), vec!["S", "ЖЕН", "ЕД", "ИМ"]);
        assert_eq!(raw(""), vec!["NID"]);
        assert_eq!(raw("UNKNOWN"), vec!["NID"]);
    }

    #[test]
    fn nouns_keep_their_grammemes() {
        let interp = TagInterpreter::syntagrus();
        let f = interp.interpret(&raw("S@ЖЕН@ЕД@ИМ@НЕОД@XYZ"));
        assert_eq!(f.get("POS").map(String::as_str), Some("S"));
        assert_eq!(f.get("CASE").map(String::as_str), Some("ИМ"));
        assert_eq!(f.get("ANIMACY").map(String::as_str), Some("НЕОД"));
        assert_eq!(f.len(), 5);
    }

    #[test]
    fn verbs_get_time_form_and_voice() {
        let interp = TagInterpreter::syntagrus();

        let f = interp.interpret(&raw("V@СОВ@ИЗЪЯВ@НЕПРОШ@ЕД@3-Л"));
        assert_eq!(f.get("TIME").map(String::as_str), Some("fut"));
        assert_eq!(f.get("VERB_FORM").map(String::as_str), Some("fin"));
        assert_eq!(f.get("VOICE").map(String::as_str), Some("act"));

        let f = interp.interpret(&raw("V@НЕСОВ@ИЗЪЯВ@НЕПРОШ"));
        assert_eq!(f.get("TIME").map(String::as_str), Some("pres"));

        let f = interp.interpret(&raw("V@НЕСОВ@ПРОШ@СТРАД"));
        assert_eq!(f.get("TIME").map(String::as_str), Some("past"));
        assert_eq!(f.get("VOICE").map(String::as_str), Some("СТРАД"));

        let f = interp.interpret(&raw("V@НЕСОВ@ИНФ"));
        assert_eq!(f.get("TIME"), None);
        assert_eq!(f.get("VOICE"), None);

        let f = interp.interpret(&raw("V@СОВ@ПОВ"));
        assert_eq!(f.get("VERB_FORM"), None);
    }

    #[test]
    fn adjectives_default_to_positive_full_form() {
        let interp = TagInterpreter::syntagrus();
        let f = interp.interpret(&raw("A@ЕД@ИМ"));
        assert_eq!(f.get("ADJ_GRAD").map(String::as_str), Some("pos"));
        assert_eq!(f.get("ADJ_FORM").map(String::as_str), Some("full"));

        let f = interp.interpret(&raw("A@КР@ЕД"));
        assert_eq!(f.get("ADJ_GRAD"), None);
        assert_eq!(f.get("ADJ_FORM").map(String::as_str), Some("КР"));
    }

    #[test]
    fn words_from_tagged_tokens() {
        let interp = TagInterpreter::syntagrus();
        let word = Word::from_tagged(&TaggedToken::new("будет", "быть", "V@НЕСОВ@НЕПРОШ"), &interp);
        assert_eq!(word.lemma(), "БЫТЬ");
        assert_eq!(word.feature("TIME"), Some("fut"));

        let unknown = Word::from_tagged(&TaggedToken::new("xyz", "", "S"), &interp);
        assert_eq!(unknown.lemma(), "XYZ");
        assert!(unknown.feature_values().any(|v| v == "NID"));
    }
}
