use crate::engine::{ChartCell, DecisionCounts, ParseStatus, ParserEngine, StepSummary};
use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::morphology::Language;
use crate::parse::{Parse, ParseMode};
use std::time::Duration;

/// Default limit on nested net calls.
///
/// Each nested call holds a few native frames, so this stays well inside a
/// 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;
/// Default look-back, in slots, of the label-consistency score.
pub const DEFAULT_FRAGMENTATION_WINDOW: usize = 5;

/// Options that affect parsing and presentation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Input language; inflected languages need morphology attached to the
    /// engine to match by lemma.
    pub language: Language,
    /// Net calls nested deeper than this abort the parse with
    /// [`ParseError::DepthLimit`]. Words consumed inside one net do not
    /// count.
    pub max_depth: usize,
    pub fragmentation_window: usize,
    /// Rendering used for [`ParseResult::rendered`].
    pub mode: ParseMode,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            language: Language::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            fragmentation_window: DEFAULT_FRAGMENTATION_WINDOW,
            mode: ParseMode::default(),
        }
    }
}

/// Result from [`parse`] and [`parse_with`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed input text.
    pub text: String,
    pub status: ParseStatus,
    /// Best parses, best first.
    pub parses: Vec<Parse>,
    /// `parses` rendered with [`Options::mode`].
    pub rendered: Vec<String>,
    /// Per parse, the words no slot covers.
    pub unparsed: Vec<Vec<String>>,
    /// Total elapsed time spent matching + ranking.
    pub elapsed: Duration,
}

/// A compact chart cell summary used in verbose traces.
#[derive(Debug, Clone)]
pub struct CellSummary {
    pub net: String,
    pub start: usize,
    pub end: usize,
    pub preview: String,
}

/// Additional details returned by [`parse_verbose`] and [`parse_verbose_with`].
///
/// This is intentionally compact: it's meant for debugging and performance
/// inspection without dumping the entire internal state.
#[derive(Debug, Clone)]
pub struct ParseDetails {
    /// Total elapsed time.
    pub total: Duration,
    /// Time spent matching nets at every position.
    pub scan: Duration,
    /// Time spent picking the best slot sequences.
    pub rank: Duration,
    /// Names of the slot nets tried at every position.
    pub active_nets: Vec<String>,
    /// The marker-wrapped token sequence.
    pub tokens: Vec<String>,
    /// One representative match per (net, start, end).
    pub chart: Vec<CellSummary>,
    pub steps: Vec<StepSummary>,
    pub decisions: DecisionCounts,
    /// Number of DFS expansions (one per attempted net and position).
    pub expansions: usize,
    pub net_calls: usize,
    pub chart_hits: usize,
}

/// Result from [`parse_verbose`] and [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub text: String,
    pub status: ParseStatus,
    pub parses: Vec<Parse>,
    pub rendered: Vec<String>,
    pub unparsed: Vec<Vec<String>>,
    pub elapsed: Duration,
    pub details: ParseDetails,
}

/// Parse `text` against `grammar` with default [`Options`].
///
/// # Example
/// ```
/// use phoenix_nlu::{Grammar, ParseStatus, parse};
///
/// let grammar = Grammar::from_sources(
///     "hello 1\n",
///     "Number of Nets=1\n[Greet] 1 2 0\n0 1 0\n1 0 1\n1 0 1\n",
///     "FUNCTION: Greeting\nNETS:\n[Greet]\n;\n",
/// )?;
/// let out = parse(&grammar, "hello")?;
/// assert_eq!(out.status, ParseStatus::Success);
/// assert_eq!(out.rendered, ["Greeting:\n[Greet](HELLO)\n"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse(grammar: &Grammar, text: &str) -> Result<ParseResult, ParseError> {
    parse_with(grammar, text, &Options::default())
}

/// Parse `text` against `grammar` with the provided `options`.
///
/// No morphology is attached here, so inflected languages match surface
/// forms (logged at `warn`). Build a [`ParserEngine`] with
/// [`ParserEngine::with_morphology`] to match by lemma.
pub fn parse_with(grammar: &Grammar, text: &str, options: &Options) -> Result<ParseResult, ParseError> {
    let mut engine = ParserEngine::with_options(grammar, options.clone());
    let status = engine.parse_line(text)?;

    Ok(ParseResult {
        text: text.to_string(),
        status,
        parses: engine.all_parses().to_vec(),
        rendered: engine.parses_as_strings(options.mode),
        unparsed: engine.unparsed_sequences(),
        elapsed: engine.metrics().total,
    })
}

pub fn parse_verbose(grammar: &Grammar, text: &str) -> Result<ParseResultVerbose, ParseError> {
    parse_verbose_with(grammar, text, &Options::default())
}

/// Parse `text` and return extra (compact) debug details.
///
/// The default [`parse_with`] path does not allocate these extra traces.
pub fn parse_verbose_with(grammar: &Grammar, text: &str, options: &Options) -> Result<ParseResultVerbose, ParseError> {
    let mut engine = ParserEngine::with_options(grammar, options.clone());
    let status = engine.parse_line(text)?;
    let metrics = engine.metrics();

    let details = ParseDetails {
        total: metrics.total,
        scan: metrics.scan,
        rank: metrics.rank,
        active_nets: grammar.active_nets().iter().map(|&id| grammar.net(id).name().to_string()).collect(),
        tokens: engine.utterance().tokens().iter().map(|t| t.surface().to_string()).collect(),
        chart: engine.chart().cells().iter().map(|cell| cell_to_summary(grammar, cell)).collect(),
        steps: engine.trellis().steps(),
        decisions: metrics.stats.decisions,
        expansions: metrics.stats.total_expansions(),
        net_calls: metrics.stats.net_calls,
        chart_hits: metrics.stats.chart_hits,
    };

    Ok(ParseResultVerbose {
        text: text.to_string(),
        status,
        parses: engine.all_parses().to_vec(),
        rendered: engine.parses_as_strings(options.mode),
        unparsed: engine.unparsed_sequences(),
        elapsed: metrics.total,
        details,
    })
}

fn cell_to_summary(grammar: &Grammar, cell: &ChartCell) -> CellSummary {
    let preview = cell.tree().all_words().join(" ");
    CellSummary {
        net: grammar.net(cell.net()).name().to_string(),
        start: cell.start(),
        end: cell.end(),
        preview: preview.chars().take(80).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting_grammar() -> Grammar {
        Grammar::from_sources(
            "hello 1\nthere 2\n",
            "Number of Nets=2\n\
             [Greet] 1 3 0\n0 1 0\n1 0 1\n1 1 1\n0 2 2\n2 0 1\n\
             [_who] 2 2 1\n0 1 0\n2 0 1\n1 0 1\n",
            "FUNCTION: Greeting\nNETS:\n[Greet]\n;\n",
        )
        .unwrap()
    }

    #[test]
    fn parse_with_renders_in_the_requested_mode() {
        let grammar = greeting_grammar();

        let res = parse(&grammar, "hello there").unwrap();
        assert_eq!(res.text, "hello there");
        assert_eq!(res.status, ParseStatus::Success);
        assert!(res.elapsed >= Duration::ZERO);
        assert_eq!(res.rendered, vec!["Greeting:\n[Greet](HELLO [_who](THERE))\n".to_string()]);

        let concise = Options { mode: ParseMode::Concise, ..Options::default() };
        let res = parse_with(&grammar, "hello there", &concise).unwrap();
        assert_eq!(res.rendered, vec!["Greeting:\n[Greet] (who THERE)\n".to_string()]);

        let res = parse(&grammar, "well hello there friend").unwrap();
        assert_eq!(res.unparsed, vec![vec!["WELL".to_string(), "FRIEND".to_string()]]);

        let res = parse(&grammar, "good morning").unwrap();
        assert_eq!(res.status, ParseStatus::NoParse);
        assert!(res.parses.is_empty());
    }

    #[test]
    fn inflected_language_without_morphology_matches_surface_forms() {
        let grammar = greeting_grammar();
        let russian = Options { language: Language::Russian, ..Options::default() };
        let res = parse_with(&grammar, "hello there", &russian).unwrap();
        assert_eq!(res.status, ParseStatus::Success);
        assert_eq!(res.rendered, vec!["Greeting:\n[Greet](HELLO [_who](THERE))\n".to_string()]);
    }

    #[test]
    fn parse_verbose_includes_metrics_and_chart() {
        let grammar = greeting_grammar();
        let res = parse_verbose_with(&grammar, "hello there", &Options::default()).unwrap();

        assert_eq!(res.text, "hello there");
        assert_eq!(res.elapsed, res.details.total);
        assert!(res.details.scan <= res.details.total);
        assert_eq!(res.details.active_nets, vec!["[Greet]".to_string()]);
        assert_eq!(res.details.tokens, vec!["<s>", "HELLO", "THERE", "<e>"]);

        let spans: Vec<(&str, usize, usize)> =
            res.details.chart.iter().map(|c| (c.net.as_str(), c.start, c.end)).collect();
        assert_eq!(spans, vec![("[Greet]", 1, 2), ("[Greet]", 1, 3), ("[_who]", 2, 3)]);
        assert_eq!(res.details.chart[1].preview, "HELLO THERE");
        assert_eq!(res.details.expansions + res.details.chart_hits, res.details.net_calls);
        assert_eq!(res.details.decisions.prune_old, 2);
    }
}
