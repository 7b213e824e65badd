use crate::engine::{ParseStatus, ParserEngine};
use crate::morphology::{Disambiguator, Language, Morphology, TagInterpreter, TaggedToken};
use crate::{DEFAULT_MAX_DEPTH, Grammar, NetArc, Options, ParseError, ParseMode};
use pretty_assertions::assert_eq;

const TRAVEL_DIC: &str = include_str!("../../grammars/travel/travel.dic");
const TRAVEL_NET: &str = include_str!("../../grammars/travel/travel.net");
const TRAVEL_FRAMES: &str = include_str!("../../grammars/travel/travel.frames");

fn travel() -> Grammar {
    Grammar::from_sources(TRAVEL_DIC, TRAVEL_NET, TRAVEL_FRAMES).unwrap()
}

fn frames_of(engine: &ParserEngine<'_>) -> Vec<Vec<String>> {
    engine.all_parses().iter().map(|p| p.frame_sequence().to_vec()).collect()
}

#[test]
fn single_word_greeting_round_trip() {
    let grammar = Grammar::from_sources(
        "hello 1\n",
        "Number of Nets=1\n[Greet] 1 2 0\n0 1 0\n1 0 1\n1 0 1\n",
        "FUNCTION: Greeting\nNETS:\n[Greet]\n;\n",
    )
    .unwrap();
    let mut engine = ParserEngine::new(&grammar);

    assert_eq!(engine.parse_line("HELLO").unwrap(), ParseStatus::Success);
    assert_eq!(engine.all_parses()[0].frame_sequence(), ["Greeting".to_string()]);
    assert_eq!(engine.parses_as_strings(ParseMode::Full), vec!["Greeting:\n[Greet](HELLO)\n".to_string()]);

    assert_eq!(engine.parse_line("hello").unwrap(), ParseStatus::Success);
}

#[test]
fn inputs_without_interpretation() {
    let grammar = travel();
    let mut engine = ParserEngine::new(&grammar);
    // (input, reason)
    let cases: Vec<(&str, &str)> = vec![
        ("", "empty"),
        ("   ", "spaces only"),
        ("\t \n", "mixed whitespace"),
        ("xyzzy", "unknown word"),
        ("boston", "sub-net that is no slot"),
        ("from", "slot missing its argument"),
    ];
    for (input, reason) in cases {
        assert_eq!(engine.parse_line(input).unwrap(), ParseStatus::NoParse, "{reason}: {input:?}");
        assert_eq!(engine.parse_count(), 0, "{reason}");
        assert!(engine.parses_as_strings(ParseMode::Full).is_empty(), "{reason}");
    }
}

#[test]
fn travel_sentences_render_in_both_modes() {
    let grammar = travel();
    let mut engine = ParserEngine::new(&grammar);

    let status = engine.parse_line("I want to fly from Boston to Denver").unwrap();
    assert_eq!(status, ParseStatus::Success);
    assert_eq!(engine.parse_count(), 1);
    assert_eq!(
        engine.parses_as_strings(ParseMode::Full)[0],
        "Flight:\n\
         [Request]([want](I WANT TO) FLY)\n\
         [Depart](FROM [_city](BOSTON))\n\
         [Arrive](TO [_city](DENVER))\n"
    );
    assert_eq!(
        engine.parses_as_strings(ParseMode::Concise)[0],
        "Flight:\n\
         [Request]\n\
         [Depart] (city BOSTON)\n\
         [Arrive] (city DENVER)\n"
    );
    assert!(!engine.all_parses()[0].is_fragmented());
    assert_eq!(engine.unparsed_sequences(), vec![Vec::<String>::new()]);
}

#[test]
fn frame_switches_and_leftover_words() {
    let grammar = travel();
    let mut engine = ParserEngine::new(&grammar);

    engine.parse_line("hello i want to fly to denver please").unwrap();
    assert_eq!(frames_of(&engine), vec![vec!["Greeting", "Flight", "Flight"]]);
    assert!(engine.all_parses()[0].is_fragmented());
    assert_eq!(
        engine.parses_as_strings(ParseMode::Full)[0],
        "Greeting:\n\
         [Greet](HELLO)\n\
         Flight:\n\
         [Request]([want](I WANT TO) FLY)\n\
         [Arrive](TO [_city](DENVER))\n"
    );
    assert_eq!(engine.unparsed_sequences(), vec![vec!["PLEASE".to_string()]]);
}

#[test]
fn longer_coverage_beats_shorter_alternatives() {
    let grammar = travel();
    let mut engine = ParserEngine::new(&grammar);
    engine.parse_line("i want to fly").unwrap();

    // [Request] also matches the bare FLY at 4..5, which must lose.
    let spans: Vec<(usize, usize)> =
        engine.all_parses()[0].slots().iter().map(|cell| (cell.start(), cell.end())).collect();
    assert_eq!(spans, vec![(1, 5)]);
    assert_eq!(engine.stats().decisions.prune_new, 1);
}

#[test]
fn reset_engine_matches_fresh_engines() {
    let grammar = travel();
    let inputs = [
        "i want to fly from boston to denver",
        "hello",
        "",
        "fly to boston please",
        "hi hi hello",
        "from denver",
    ];

    let mut reused = ParserEngine::new(&grammar);
    for input in inputs {
        reused.reset();
        let status = reused.parse_line(input).unwrap();

        let mut fresh = ParserEngine::new(&grammar);
        assert_eq!(fresh.parse_line(input).unwrap(), status, "{input}");
        assert_eq!(fresh.all_parses(), reused.all_parses(), "{input}");
        assert_eq!(fresh.parses_as_strings(ParseMode::Full), reused.parses_as_strings(ParseMode::Full));
        assert_eq!(fresh.unparsed_sequences(), reused.unparsed_sequences());
        assert_eq!(fresh.chart().cells(), reused.chart().cells());
        assert_eq!(fresh.trellis().steps(), reused.trellis().steps());
    }

    reused.reset();
    assert_eq!(reused.status(), ParseStatus::NoParse);
    assert_eq!(reused.parse_count(), 0);
    assert_eq!(reused.chart().entry_count(), 0);
}

#[test]
fn every_net_position_pair_is_expanded_once() {
    // Both slots call [_x]; the second call is served by the chart.
    let grammar = Grammar::from_sources(
        "x 1\n",
        "Number of Nets=3\n\
         [_x] 1 2 1\n0 1 0\n1 0 1\n1 0 1\n\
         [A] 2 2 0\n0 1 0\n0 1 1\n1 0 1\n\
         [B] 3 2 0\n0 1 0\n0 1 1\n1 0 1\n",
        "FUNCTION: F\nNETS:\n[A]\n[B]\n;\n",
    )
    .unwrap();
    let mut engine = ParserEngine::new(&grammar);
    engine.parse_line("x").unwrap();

    let stats = engine.stats();
    assert!(stats.expansions.values().all(|&count| count == 1), "{:?}", stats.expansions);
    assert_eq!(stats.net_calls, stats.total_expansions() + stats.chart_hits);
    // One hit per position: <s>, X and <e>.
    assert_eq!(stats.chart_hits, 3);
    assert_eq!(engine.parse_count(), 2);

    let mut engine = ParserEngine::new(&grammar);
    let travel = travel();
    let mut travel_engine = ParserEngine::new(&travel);
    engine.parse_line("x x x").unwrap();
    travel_engine.parse_line("i want to fly from boston to denver").unwrap();
    for stats in [engine.stats(), travel_engine.stats()] {
        assert!(stats.expansions.values().all(|&count| count == 1));
    }
}

#[test]
fn uniform_frame_labels_are_preferred() {
    // [A] and [B] both read X, [C] reads Y. F1 = {A, C}, F2 = {B}.
    let grammar = Grammar::from_sources(
        "x 1\ny 2\n",
        "Number of Nets=3\n\
         [A] 1 2 0\n0 1 0\n1 0 1\n1 0 1\n\
         [B] 2 2 0\n0 1 0\n1 0 1\n1 0 1\n\
         [C] 3 2 0\n0 1 0\n2 0 1\n1 0 1\n",
        "FUNCTION: F1\nNETS:\n[A]\n[C]\n;\nFUNCTION: F2\nNETS:\n[B]\n;\n",
    )
    .unwrap();
    let mut engine = ParserEngine::new(&grammar);
    engine.parse_line("x y").unwrap();

    assert_eq!(frames_of(&engine), vec![vec!["F1", "F1"]]);
    assert_eq!(engine.stats().decisions.add, 1);
}

#[test]
fn forward_and_mutual_references_resolve_on_first_use() {
    // [A] = X [B]?   [B] = Y [A]   with [B] declared after [A].
    let grammar = Grammar::from_sources(
        "x 1\ny 2\n",
        "Number of Nets=2\n\
         [A] 1 3 0\n0 1 0\n1 0 1\n1 1 1\n0 2 2\n2 0 1\n\
         [B] 2 3 0\n0 1 0\n2 0 1\n1 1 0\n0 1 2\n2 0 1\n",
        "FUNCTION: F\nNETS:\n[A]\n;\n",
    )
    .unwrap();
    let a = grammar.find_net_by_name("[A]").unwrap();
    let call_arc_resolved = |grammar: &Grammar| {
        grammar.net(a).nodes()[1].arcs().iter().any(|arc| matches!(arc, NetArc::Call { net, .. } if net.is_resolved()))
    };
    assert!(!call_arc_resolved(&grammar));

    let mut engine = ParserEngine::new(&grammar);
    assert_eq!(engine.parse_line("x y x").unwrap(), ParseStatus::Success);
    assert!(call_arc_resolved(&grammar));
    assert_eq!(engine.parses_as_strings(ParseMode::Full), vec!["F:\n[A](X [B](Y [A](X)))\n".to_string()]);
}

#[test]
fn empty_cycles_are_pruned() {
    // Nodes 0 and 1 point at each other through null arcs.
    let grammar = Grammar::from_sources(
        "x 1\n",
        "Number of Nets=1\n[Loop] 1 3 0\n0 2 0\n0 0 1\n1 0 2\n1 1 0\n0 0 0\n2 0 1\n",
        "FUNCTION: F\nNETS:\n[Loop]\n;\n",
    )
    .unwrap();
    let mut engine = ParserEngine::new(&grammar);
    assert_eq!(engine.parse_line("x").unwrap(), ParseStatus::Success);
    assert!(engine.stats().pruned_cycles > 0);
}

#[test]
fn deep_recursion_hits_the_depth_limit() {
    // [R] = X [R]?
    let grammar = Grammar::from_sources(
        "x 1\n",
        "Number of Nets=1\n[R] 1 3 0\n0 1 0\n1 0 1\n1 1 1\n0 1 2\n2 0 1\n",
        "FUNCTION: F\nNETS:\n[R]\n;\n",
    )
    .unwrap();

    let mut engine = ParserEngine::with_options(&grammar, Options { max_depth: 4, ..Options::default() });
    let err = engine.parse_line("x x x x x x").unwrap_err();
    assert!(matches!(err, ParseError::DepthLimit { limit: 4, .. }), "{err}");

    let mut engine = ParserEngine::new(&grammar);
    assert_eq!(engine.parse_line("x x x x x x").unwrap(), ParseStatus::Success);
    assert_eq!(engine.all_parses()[0].slots()[0].span().len(), 6);
}

/// Run `work` on a thread with the default spawned-thread stack size.
fn on_small_stack<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new().stack_size(2 * 1024 * 1024).spawn(work).unwrap().join().unwrap()
}

#[test]
fn looping_net_covers_a_long_utterance() {
    // [Words] = HELLO HELLO*, looping on node 1.
    let (status, covered, parses) = on_small_stack(|| {
        let grammar = Grammar::from_sources(
            "hello 1\n",
            "Number of Nets=1\n[Words] 1 2 0\n0 1 0\n1 0 1\n1 1 1\n1 0 1\n",
            "FUNCTION: F\nNETS:\n[Words]\n;\n",
        )
        .unwrap();
        let text = vec!["hello"; 500].join(" ");
        let mut engine = ParserEngine::new(&grammar);
        let status = engine.parse_line(&text).unwrap();
        (status, engine.all_parses()[0].slots()[0].span().len(), engine.parse_count())
    });
    assert_eq!((status, covered, parses), (ParseStatus::Success, 500, 1));
}

#[test]
fn deep_net_nesting_stops_at_the_default_limit() {
    // [R] = X [R]?, one nested call per token.
    let result = on_small_stack(|| {
        let grammar = Grammar::from_sources(
            "x 1\n",
            "Number of Nets=1\n[R] 1 3 0\n0 1 0\n1 0 1\n1 1 1\n0 1 2\n2 0 1\n",
            "FUNCTION: F\nNETS:\n[R]\n;\n",
        )
        .unwrap();
        let text = vec!["x"; 600].join(" ");
        ParserEngine::new(&grammar).parse_line(&text)
    });
    let ParseError::DepthLimit { net, position, limit } = result.unwrap_err() else {
        panic!("expected the depth limit");
    };
    // <s> sits at 0, so the call at depth d starts at position d + 1.
    assert_eq!((net.as_str(), position, limit), ("[R]", DEFAULT_MAX_DEPTH + 2, DEFAULT_MAX_DEPTH));
}

#[test]
fn slot_that_matches_nothing_is_a_wild_rule() {
    let grammar = Grammar::from_sources(
        "x 1\n",
        "Number of Nets=1\n[Opt] 1 2 0\n0 2 0\n0 0 1\n1 0 1\n1 0 1\n",
        "FUNCTION: F\nNETS:\n[Opt]\n;\n",
    )
    .unwrap();
    let mut engine = ParserEngine::new(&grammar);
    let err = engine.parse_line("x").unwrap_err();
    assert!(matches!(err, ParseError::WildRule { ref net, position: 0 } if net == "[Opt]"), "{err}");
}

struct CityTagger;

impl Disambiguator for CityTagger {
    fn disambiguate(&self, tokens: &[String]) -> Vec<TaggedToken> {
        tokens
            .iter()
            .map(|token| match token.as_str() {
                "В" => TaggedToken::new("в", "в", "PR"),
                "МОСКВЕ" => TaggedToken::new("москве", "москва", "S@ЖЕН@ЕД@ПР@НЕОД"),
                "МОСКВА" => TaggedToken::new("москва", "москва", "S@ЖЕН@ЕД@ИМ@НЕОД"),
                other => TaggedToken::new(other, "", "UNKNOWN"),
            })
            .collect()
    }
}

#[test]
fn inflected_words_match_by_lemma_and_case() {
    // [Dest] = В [_city]; [_city] reads МОСКВА in the locative only.
    let grammar = Grammar::from_sources(
        "москва 1\nв 2\n",
        "Number of Nets=2\n\
         [_city] 1 2 1\n0 1 0\n1 0 1 0 {ПР}\n1 0 1\n\
         [Dest] 2 3 0\n0 1 0\n2 0 1\n1 1 0\n0 1 2 1\n2 0 1\n",
        "FUNCTION: Where\nNETS:\n[Dest]\n;\n",
    )
    .unwrap();
    let interpreter = TagInterpreter::syntagrus();
    let options = Options { language: Language::Russian, ..Options::default() };
    let mut engine =
        ParserEngine::with_options(&grammar, options).with_morphology(Morphology::new(CityTagger, &interpreter));

    assert_eq!(engine.parse_line("в Москве").unwrap(), ParseStatus::Success);
    let slot = &engine.all_parses()[0].slots()[0];
    assert_eq!(slot.tree().features().get("CASE").map(String::as_str), Some("ПР"));
    assert_eq!(engine.parses_as_strings(ParseMode::Concise), vec!["Where:\n[Dest] (city МОСКВА)\n".to_string()]);

    // Nominative case is not admitted.
    assert_eq!(engine.parse_line("в Москва").unwrap(), ParseStatus::NoParse);
    assert_eq!(engine.parse_line("в Твери").unwrap(), ParseStatus::NoParse);
}
