use phoenix_nlu::{CellSummary, Grammar, NetEvaluator, ParseResultVerbose, ParseStatus};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            self.paint(s, BOLD)
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            self.paint(s, DIM)
        }
    }
}

pub struct Report<'a> {
    pub grammar: &'a Grammar,
    /// Present when slot values should be printed.
    pub evaluator: Option<&'a NetEvaluator>,
    pub color: bool,
}

impl Report<'_> {
    /// Full report for a single utterance.
    pub fn print_run(&self, res: &ParseResultVerbose) {
        let palette = ansi::Palette::new(self.color);
        let details = &res.details;
        println!("\n{}", palette.bold(palette.paint(format!("⚙  Parsing: \"{}\"", res.text), ansi::CYAN)));

        println!("\n{}", palette.paint("━━━ Tokens ━━━", ansi::GRAY));
        let tokens: Vec<String> = details
            .tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| format!("{}{}", palette.dim(format!("{idx}:")), token))
            .collect();
        if tokens.is_empty() {
            println!("  {}", palette.dim("(no tokens)"));
        } else {
            println!("  {}", tokens.join(" "));
        }

        println!("\n{}", palette.paint("━━━ Chart ━━━", ansi::GRAY));
        println!(
            "  {} entries expanded  │  {} net calls  │  {} chart hits",
            palette.paint(details.expansions.to_string(), ansi::BLUE),
            palette.paint(details.net_calls.to_string(), ansi::BLUE),
            palette.paint(details.chart_hits.to_string(), ansi::BLUE),
        );
        for cell in details.chart.iter().take(12) {
            println!("    {}", fmt_cell_compact(cell, &palette));
        }
        if details.chart.len() > 12 {
            println!("    {}", palette.dim(format!("... +{} more", details.chart.len() - 12)));
        }

        println!("\n{}", palette.paint("━━━ Trellis ━━━", ansi::GRAY));
        for step in details.steps.iter().filter(|s| s.end > 0) {
            println!(
                "  {} {} {}",
                palette.paint(format!("end {:>2}:", step.end), ansi::YELLOW),
                palette.paint(format!("{} path(s)", step.paths), ansi::BLUE),
                palette.dim(format!(
                    "words {}  slots {}  fragmentation {}",
                    step.word_score, step.slot_count, step.fragmentation
                )),
            );
        }
        let d = details.decisions;
        println!(
            "  {}",
            palette.dim(format!("add {}  │  prune old {}  │  prune new {}", d.add, d.prune_old, d.prune_new))
        );

        println!("\n{}", palette.paint("━━━ Parses ━━━", ansi::GRAY));
        if res.status == ParseStatus::NoParse {
            println!("{}", palette.dim("  No parse"));
            println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
            println!("  • No slot net of any frame starts at any token");
            println!("  • Words are missing from the dictionary");
            println!("  • Arc features reject the analysed word forms");
            println!("\n{}", palette.dim("  Tip: Set RUST_LOG=phoenix_nlu=trace to see every net expansion"));
        } else {
            self.print_parses(res, &palette);
        }

        println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
        println!(
            "  Total: {}  │  Scan: {}  │  Rank: {}",
            palette.paint(format!("{:?}", details.total), ansi::GREEN),
            palette.paint(format!("{:?}", details.scan), ansi::CYAN),
            palette.dim(format!("{:?}", details.rank)),
        );
        println!();
    }

    /// Compact output for one line of a batch.
    pub fn print_line(&self, res: &ParseResultVerbose) {
        let palette = ansi::Palette::new(self.color);
        println!("{}", palette.bold(palette.paint(format!("> {}", res.text), ansi::CYAN)));
        if res.status == ParseStatus::NoParse {
            println!("{}", palette.dim("  No parse"));
        } else {
            self.print_parses(res, &palette);
        }
    }

    fn print_parses(&self, res: &ParseResultVerbose, palette: &ansi::Palette) {
        let rows = res.parses.iter().zip(&res.rendered).zip(&res.unparsed);
        for (idx, ((parse, rendered), leftover)) in rows.enumerate() {
            println!("  {}", palette.paint(format!("[{}]", idx), ansi::GRAY));
            for line in rendered.lines() {
                if line.ends_with(':') {
                    println!("    {}", palette.bold(palette.paint(line, ansi::GREEN)));
                } else {
                    println!("    {}", line);
                }
            }

            if !leftover.is_empty() {
                println!("    {} {}", palette.dim("unparsed:"), palette.paint(leftover.join(" "), ansi::YELLOW));
            }

            if let Some(evaluator) = self.evaluator {
                for value in evaluator.evaluate_parse(parse, self.grammar) {
                    println!(
                        "    {} {} {}",
                        palette.paint(&value.net, ansi::BLUE),
                        palette.dim("="),
                        palette.paint(format!("{:?}", value.value), ansi::GREEN),
                    );
                }
            }
        }
    }
}

fn fmt_cell_compact(cell: &CellSummary, palette: &ansi::Palette) -> String {
    format!(
        "{} {} {}",
        palette.paint(format!("{}..{}", cell.start, cell.end), ansi::YELLOW),
        palette.paint(&cell.net, ansi::BLUE),
        palette.dim(cell.preview.clone())
    )
}
