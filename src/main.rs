mod debug_report;

use phoenix_nlu::{Grammar, NetEvaluator, Options, ParseMode, parse_verbose_with};
use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let paths = &config.grammar;
    let grammar = Grammar::load(&paths.dictionary, &paths.nets, &paths.frames)?;
    let evaluator = match &paths.interpretations {
        Some(path) => Some(NetEvaluator::load(path)?),
        None => None,
    };
    let options = Options { max_depth: config.max_depth, mode: config.mode, ..Options::default() };
    let report = debug_report::Report {
        grammar: &grammar,
        evaluator: if config.values { evaluator.as_ref() } else { None },
        color: config.color,
    };

    match &config.input {
        Some(input) => {
            let res = parse_verbose_with(&grammar, input, &options)?;
            report.print_run(&res);
        }
        None => {
            for line in io::stdin().lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let res = parse_verbose_with(&grammar, &line, &options)?;
                report.print_line(&res);
            }
        }
    }
    Ok(())
}

struct GrammarPaths {
    dictionary: PathBuf,
    nets: PathBuf,
    frames: PathBuf,
    interpretations: Option<PathBuf>,
}

struct CliConfig {
    grammar: GrammarPaths,
    input: Option<String>,
    mode: ParseMode,
    max_depth: usize,
    values: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut dictionary: Option<PathBuf> = None;
    let mut nets: Option<PathBuf> = None;
    let mut frames: Option<PathBuf> = None;
    let mut interpretations: Option<PathBuf> = None;
    let mut mode = ParseMode::Full;
    let mut max_depth = phoenix_nlu::DEFAULT_MAX_DEPTH;
    let mut values = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    fn value_of(flag: &str, value: Option<String>) -> Result<String, String> {
        value.ok_or_else(|| format!("error: {flag} expects a value"))
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("phoenix-nlu {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--concise" => mode = ParseMode::Concise,
            "--values" => values = true,
            "--dict" => dictionary = Some(value_of(&arg, args.next())?.into()),
            "--nets" => nets = Some(value_of(&arg, args.next())?.into()),
            "--frames" => frames = Some(value_of(&arg, args.next())?.into()),
            "--interp" => interpretations = Some(value_of(&arg, args.next())?.into()),
            "--config" => config_file = Some(value_of(&arg, args.next())?.into()),
            "--max-depth" => {
                let value = value_of(&arg, args.next())?;
                max_depth = value
                    .parse()
                    .map_err(|_| format!("error: invalid --max-depth '{value}' (expected a positive integer)"))?;
            }
            "--input" | "-i" => {
                let value = value_of(&arg, args.next())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let grammar = match (config_file, dictionary, nets, frames) {
        (Some(path), None, None, None) => {
            let mut paths = read_config(&path)?;
            if interpretations.is_some() {
                paths.interpretations = interpretations;
            }
            paths
        }
        (None, Some(dictionary), Some(nets), Some(frames)) => {
            GrammarPaths { dictionary, nets, frames, interpretations }
        }
        (Some(_), ..) => return Err("error: --config cannot be combined with --dict/--nets/--frames".to_string()),
        _ => {
            let hint = "error: a grammar is required (--config, or --dict, --nets and --frames)";
            return Err(format!("{hint}\n\n{}", help_text()));
        }
    };

    if max_depth == 0 {
        return Err("error: --max-depth must be at least 1".to_string());
    }

    Ok(CliConfig { grammar, input, mode, max_depth, values, color })
}

/// Grammar paths from a config file: dictionary, nets and frames on the
/// first three non-blank lines, an optional interpretation table on the
/// fourth. Relative paths are taken from the config file's directory.
fn read_config(path: &Path) -> Result<GrammarPaths, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("error: cannot read config '{}': {err}", path.display()))?;
    let base = path.parent().unwrap_or(Path::new(""));
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).map(|l| base.join(l));

    let mut required = |what: &str| {
        lines.next().ok_or_else(|| format!("error: config '{}' does not name the {what} file", path.display()))
    };
    let dictionary = required("dictionary")?;
    let nets = required("nets")?;
    let frames = required("frames")?;
    let interpretations = lines.next();

    Ok(GrammarPaths { dictionary, nets, frames, interpretations })
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "phoenix-nlu {version}

Semantic frame parser CLI.

Usage:
  phoenix-nlu --config <file> [OPTIONS] [--] <input...>
  phoenix-nlu --dict <file> --nets <file> --frames <file> [OPTIONS] --input <text>

Without input, every non-blank line of stdin is parsed.

Options:
  --config <file>            File naming the dictionary, nets, frames and
                             (optionally) interpretation table, one per line.
  --dict <file>              Dictionary file.
  --nets <file>              Nets file.
  --frames <file>            Frames file.
  --interp <file>            Interpretation table used by --values.
  -i, --input <text>         Input text to parse.
  --concise                  Print parses in concise form.
  --values                   Print slot values from the interpretation table.
  --max-depth <n>            Limit on nested net calls. Default: {depth}
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Logging:
  RUST_LOG=phoenix_nlu=debug shows per-parse summaries, =trace every net
  expansion.

Exit codes:
  0  Success.
  1  Grammar, table or parse error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        depth = phoenix_nlu::DEFAULT_MAX_DEPTH,
    )
}
