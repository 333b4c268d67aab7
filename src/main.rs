mod debug_report;

use rulecov::{CoverageReporter, Options, PatternChecker, RuleSet, SynthesizedExample, Synthesizer, WordList};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Synthesize,
    Coverage,
    Split,
}

struct CliConfig {
    command: Command,
    dict: PathBuf,
    rules: PathBuf,
    existing: Option<PathBuf>,
    novel: Option<PathBuf>,
    covered: Option<PathBuf>,
    options: Options,
    verbose: bool,
    color: bool,
}

fn run(config: &CliConfig) -> Result<(), String> {
    let dict = Arc::new(WordList::load(&config.dict).map_err(|e| describe(&e))?);
    let rules = RuleSet::load(&config.rules).map_err(|e| describe(&e))?;
    let mut synth = Synthesizer::with_options(Arc::clone(&dict), &config.options);

    if config.command == Command::Synthesize {
        for rule in &rules {
            if config.verbose {
                let (example, details) = synth.synthesize_verbose(rule);
                debug_report::print_rule(&example, &details, None, config.color);
            } else {
                print_example(&synth.synthesize(rule));
            }
        }
        return Ok(());
    }

    // Both remaining commands check against an existing rule set.
    let existing_path = config.existing.as_ref().ok_or_else(|| "--existing is required".to_string())?;
    let existing = RuleSet::load(existing_path).map_err(|e| describe(&e))?;
    let checker = PatternChecker::new(&existing, Arc::clone(&dict)).map_err(|e| describe(&e))?;
    let mut reporter = CoverageReporter::new(checker, synth);

    match config.command {
        Command::Coverage => {
            for rule in &rules {
                if config.verbose {
                    let (example, details) = reporter.synthesizer_mut().synthesize_verbose(rule);
                    let covered_by = reporter.covering_rules(&example.sentence).map_err(|e| describe(&e))?;
                    debug_report::print_rule(&example, &details, Some(&covered_by), config.color);
                } else {
                    let coverage = reporter.rule_coverage(rule).map_err(|e| describe(&e))?;
                    let status = if coverage.is_covered() {
                        format!("covered by {}", coverage.covered_by.iter().cloned().collect::<Vec<_>>().join(", "))
                    } else {
                        "novel".to_string()
                    };
                    println!("{}\t{}\t{}", coverage.rule_id, coverage.example.sentence, status);
                }
            }
        }
        Command::Split => {
            let mut novel = create_output(config.novel.as_ref(), "--novel")?;
            let mut covered = create_output(config.covered.as_ref(), "--covered")?;
            let report = reporter.split(&rules, &mut novel, &mut covered).map_err(|e| describe(&e))?;
            println!("{} of {} rules covered, {} novel", report.covered_count(), report.total(), report.novel_count());
        }
        Command::Synthesize => {}
    }

    Ok(())
}

fn print_example(example: &SynthesizedExample) {
    if example.is_complete() {
        println!("{}\t{}", example.rule_id, example.sentence);
    } else {
        println!("{}\t{}\t(incomplete)", example.rule_id, example.sentence);
    }
}

fn create_output(path: Option<&PathBuf>, flag: &str) -> Result<BufWriter<File>, String> {
    let path = path.ok_or_else(|| format!("{flag} is required"))?;
    let file = File::create(path).map_err(|err| format!("could not create {}: {err}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Render an error with its chain of causes.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn parse_args() -> Result<CliConfig, String> {
    let mut args = std::env::args().skip(1);

    let command = match args.next().as_deref() {
        Some("-h" | "--help") => {
            print_help();
            std::process::exit(0);
        }
        Some("-V" | "--version") => {
            println!("rulecov {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Some("synthesize") => Command::Synthesize,
        Some("coverage") => Command::Coverage,
        Some("split") => Command::Split,
        Some(other) => return Err(format!("error: unknown command '{other}'\n\n{}", help_text())),
        None => return Err(format!("error: no command given\n\n{}", help_text())),
    };

    let mut dict: Option<PathBuf> = None;
    let mut rules: Option<PathBuf> = None;
    let mut existing: Option<PathBuf> = None;
    let mut novel: Option<PathBuf> = None;
    let mut covered: Option<PathBuf> = None;
    let mut options = Options::from_env();
    let mut verbose = false;
    let mut color = io::stdout().is_terminal();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = || -> Result<String, String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => args.next().ok_or_else(|| format!("error: {flag} expects a value")),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rulecov {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "-v" | "--verbose" => verbose = true,
            "--dict" => dict = Some(PathBuf::from(value()?)),
            "--rules" => rules = Some(PathBuf::from(value()?)),
            "--existing" => existing = Some(PathBuf::from(value()?)),
            "--novel" => novel = Some(PathBuf::from(value()?)),
            "--covered" => covered = Some(PathBuf::from(value()?)),
            "--passes" => {
                let raw = value()?;
                let passes: usize = raw.parse().map_err(|_| format!("error: invalid --passes '{raw}'"))?;
                if passes == 0 {
                    return Err("error: --passes must be at least 1".to_string());
                }
                options.max_passes = passes;
            }
            "--seed" => {
                let raw = value()?;
                options.seed = Some(raw.parse().map_err(|_| format!("error: invalid --seed '{raw}'"))?);
            }
            _ => return Err(format!("error: unknown option '{arg}'")),
        }
    }

    let dict = dict.ok_or_else(|| "error: --dict is required".to_string())?;
    let rules = rules.ok_or_else(|| "error: --rules is required".to_string())?;
    if command != Command::Synthesize && existing.is_none() {
        return Err("error: --existing is required".to_string());
    }
    if command == Command::Split && (novel.is_none() || covered.is_none()) {
        return Err("error: split needs both --novel and --covered".to_string());
    }

    Ok(CliConfig { command, dict, rules, existing, novel, covered, options, verbose, color })
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "rulecov {version}

Synthesize example sentences for pattern rules and check which existing rules
already flag them.

Usage:
  rulecov synthesize --dict <tsv> --rules <toml> [OPTIONS]
  rulecov coverage   --dict <tsv> --rules <toml> --existing <toml> [OPTIONS]
  rulecov split      --dict <tsv> --rules <toml> --existing <toml>
                     --novel <out> --covered <out> [OPTIONS]

Commands:
  synthesize           Print one example sentence per rule.
  coverage             Print, per rule, its example and the existing rules
                       that fire on it.
  split                Write rules whose example no existing rule flags to
                       --novel, all others to --covered.

Options:
  --dict <path>        Dictionary dump, one word<TAB>lemma<TAB>tag per line.
  --rules <path>       Rules to synthesize examples for.
  --existing <path>    Rules of the checking engine.
  --novel <path>       Output file for uncovered rules (split).
  --covered <path>     Output file for covered rules (split).
  --passes <n>         Dictionary passes per token search. Default: {passes}
                       (env: RULECOV_MAX_PASSES)
  --seed <n>           Seed for random alternative choice (env: RULECOV_SEED).
  -v, --verbose        Print a per-token synthesis trace.
  --color              Force ANSI color output.
  --no-color           Disable ANSI color output.
  -h, --help           Show this help message.
  -V, --version        Print version information.

Logging goes to stderr and is controlled by RUST_LOG (default: warn).

Exit codes:
  0  Success.
  1  Runtime failure (unreadable input, checking engine error).
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        passes = rulecov::DEFAULT_MAX_PASSES
    )
}
