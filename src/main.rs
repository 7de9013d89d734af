mod report;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use verdict_engine::{Collaborators, Context, EngineConfig, MemoryStore, Options, ProductInput, Verdict, decide_verbose_with};

const LOG_ENV: &str = "VERDICT_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let now = Utc::now();
    let cli = match parse_args(now) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    match run(&cli, now) {
        Ok(can_save) => std::process::exit(if can_save { 0 } else { 3 }),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &CliConfig, now: DateTime<Utc>) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let env: HashMap<String, String> = std::env::vars().collect();
    let overridden = config.apply_env_overrides(&env)?;
    if !overridden.is_empty() {
        tracing::info!(keys = ?overridden, "configuration overridden from environment");
    }

    let store = match &cli.fixture {
        Some(path) => MemoryStore::from_fixture_json(&std::fs::read_to_string(path)?)?,
        None => MemoryStore::new(),
    };

    let product = ProductInput {
        ingredients_text: cli.ingredients.clone(),
        category_path: cli.category.clone(),
        category_id: None,
        proposed_verdict: cli.proposed,
        verdict_override: cli.verdict_override,
        last_reviewed: cli.reviewed,
    };
    let options = Options { config, ..Options::default() };
    let run = decide_verbose_with(&product, Collaborators::from_store(&store), &Context { now }, &options)?;

    report::print_run(&cli.ingredients, &run, cli.color);
    Ok(run.decision.can_save)
}

struct CliConfig {
    ingredients: String,
    fixture: Option<PathBuf>,
    config: Option<PathBuf>,
    category: Option<String>,
    proposed: Option<Verdict>,
    verdict_override: bool,
    reviewed: Option<DateTime<Utc>>,
    color: bool,
}

fn parse_args(now: DateTime<Utc>) -> Result<CliConfig, String> {
    let mut ingredients: Option<String> = None;
    let mut fixture = None;
    let mut config = None;
    let mut category = None;
    let mut proposed = None;
    let mut verdict_override = false;
    let mut reviewed = None;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline.clone().or_else(|| args.next()).ok_or_else(|| format!("error: {name} expects a value"))
        };

        match flag.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("verdict {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--override" => verdict_override = true,
            "--fixture" | "-f" => fixture = Some(PathBuf::from(value("--fixture")?)),
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--category" | "-c" => category = Some(value("--category")?),
            "--proposed" | "-p" => {
                let raw = value("--proposed")?;
                proposed = Some(raw.parse::<Verdict>().map_err(|err| format!("error: {err}"))?);
            }
            "--reviewed" => reviewed = Some(parse_reviewed(&value("--reviewed")?, now)?),
            "--ingredients" | "-i" => {
                if ingredients.is_some() {
                    return Err("error: ingredients provided multiple times".to_string());
                }
                ingredients = Some(value("--ingredients")?);
            }
            "--" => {
                let rest = args.by_ref().collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if ingredients.is_some() {
                        return Err("error: ingredients provided multiple times".to_string());
                    }
                    ingredients = Some(rest);
                }
                break;
            }
            _ if arg.starts_with('-') => return Err(format!("error: unknown option '{arg}'")),
            _ => {
                let rest = std::iter::once(arg).chain(args.by_ref()).collect::<Vec<_>>().join(" ");
                if ingredients.is_some() {
                    return Err("error: ingredients provided multiple times".to_string());
                }
                ingredients = Some(rest);
                break;
            }
        }
    }

    let ingredients = match ingredients {
        Some(value) => value,
        None if io::stdin().is_terminal() => String::new(),
        None => read_stdin_input()?,
    };

    if ingredients.trim().is_empty() && category.is_none() {
        return Err(format!("error: no ingredients provided\n\n{}", help_text()));
    }

    Ok(CliConfig { ingredients, fixture, config, category, proposed, verdict_override, reviewed, color })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

/// RFC 3339 first, then informal English ("3 months ago", "last friday").
fn parse_reviewed(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    chrono_english::parse_date_string(value, now, chrono_english::Dialect::Uk)
        .map_err(|err| format!("error: invalid --reviewed '{value}': {err}"))
}

fn help_text() -> String {
    format!(
        "verdict {version}

Resolve an ingredient list, evaluate verdict rules, and check for conflicts.

Usage:
  verdict [OPTIONS] [--] <ingredients...>
  verdict [OPTIONS] --ingredients <text>

Options:
  -i, --ingredients <text>   Raw ingredient list. If omitted, reads remaining args
                             or stdin.
  -f, --fixture <file>       JSON with \"catalog\", \"rules\" and \"categories\" arrays.
  -c, --category <path>      Category path, e.g. \"Food & Beverage > Protein Bars\".
  -p, --proposed <verdict>   Proposed verdict: recommend, caution or avoid.
  --override                 Override a blocking verdict conflict.
  --reviewed <when>          Last review time (RFC 3339 or e.g. \"3 months ago\").
  --config <file>            Engine configuration JSON.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}                  Log filter (default: warn).
  VERDICT_FUZZY_MATCHING, VERDICT_FUZZY_THRESHOLD, VERDICT_MAX_ACTIVE_RULES
                             Override configuration values.

Exit codes:
  0  Save allowed.
  1  Internal error.
  2  Invalid arguments or missing input.
  3  Save vetoed by a verdict conflict.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}
