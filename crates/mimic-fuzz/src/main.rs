//! Mimic fuzz-data CLI
//!
//! Infers type patterns from sample bodies, validates bodies against regex
//! maps and generates synthetic data.
//!
//! Usage:
//!   mimic-fuzz extract sample.json
//!   mimic-fuzz flatten sample.json > contract.json
//!   mimic-fuzz validate contract.json response.json
//!   mimic-fuzz generate sample.json --infer --count 3
//!   mimic-fuzz render body.tmpl --data request.json

use anyhow::Context;
use clap::{Parser, Subcommand};
use mimic_fuzz::{
    extract_types, flat_regex_map_with_limit, unmarshal_array_or_object, validate_regex_map,
    FixtureStore, FuzzConfig, FuzzGenerator, RegexMap, TemplateEngine, Value,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Mimic fuzz-data tool
#[derive(Parser, Debug)]
#[command(name = "mimic-fuzz")]
#[command(author, version, about = "Infer, validate and generate scenario data")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "MIMIC_FUZZ_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for reproducible generation (overrides the config)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Minimum quantifier multiplier for inferred patterns
    #[arg(long, global = true)]
    min_multiplier: Option<usize>,

    /// Maximum quantifier multiplier for inferred patterns
    #[arg(long, global = true)]
    max_multiplier: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tagged-pattern tree of a sample body
    Extract {
        path: PathBuf,
        /// Keep `__example__` values alongside inferred patterns
        #[arg(long)]
        include_type: bool,
    },
    /// Print the flattened regex map of a sample body
    Flatten { path: PathBuf },
    /// Check a body against a regex map; exits 1 on mismatch
    Validate { regex_map: PathBuf, path: PathBuf },
    /// Generate synthetic bodies from a tagged-pattern tree
    Generate {
        path: PathBuf,
        /// Treat the input as a sample body and infer its patterns first
        #[arg(long)]
        infer: bool,
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
    /// Render a `{{ ... }}` template
    Render {
        template: PathBuf,
        /// JSON/YAML data context
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{RED}Error:{RESET} {e:#}");
            std::process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when validation found a mismatch.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;
    let request = config.data_template;

    match cli.command {
        Command::Extract { path, include_type } => {
            let sample = read_body(&path)?;
            let tagged = extract_types(&sample, &request.with_include(include_type))
                .unwrap_or_default();
            print_json(&tagged)?;
        }
        Command::Flatten { path } => {
            let sample = read_body(&path)?;
            print_json(&infer_regex_map(&sample, &config))?;
        }
        Command::Validate { regex_map, path } => {
            let contents = std::fs::read_to_string(&regex_map)
                .with_context(|| format!("failed to read {}", regex_map.display()))?;
            let regex: RegexMap = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a JSON regex map", regex_map.display()))?;
            let body = read_body(&path)?;
            if let Err(e) = validate_regex_map(&body, &regex) {
                println!("{RED}{BOLD}FAIL{RESET} {}: {e}", path.display());
                return Ok(false);
            }
            println!("{GREEN}{BOLD}OK{RESET} {}", path.display());
        }
        Command::Generate { path, infer, count } => {
            let input = read_body(&path)?;
            let tagged = if infer {
                extract_types(&input, &request).unwrap_or_default()
            } else {
                input
            };
            let mut generator = FuzzGenerator::from_config(&config);
            for _ in 0..count {
                print_json(&generator.generate(&tagged))?;
            }
        }
        Command::Render { template, data } => {
            let text = std::fs::read_to_string(&template)
                .with_context(|| format!("failed to read {}", template.display()))?;
            let data = match data {
                Some(path) => read_body(&path)?,
                None => Value::Null,
            };
            let mut engine = TemplateEngine::new();
            if let Some(dir) = &config.fixtures_dir {
                engine = engine.with_fixtures(FixtureStore::new(dir));
            }
            let out = engine.render_with(&text, &data, FuzzGenerator::from_config(&config))?;
            println!("{out}");
        }
    }
    Ok(true)
}

fn load_config(cli: &Cli) -> anyhow::Result<FuzzConfig> {
    let mut config = match &cli.config {
        Some(path) => FuzzConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FuzzConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(min) = cli.min_multiplier {
        config.data_template = config.data_template.with_min_multiplier(min);
    }
    if let Some(max) = cli.max_multiplier {
        config.data_template = config.data_template.with_max_multiplier(max);
    }
    config.data_template = config.data_template.normalized();
    Ok(config)
}

fn infer_regex_map(sample: &Value, config: &FuzzConfig) -> RegexMap {
    extract_types(sample, &config.data_template)
        .map(|tagged| flat_regex_map_with_limit(&tagged, config.max_regex_len))
        .unwrap_or_default()
}

fn read_body(path: &Path) -> anyhow::Result<Value> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    unmarshal_array_or_object(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
