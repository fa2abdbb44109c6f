use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use fire_persist_core::{ConfigLayers, FireInformation, PersistenceEngine, PersistenceOutcome};
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Extend fire activity through the dispersion window
#[derive(Parser, Debug)]
#[command(name = "persist-headless")]
#[command(about = "Persist fire activity through the dispersion window", long_about = None)]
struct Args {
    /// Fire information JSON to read (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the persisted fire information (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config document layered over the input's own config (repeatable)
    #[arg(short = 'c', long = "config")]
    config_files: Vec<PathBuf>,

    /// Config override applied after config files (repeatable)
    #[arg(short = 'C', long = "set", value_name = "SECTION.KEY=VALUE")]
    overrides: Vec<String>,

    /// Dispersion start, e.g. 2015-08-04T00:00:00
    #[arg(long)]
    start: Option<NaiveDateTime>,

    /// Dispersion length in hours
    #[arg(long)]
    num_hours: Option<u32>,

    /// Drop fires and activity entirely outside the dispersion window
    #[arg(long)]
    prune_unused: bool,

    /// Persist fires on all cores
    #[arg(long)]
    parallel: bool,

    /// Write compact instead of pretty-printed JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean JSON stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut fire_info = read_fire_information(args.input.as_deref())?;
    let layers = layer_config(&args, std::mem::take(&mut fire_info.config))?;
    let config = layers
        .resolve()
        .context("Failed to read persistence configuration")?;
    fire_info.config = layers.into_value();

    info!("Persisting {} fires", fire_info.fire_information.len());
    let engine = PersistenceEngine::new(config);
    let outcome = if args.parallel {
        engine.run_parallel(&mut fire_info.fire_information)
    } else {
        engine.run(&mut fire_info.fire_information)
    }
    .context("Failed to resolve dispersion window")?;

    if !outcome.failures.is_empty() {
        warn!("{} fires failed persistence", outcome.failures.len());
    }

    let mut output = serde_json::to_value(&fire_info)?;
    if let Value::Object(map) = &mut output {
        map.insert("persistence".to_owned(), summary(&outcome));
    }
    write_output(args.output.as_deref(), &output, args.compact)
}

fn read_fire_information(path: Option<&Path>) -> Result<FireInformation> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("Failed to parse fire information")
}

/// Input config, then config files in order, then `-C` overrides, then shorthand flags
fn layer_config(args: &Args, base: Value) -> Result<ConfigLayers> {
    let mut layers = ConfigLayers::new(base);

    for path in &args.config_files {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let document: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        layers.merge_document(document);
    }

    for assignment in &args.overrides {
        layers.apply_override(assignment)?;
    }

    if let Some(start) = args.start {
        layers.set("dispersion.start", json!(start))?;
    }
    if let Some(num_hours) = args.num_hours {
        layers.set("dispersion.num_hours", json!(num_hours))?;
    }
    if args.prune_unused {
        layers.set("persistence.prune_unused_fires", Value::Bool(true))?;
    }

    Ok(layers)
}

fn summary(outcome: &PersistenceOutcome) -> Value {
    let failures: Vec<Value> = outcome
        .failures
        .iter()
        .map(|failure| {
            json!({
                "fire_id": failure.fire_id,
                "event_id": failure.event_id,
                "error": failure.error.to_string(),
            })
        })
        .collect();

    json!({
        "created": outcome.created,
        "window": outcome.window,
        "failures": failures,
        "pruned": outcome.pruned,
    })
}

fn write_output(path: Option<&Path>, output: &Value, compact: bool) -> Result<()> {
    let mut text = if compact {
        serde_json::to_string(output)?
    } else {
        serde_json::to_string_pretty(output)?
    };
    text.push('\n');

    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .context("Failed to write stdout"),
    }
}
