//! explain-relay: HTTP relay and batch runner for cached explanations
//!
//! Usage:
//!   explain-relay serve [--config <path>]
//!   explain-relay batch <input.json> [--models a,b] [--switch-limit N] [--output <path>] [--config <path>]
//!   explain-relay key <value>
//!   explain-relay version

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use explain_relay::cache::{derive_key, FileCache};
use explain_relay::types::{BatchRequest, BatchResponse};
use explain_relay::{BatchSummary, Relay, RelayConfig};
use serde_json::Value;

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "serve" => cmd_serve(&args[2..]).await,
        "batch" => cmd_batch(&args[2..]).await,
        "key" => cmd_key(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("explain-relay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"explain-relay: cached explanation relay

USAGE:
    explain-relay <COMMAND> [OPTIONS]

COMMANDS:
    serve [--config <path>]          Start the HTTP server
    batch <input.json> [OPTIONS]     Explain every item of a JSON array file
        --models <a,b,...>           Models to rotate through (default: configured default model)
        --switch-limit <N>           Items per model before rotating (default: 10)
        --output <path>              Write results here instead of stdout
        --config <path>              Config file
    key <value>                      Print the cache key derived for a value
    version                          Show version information
    help                             Show this help message

ENVIRONMENT:
    EXPLAIN_RELAY_CONFIG             Config file path
    GEMINI_API_KEY / GOOGLE_API_KEY  Upstream API key
    RUST_LOG                         Log filter (default: info)"#
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_config(args: &[String]) -> Result<RelayConfig> {
    let path = flag_value(args, "--config").map(PathBuf::from);
    RelayConfig::load(path.as_deref()).context("Failed to load configuration")
}

async fn cmd_serve(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    if config.api_key.is_none() {
        tracing::warn!("No GEMINI_API_KEY configured; only cached explanations will succeed");
    }
    FileCache::new(&config.cache_dir)
        .ensure_root()
        .await
        .with_context(|| format!("Failed to create cache directory {}", config.cache_dir.display()))?;

    let relay = Relay::from_config(&config)?;
    explain_relay::server::start_server(&config, relay).await?;
    Ok(())
}

async fn cmd_batch(args: &[String]) -> Result<()> {
    let Some(input) = args.first().filter(|a| !a.starts_with("--")) else {
        bail!("batch requires an input file");
    };
    let config = load_config(args)?;

    let items = read_items(Path::new(input))?;
    let models: Vec<Value> = match flag_value(args, "--models") {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| Value::String(m.to_string()))
            .collect(),
        None => vec![Value::String(config.default_model.clone())],
    };
    let switch_limit = flag_value(args, "--switch-limit").unwrap_or("10");

    let relay = Relay::from_config(&config)?;
    let start = Instant::now();
    let all_responses = relay
        .explain_batch(BatchRequest {
            json_array: items,
            models: Value::Array(models),
            model_switch_limit: Value::String(switch_limit.to_string()),
        })
        .await?;
    let summary = BatchSummary::from_outcomes(&all_responses, start.elapsed());

    let rendered = serde_json::to_string_pretty(&BatchResponse { all_responses })?;
    match flag_value(args, "--output") {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write results to {path}"))?,
        None => println!("{rendered}"),
    }

    eprintln!(
        "Batch complete: {} total, {} succeeded, {} failed, {} from cache ({:.1}s)",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.cache_hits,
        summary.elapsed.as_secs_f64()
    );
    if !summary.all_succeeded() {
        tracing::warn!(
            failed = summary.failed,
            success_rate = summary.success_rate(),
            "Some items failed; rerun the batch to retry them (successful items are cached)"
        );
    }
    Ok(())
}

fn read_items(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch input file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Batch input file {} is not valid JSON", path.display()))
}

fn cmd_key(args: &[String]) -> Result<()> {
    let Some(raw) = args.first() else {
        bail!("key requires a value");
    };
    // JSON input is canonicalized as JSON; anything else is taken as a plain string.
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()));
    println!("{}", derive_key(&value));
    Ok(())
}
