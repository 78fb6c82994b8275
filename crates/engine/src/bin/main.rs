// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! sqlctx - classify SQL buffers from the command line

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlctx_catalog::StaticLoader;
use sqlctx_engine::{Dialect, EngineConfig, Position, SqlEngine, init_tracing};

/// Cursor marker accepted in `complete` input
const CURSOR: char = '█';

/// Cursor-context classification and catalog-aware completion for SQL
#[derive(Parser, Debug)]
#[command(name = "sqlctx")]
#[command(about = "SQL completion context and identifier classification", long_about = None)]
#[command(version)]
struct Args {
    /// Catalog document (YAML or JSON)
    #[arg(short = 'C', long, value_name = "FILE")]
    catalog: PathBuf,

    /// Engine config file (YAML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQL dialect, overriding the config file
    #[arg(short, long, value_parser = parse_dialect)]
    dialect: Option<Dialect>,

    /// Connected database, overriding the config file
    #[arg(long, value_name = "NAME")]
    database: Option<String>,

    /// Compact JSON output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Completion candidates at a cursor
    ///
    /// Without --line/--col the input must contain one `█` cursor marker.
    Complete {
        /// SQL file, `-` for stdin
        input: PathBuf,
        #[arg(long, requires = "col")]
        line: Option<u32>,
        #[arg(long, requires = "line")]
        col: Option<u32>,
    },
    /// Classify every identifier of a buffer
    Highlight {
        /// SQL file, `-` for stdin
        input: PathBuf,
    },
    /// Split a script into execution chunks
    Segments {
        /// SQL file, `-` for stdin
        input: PathBuf,
    },
}

fn parse_dialect(name: &str) -> Result<Dialect, String> {
    Dialect::from_name(name).ok_or_else(|| format!("unknown dialect '{}'", name))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            EngineConfig::from_yaml_str(&text).with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(dialect) = args.dialect {
        config.dialect = dialect;
    }
    if let Some(database) = &args.database {
        config.connected_database = Some(database.clone());
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(config.log_filter.as_deref());

    let loader = StaticLoader::from_file(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    let engine = SqlEngine::new(config, Arc::new(loader))?;
    tracing::info!(catalog = %args.catalog.display(), "starting sqlctx");

    match &args.command {
        Command::Complete { input, line, col } => {
            let text = read_input(input)?;
            let (text, position) = match (line, col) {
                (Some(line), Some(col)) => (text, Position::new(*line, *col)),
                _ => match marker_position(&text) {
                    Some(found) => found,
                    None => bail!("Input has no {} cursor marker; pass --line and --col", CURSOR),
                },
            };
            engine.open("input", text);
            let response = engine.complete_settled("input", position).await?;
            print_json(&response, args.compact)?;
        }
        Command::Highlight { input } => {
            engine.open("input", read_input(input)?);
            engine.catalog().settle().await;
            let mut response = engine.highlight("input")?;
            // every round resolves at least one more catalog level
            while !response.pending.is_empty() {
                engine.catalog().settle().await;
                response = engine.highlight("input")?;
            }
            print_json(&response.spans, args.compact)?;
        }
        Command::Segments { input } => {
            engine.open("input", read_input(input)?);
            print_json(&engine.segments("input")?, args.compact)?;
        }
    }
    Ok(())
}

/// Remove the cursor marker and return where it was
fn marker_position(text: &str) -> Option<(String, Position)> {
    let offset = text.find(CURSOR)?;
    Some((text.replacen(CURSOR, "", 1), Position::from_offset(text, offset)))
}
