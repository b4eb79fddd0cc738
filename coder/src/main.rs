//! Autonomous coding agent CLI.
//!
//! `coder run` hands one request to the agent loop and prints the final
//! response and the action ledger. `coder init` writes the default config.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use coder::core::types::ActionRecord;
use coder::exit_codes;
use coder::io::config::{CoderConfig, config_path, load_config, write_config};
use coder::io::oracle::CommandOracle;
use coder::io::workspace::LocalWorkspace;
use coder::logging;
use coder::looping::{RunOutcome, StopReason, run_agent};

#[derive(Parser)]
#[command(
    name = "coder",
    version,
    about = "Autonomous coding agent that edits a working directory one tool call at a time"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one coding request to completion.
    Run {
        /// The request. Read from stdin when omitted.
        query: Option<String>,
        /// Working directory the agent operates on.
        #[arg(long, default_value = ".")]
        workdir: PathBuf,
        /// Config file (defaults to `<workdir>/.coder/config.toml`).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the response and history as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write the default config to `<workdir>/.coder/config.toml`.
    Init {
        #[arg(long, default_value = ".")]
        workdir: PathBuf,
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            query,
            workdir,
            config,
            json,
        } => cmd_run(query, &workdir, config.as_deref(), json),
        Command::Init { workdir, force } => cmd_init(&workdir, force),
    }
}

fn cmd_run(query: Option<String>, workdir: &Path, config: Option<&Path>, json: bool) -> Result<i32> {
    let root = fs::canonicalize(workdir)
        .with_context(|| format!("resolve working directory {}", workdir.display()))?;
    let config_file = config.map_or_else(|| config_path(&root), Path::to_path_buf);
    let cfg = load_config(&config_file)?;

    let query = match query {
        Some(query) => query,
        None => prompt_for_query()?,
    };
    if query.trim().is_empty() {
        bail!("empty request");
    }

    let oracle = CommandOracle::new(cfg.oracle.clone()).with_working_dir(&root);
    let workspace = LocalWorkspace::new(&root);
    let outcome = run_agent(&oracle, &workspace, &cfg, &query, |_| {})?;

    if json {
        print_json(&outcome)?;
    } else {
        print_text(&outcome);
    }

    Ok(match outcome.stop {
        StopReason::Finished => exit_codes::OK,
        StopReason::StepLimit => exit_codes::STEP_LIMIT,
    })
}

fn cmd_init(workdir: &Path, force: bool) -> Result<i32> {
    let path = config_path(workdir);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(&path, &CoderConfig::default())?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn prompt_for_query() -> Result<String> {
    eprint!("Describe your coding request: ");
    io::stderr().flush().context("flush prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read request from stdin")?;
    Ok(line.trim().to_string())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    response: &'a str,
    history: &'a [ActionRecord],
    steps: u32,
    stop: StopReason,
}

fn print_json(outcome: &RunOutcome) -> Result<()> {
    let report = JsonReport {
        response: &outcome.response,
        history: &outcome.history,
        steps: outcome.steps,
        stop: outcome.stop,
    };
    let payload = serde_json::to_string_pretty(&report).context("serialize run report")?;
    println!("{payload}");
    Ok(())
}

fn print_text(outcome: &RunOutcome) {
    println!("=== Final Response ===");
    println!("{}", outcome.response);
    println!();
    println!("=== Action History ===");
    for (idx, record) in outcome.history.iter().enumerate() {
        let params = serde_json::Value::Object(record.params.clone());
        let result_keys = record
            .result
            .as_ref()
            .map_or_else(|| "none".to_string(), |result| format!("[{}]", result.keys().join(", ")));
        println!("{}. tool={} reason={}", idx + 1, record.tool, record.reason);
        println!("   params={params}");
        println!("   result_keys={result_keys}");
    }
    if outcome.stop == StopReason::StepLimit {
        println!();
        println!("(stopped after {} steps: step limit reached)", outcome.steps);
    }
}
