//! Line-oriented mjai filter for one seat.
//!
//! Usage:
//!   seatlog <seat> [--all] [--with-meta] [--config agent.json] \
//!           --oracle <program> [args..] < events.jsonl
//!
//! Reads one mjai event per stdin line, commits them to the seat's log,
//! asks the oracle once, and prints its decision as compact JSON.

mod process_oracle;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use seatlog_core::{AgentConfig, EventLogAdapter, Oracle, Reactions};
use seatlog_engine::{MjaiEvent, Seat};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::process_oracle::ProcessOracle;

#[derive(Parser, Debug)]
#[command(name = "seatlog", about = "Replay an mjai log for one seat and print the oracle's decision")]
struct Args {
    /// Observing seat.
    #[arg(value_parser = clap::value_parser!(u8).range(0..4))]
    seat: u8,

    /// Oracle program and its arguments. Takes the rest of the command line.
    #[arg(long, num_args = 1.., required = true, allow_hyphen_values = true)]
    oracle: Vec<String>,

    /// Print every action from the final query, not only the last one.
    #[arg(long)]
    all: bool,

    /// Keep the oracle's `meta` object in the output.
    #[arg(long)]
    with_meta: bool,

    /// JSON file with agent settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let seat = Seat::new(args.seat)?;
    let (program, program_args) = args
        .oracle
        .split_first()
        .context("--oracle needs a program")?;

    let oracle = ProcessOracle::spawn(program, program_args)
        .with_context(|| format!("failed to start oracle {program}"))?;
    let mut adapter = EventLogAdapter::new(oracle).with_keep_meta(config.keep_meta);

    let stdin = io::stdin();
    for (lineno, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let event = MjaiEvent::from_json(&line)
            .with_context(|| format!("line {}: invalid event", lineno + 1))?;
        adapter.commit(event)?;
    }
    info!(seat = seat.id(), events = adapter.len(), "log committed");

    let reactions = decide(&mut adapter, seat, &config).context("oracle query failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let printed: Vec<_> = if args.all {
        reactions.into_vec()
    } else {
        vec![reactions.last().clone()]
    };
    for reaction in printed {
        writeln!(out, "{}", reaction.to_json()?).context("failed to write stdout")?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            AgentConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => AgentConfig::default(),
    };
    if args.with_meta {
        config.keep_meta = true;
    }
    Ok(config)
}

/// Probes once, withholding the dora reveal that follows the seat's own kan
/// when configured to.
fn decide<O: Oracle>(
    adapter: &mut EventLogAdapter<O>,
    seat: Seat,
    config: &AgentConfig,
) -> seatlog_engine::SeatResult<Reactions> {
    if config.hide_dora_after_kan && dora_follows_own_kan(adapter.events(), seat) {
        debug!("withholding dora reveal after kan");
        return adapter
            .probe_with_temporary_removal(|e| matches!(e, MjaiEvent::Dora { .. }), []);
    }
    adapter.probe([])
}

fn dora_follows_own_kan<'a>(
    events: impl DoubleEndedIterator<Item = &'a MjaiEvent>,
    seat: Seat,
) -> bool {
    let mut saw_dora = false;
    for event in events.rev() {
        match event {
            MjaiEvent::Dora { .. } => saw_dora = true,
            MjaiEvent::Tsumo { actor, .. } if *actor == seat => {}
            e if e.is_kan() => return saw_dora && e.actor() == Some(seat),
            _ => return false,
        }
    }
    false
}
