mod renderer;
mod replay;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use promise_lens_core::{DisplayState, PanelConfig};
use tracing_subscriber::EnvFilter;

use crate::replay::{Replay, load_transcript};

/// Replay a promise-instrumentation transcript and inspect the promise tree.
#[derive(Parser, Debug)]
#[command(name = "promise-lens", version, about)]
struct Cli {
    /// JSON-lines transcript of messages sent by the observed runtime.
    transcript: PathBuf,

    /// Panel config (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay the whole transcript and print the visible rows instead of
    /// opening the interactive view.
    #[arg(long)]
    dump: bool,

    /// With --dump: expand every node first.
    #[arg(long, requires = "dump")]
    expand_all: bool,

    /// Write logs here (interactive mode logs nowhere otherwise).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false);
    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if cli.dump => builder.with_writer(io::stderr).init(),
        None => {}
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<PanelConfig> {
    let Some(path) = &cli.config else {
        return Ok(PanelConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Ok(PanelConfig::from_json(&text)?)
}

fn dump(replay: &Replay, out: &mut impl Write) -> io::Result<()> {
    match replay.panel().display_state() {
        DisplayState::Checking => writeln!(out, "(no reply to the promise support handshake)")?,
        DisplayState::Unsupported => writeln!(out, "Promises not detected!")?,
        DisplayState::AwaitingPromises => {
            writeln!(out, "(no promises yet: reload the page to attach instrumentation)")?;
        }
        DisplayState::Tree => {
            for row in replay.panel().rows() {
                let marker = match (row.has_children, row.collapsed) {
                    (false, _) => ' ',
                    (true, true) => '+',
                    (true, false) => '-',
                };
                write!(
                    out,
                    "{indent}{marker} #{guid} {label} [{status}]",
                    indent = "  ".repeat(row.depth),
                    guid = row.guid,
                    label = row.label,
                    status = row.status_text,
                )?;
                if let Some(summary) = &row.value_summary {
                    write!(out, " {summary}")?;
                }
                if let Some(elapsed) = &row.elapsed_text {
                    write!(out, " ({elapsed})")?;
                }
                writeln!(out)?;
            }
        }
    }
    for message in replay.sent() {
        let envelope = message.to_envelope();
        match envelope.payload {
            Some(payload) => writeln!(out, "-> {} {payload}", envelope.name)?,
            None => writeln!(out, "-> {}", envelope.name)?,
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = load_config(&cli)?;
    let transcript = load_transcript(&cli.transcript)?;
    let mut replay = Replay::new(config, transcript);

    if cli.dump {
        replay.replay_all();
        if cli.expand_all {
            replay.expand_all();
        }
        dump(&replay, &mut io::stdout().lock())?;
    } else {
        renderer::run_tui(&mut replay)?;
    }
    Ok(())
}
