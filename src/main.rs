//! Formic CLI - runs the bot against a game server over stdin/stdout.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use formic::bot::BotConfig;
use formic::protocol::Driver;
use formic::trace::{TraceRecord, TraceWriter};

/// Formic - a deterministic Ants-challenge bot
#[derive(Parser, Debug)]
#[command(name = "formic")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a game over stdin/stdout (the mode game servers invoke)
    Run {
        /// Write a JSON-lines trace of each turn to this file
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Suppress the per-turn timing line on stderr
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match args.command {
        Commands::Run { trace, quiet } => run(trace, quiet),
    }
}

fn run(trace: Option<PathBuf>, quiet: bool) -> ExitCode {
    let mut tracer = match trace.as_deref().map(TraceWriter::create) {
        Some(Ok(tracer)) => Some(tracer),
        Some(Err(e)) => {
            eprintln!("formic: cannot create trace file: {e}");
            return ExitCode::FAILURE;
        }
        None => None,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = BufReader::new(stdin.lock());
    let writer = stdout.lock();

    let mut driver = match Driver::setup(reader, writer, BotConfig::default()) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("formic: setup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = driver.run(&mut |report| {
        if !quiet {
            eprintln!(
                "turn {} finished with {} ms remaining ({} ants, {} moves)",
                report.turn, report.remaining_ms, report.own_ants, report.moves
            );
        }
        if let Some(tracer) = tracer.as_mut()
            && let Err(e) = tracer.record(&TraceRecord::from(report))
        {
            eprintln!("formic: trace write failed: {e}");
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("formic: protocol error: {e}");
            ExitCode::FAILURE
        }
    }
}
