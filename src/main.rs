// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Command-line driver for the program search.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bf_brute::config::{load_config, SearchConfig};
use bf_brute::constants::{DEFAULT_DATA_WIDTH, DEFAULT_STEP_BUDGET};
use bf_brute::search::{search, Match, Progress};
use bf_brute::{
    logging, Dialect, DivisorTable, Interpreter, Lane, MachineLimits, MemoizedData,
    ProgramEnumerator, ProgramImage, TapeMachine,
};

const REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(
    name = "bfbrute",
    version,
    about = "Brute-force search for the shortest tape programs matching examples"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search every length of a config for matching programs.
    Search {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        lanes: Option<usize>,
        #[arg(long)]
        min_length: Option<usize>,
        #[arg(long)]
        max_length: Option<usize>,
        /// Stop after the first length with a match.
        #[arg(long)]
        first: bool,
    },
    /// Estimate how many candidates one length has.
    Count {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        length: usize,
        /// Also walk every candidate and report the exact number.
        #[arg(long)]
        enumerate: bool,
    },
    /// Run one program on the tape machine and the reference interpreter.
    Run {
        source: String,
        /// Input as text.
        #[arg(long, conflicts_with = "bytes")]
        input: Option<String>,
        /// Input as comma separated byte values.
        #[arg(long, value_delimiter = ',')]
        bytes: Vec<u8>,
        #[arg(long, default_value_t = DEFAULT_DATA_WIDTH)]
        width: usize,
        #[arg(long, default_value_t = DEFAULT_STEP_BUDGET)]
        budget: usize,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Search {
            config,
            lanes,
            min_length,
            max_length,
            first,
        } => {
            let mut cfg = load_config(&config)?;
            if let Some(lanes) = lanes {
                cfg.search.lanes = lanes;
            }
            if let Some(min_length) = min_length {
                cfg.search.min_length = min_length;
            }
            if let Some(max_length) = max_length {
                cfg.search.max_length = max_length;
            }
            cfg.search.stop_at_first |= first;
            cfg.validate()
                .with_context(|| format!("invalid options for {}", config.display()))?;
            cmd_search(&cfg)
        }
        Command::Count {
            config,
            length,
            enumerate,
        } => cmd_count(&config, length, enumerate),
        Command::Run {
            source,
            input,
            bytes,
            width,
            budget,
        } => {
            let input = input.map_or(bytes, String::into_bytes);
            cmd_run(&source, &input, width, budget)
        }
    }
}

fn print_match(found: &Match) {
    match found.multiple {
        Some(multiple) => println!("{:>3} {:>3} {}", found.length, multiple, found.program),
        None => println!("{:>3} {}", found.length, found.program),
    }
}

fn cmd_search(cfg: &SearchConfig) -> Result<()> {
    let memo = MemoizedData::new(&cfg.cache).context("build fragment cache")?;
    let plan = cfg.plan();
    let progress = Progress::new();
    let (done, finished) = mpsc::channel::<()>();

    let matches = thread::scope(|scope| {
        let progress = &progress;
        scope.spawn(move || loop {
            match finished.recv_timeout(REPORT_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => {
                    let snapshot = progress.snapshot();
                    info!(
                        length = snapshot.length,
                        completion = snapshot.completion(),
                        candidates = snapshot.candidates,
                        matches = snapshot.matches,
                        "progress"
                    );
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        let result = search(&memo, &plan, progress, print_match);
        drop(done);
        result
    })?;

    info!(
        matches = matches.len(),
        candidates = progress.candidates(),
        "search finished"
    );
    Ok(())
}

fn cmd_count(config: &Path, length: usize, enumerate: bool) -> Result<()> {
    let cfg = load_config(config)?;
    let memo = MemoizedData::new(&cfg.cache).context("build fragment cache")?;
    let plan = cfg.plan();
    let mut enumerator = ProgramEnumerator::new(&memo, plan.dialect, plan.enumerator);
    let estimate = enumerator.estimate_total_candidates(length)?;
    println!("length {}: about {} candidates", length, estimate);
    if enumerate {
        enumerator.start(length, Lane::SINGLE)?;
        let mut count = 0u64;
        while enumerator.advance() {
            count += 1;
        }
        println!(
            "length {}: {} candidates, {} block values pruned",
            length,
            count,
            enumerator.pruned()
        );
    }
    Ok(())
}

fn cmd_run(source: &str, input: &[u8], width: usize, budget: usize) -> Result<()> {
    let limits = MachineLimits {
        data_width: width,
        step_budget: budget,
    };
    let image = ProgramImage::parse(source).with_context(|| format!("parse {:?}", source))?;
    let divisors = DivisorTable::new();
    let mut machine = TapeMachine::new(limits, &Dialect::data());
    match machine.run(&image, &divisors, input, 0, None) {
        Ok(()) => {
            let pointer = machine.pointer() as isize - machine.origin() as isize;
            println!(
                "machine: {} block steps, pointer {:+}, cells {:?}",
                machine.steps(),
                pointer,
                machine.cells_at(-2, 5).unwrap_or_default()
            );
        }
        Err(rejection) => println!("machine: {}", rejection),
    }

    let interpreter = Interpreter::for_machine(limits, budget.saturating_mul(1_000));
    let execution = interpreter.run(source, input, 0)?;
    println!(
        "interpreter: {} steps, pointer {:+}, cells {:?}, output {:?}",
        execution.steps,
        execution.pointer as isize - interpreter.origin() as isize,
        execution.cells_at(-2, 5).unwrap_or_default(),
        String::from_utf8_lossy(&execution.output)
    );
    Ok(())
}
