//! soundmaster - An ear-training trainer for the terminal.
//!
//! Plays randomized notes, intervals and chords as sine tones and scores
//! the answers typed back, keeping accuracy, streak and rank statistics
//! between sessions.
//!
//! # Usage
//!
//! ```bash
//! cargo run                                        # single notes, beginner
//! cargo run -- --mode chord --difficulty advanced
//! cargo run -- --silent --seed 7                   # no sound card needed
//! ```
//!
//! Type `help` at the prompt for the list of commands.

use anyhow::{Context, Result};
use clap::Parser;
use soundmaster::app::{Command, Input, Notice, Trainer, TrainerConfig};
use soundmaster::audio::{AudioHost, RodioHost, SilentHost, DEFAULT_VOLUME};
use soundmaster::stats::DEFAULT_STATS_PATH;
use soundmaster::training::{Difficulty, Mode};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::error;

/// Command-line options for the application.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Training mode (single-note, interval, chord, melody, rhythm)
    #[arg(long, default_value = "single-note")]
    mode: Mode,

    /// Difficulty tier (beginner, intermediate, advanced)
    #[arg(long, default_value = "beginner")]
    difficulty: Difficulty,

    /// Master volume from 0 to 1
    #[arg(long, default_value_t = DEFAULT_VOLUME)]
    volume: f32,

    /// Where statistics are kept between sessions
    #[arg(long, default_value = DEFAULT_STATS_PATH)]
    stats: PathBuf,

    /// Keep time without producing sound
    #[arg(long)]
    silent: bool,

    /// Do not play a jingle after each answer
    #[arg(long)]
    no_cues: bool,

    /// Start with empty statistics, overwriting the stored ones
    #[arg(long)]
    reset_stats: bool,

    /// Seed for a reproducible question sequence
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn config(&self) -> TrainerConfig {
        TrainerConfig {
            mode: self.mode,
            difficulty: self.difficulty,
            volume: self.volume,
            stats_path: self.stats.clone(),
            cues: !self.no_cues,
            reset_stats: self.reset_stats,
            seed: self.seed,
        }
    }

    fn host(&self) -> Box<dyn AudioHost> {
        if self.silent {
            Box::new(SilentHost::new())
        } else {
            Box::new(RodioHost::default())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays the conversation with the learner
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Audio output handles are not Send, so everything runs on one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(args));
    Ok(())
}

async fn run(args: Args) {
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel::<Notice>();
    let (input_tx, input_rx) = mpsc::unbounded_channel::<Input>();

    let printer = tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            println!("{}", notice);
        }
    });

    spawn_input_reader(input_tx);
    println!("soundmaster - type `help` for commands, `quit` to leave.");

    let mut trainer = Trainer::new(args.config(), args.host(), notice_tx);
    trainer.run(input_rx).await;

    // The trainer holds the only notice sender; dropping it lets the
    // printer drain and finish even while stdin is still open
    drop(trainer);
    if let Err(e) = printer.await {
        error!("Notice printer failed: {}", e);
    }
}

/// Reads commands from stdin on a dedicated thread.
///
/// Stdin reads block, so they stay off the async thread. The input
/// channel closes at end of input, which ends the session.
fn spawn_input_reader(inputs: UnboundedSender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            if inputs.send(line.parse::<Command>()).is_err() {
                break;
            }
        }
    });
}
