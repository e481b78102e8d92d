// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains a classifier on a data directory
//   2. `predict` — loads a saved model and labels a text
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::predict_use_case::PredictUseCase;
use crate::application::train_use_case::TrainUseCase;
use crate::ml::InferenceBackend;

#[derive(Parser, Debug)]
#[command(
    name = "labelwise",
    version = "0.1.0",
    about = "Train multi-label text classifiers on pretrained word vectors, then label new text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Printing happens here only.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on data in: {}", args.data_dir.display());

    let data_dir = args.data_dir.clone();
    let summary = TrainUseCase::new(data_dir, args.into()).execute()?;

    println!("\nModel:  {}", summary.model_name);
    match summary.best_epoch {
        Some(epoch) => println!(
            "Best {}: {:.4} (epoch {} of {})",
            summary.metric, summary.best_value, epoch, summary.epochs_run
        ),
        None => println!("No epoch completed; best {} is {}", summary.metric, summary.best_value),
    }
    if let Some(dir) = summary.checkpoint_dir {
        println!("Checkpoint: {}", dir.display());
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let use_case = PredictUseCase::<InferenceBackend>::new(&args.data_dir, &args.name)?;

    for score in use_case.predict(&args.text)? {
        let mark = if score.decision { "yes" } else { "no" };
        println!("{:<24} {:>8.4}  {}", score.label, score.score, mark);
    }
    Ok(())
}
