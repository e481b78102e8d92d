// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and their
// flags. Every ModelConfig field has a flag; defaults match
// ModelConfig::default().
//
// Optimiser and metric names are parsed with their FromStr impls,
// so a typo is rejected before anything is loaded.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::domain::config::{ModelConfig, OptimizerKind};
use crate::domain::metric::ValidationMetric;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a multi-label classifier on a data directory
    Train(TrainArgs),

    /// Label a text with a saved model
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding vectors.vec, train.jsonl and test.jsonl
    pub data_dir: PathBuf,

    /// Model name; generated from the non-default settings if omitted
    #[arg(long)]
    pub name: Option<String>,

    /// adam, rmsprop or momentum
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// val_loss, val_acc, val_hamming, val_ebf1, val_mif1 or val_maf1
    #[arg(long, default_value = "val_ebf1")]
    pub metric: ValidationMetric,

    /// Leading tokens of each document that are averaged
    #[arg(long, default_value_t = 300)]
    pub max_words: usize,

    /// Hidden layers per label classifier
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub hidden_size: usize,

    /// Vocabulary size, unknown token included
    #[arg(long, default_value_t = 300_000)]
    pub voc_size: usize,

    /// Must match the width of the pretrained vectors
    #[arg(long, default_value_t = 300)]
    pub embedding_dim: usize,

    /// Chain label classifiers in label order
    #[arg(long)]
    pub chain: bool,

    /// Keep the pretrained embeddings frozen
    #[arg(long)]
    pub fixed_emb: bool,

    /// Hinge loss on margins instead of cross-entropy
    #[arg(long)]
    pub hinge: bool,

    /// Write the best checkpoint under <DATA_DIR>/models/<name>
    #[arg(long)]
    pub save: bool,

    /// No per-epoch progress lines
    #[arg(long)]
    pub quiet: bool,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Epochs without improvement before stopping (0 = never stop early)
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Defaults to 1e-3 for adam/rmsprop and 1e-2 for momentum
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Comma-separated loss weight per label, in label order
    #[arg(long, value_delimiter = ',')]
    pub label_weights: Vec<f32>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the domain ModelConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for ModelConfig {
    fn from(a: TrainArgs) -> Self {
        ModelConfig {
            name:          a.name,
            optimizer:     a.optimizer,
            metric:        a.metric,
            max_words:     a.max_words,
            num_layers:    a.num_layers,
            hidden_size:   a.hidden_size,
            voc_size:      a.voc_size,
            embedding_dim: a.embedding_dim,
            chain:         a.chain,
            fixed_emb:     a.fixed_emb,
            hinge:         a.hinge,
            save:          a.save,
            verbose:       !a.quiet,
            epochs:        a.epochs,
            patience:      (a.patience > 0).then_some(a.patience),
            batch_size:    a.batch_size,
            learning_rate: a.learning_rate,
            label_weights: (!a.label_weights.is_empty()).then_some(a.label_weights),
            seed:          a.seed,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Data directory the model was trained in
    pub data_dir: PathBuf,

    /// Name printed by `train`
    #[arg(long)]
    pub name: String,

    /// Text to label
    #[arg(long)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(args: &[&str]) -> ModelConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Train(a) => a.into(),
            Commands::Predict(_) => panic!("expected train"),
        }
    }

    #[test]
    fn test_defaults_match_model_config() {
        assert_eq!(train_config(&["labelwise", "train", "data"]), ModelConfig::default());
    }

    #[test]
    fn test_flags_map_to_config() {
        let cfg = train_config(&[
            "labelwise", "train", "data",
            "--optimizer", "momentum",
            "--metric", "val_mif1",
            "--chain", "--hinge", "--quiet",
            "--patience", "0",
            "--label-weights", "1,0.5",
        ]);
        assert_eq!(cfg.optimizer, OptimizerKind::Momentum);
        assert_eq!(cfg.metric, ValidationMetric::MicroF1);
        assert!(cfg.chain && cfg.hinge && !cfg.verbose);
        assert_eq!(cfg.patience, None);
        assert_eq!(cfg.label_weights, Some(vec![1.0, 0.5]));
        assert_eq!(cfg.model_name(), "mlp_momentum_val_mif1_hinge_chain_patience-none_weights-1-0.5");
    }

    #[test]
    fn test_unknown_optimizer_is_rejected() {
        assert!(Cli::try_parse_from(["labelwise", "train", "data", "--optimizer", "lbfgs"]).is_err());
    }

    #[test]
    fn test_predict_args() {
        let cli = Cli::try_parse_from(["labelwise", "predict", "data", "--name", "mlp", "--text", "oil"]).unwrap();
        match cli.command {
            Commands::Predict(a) => {
                assert_eq!(a.name, "mlp");
                assert_eq!(a.text, "oil");
            }
            Commands::Train(_) => panic!("expected predict"),
        }
    }
}
