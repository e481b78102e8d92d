// ============================================================
// Layer 3 — Model Configuration
// ============================================================
// One immutable record describing a model and how it is trained.
// String-valued choices (optimizer, metric) are closed enums
// parsed eagerly, so an unknown name fails before anything is
// built.
//
// The generated model name doubles as the checkpoint key: two
// trainers with the same non-default configuration share one
// checkpoint slot on disk.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::domain::error::{TrainError, TrainResult};
use crate::domain::labels::LabelSet;
use crate::domain::metric::ValidationMetric;

/// Gradient-based update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    RmsProp,
    /// SGD with classical momentum
    Momentum,
}

impl OptimizerKind {
    pub fn name(self) -> &'static str {
        match self {
            OptimizerKind::Adam     => "adam",
            OptimizerKind::RmsProp  => "rmsprop",
            OptimizerKind::Momentum => "momentum",
        }
    }

    /// Learning rate used when the configuration leaves it unset.
    pub fn default_learning_rate(self) -> f64 {
        match self {
            OptimizerKind::Adam | OptimizerKind::RmsProp => 1e-3,
            OptimizerKind::Momentum => 1e-2,
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adam"     => Ok(OptimizerKind::Adam),
            "rmsprop"  => Ok(OptimizerKind::RmsProp),
            "momentum" => Ok(OptimizerKind::Momentum),
            other => Err(TrainError::Configuration(format!(
                "unknown optimizer '{other}' (expected one of: adam, rmsprop, momentum)"
            ))),
        }
    }
}

/// Training objective of every per-label classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// Binary cross-entropy; outputs are probabilities
    CrossEntropy,
    /// Maximum margin; outputs are raw margins
    Hinge,
}

impl LossKind {
    pub fn from_hinge_flag(hinge: bool) -> Self {
        if hinge { LossKind::Hinge } else { LossKind::CrossEntropy }
    }

    /// Cutoff applied to decoder outputs to obtain a positive decision.
    pub fn output_threshold(self) -> f64 {
        match self {
            LossKind::CrossEntropy => 0.5,
            LossKind::Hinge => 0.0,
        }
    }
}

/// Full configuration of a model and its training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Explicit model name; generated from the other fields when unset
    pub name:           Option<String>,
    pub optimizer:      OptimizerKind,
    pub metric:         ValidationMetric,
    /// Number of leading tokens of a document that are averaged
    pub max_words:      usize,
    /// Hidden layers in each per-label classifier (0 = logistic regression)
    pub num_layers:     usize,
    pub hidden_size:    usize,
    /// Vocabulary cap, including the reserved unknown slot
    pub voc_size:       usize,
    pub embedding_dim:  usize,
    /// Chain label classifiers in LabelSet order
    pub chain:          bool,
    /// Keep pretrained embeddings frozen
    pub fixed_emb:      bool,
    pub hinge:          bool,
    /// Persist the best checkpoint to disk
    pub save:           bool,
    pub verbose:        bool,
    /// Epoch budget
    pub epochs:         usize,
    /// Stop after this many consecutive epochs without improvement
    pub patience:       Option<usize>,
    pub batch_size:     usize,
    pub learning_rate:  Option<f64>,
    /// One loss weight per label, in LabelSet order
    pub label_weights:  Option<Vec<f32>>,
    pub seed:           u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name:          None,
            optimizer:     OptimizerKind::Adam,
            metric:        ValidationMetric::ExampleF1,
            max_words:     300,
            num_layers:    2,
            hidden_size:   1024,
            voc_size:      300_000,
            embedding_dim: 300,
            chain:         false,
            fixed_emb:     false,
            hinge:         false,
            save:          false,
            verbose:       true,
            epochs:        20,
            patience:      Some(5),
            batch_size:    64,
            learning_rate: None,
            label_weights: None,
            seed:          42,
        }
    }
}

impl ModelConfig {
    pub fn loss(&self) -> LossKind {
        LossKind::from_hinge_flag(self.hinge)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
            .unwrap_or_else(|| self.optimizer.default_learning_rate())
    }

    /// Reject configurations that cannot produce a working model.
    pub fn validate(&self, labels: &LabelSet) -> TrainResult<()> {
        let positive = [
            ("max_words",     self.max_words),
            ("hidden_size",   self.hidden_size),
            ("voc_size",      self.voc_size),
            ("embedding_dim", self.embedding_dim),
            ("epochs",        self.epochs),
            ("batch_size",    self.batch_size),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(TrainError::Configuration(format!("{field} must be greater than 0")));
            }
        }
        if self.patience == Some(0) {
            return Err(TrainError::Configuration("patience must be greater than 0".into()));
        }
        if let Some(lr) = self.learning_rate {
            if !lr.is_finite() || lr <= 0.0 {
                return Err(TrainError::Configuration(format!(
                    "learning rate must be a positive number, got {lr}"
                )));
            }
        }
        if let Some(weights) = &self.label_weights {
            if weights.len() != labels.len() {
                return Err(TrainError::Configuration(format!(
                    "{} label weights given for {} labels",
                    weights.len(),
                    labels.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(TrainError::Configuration(
                    "label weights must be finite and non-negative".into(),
                ));
            }
        }
        Ok(())
    }

    /// Checkpoint key for this configuration.
    ///
    /// `"mlp"` plus one segment per model-defining field that differs
    /// from its default, always in the same order.
    pub fn model_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let d = Self::default();
        let mut name = String::from("mlp");
        // write! into a String cannot fail
        if self.optimizer != d.optimizer {
            let _ = write!(name, "_{}", self.optimizer);
        }
        if self.metric != d.metric {
            let _ = write!(name, "_{}", self.metric);
        }
        if self.max_words != d.max_words {
            let _ = write!(name, "_words-{}", self.max_words);
        }
        if self.num_layers != d.num_layers {
            let _ = write!(name, "_layers-{}", self.num_layers);
        }
        if self.hidden_size != d.hidden_size {
            let _ = write!(name, "_hidden-{}", self.hidden_size);
        }
        if self.voc_size != d.voc_size {
            let _ = write!(name, "_voc-{}", self.voc_size);
        }
        if self.embedding_dim != d.embedding_dim {
            let _ = write!(name, "_dim-{}", self.embedding_dim);
        }
        if self.hinge {
            name.push_str("_hinge");
        }
        if self.chain {
            name.push_str("_chain");
        }
        if self.fixed_emb {
            name.push_str("_fixed-emb");
        }
        // Training settings change the learned weights too; only `save`
        // and `verbose` stay out of the name.
        if self.epochs != d.epochs {
            let _ = write!(name, "_epochs-{}", self.epochs);
        }
        if self.patience != d.patience {
            match self.patience {
                Some(p) => { let _ = write!(name, "_patience-{p}"); }
                None    => name.push_str("_patience-none"),
            }
        }
        if self.batch_size != d.batch_size {
            let _ = write!(name, "_batch-{}", self.batch_size);
        }
        if let Some(lr) = self.learning_rate {
            let _ = write!(name, "_lr-{lr}");
        }
        if let Some(weights) = &self.label_weights {
            let joined: Vec<String> = weights.iter().map(f32::to_string).collect();
            let _ = write!(name, "_weights-{}", joined.join("-"));
        }
        if self.seed != d.seed {
            let _ = write!(name, "_seed-{}", self.seed);
        }
        name
    }
}
