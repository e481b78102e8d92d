// ============================================================
// Layer 3 — Validation Metrics
// ============================================================
// The trainer selects checkpoints by one of these metrics,
// computed over thresholded binary label vectors.
//
// Conventions:
//   - an F-measure whose numerator and denominator are both zero
//     (nothing predicted, nothing expected) counts as 1.0
//   - loss and hamming loss are minimised, everything else is
//     maximised

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::TrainError;

/// Whether larger or smaller values of a metric are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// The value every real observation improves on.
    pub fn worst(self) -> f64 {
        match self {
            Direction::Maximize => f64::NEG_INFINITY,
            Direction::Minimize => f64::INFINITY,
        }
    }

    /// Strict improvement test. NaN never improves.
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Direction::Maximize => candidate > best,
            Direction::Minimize => candidate < best,
        }
    }
}

/// Objective tracked on the validation split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationMetric {
    #[serde(rename = "val_loss")]
    Loss,
    /// Subset accuracy (exact match of the whole label vector)
    #[serde(rename = "val_acc")]
    Accuracy,
    #[serde(rename = "val_hamming")]
    Hamming,
    /// Example-based F1
    #[serde(rename = "val_ebf1")]
    ExampleF1,
    #[serde(rename = "val_mif1")]
    MicroF1,
    #[serde(rename = "val_maf1")]
    MacroF1,
}

impl ValidationMetric {
    pub const ALL: [ValidationMetric; 6] = [
        ValidationMetric::Loss,
        ValidationMetric::Accuracy,
        ValidationMetric::Hamming,
        ValidationMetric::ExampleF1,
        ValidationMetric::MicroF1,
        ValidationMetric::MacroF1,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValidationMetric::Loss      => "val_loss",
            ValidationMetric::Accuracy  => "val_acc",
            ValidationMetric::Hamming   => "val_hamming",
            ValidationMetric::ExampleF1 => "val_ebf1",
            ValidationMetric::MicroF1   => "val_mif1",
            ValidationMetric::MacroF1   => "val_maf1",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            ValidationMetric::Loss | ValidationMetric::Hamming => Direction::Minimize,
            _ => Direction::Maximize,
        }
    }
}

impl fmt::Display for ValidationMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValidationMetric {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValidationMetric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ValidationMetric::ALL.iter().map(|m| m.name()).collect();
                TrainError::Configuration(format!(
                    "unknown metric '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Every metric for one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub loss:       f64,
    pub accuracy:   f64,
    pub hamming:    f64,
    pub example_f1: f64,
    pub micro_f1:   f64,
    pub macro_f1:   f64,
}

impl MetricSet {
    /// Compute the label-vector metrics and attach the already
    /// averaged validation loss.
    ///
    /// `predictions` and `targets` are row-aligned, one row per document.
    pub fn compute(loss: f64, predictions: &[Vec<bool>], targets: &[Vec<bool>]) -> Self {
        Self {
            loss,
            accuracy:   subset_accuracy(predictions, targets),
            hamming:    hamming_loss(predictions, targets),
            example_f1: example_f1(predictions, targets),
            micro_f1:   micro_f1(predictions, targets),
            macro_f1:   macro_f1(predictions, targets),
        }
    }

    pub fn get(&self, metric: ValidationMetric) -> f64 {
        match metric {
            ValidationMetric::Loss      => self.loss,
            ValidationMetric::Accuracy  => self.accuracy,
            ValidationMetric::Hamming   => self.hamming,
            ValidationMetric::ExampleF1 => self.example_f1,
            ValidationMetric::MicroF1   => self.micro_f1,
            ValidationMetric::MacroF1   => self.macro_f1,
        }
    }
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss={:.4} acc={:.4} hamming={:.4} ebf1={:.4} mif1={:.4} maf1={:.4}",
            self.loss, self.accuracy, self.hamming,
            self.example_f1, self.micro_f1, self.macro_f1,
        )
    }
}

#[derive(Default, Clone, Copy)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_count: usize,
}

impl Counts {
    fn add(&mut self, predicted: bool, expected: bool) {
        match (predicted, expected) {
            (true, true)  => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_count += 1,
            (false, false) => {}
        }
    }

    fn f1(&self) -> f64 {
        let denom = 2 * self.tp + self.fp + self.fn_count;
        if denom == 0 {
            1.0
        } else {
            (2 * self.tp) as f64 / denom as f64
        }
    }
}

fn pairs<'a>(
    predictions: &'a [Vec<bool>],
    targets: &'a [Vec<bool>],
) -> impl Iterator<Item = (&'a Vec<bool>, &'a Vec<bool>)> {
    debug_assert_eq!(predictions.len(), targets.len());
    predictions.iter().zip(targets.iter())
}

pub fn subset_accuracy(predictions: &[Vec<bool>], targets: &[Vec<bool>]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let exact = pairs(predictions, targets).filter(|(p, t)| p == t).count();
    exact as f64 / targets.len() as f64
}

pub fn hamming_loss(predictions: &[Vec<bool>], targets: &[Vec<bool>]) -> f64 {
    let mut wrong = 0usize;
    let mut total = 0usize;
    for (p, t) in pairs(predictions, targets) {
        wrong += p.iter().zip(t).filter(|(a, b)| a != b).count();
        total += t.len();
    }
    if total == 0 { 0.0 } else { wrong as f64 / total as f64 }
}

pub fn example_f1(predictions: &[Vec<bool>], targets: &[Vec<bool>]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let sum: f64 = pairs(predictions, targets)
        .map(|(p, t)| {
            let mut c = Counts::default();
            p.iter().zip(t).for_each(|(&a, &b)| c.add(a, b));
            c.f1()
        })
        .sum();
    sum / targets.len() as f64
}

pub fn micro_f1(predictions: &[Vec<bool>], targets: &[Vec<bool>]) -> f64 {
    let mut c = Counts::default();
    for (p, t) in pairs(predictions, targets) {
        p.iter().zip(t).for_each(|(&a, &b)| c.add(a, b));
    }
    c.f1()
}

pub fn macro_f1(predictions: &[Vec<bool>], targets: &[Vec<bool>]) -> f64 {
    let num_labels = targets.first().map(Vec::len).unwrap_or(0);
    if num_labels == 0 {
        return 0.0;
    }
    let mut per_label = vec![Counts::default(); num_labels];
    for (p, t) in pairs(predictions, targets) {
        for (j, counts) in per_label.iter_mut().enumerate() {
            counts.add(p[j], t[j]);
        }
    }
    per_label.iter().map(Counts::f1).sum::<f64>() / num_labels as f64
}
