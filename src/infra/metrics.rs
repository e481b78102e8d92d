// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records every epoch's validation metrics to a CSV file next to
// the checkpoint, one row per epoch:
//
//   epoch,train_loss,val_loss,val_acc,val_hamming,val_ebf1,val_mif1,val_maf1,best
//   1,0.412300,0.388100,0.512000,0.081000,0.702000,0.688000,0.401000,1
//   2,0.301500,0.356200,0.540000,0.074000,0.731000,0.709000,0.433000,1
//   3,0.250100,0.361900,0.536000,0.076000,0.728000,0.705000,0.430000,0
//
// `best` is 1 on epochs that produced a new best checkpoint.
// A logger starts a fresh file: the rows always describe the run
// that produced the checkpoint beside them.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::metric::{MetricSet, ValidationMetric};

pub const METRICS_FILE: &str = "metrics.csv";

/// One row of the metrics log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Mean training loss over the epoch's batches
    pub train_loss: f64,
    /// Validation metrics after the epoch
    pub validation: MetricSet,
    /// Whether this epoch became the new best
    pub improved:   bool,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, validation: MetricSet, improved: bool) -> Self {
        Self { epoch, train_loss, validation, improved }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `dir/metrics.csv`, replacing any previous log.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let csv_path = dir.join(METRICS_FILE);

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        let columns: Vec<&str> = ValidationMetric::ALL.iter().map(|m| m.name()).collect();
        writeln!(f, "epoch,train_loss,{},best", columns.join(","))?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let values: Vec<String> = ValidationMetric::ALL
            .iter()
            .map(|&metric| format!("{:.6}", m.validation.get(metric)))
            .collect();
        writeln!(
            f,
            "{},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            values.join(","),
            u8::from(m.improved),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(loss: f64) -> MetricSet {
        MetricSet { loss, accuracy: 0.5, hamming: 0.1, example_f1: 0.7, micro_f1: 0.6, macro_f1: 0.4 }
    }

    #[test]
    fn test_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.9, metrics(0.8), true)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.7, metrics(0.85), false)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "epoch,train_loss,val_loss,val_acc,val_hamming,val_ebf1,val_mif1,val_maf1,best"
        );
        assert_eq!(
            lines[1],
            "1,0.900000,0.800000,0.500000,0.100000,0.700000,0.600000,0.400000,1"
        );
        assert!(lines[2].ends_with(",0"));
    }

    #[test]
    fn test_create_replaces_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let first = MetricsLogger::create(dir.path()).unwrap();
        first.log(&EpochMetrics::new(1, 0.9, metrics(0.8), true)).unwrap();
        let second = MetricsLogger::create(dir.path()).unwrap();
        let text = fs::read_to_string(second.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
