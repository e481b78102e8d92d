// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Loads a labelled corpus stored as JSON lines:
//
//   data_dir/
//     train.jsonl    ← {"text": "...", "labels": ["earn", "acq"]}
//     test.jsonl     ← validation split (optional)
//     unused.jsonl   ← documents outside both splits (optional)
//     labels.txt     ← label order, one per line (optional)
//
// Without labels.txt the label set is the sorted union of every
// label seen, which keeps the order stable across runs. Without
// test.jsonl a seeded 10% of train is held out for validation.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::data::splitter::split_train_val;
use crate::domain::document::LabeledDocument;
use crate::domain::labels::LabelSet;
use crate::domain::traits::{DatasetSource, DatasetSplits};

const TRAIN_FILE:  &str = "train.jsonl";
const TEST_FILE:   &str = "test.jsonl";
const UNUSED_FILE: &str = "unused.jsonl";
const LABELS_FILE: &str = "labels.txt";

/// Fraction of train kept when no validation file exists.
const HOLDOUT_TRAIN_FRACTION: f64 = 0.9;

pub struct JsonlDataset {
    dir:  PathBuf,
    seed: u64,
}

impl JsonlDataset {
    pub fn new(dir: impl AsRef<Path>, seed: u64) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), seed }
    }

    fn read_split(&self, file: &str, required: bool) -> Result<Option<Vec<LabeledDocument>>> {
        let path = self.dir.join(file);
        if !path.exists() {
            if required {
                anyhow::bail!("Missing dataset file '{}'", path.display());
            }
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let prep = Preprocessor::new();

        let mut docs = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut doc: LabeledDocument = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid document", path.display(), i + 1))?;
            doc.text = prep.clean(&doc.text);
            docs.push(doc);
        }
        tracing::debug!("Loaded {} documents from '{}'", docs.len(), path.display());
        Ok(Some(docs))
    }

    fn read_labels(&self, seen: &[&[LabeledDocument]]) -> Result<LabelSet> {
        let path = self.dir.join(LABELS_FILE);
        let names: Vec<String> = if path.exists() {
            fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()
        } else {
            seen.iter()
                .flat_map(|split| split.iter())
                .flat_map(|d| d.labels.iter().cloned())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        Ok(LabelSet::new(names)?)
    }
}

impl DatasetSource for JsonlDataset {
    fn fetch_dataset(&self) -> Result<DatasetSplits> {
        let train = self.read_split(TRAIN_FILE, true)?.unwrap_or_default();
        let (train, validation) = match self.read_split(TEST_FILE, false)? {
            Some(validation) => (train, validation),
            None => {
                tracing::warn!(
                    "No '{}' in '{}' — holding out part of the training split",
                    TEST_FILE,
                    self.dir.display()
                );
                split_train_val(train, HOLDOUT_TRAIN_FRACTION, self.seed)
            }
        };
        let unused = self.read_split(UNUSED_FILE, false)?.unwrap_or_default();
        let labels = self.read_labels(&[train.as_slice(), validation.as_slice()])?;

        tracing::info!(
            "Dataset: {} train, {} validation, {} unused, {} labels",
            train.len(),
            validation.len(),
            unused.len(),
            labels.len()
        );
        Ok(DatasetSplits { train, validation, unused, labels })
    }
}
