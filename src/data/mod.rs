// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and tensor batches:
//
//   vectors.vec            train.jsonl / test.jsonl
//       │                          │
//       ▼                          ▼
//   FastTextVectors          JsonlDataset ── Preprocessor
//       │                          │          splitter
//       ▼                          ▼
//   Vocabulary + vectors     LabeledDocument
//                                  │  (tokenizer, Layer 6)
//                                  ▼
//                           ClassificationDataset
//                                  │
//                                  ▼
//                           ClassificationBatcher → DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Burn Batcher: pads, masks and stacks samples
pub mod batcher;

/// Burn Dataset over tokenised samples
pub mod dataset;

/// JSON-lines corpus loader
pub mod loader;

/// Cleans raw document text
pub mod preprocessor;

/// Seeded train/validation split
pub mod splitter;

/// fastText vector loader
pub mod vectors;
