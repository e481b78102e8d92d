#![recursion_limit = "256"]

//! Multi-label text classification: documents are averaged into one
//! vector over a shared embedding table, then every label gets its own
//! feed-forward classifier, independent or chained in label order.
//!
//! Layers, outermost first:
//!   cli → application → domain / data → ml → infra

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
