// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the problem:
// documents, labels, vocabularies, configuration, metrics and
// the error taxonomy.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Model and training configuration
pub mod config;

// Raw and tokenised documents
pub mod document;

// Error taxonomy shared by every layer
pub mod error;

// Ordered label names
pub mod labels;

// Validation metrics and their optimisation direction
pub mod metric;

// Collaborator traits other layers implement
pub mod traits;

// Token → index mapping and pretrained vectors
pub mod vocabulary;
