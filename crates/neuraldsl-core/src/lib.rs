//! NeuralDSL Core - scanning and validation for the NeuralDSL model language.
//!
//! This crate provides the editor-independent engine behind the NeuralDSL
//! tooling:
//!
//! - **Params** - Argument-list tokenizer for layer and training declarations
//! - **Scanner** - Line-oriented structural scan producing a [`ModelStructure`]
//! - **Validation** - Ordered rule table emitting [`Diagnostic`]s
//! - **Cache** - Per-document memoisation keyed by document version
//!
//! # Pipeline
//!
//! Raw text flows through [`scanner::scan`] into a [`ModelStructure`], which
//! [`validation::validate`] turns into an ordered list of diagnostics. The
//! [`DiagnosticCache`] wraps the whole pipeline so unchanged documents are
//! never re-scanned.
//!
//! ```
//! use neuraldsl_core::{analyze, ValidationOptions};
//!
//! let analysis = analyze("model T { Dense() }", &ValidationOptions::default());
//! assert_eq!(analysis.structure.models.len(), 1);
//! assert!(analysis.diagnostics.iter().any(|d| d.message.contains("units")));
//! ```

pub mod cache;
pub mod diagnostic;
pub mod error;
pub mod options;
pub mod params;
pub mod scanner;
pub mod structure;
pub mod validation;

mod text;

pub use cache::DiagnosticCache;
pub use diagnostic::{Diagnostic, DiagnosticCode, Position, Range, RelatedInformation, Severity};
pub use error::ScanError;
pub use options::{IgnorePatterns, ValidationOptions};
pub use params::{parse_parameters, Parameters};
pub use scanner::{scan, scan_text};
pub use structure::{Layer, Model, ModelStructure, TrainingConfig, TrainingKind};
pub use validation::catalog::{placeholder_for, replacement_for, required_parameters};
pub use validation::{analyze, validate, Analysis, Validator};
