//! Scan-level errors.
//!
//! The scanner never rejects input; it records the structural problems it
//! notices here and the validator turns them into diagnostics.

use serde::Serialize;
use thiserror::Error;

/// A structural problem noticed while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScanError {
    /// End of input reached while a model block was still open.
    #[error("Model '{name}' is not closed: missing '}}'")]
    UnclosedModel { name: String, line: u32, column: u32 },

    /// A `model` header appeared inside another model's braces.
    #[error("Model '{name}' is declared inside model '{parent}'; models cannot be nested")]
    NestedModel {
        name: String,
        parent: String,
        parent_line: u32,
        line: u32,
        column: u32,
    },
}

