//! Model structure produced by the scanner.
//!
//! A structure is rebuilt from scratch on every validation pass; nothing in
//! here is mutated incrementally.

use serde::Serialize;
use std::fmt;

use crate::diagnostic::Range;
use crate::error::ScanError;
use crate::params::Parameters;

/// One layer declaration inside a model block, e.g. `Dense(units=64)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Declared layer keyword, case-sensitive as written.
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Zero-based source line.
    pub line: u32,
    /// Byte column of the layer keyword.
    pub column: u32,
    /// Byte column just past the declaration (after `)` when present).
    pub end_column: u32,
    /// Raw text between the parentheses, `None` for a bare keyword.
    pub arguments: Option<String>,
    pub parameters: Parameters,
}

impl Layer {
    /// Range covering the whole declaration.
    pub fn range(&self) -> Range {
        Range::on_line(self.line, self.column, self.end_column)
    }

    /// Range covering only the layer keyword.
    pub fn name_range(&self) -> Range {
        Range::on_line(self.line, self.column, self.column + self.layer_type.len() as u32)
    }

    pub fn is_convolution(&self) -> bool {
        self.layer_type.contains("Conv")
    }

    /// Layers that collapse spatial dimensions so a `Dense` can follow.
    pub fn is_flattening(&self) -> bool {
        matches!(
            self.layer_type.as_str(),
            "Flatten" | "GlobalAveragePooling1D" | "GlobalAveragePooling2D" | "GlobalMaxPooling1D" | "GlobalMaxPooling2D" | "Reshape"
        )
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// One `model <Name> { ... }` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    pub start_line: u32,
    /// Line of the closing brace; `None` while the block is unterminated.
    pub end_line: Option<u32>,
    /// Byte column of the `model` keyword.
    pub column: u32,
    /// Byte column just past the opening `{` of the header.
    pub body_column: u32,
    /// Layers in declaration (topology) order.
    pub layers: Vec<Layer>,
}

impl Model {
    /// Range covering `model <Name> {`.
    pub fn header_range(&self) -> Range {
        Range::on_line(self.start_line, self.column, self.body_column)
    }

    pub fn is_closed(&self) -> bool {
        self.end_line.is_some()
    }

    /// Whether `line` falls inside this model's braces.
    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && self.end_line.map_or(true, |end| line <= end)
    }

    pub fn has_layer(&self, layer_type: &str) -> bool {
        self.layers.iter().any(|l| l.layer_type == layer_type)
    }
}

/// Kind of a training statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingKind {
    Compile,
    Fit,
    Train,
}

impl TrainingKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "compile" => Some(TrainingKind::Compile),
            "fit" => Some(TrainingKind::Fit),
            "train" => Some(TrainingKind::Train),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingKind::Compile => "compile",
            TrainingKind::Fit => "fit",
            TrainingKind::Train => "train",
        }
    }

    /// `compile` and `train` configure the optimizer and loss.
    pub fn configures_optimizer(&self) -> bool {
        matches!(self, TrainingKind::Compile | TrainingKind::Train)
    }

    /// `fit` and `train` run the training loop and take `epochs`.
    pub fn runs_training(&self) -> bool {
        matches!(self, TrainingKind::Fit | TrainingKind::Train)
    }
}

impl fmt::Display for TrainingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `compile(...)`, `fit(...)` or `train(...)` statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    pub kind: TrainingKind,
    pub line: u32,
    pub column: u32,
    pub end_column: u32,
    pub parameters: Parameters,
}

impl TrainingConfig {
    pub fn range(&self) -> Range {
        Range::on_line(self.line, self.column, self.end_column)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Aggregate scan result for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStructure {
    pub models: Vec<Model>,
    /// Flat view of every layer across all models, in document order.
    pub layers: Vec<Layer>,
    pub training: Vec<TrainingConfig>,
    pub errors: Vec<ScanError>,
}

impl ModelStructure {
    /// The model whose braces enclose `line`.
    pub fn model_at_line(&self, line: u32) -> Option<&Model> {
        self.models.iter().find(|m| m.contains_line(line))
    }

    /// The layer declared at `line`, preferring the one spanning `column`.
    pub fn layer_at(&self, line: u32, column: u32) -> Option<&Layer> {
        let mut on_line = self.layers.iter().filter(|l| l.line == line);
        let first = on_line.clone().next();
        on_line
            .find(|l| column >= l.column && column < l.end_column.max(l.column + 1))
            .or(first)
    }

    /// The training statement declared at `line`.
    pub fn training_at_line(&self, line: u32) -> Option<&TrainingConfig> {
        self.training.iter().find(|t| t.line == line)
    }

    pub fn has_optimizer_config(&self) -> bool {
        self.training.iter().any(|t| t.kind.configures_optimizer())
    }
}
