//! Diagnostic types produced by the validator.
//!
//! Diagnostic codes form a closed vocabulary: quick-fix providers dispatch
//! purely on [`DiagnosticCode`], so renaming a code string is a breaking
//! change for every consumer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Diagnostic severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        f.write_str(name)
    }
}

macro_rules! diagnostic_codes {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        /// Stable identifier attached to every diagnostic.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DiagnosticCode {
            $($variant),+
        }

        impl DiagnosticCode {
            /// Every code, in declaration order.
            pub const ALL: &'static [DiagnosticCode] = &[$(DiagnosticCode::$variant),+];

            /// The wire form of the code, e.g. `missing-input-layer`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(DiagnosticCode::$variant => $code),+
                }
            }
        }

        impl FromStr for DiagnosticCode {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(DiagnosticCode::$variant),)+
                    other => Err(UnknownCode(other.to_string())),
                }
            }
        }
    };
}

diagnostic_codes! {
    NoModelDefinition => "no-model-definition",
    EmptyFile => "empty-file",
    UnmatchedBrace => "unmatched-brace",
    UnbalancedParentheses => "unbalanced-parentheses",
    UnclosedModel => "unclosed-model",
    NestedModel => "nested-model",
    EmptyModel => "empty-model",
    MissingInputLayer => "missing-input-layer",
    MissingOutputLayer => "missing-output-layer",
    MissingFlatten => "missing-flatten",
    IndentationError => "indentation-error",
    ModelNaming => "model-naming",
    DeprecatedLayer => "deprecated-layer",
    MissingRequiredParameter => "missing-required-parameter",
    InvalidParameterType => "invalid-parameter-type",
    InvalidParameterValue => "invalid-parameter-value",
    UnknownParameterValue => "unknown-parameter-value",
    MissingCompile => "missing-compile",
    MissingTrainingParameter => "missing-training-parameter",
    MissingEpochs => "missing-epochs",
    UnknownOptimizer => "unknown-optimizer",
    UnknownLoss => "unknown-loss",
    NegativeLearningRate => "negative-learning-rate",
    HighLearningRate => "high-learning-rate",
    LargeBatchSize => "large-batch-size",
    HighEpochs => "high-epochs",
    LargeDenseLayer => "large-dense-layer",
    LargeKernel => "large-kernel",
    HighDropout => "high-dropout",
    ConsiderBatchNormalization => "consider-batch-normalization",
    MissingRegularization => "missing-regularization",
    MissingBatchNormalization => "missing-batch-normalization",
    TodoComment => "todo-comment",
    InternalValidationError => "internal-validation-error",
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when parsing a code string outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagnostic code '{0}'")]
pub struct UnknownCode(pub String);

/// A zero-based line/column position. Columns are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// A half-open source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range from explicit coordinates.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position {
                line: start_line,
                character: start_col,
            },
            end: Position {
                line: end_line,
                character: end_col,
            },
        }
    }

    /// A range on a single line.
    pub fn on_line(line: u32, start_col: u32, end_col: u32) -> Self {
        Self::new(line, start_col, line, end_col)
    }
}

/// Secondary location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedInformation {
    pub message: String,
    pub range: Range,
}

/// One validator finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub range: Range,
    /// How to fix the problem, kept apart from the message so reports can
    /// leave it out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>, range: Range) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            range,
            suggestion: None,
            related_information: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, range: Range) -> Self {
        Self::new(Severity::Error, code, message, range)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, range: Range) -> Self {
        Self::new(Severity::Warning, code, message, range)
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>, range: Range) -> Self {
        Self::new(Severity::Info, code, message, range)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a secondary location.
    pub fn with_related(mut self, message: impl Into<String>, range: Range) -> Self {
        self.related_information.push(RelatedInformation {
            message: message.into(),
            range,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_strings_round_trip_through_from_str() {
        for code in DiagnosticCode::ALL {
            assert_eq!(code.as_str().parse::<DiagnosticCode>(), Ok(*code));
        }
        assert!("not-a-code".parse::<DiagnosticCode>().is_err());
    }

    #[test]
    fn test_severity_orders_error_first() {
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Info < Severity::Hint);
    }

    #[test]
    fn test_serialized_shape() {
        let diag = Diagnostic::error(
            DiagnosticCode::MissingCompile,
            "no compile",
            Range::on_line(2, 0, 5),
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["code"], "missing-compile");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["range"]["start"]["line"], 2);
        assert!(json.get("relatedInformation").is_none());
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn test_suggestion_is_serialized_when_present() {
        let diag = Diagnostic::warning(DiagnosticCode::UnknownLoss, "Unknown loss function 'mce'", Range::default())
            .with_suggestion("Did you mean 'mse'?");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["suggestion"], "Did you mean 'mse'?");
        assert_eq!(json["message"], "Unknown loss function 'mce'");
    }
}
