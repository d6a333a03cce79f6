//! Conversion of validator diagnostics into LSP diagnostics.

use neuraldsl_core::{Diagnostic, Range, Severity};
use tower_lsp::lsp_types::{
    self, DiagnosticRelatedInformation, DiagnosticSeverity, Location, NumberOrString, Position, Url,
};

use crate::document::Document;

/// Value of the `source` field on every published diagnostic.
pub const SOURCE: &str = "neuraldsl";

pub fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Convert a byte-column range. Without a document the columns are
/// passed through unchanged.
pub fn to_lsp_range(range: &Range, doc: Option<&Document>) -> lsp_types::Range {
    let convert = |line: u32, character: u32| Position {
        line,
        character: doc.map_or(character, |d| d.utf16_column(line, character)),
    };

    lsp_types::Range {
        start: convert(range.start.line, range.start.character),
        end: convert(range.end.line, range.end.character),
    }
}

pub fn to_lsp_diagnostic(
    diagnostic: &Diagnostic,
    uri: &Url,
    doc: Option<&Document>,
) -> lsp_types::Diagnostic {
    let related_information = if diagnostic.related_information.is_empty() {
        None
    } else {
        Some(
            diagnostic
                .related_information
                .iter()
                .map(|related| DiagnosticRelatedInformation {
                    location: Location {
                        uri: uri.clone(),
                        range: to_lsp_range(&related.range, doc),
                    },
                    message: related.message.clone(),
                })
                .collect(),
        )
    };

    // The suggestion goes on a line of its own.
    let message = match &diagnostic.suggestion {
        Some(suggestion) => format!("{}\n{}", diagnostic.message, suggestion),
        None => diagnostic.message.clone(),
    };

    lsp_types::Diagnostic {
        range: to_lsp_range(&diagnostic.range, doc),
        severity: Some(to_lsp_severity(diagnostic.severity)),
        code: Some(NumberOrString::String(diagnostic.code.to_string())),
        code_description: None,
        source: Some(SOURCE.to_string()),
        message,
        related_information,
        tags: None,
        data: None,
    }
}

/// Convert every diagnostic of an analysis, preserving order.
pub fn to_lsp_diagnostics(
    diagnostics: &[Diagnostic],
    uri: &Url,
    doc: Option<&Document>,
) -> Vec<lsp_types::Diagnostic> {
    diagnostics
        .iter()
        .map(|d| to_lsp_diagnostic(d, uri, doc))
        .collect()
}
