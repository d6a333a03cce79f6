//! Rendering of check results.

use clap::ValueEnum;
use neuraldsl_core::{Analysis, Diagnostic};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Output format of the `check` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per diagnostic followed by a summary
    #[default]
    Text,
    /// A JSON array of diagnostics
    Json,
}

/// Analysis of one checked file.
#[derive(Debug)]
pub struct FileReport {
    pub file: String,
    pub analysis: Analysis,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    file: &'a str,
    #[serde(flatten)]
    diagnostic: Diagnostic,
}

pub fn render(
    reports: &[FileReport],
    format: OutputFormat,
    show_suggestions: bool,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(reports, show_suggestions)),
        OutputFormat::Json => render_json(reports, show_suggestions),
    }
}

/// `file:line:col: severity [code] message` with 1-based positions, each
/// optionally followed by an indented suggestion line.
pub fn render_text(reports: &[FileReport], show_suggestions: bool) -> String {
    let mut out = String::new();
    let mut errors = 0;
    let mut warnings = 0;

    for report in reports {
        errors += report.analysis.error_count();
        warnings += report.analysis.warning_count();

        for d in &report.analysis.diagnostics {
            out.push_str(&format!(
                "{}:{}:{}: {} [{}] {}\n",
                report.file,
                d.range.start.line + 1,
                d.range.start.character + 1,
                d.severity,
                d.code,
                d.message
            ));
            if let Some(suggestion) = d.suggestion.as_ref().filter(|_| show_suggestions) {
                out.push_str(&format!("    suggestion: {}\n", suggestion));
            }
        }
    }

    let files = match reports.len() {
        1 => "1 file".to_string(),
        n => format!("{} files", n),
    };
    if errors == 0 && warnings == 0 {
        out.push_str(&format!("No problems found in {}\n", files));
    } else {
        out.push_str(&format!(
            "{} error(s), {} warning(s) in {}\n",
            errors, warnings, files
        ));
    }
    out
}

pub fn render_json(reports: &[FileReport], show_suggestions: bool) -> serde_json::Result<String> {
    let items: Vec<JsonDiagnostic<'_>> = reports
        .iter()
        .flat_map(|report| {
            report.analysis.diagnostics.iter().map(move |d| {
                let mut diagnostic = d.clone();
                if !show_suggestions {
                    diagnostic.suggestion = None;
                }
                JsonDiagnostic {
                    file: &report.file,
                    diagnostic,
                }
            })
        })
        .collect();
    serde_json::to_string_pretty(&items)
}

/// Write a rendered report to `path`, or to stdout without one.
pub fn emit(output: &str, path: Option<&Path>) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, output),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuraldsl_core::{analyze, ValidationOptions};

    fn report(file: &str, text: &str) -> FileReport {
        FileReport {
            file: file.to_string(),
            analysis: analyze(text, &ValidationOptions::default()),
        }
    }

    #[test]
    fn test_text_lines_are_one_based() {
        let output = render_text(&[report("m.neural", "model T { Dense() }")], true);
        assert!(
            output.contains("m.neural:1:11: error [missing-required-parameter] Layer 'Dense' is missing required parameter 'units'"),
            "got: {output}"
        );
        assert!(output.trim_end().ends_with("in 1 file"));
    }

    #[test]
    fn test_text_summary_without_problems() {
        let output = render_text(&[], true);
        assert_eq!(output, "No problems found in 0 files\n");
    }

    #[test]
    fn test_json_output() {
        let output = render_json(&[report("a.neural", ""), report("b.neural", "model T { Dense() }")], true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items[0]["file"], "a.neural");
        assert_eq!(items[0]["code"], "empty-file");
        assert_eq!(items[0]["severity"], "warning");
        assert!(items.iter().any(|i| i["file"] == "b.neural" && i["code"] == "missing-required-parameter"));
        assert_eq!(items[0]["range"]["start"]["line"], 0);
    }

    const TYPO: &str = "model M {\n  Input(shape=(4,))\n  Dropout(rate=0.1)\n  Dense(units=1, activation='softmx')\n}\ncompile(optimizer='adam', loss='mse')";

    #[test]
    fn test_text_suggestions_can_be_hidden() {
        let reports = [report("m.neural", TYPO)];

        let shown = render_text(&reports, true);
        assert!(shown.contains("\n    suggestion: Did you mean 'softmax'?\n"), "got: {shown}");

        let hidden = render_text(&reports, false);
        assert!(!hidden.contains("suggestion"));
        assert!(hidden.contains("[unknown-parameter-value]"));
    }

    #[test]
    fn test_json_suggestions_can_be_hidden() {
        let reports = [report("m.neural", TYPO)];

        let shown: serde_json::Value = serde_json::from_str(&render_json(&reports, true).unwrap()).unwrap();
        assert_eq!(shown[0]["suggestion"], "Did you mean 'softmax'?");

        let hidden: serde_json::Value = serde_json::from_str(&render_json(&reports, false).unwrap()).unwrap();
        assert!(hidden[0].get("suggestion").is_none());
        assert_eq!(hidden[0]["code"], "unknown-parameter-value");
    }

    #[test]
    fn test_emit_writes_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        emit("m.neural:1:1: error [empty-model] x\n", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "m.neural:1:1: error [empty-model] x\n");
    }
}
