//! Rule-based validator.
//!
//! Validation is driven by a single ordered rule table. Every rule runs on
//! every pass, so one document can collect diagnostics from all categories
//! at once. A rule that panics is isolated: it contributes one
//! `internal-validation-error` diagnostic and the remaining rules still run.

mod advice;
pub mod catalog;
mod document;
mod layers;
mod training;

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

use crate::diagnostic::{Diagnostic, DiagnosticCode, Range, Severity};
use crate::options::{IgnorePatterns, ValidationOptions};
use crate::scanner::{scan, scan_text};
use crate::structure::ModelStructure;

/// Result of running the whole pipeline over one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub structure: ModelStructure,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }
}

/// Everything a rule may look at.
pub(crate) struct RuleContext<'a> {
    pub lines: &'a [&'a str],
    pub structure: &'a ModelStructure,
    pub options: &'a ValidationOptions,
}

impl RuleContext<'_> {
    /// Whether the document holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// Length in bytes of a line, or zero past the end.
    pub fn line_len(&self, line: u32) -> u32 {
        self.lines.get(line as usize).map_or(0, |l| l.len() as u32)
    }

    /// Range of `name=value` inside the columns `start..end` of `line`.
    ///
    /// Falls back to `None` when the pair cannot be located, e.g. when the
    /// declaration spans several lines.
    pub fn parameter_range(&self, line: u32, start: u32, end: u32, name: &str, value: &str) -> Option<Range> {
        let text = self.lines.get(line as usize)?;
        let end = (end as usize).min(text.len());
        let segment = text.get(start as usize..end)?;

        for (idx, _) in segment.match_indices(name) {
            let preceded_by_ident = segment[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if preceded_by_ident {
                continue;
            }
            let after_name = &segment[idx + name.len()..];
            let Some(after_eq) = after_name.trim_start().strip_prefix('=') else {
                continue;
            };
            let value_start = segment.len() - after_eq.trim_start().len();
            let value_end = if segment[value_start..].starts_with(value) {
                value_start + value.len()
            } else {
                idx + name.len()
            };
            return Some(Range::on_line(
                line,
                start + idx as u32,
                start + value_end as u32,
            ));
        }

        None
    }
}

type Check = fn(&RuleContext<'_>, &mut Vec<Diagnostic>);

struct Rule {
    name: &'static str,
    /// Strict mode turns this rule's warnings into errors.
    promotable: bool,
    check: Check,
}

const RULES: &[Rule] = &[
    Rule {
        name: "presence",
        promotable: false,
        check: document::check_presence,
    },
    Rule {
        name: "empty-file",
        promotable: false,
        check: document::check_empty_file,
    },
    Rule {
        name: "brace-balance",
        promotable: false,
        check: document::check_brace_balance,
    },
    Rule {
        name: "scan-errors",
        promotable: false,
        check: document::check_scan_errors,
    },
    Rule {
        name: "model-content",
        promotable: false,
        check: document::check_model_content,
    },
    Rule {
        name: "layer-parameters",
        promotable: true,
        check: layers::check_layer_parameters,
    },
    Rule {
        name: "training-config",
        promotable: true,
        check: training::check_training_config,
    },
    Rule {
        name: "best-practice",
        promotable: false,
        check: advice::check_best_practices,
    },
    Rule {
        name: "housekeeping",
        promotable: false,
        check: document::check_todo_comments,
    },
];

/// Run every rule against a scanned document.
///
/// The result is truncated to `options.max_number_of_problems`.
pub fn validate(lines: &[&str], structure: &ModelStructure, options: &ValidationOptions) -> Vec<Diagnostic> {
    let ctx = RuleContext {
        lines,
        structure,
        options,
    };
    let mut diagnostics = run_rules(RULES, &ctx);

    if diagnostics.len() > options.max_number_of_problems {
        log::debug!(
            "Truncating {} diagnostics to {}",
            diagnostics.len(),
            options.max_number_of_problems
        );
        diagnostics.truncate(options.max_number_of_problems);
    }

    diagnostics
}

/// Run `rules` in order. A rule that panics is replaced by one
/// `internal-validation-error` at the document start.
fn run_rules(rules: &[Rule], ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for rule in rules {
        let mut found = Vec::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (rule.check)(ctx, &mut found)));

        match outcome {
            Ok(()) => {
                if rule.promotable && ctx.options.strict {
                    for diag in found.iter_mut().filter(|d| d.severity == Severity::Warning) {
                        diag.severity = Severity::Error;
                    }
                }
                diagnostics.append(&mut found);
            }
            Err(_) => {
                log::error!("Validation rule '{}' panicked; skipping it", rule.name);
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::InternalValidationError,
                    format!("Internal error while running the '{}' check", rule.name),
                    Range::default(),
                ));
            }
        }
    }

    diagnostics
}

/// Scan and validate a document.
///
/// Disabled validation still computes the structure so presentation
/// features keep working; it just reports no diagnostics.
pub fn analyze(text: &str, options: &ValidationOptions) -> Analysis {
    let lines: Vec<&str> = text.lines().collect();
    let structure = scan(&lines);
    let diagnostics = if options.enable {
        validate(&lines, &structure, options)
    } else {
        Vec::new()
    };

    Analysis {
        structure,
        diagnostics,
    }
}

/// Validation options prepared for repeated use.
///
/// Ignore patterns are compiled once here instead of on every pass.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
    ignore: IgnorePatterns,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        let ignore = options.ignore_set();
        Self { options, ignore }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Like [`analyze`], honouring the ignore patterns for `document_id`.
    pub fn analyze_document(&self, document_id: &str, text: &str) -> Analysis {
        if self.ignore.is_match(document_id) {
            log::debug!("Document {} matches an ignore pattern", document_id);
            return Analysis {
                structure: scan_text(text),
                diagnostics: Vec::new(),
            };
        }
        analyze(text, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(analysis: &Analysis) -> Vec<DiagnosticCode> {
        analysis.diagnostics.iter().map(|d| d.code).collect()
    }

    const CLASSIFIER: &str = r#"model Classifier {
    Input(shape=(28, 28, 1))
    Conv2D(filters=32, kernel_size=(3, 3), activation="relu")
    BatchNormalization()
    MaxPooling2D(pool_size=(2, 2))
    Flatten()
    Dense(units=128, activation="relu")
    Dropout(rate=0.3)
    Dense(units=10, activation="softmax")
}

compile(optimizer="adam", loss="categorical_crossentropy")
fit(epochs=10, batch_size=32, validation_split=0.2)
"#;

    #[test]
    fn test_valid_model_has_no_diagnostics() {
        let analysis = analyze(CLASSIFIER, &ValidationOptions::default());
        assert!(analysis.diagnostics.is_empty(), "unexpected: {:?}", analysis.diagnostics);
        assert_eq!(analysis.structure.models[0].layers.len(), 8);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let text = "model T { Dense() }\ncompile(optimizer='adm')\n  Conv2D(filters=x)";
        let options = ValidationOptions::default();
        let lines: Vec<&str> = text.lines().collect();

        let first = validate(&lines, &scan(&lines), &options);
        let second = validate(&lines, &scan(&lines), &options);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_scenario_missing_units() {
        let analysis = analyze("model T { Dense() }", &ValidationOptions::default());
        assert!(analysis.diagnostics.iter().any(|d| d.severity == Severity::Error
            && d.code == DiagnosticCode::MissingRequiredParameter
            && d.message.contains("units")));
    }

    #[test]
    fn test_scenario_empty_document() {
        let analysis = analyze("", &ValidationOptions::default());
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(analysis.diagnostics[0].severity, Severity::Warning);
        assert_eq!(analysis.diagnostics[0].code, DiagnosticCode::EmptyFile);
        assert!(analysis.structure.models.is_empty());
    }

    #[test]
    fn test_scenario_compile_without_loss() {
        let analysis = analyze(r#"compile(optimizer="adam")"#, &ValidationOptions::default());
        let errors: Vec<&Diagnostic> = analysis
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();

        assert_eq!(errors.iter().filter(|d| d.message.contains("loss")).count(), 1);
        assert!(!analysis.diagnostics.iter().any(|d| d.message.contains("optimizer '")));
        assert!(!codes(&analysis).contains(&DiagnosticCode::UnknownOptimizer));
    }

    #[test]
    fn test_scenario_conv_then_dense_needs_flatten() {
        let analysis = analyze(
            "model M { Input(shape=(28,28,1)) Conv2D(filters=32, kernel_size=(3,3)) Dense(units=10) }",
            &ValidationOptions::default(),
        );
        let flatten = analysis
            .diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::MissingFlatten)
            .expect("missing-flatten diagnostic");
        assert!(matches!(flatten.severity, Severity::Warning | Severity::Error));
        assert!(flatten.message.contains("Flatten"));
    }

    #[test]
    fn test_scenario_negative_learning_rate() {
        let analysis = analyze(
            r#"compile(optimizer="adam", learning_rate=-0.1, loss="mean_squared_error")"#,
            &ValidationOptions::default(),
        );
        assert!(analysis.diagnostics.iter().any(|d| d.severity == Severity::Error
            && d.message.contains("learning_rate")
            && d.message.contains("negative")));
    }

    #[test]
    fn test_disabled_validation_reports_nothing() {
        let options = ValidationOptions {
            enable: false,
            ..Default::default()
        };
        let analysis = analyze("model T { Dense() }", &options);
        assert!(analysis.diagnostics.is_empty());
        assert_eq!(analysis.structure.layers.len(), 1);
    }

    #[test]
    fn test_ignored_document_reports_nothing() {
        let options = ValidationOptions {
            ignore_patterns: vec![r"scratch/".to_string()],
            ..Default::default()
        };
        let validator = Validator::new(options);
        assert!(validator.analyze_document("file:///scratch/a.neural", "").diagnostics.is_empty());
        assert!(!validator.analyze_document("file:///src/a.neural", "").diagnostics.is_empty());
    }

    #[test]
    fn test_max_number_of_problems_truncates() {
        let text = "model T {\n  Dense()\n  Dense()\n  Dense()\n  Dense()\n}";
        let options = ValidationOptions {
            max_number_of_problems: 2,
            ..Default::default()
        };
        let full = analyze(text, &ValidationOptions::default());
        let capped = analyze(text, &options);

        assert!(full.diagnostics.len() > 2);
        assert_eq!(capped.diagnostics, full.diagnostics[..2].to_vec());
    }

    #[test]
    fn test_strict_promotes_parameter_warnings_but_not_advice() {
        let text = "model M {\n  Input(shape=(4,))\n  Dense(units=8000, activation='rleu')\n}\ncompile(optimizer='adam', loss='mse')";
        let lenient = analyze(text, &ValidationOptions::default());
        let strict = analyze(
            text,
            &ValidationOptions {
                strict: true,
                ..Default::default()
            },
        );

        let severity_of = |analysis: &Analysis, code| {
            analysis
                .diagnostics
                .iter()
                .find(|d| d.code == code)
                .map(|d| d.severity)
        };

        assert_eq!(severity_of(&lenient, DiagnosticCode::UnknownParameterValue), Some(Severity::Warning));
        assert_eq!(severity_of(&strict, DiagnosticCode::UnknownParameterValue), Some(Severity::Error));
        assert_eq!(severity_of(&strict, DiagnosticCode::LargeDenseLayer), Some(Severity::Warning));
    }

    fn flag_first_line(_: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
        out.push(Diagnostic::warning(DiagnosticCode::TodoComment, "before", Range::on_line(1, 0, 4)));
    }

    fn always_panics(ctx: &RuleContext<'_>, _: &mut Vec<Diagnostic>) {
        panic!("rule failed on {} lines", ctx.lines.len());
    }

    fn flag_last_line(_: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
        out.push(Diagnostic::warning(DiagnosticCode::LargeKernel, "after", Range::on_line(2, 0, 4)));
    }

    #[test]
    fn test_panicking_rule_is_isolated() {
        let rules = [
            Rule {
                name: "first",
                promotable: false,
                check: flag_first_line,
            },
            Rule {
                name: "broken",
                promotable: true,
                check: always_panics,
            },
            Rule {
                name: "last",
                promotable: true,
                check: flag_last_line,
            },
        ];
        let lines = ["model M {", "  Dense(units=1)", "}"];
        let structure = scan(&lines);
        let options = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        let ctx = RuleContext {
            lines: &lines,
            structure: &structure,
            options: &options,
        };

        let diagnostics = run_rules(&rules, &ctx);
        assert_eq!(diagnostics.len(), 3);

        let internal: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::InternalValidationError)
            .collect();
        assert_eq!(internal.len(), 1);
        assert_eq!(internal[0].severity, Severity::Error);
        assert_eq!(internal[0].range, Range::default());
        assert!(internal[0].message.contains("'broken'"));

        assert_eq!(diagnostics[0].message, "before");
        assert_eq!(diagnostics[1].code, DiagnosticCode::InternalValidationError);
        assert_eq!(diagnostics[2].message, "after");
        assert_eq!(diagnostics[2].severity, Severity::Error, "later rules still get strict promotion");
    }

    #[test]
    fn test_pipeline_never_fails_on_malformed_input() {
        let inputs = [
            "model",
            "model {",
            "model M {{{{",
            "}}}} model M { Dense(",
            "model M {\n  Dense(units=\"unterminated\n  Conv2D(kernel_size=((((\n",
            "compile(optimizer=Adam(learning_rate=, loss='\\'')",
            "fit(epochs=1e999, batch_size=-0, validation_split=NaN)",
            "model Ünïcödé {\n  Dënse(ünits=💥)\n}",
            "\u{0}\u{1}\u{7f}model \u{fffd} { ) ] } (",
            "model M {\n  model N {\n    model O {\n",
            "train(optimizer=\"a\", loss=\"b\"\nmodel M { Input(shape=(,)) Dense(units=) Dropout(rate=) }",
            "   \t  \r\n  # only a comment\n// and another",
            "model M { Conv2D(filters=1, kernel_size=(9,9)) Conv2D() Conv2D() Conv2D() Dense(units=99999) }",
        ];

        for strict in [false, true] {
            let options = ValidationOptions {
                strict,
                ..Default::default()
            };
            for input in inputs {
                let analysis = analyze(input, &options);
                assert!(
                    !analysis
                        .diagnostics
                        .iter()
                        .any(|d| d.code == DiagnosticCode::InternalValidationError),
                    "internal error for {input:?}: {:?}",
                    analysis.diagnostics
                );
            }
        }
    }

    #[test]
    fn test_every_rule_category_can_fire_together() {
        let text = "model bad {\n  Dense(units=abc)\nConv2D(filters=1, kernel_size=3)\n  Dense(units=4)\n  # TODO tune\n\ncompile(optimizer='adm', loss='nope', learning_rate=-1)\nfit()";
        let analysis = analyze(
            text,
            &ValidationOptions {
                strict: true,
                ..Default::default()
            },
        );
        let found = codes(&analysis);

        for expected in [
            DiagnosticCode::UnclosedModel,
            DiagnosticCode::MissingInputLayer,
            DiagnosticCode::MissingFlatten,
            DiagnosticCode::IndentationError,
            DiagnosticCode::ModelNaming,
            DiagnosticCode::InvalidParameterType,
            DiagnosticCode::UnknownOptimizer,
            DiagnosticCode::UnknownLoss,
            DiagnosticCode::NegativeLearningRate,
            DiagnosticCode::MissingEpochs,
            DiagnosticCode::TodoComment,
        ] {
            assert!(found.contains(&expected), "expected {expected} in {found:?}");
        }
    }
}
