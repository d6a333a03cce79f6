//! Training configuration rules for `compile`, `fit` and `train` statements.

use super::catalog::{LOSSES, OPTIMIZERS, TRAINING_NUMERIC};
use super::RuleContext;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Range};
use crate::params::{find_closing, parse_parameters, Parameters};
use crate::structure::TrainingConfig;
use crate::text::{find_similar, parse_number, unquote};

/// Arguments of an optimizer written as a call, e.g. `Adam(learning_rate=0.1)`.
pub(super) fn optimizer_arguments(raw: &str) -> Option<Parameters> {
    let open = raw.find('(')?;
    let close = find_closing(raw, open)?;
    Some(parse_parameters(&raw[open + 1..close]))
}

/// Optimizer name with quotes and call arguments removed, lowercased.
fn optimizer_name(raw: &str) -> String {
    let head = raw.split('(').next().unwrap_or(raw);
    unquote(head).to_lowercase()
}

pub(crate) fn check_training_config(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let structure = ctx.structure;

    if let Some(last) = structure.models.last() {
        if !structure.has_optimizer_config() {
            out.push(Diagnostic::warning(
                DiagnosticCode::MissingCompile,
                format!(
                    "Model '{}' is never compiled; add compile(optimizer=\"adam\", loss=\"categorical_crossentropy\")",
                    last.name
                ),
                last.header_range(),
            ));
        }
    }

    for config in &structure.training {
        check_statement(ctx, config, out);
    }
}

fn check_statement(ctx: &RuleContext<'_>, config: &TrainingConfig, out: &mut Vec<Diagnostic>) {
    let statement_range = config.range();
    let range_of = |name: &str, value: &str| {
        ctx.parameter_range(config.line, config.column, config.end_column, name, value)
            .unwrap_or(statement_range)
    };

    if config.kind.configures_optimizer() {
        for field in ["optimizer", "loss"] {
            if !config.parameters.contains_key(field) {
                out.push(Diagnostic::error(
                    DiagnosticCode::MissingTrainingParameter,
                    format!("{}() is missing required parameter '{}'", config.kind, field),
                    statement_range,
                ));
            }
        }
    }

    if let Some(raw) = config.parameter("optimizer") {
        let name = optimizer_name(raw);
        if !OPTIMIZERS.contains(&name.as_str()) {
            let mut diagnostic = Diagnostic::warning(
                DiagnosticCode::UnknownOptimizer,
                format!("Unknown optimizer '{}'", name),
                range_of("optimizer", raw),
            );
            if let Some(similar) = find_similar(&name, OPTIMIZERS) {
                diagnostic = diagnostic.with_suggestion(format!("Did you mean '{}'?", similar));
            }
            out.push(diagnostic);
        }

        if let Some(arguments) = optimizer_arguments(raw) {
            if let Some(rate) = arguments.get("learning_rate") {
                if let Some(diagnostic) = check_number("learning_rate", rate, range_of("optimizer", raw)) {
                    out.push(diagnostic);
                }
            }
        }
    }

    if let Some(raw) = config.parameter("loss") {
        let name = unquote(raw).to_lowercase();
        if !LOSSES.contains(&name.as_str()) {
            let mut diagnostic = Diagnostic::warning(
                DiagnosticCode::UnknownLoss,
                format!("Unknown loss function '{}'", name),
                range_of("loss", raw),
            );
            if let Some(similar) = find_similar(&name, LOSSES) {
                diagnostic = diagnostic.with_suggestion(format!("Did you mean '{}'?", similar));
            }
            out.push(diagnostic);
        }
    }

    if config.kind.runs_training() && !config.parameters.contains_key("epochs") {
        out.push(Diagnostic::warning(
            DiagnosticCode::MissingEpochs,
            format!("{}() does not specify 'epochs'", config.kind),
            statement_range,
        ));
    }

    for &name in TRAINING_NUMERIC {
        if let Some(raw) = config.parameter(name) {
            if let Some(diagnostic) = check_number(name, raw, range_of(name, raw)) {
                out.push(diagnostic);
            }
        }
    }
}

fn check_number(name: &str, raw: &str, range: Range) -> Option<Diagnostic> {
    let Some(value) = parse_number(raw) else {
        return Some(Diagnostic::error(
            DiagnosticCode::InvalidParameterType,
            format!("Training parameter '{}' must be a number, got '{}'", name, raw),
            range,
        ));
    };

    match name {
        "learning_rate" if value < 0.0 => Some(Diagnostic::error(
            DiagnosticCode::NegativeLearningRate,
            format!("learning_rate must not be negative, got {}", raw),
            range,
        )),
        "epochs" | "batch_size" if value <= 0.0 || value.fract() != 0.0 => Some(Diagnostic::error(
            DiagnosticCode::InvalidParameterValue,
            format!("Training parameter '{}' must be a positive integer, got {}", name, raw),
            range,
        )),
        "validation_split" if !(0.0..1.0).contains(&value) => Some(Diagnostic::error(
            DiagnosticCode::InvalidParameterValue,
            format!("validation_split must be in [0, 1), got {}", raw),
            range,
        )),
        _ => None,
    }
}
