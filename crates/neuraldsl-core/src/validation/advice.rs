//! Best-practice advice. These findings never block anything and strict
//! mode leaves their severity alone.

use super::training::optimizer_arguments;
use super::RuleContext;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use crate::params::split_top_level;
use crate::structure::{Layer, Model, TrainingConfig};
use crate::text::parse_number;

const MAX_DENSE_UNITS: f64 = 4096.0;
const MAX_KERNEL_SIZE: f64 = 5.0;
const MAX_DROPOUT_RATE: f64 = 0.5;
const MAX_BATCH_SIZE: f64 = 1024.0;
const MAX_EPOCHS: f64 = 1000.0;
const MAX_LEARNING_RATE: f64 = 0.01;

/// Consecutive convolution layers after which batch normalization is suggested.
const CONV_RUN_LENGTH: usize = 3;

pub(crate) fn check_best_practices(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for model in &ctx.structure.models {
        let mut run = 0;
        for layer in &model.layers {
            if !layer.is_convolution() {
                run = 0;
                continue;
            }
            run += 1;
            if run == CONV_RUN_LENGTH {
                out.push(Diagnostic::info(
                    DiagnosticCode::ConsiderBatchNormalization,
                    format!(
                        "{} consecutive convolutional layers; consider adding BatchNormalization between them",
                        CONV_RUN_LENGTH
                    ),
                    layer.range(),
                ));
            }
        }

        check_regularization(model, out);
    }

    for layer in &ctx.structure.layers {
        check_layer(layer, out);
    }

    for config in &ctx.structure.training {
        check_training(config, out);
    }
}

fn is_regularizing(layer: &Layer) -> bool {
    layer.layer_type.contains("Dropout") || layer.layer_type.ends_with("Normalization")
}

/// Models with layers but no dropout or normalization, and stacks of Dense
/// layers without batch normalization.
fn check_regularization(model: &Model, out: &mut Vec<Diagnostic>) {
    if model.layers.is_empty() {
        return;
    }

    if !model.layers.iter().any(is_regularizing) {
        out.push(
            Diagnostic::warning(
                DiagnosticCode::MissingRegularization,
                format!(
                    "No regularization (dropout/batch normalization) detected in model '{}'",
                    model.name
                ),
                model.header_range(),
            )
            .with_suggestion("Consider adding Dropout or BatchNormalization to prevent overfitting"),
        );
    }

    let dense = model.layers.iter().filter(|l| l.layer_type == "Dense").count();
    if dense > 1 && !model.has_layer("BatchNormalization") {
        out.push(
            Diagnostic::new(
                Severity::Hint,
                DiagnosticCode::MissingBatchNormalization,
                format!("Model '{}' stacks {} Dense layers without BatchNormalization", model.name, dense),
                model.header_range(),
            )
            .with_suggestion("Consider adding BatchNormalization for better training stability"),
        );
    }
}

fn number(layer: &Layer, name: &str) -> Option<f64> {
    layer.parameter(name).and_then(parse_number)
}

fn check_layer(layer: &Layer, out: &mut Vec<Diagnostic>) {
    if layer.layer_type == "Dense" {
        if let Some(units) = number(layer, "units").filter(|u| *u > MAX_DENSE_UNITS) {
            out.push(Diagnostic::warning(
                DiagnosticCode::LargeDenseLayer,
                format!(
                    "Dense layer with {} units is very large and may be slow to train",
                    units
                ),
                layer.range(),
            ));
        }
    }

    if layer.is_convolution() {
        if let Some(raw) = layer.parameter("kernel_size") {
            let inner = raw.trim().trim_start_matches('(').trim_end_matches(')');
            let largest = split_top_level(inner)
                .into_iter()
                .filter_map(parse_number)
                .fold(None, |max: Option<f64>, n| Some(max.map_or(n, |m| m.max(n))));
            if largest.is_some_and(|k| k > MAX_KERNEL_SIZE) {
                out.push(Diagnostic::warning(
                    DiagnosticCode::LargeKernel,
                    format!(
                        "Kernel size {} is large; stacking smaller kernels is usually cheaper",
                        raw
                    ),
                    layer.range(),
                ));
            }
        }
    }

    if layer.layer_type.starts_with("Dropout") || layer.layer_type.starts_with("SpatialDropout") {
        if let Some(rate) = number(layer, "rate").filter(|r| *r > MAX_DROPOUT_RATE) {
            out.push(Diagnostic::warning(
                DiagnosticCode::HighDropout,
                format!("Dropout rate {} is high and may cause underfitting", rate),
                layer.range(),
            ));
        }
    }
}

fn check_training(config: &TrainingConfig, out: &mut Vec<Diagnostic>) {
    let value = |name: &str| config.parameter(name).and_then(parse_number);

    if let Some(batch) = value("batch_size").filter(|b| *b > MAX_BATCH_SIZE) {
        out.push(Diagnostic::warning(
            DiagnosticCode::LargeBatchSize,
            format!("Batch size {} is very large and may exhaust memory", batch),
            config.range(),
        ));
    }

    if let Some(epochs) = value("epochs").filter(|e| *e > MAX_EPOCHS) {
        out.push(Diagnostic::warning(
            DiagnosticCode::HighEpochs,
            format!("{} epochs is a lot; consider early stopping", epochs),
            config.range(),
        ));
    }

    let nested = config
        .parameter("optimizer")
        .and_then(optimizer_arguments)
        .and_then(|args| args.get("learning_rate").and_then(|r| parse_number(r)));
    for rate in [value("learning_rate"), nested].into_iter().flatten() {
        if rate > MAX_LEARNING_RATE {
            out.push(Diagnostic::info(
                DiagnosticCode::HighLearningRate,
                format!("Learning rate {} is high; values above {} often diverge", rate, MAX_LEARNING_RATE),
                config.range(),
            ));
        }
    }
}
