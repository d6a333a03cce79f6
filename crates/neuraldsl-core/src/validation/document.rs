//! Document-level and model-level structure rules.

use regex::Regex;
use std::sync::OnceLock;

use super::catalog::OUTPUT_ACTIVATIONS;
use super::RuleContext;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Position, Range};
use crate::error::ScanError;
use crate::structure::{Layer, Model};
use crate::text::{comment_start, indentation, strip_line_comment, unquote, unquoted_chars};

fn model_token_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bmodel\s").ok()).as_ref()
}

fn pascal_case_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").ok()).as_ref()
}

fn todo_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(TODO|FIXME)\b").ok()).as_ref()
}

/// A document with no `model` keyword anywhere cannot define a network.
pub(crate) fn check_presence(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    if ctx.is_blank() {
        return;
    }
    let Some(re) = model_token_pattern() else {
        return;
    };
    if ctx.lines.iter().any(|l| re.is_match(l)) {
        return;
    }

    out.push(Diagnostic::error(
        DiagnosticCode::NoModelDefinition,
        "No model definition found. Define a model with 'model <Name> { ... }'",
        Range::on_line(0, 0, ctx.line_len(0)),
    ));
}

pub(crate) fn check_empty_file(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    if ctx.is_blank() {
        out.push(Diagnostic::warning(
            DiagnosticCode::EmptyFile,
            "Document is empty",
            Range::default(),
        ));
    }
}

/// Brace balance across the document and bracket balance per line.
///
/// A `}` with nothing open is reported where it appears. A `{` still open
/// at end of input is reported only when no unclosed model already covers
/// it. Parentheses and square brackets must balance on their own line,
/// since declarations are scanned line by line.
pub(crate) fn check_brace_balance(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let mut open_braces: Vec<Position> = Vec::new();

    for (line_num, raw) in ctx.lines.iter().enumerate() {
        let line_num = line_num as u32;
        let code = strip_line_comment(raw);
        let mut brackets: Vec<(char, usize)> = Vec::new();
        let mut line_reported = false;

        for (col, c) in unquoted_chars(code) {
            match c {
                '{' => open_braces.push(Position {
                    line: line_num,
                    character: col as u32,
                }),
                '}' => {
                    if open_braces.pop().is_none() {
                        out.push(Diagnostic::error(
                            DiagnosticCode::UnmatchedBrace,
                            "Unmatched closing brace '}'",
                            Range::on_line(line_num, col as u32, col as u32 + 1),
                        ));
                    }
                }
                '(' | '[' => brackets.push((c, col)),
                ')' | ']' if !line_reported => {
                    let expected = if c == ')' { '(' } else { '[' };
                    match brackets.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            out.push(Diagnostic::error(
                                DiagnosticCode::UnbalancedParentheses,
                                format!("Unmatched closing '{}'", c),
                                Range::on_line(line_num, col as u32, col as u32 + 1),
                            ));
                            line_reported = true;
                        }
                    }
                }
                _ => {}
            }
        }

        if !line_reported {
            if let Some(&(c, col)) = brackets.first() {
                out.push(Diagnostic::error(
                    DiagnosticCode::UnbalancedParentheses,
                    format!("Unclosed '{}' on this line", c),
                    Range::on_line(line_num, col as u32, col as u32 + 1),
                ));
            }
        }
    }

    for brace in open_braces {
        let covered = ctx
            .structure
            .models
            .iter()
            .any(|m| !m.is_closed() && brace.line >= m.start_line);
        if !covered {
            out.push(Diagnostic::error(
                DiagnosticCode::UnmatchedBrace,
                "Unclosed '{'",
                Range::on_line(brace.line, brace.character, brace.character + 1),
            ));
        }
    }
}

/// Turn scanner findings into diagnostics.
pub(crate) fn check_scan_errors(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for error in &ctx.structure.errors {
        let diagnostic = match error {
            ScanError::UnclosedModel { line, column, .. } => Diagnostic::error(
                DiagnosticCode::UnclosedModel,
                error.to_string(),
                Range::on_line(*line, *column, ctx.line_len(*line)),
            ),
            ScanError::NestedModel {
                parent,
                parent_line,
                line,
                column,
                ..
            } => Diagnostic::error(
                DiagnosticCode::NestedModel,
                error.to_string(),
                Range::on_line(*line, *column, ctx.line_len(*line)),
            )
            .with_related(
                format!("Model '{}' starts here", parent),
                Range::on_line(*parent_line, 0, ctx.line_len(*parent_line)),
            ),
        };
        out.push(diagnostic);
    }
}

/// Per-model checks: layers present, input and output layers, flattening
/// between convolution and dense layers, indentation and naming.
pub(crate) fn check_model_content(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for model in &ctx.structure.models {
        let header = model.header_range();

        if ctx.options.strict {
            let pascal = pascal_case_pattern().map_or(true, |re| re.is_match(&model.name));
            if !pascal {
                out.push(Diagnostic::warning(
                    DiagnosticCode::ModelNaming,
                    format!("Model name '{}' should be in PascalCase", model.name),
                    header,
                ));
            }
        }

        if model.layers.is_empty() {
            out.push(Diagnostic::error(
                DiagnosticCode::EmptyModel,
                format!("Model '{}' has no layers defined", model.name),
                header,
            ));
            continue;
        }

        if !model.has_layer("Input") {
            out.push(Diagnostic::warning(
                DiagnosticCode::MissingInputLayer,
                format!("Model '{}' should have an Input layer", model.name),
                header,
            ));
        }

        let has_output = model.has_layer("Dense")
            || model.layers.iter().any(|l| {
                l.parameter("activation")
                    .is_some_and(|a| OUTPUT_ACTIVATIONS.contains(&unquote(a)))
            });
        if !has_output {
            out.push(Diagnostic::warning(
                DiagnosticCode::MissingOutputLayer,
                format!(
                    "Model '{}' has no output layer; add a Dense layer such as Dense(units=10, activation=\"softmax\")",
                    model.name
                ),
                header,
            ));
        }

        check_flatten(model, out);
        check_indentation(ctx, model, out);
    }
}

fn check_flatten(model: &Model, out: &mut Vec<Diagnostic>) {
    let mut pending_conv: Option<&Layer> = None;

    for layer in &model.layers {
        if layer.is_convolution() {
            pending_conv = Some(layer);
        } else if layer.is_flattening() {
            pending_conv = None;
        } else if layer.layer_type == "Dense" {
            if let Some(conv) = pending_conv.take() {
                out.push(
                    Diagnostic::warning(
                        DiagnosticCode::MissingFlatten,
                        format!(
                            "Dense layer follows {} without a Flatten layer; add Flatten() so the shapes are compatible",
                            conv.layer_type
                        ),
                        layer.range(),
                    )
                    .with_related("Convolutional layer declared here", conv.range()),
                );
            }
        }
    }
}

/// Layers written on their own line must be indented deeper than the
/// model header. Single-line models are exempt.
fn check_indentation(ctx: &RuleContext<'_>, model: &Model, out: &mut Vec<Diagnostic>) {
    if model.end_line == Some(model.start_line) {
        return;
    }
    let Some(header_line) = ctx.lines.get(model.start_line as usize) else {
        return;
    };
    let header_indent = indentation(header_line);
    let mut last_line = None;

    for layer in &model.layers {
        if layer.line == model.start_line || last_line == Some(layer.line) {
            continue;
        }
        last_line = Some(layer.line);

        let Some(line) = ctx.lines.get(layer.line as usize) else {
            continue;
        };
        let indent = indentation(line);
        if indent == layer.column as usize && indent <= header_indent {
            out.push(Diagnostic::warning(
                DiagnosticCode::IndentationError,
                format!(
                    "Layer '{}' should be indented inside model '{}'",
                    layer.layer_type, model.name
                ),
                Range::on_line(layer.line, 0, layer.end_column),
            ));
        }
    }
}

/// TODO and FIXME markers in comments.
pub(crate) fn check_todo_comments(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let Some(re) = todo_pattern() else {
        return;
    };

    for (line_num, line) in ctx.lines.iter().enumerate() {
        let Some(start) = comment_start(line) else {
            continue;
        };
        if let Some(marker) = re.find(&line[start..]) {
            let col = (start + marker.start()) as u32;
            out.push(Diagnostic::info(
                DiagnosticCode::TodoComment,
                format!("{} comment", marker.as_str()),
                Range::on_line(line_num as u32, col, line.len() as u32),
            ));
        }
    }
}
