//! Hover provider for NeuralDSL.
//!
//! Provides information on hover for:
//! - Layer declarations (required and declared parameters)
//! - Training statements (`compile`, `fit`, `train`)
//! - Model headers (layer summary)

use neuraldsl_core::{required_parameters, Layer, Model, ModelStructure, Parameters, TrainingConfig};
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::diagnostics::to_lsp_range;
use crate::document::Document;

/// Get hover information for a position in a scanned document.
pub fn get_hover(structure: &ModelStructure, doc: &Document, position: Position) -> Option<Hover> {
    let line = position.line;
    let column = doc.byte_column(line, position.character);

    if let Some(layer) = structure.layer_at(line, column) {
        return Some(Hover {
            contents: HoverContents::Markup(format_layer_hover(layer)),
            range: Some(to_lsp_range(&layer.name_range(), Some(doc))),
        });
    }

    if let Some(config) = structure.training_at_line(line) {
        return Some(Hover {
            contents: HoverContents::Markup(format_training_hover(config)),
            range: Some(to_lsp_range(&config.range(), Some(doc))),
        });
    }

    if let Some(model) = structure.models.iter().find(|m| m.start_line == line) {
        return Some(Hover {
            contents: HoverContents::Markup(format_model_hover(model)),
            range: Some(to_lsp_range(&model.header_range(), Some(doc))),
        });
    }

    None
}

fn push_parameters(content: &mut String, parameters: &Parameters) {
    if parameters.is_empty() {
        return;
    }
    content.push_str("**Parameters:**\n\n");
    for (name, value) in parameters {
        content.push_str(&format!("- `{}` = `{}`\n", name, value));
    }
}

fn format_layer_hover(layer: &Layer) -> MarkupContent {
    let mut content = format!("### Layer: `{}`\n\n", layer.layer_type);

    let required = required_parameters(&layer.layer_type);
    if !required.is_empty() {
        let names: Vec<String> = required
            .iter()
            .map(|name| {
                if layer.parameters.contains_key(*name) {
                    format!("`{}`", name)
                } else {
                    format!("`{}` (missing)", name)
                }
            })
            .collect();
        content.push_str(&format!("**Required:** {}\n\n", names.join(", ")));
    }

    push_parameters(&mut content, &layer.parameters);

    MarkupContent {
        kind: MarkupKind::Markdown,
        value: content,
    }
}

fn format_training_hover(config: &TrainingConfig) -> MarkupContent {
    let summary = match (config.kind.configures_optimizer(), config.kind.runs_training()) {
        (true, true) => "Configures the optimizer and loss, then runs training.",
        (true, false) => "Configures the optimizer and loss.",
        _ => "Runs the training loop.",
    };
    let mut content = format!("### Training: `{}()`\n\n{}\n\n", config.kind, summary);
    push_parameters(&mut content, &config.parameters);

    MarkupContent {
        kind: MarkupKind::Markdown,
        value: content,
    }
}

fn format_model_hover(model: &Model) -> MarkupContent {
    let mut content = format!("### Model: `{}`\n\n", model.name);

    match model.end_line {
        Some(end) => content.push_str(&format!("Lines {}-{}\n\n", model.start_line + 1, end + 1)),
        None => content.push_str("**Not closed**\n\n"),
    }

    if model.layers.is_empty() {
        content.push_str("No layers defined.\n");
    } else {
        content.push_str(&format!("**Layers ({}):**\n\n", model.layers.len()));
        for layer in &model.layers {
            content.push_str(&format!("- `{}`\n", layer.layer_type));
        }
    }

    MarkupContent {
        kind: MarkupKind::Markdown,
        value: content,
    }
}
