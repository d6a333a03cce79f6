//! Quick fixes for validator diagnostics.
//!
//! Fixes are chosen purely from the diagnostic code; the scanned structure
//! only supplies the positions the edits are anchored at.

use std::collections::HashMap;
use std::str::FromStr;

use neuraldsl_core::{placeholder_for, replacement_for, required_parameters, DiagnosticCode, ModelStructure};
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, NumberOrString, Position, Range, TextEdit, Url,
    WorkspaceEdit,
};

use crate::document::Document;

/// Indentation used for inserted layer lines, relative to the model header.
const INDENT: &str = "    ";

const MODEL_SKELETON: &str = "model MyModel {\n    Input(shape=(28, 28, 1))\n    Flatten()\n    Dense(units=10, activation=\"softmax\")\n}\n\n";

const COMPILE_STATEMENT: &str = "compile(optimizer=\"adam\", loss=\"categorical_crossentropy\")";

/// Quick fixes for the diagnostics the client sent with the request.
pub fn get_code_actions(
    uri: &Url,
    doc: &Document,
    structure: &ModelStructure,
    diagnostics: &[Diagnostic],
) -> Vec<CodeActionOrCommand> {
    diagnostics
        .iter()
        .filter_map(|diagnostic| {
            let code = match &diagnostic.code {
                Some(NumberOrString::String(code)) => DiagnosticCode::from_str(code).ok()?,
                _ => return None,
            };
            let fix = Fix {
                doc,
                structure,
                diagnostic,
            };
            let (title, edits) = fix.for_code(code)?;
            Some(CodeActionOrCommand::CodeAction(CodeAction {
                title,
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: Some(vec![diagnostic.clone()]),
                edit: Some(WorkspaceEdit {
                    changes: Some(HashMap::from([(uri.clone(), edits)])),
                    ..Default::default()
                }),
                is_preferred: Some(true),
                ..Default::default()
            }))
        })
        .collect()
}

struct Fix<'a> {
    doc: &'a Document,
    structure: &'a ModelStructure,
    diagnostic: &'a Diagnostic,
}

impl Fix<'_> {
    fn for_code(&self, code: DiagnosticCode) -> Option<(String, Vec<TextEdit>)> {
        match code {
            DiagnosticCode::MissingRequiredParameter => self.add_parameters(),
            DiagnosticCode::MissingInputLayer => self.add_input_layer(),
            DiagnosticCode::MissingFlatten => self.add_flatten(),
            DiagnosticCode::MissingCompile => self.add_compile(),
            DiagnosticCode::NoModelDefinition => Some((
                "Insert a model definition".to_string(),
                vec![insert(self.position(0, 0), MODEL_SKELETON)],
            )),
            DiagnosticCode::IndentationError => self.fix_indentation(),
            DiagnosticCode::DeprecatedLayer => self.replace_deprecated(),
            _ => None,
        }
    }

    /// Diagnostic start as (line, byte column).
    fn start(&self) -> (u32, u32) {
        let start = self.diagnostic.range.start;
        (start.line, self.doc.byte_column(start.line, start.character))
    }

    fn position(&self, line: u32, byte_col: u32) -> Position {
        Position {
            line,
            character: self.doc.utf16_column(line, byte_col),
        }
    }

    fn line_text(&self, line: u32) -> String {
        self.doc.line(line as usize).unwrap_or_default()
    }

    fn indentation_of(&self, line: u32) -> String {
        let text = self.line_text(line);
        text[..text.len() - text.trim_start().len()].to_string()
    }

    fn add_parameters(&self) -> Option<(String, Vec<TextEdit>)> {
        let (line, column) = self.start();
        let layer = self.structure.layer_at(line, column)?;
        let missing: Vec<&str> = required_parameters(&layer.layer_type)
            .iter()
            .copied()
            .filter(|name| !layer.parameters.contains_key(*name))
            .collect();
        if missing.is_empty() {
            return None;
        }

        let pairs = missing
            .iter()
            .map(|name| format!("{}={}", name, placeholder_for(name)))
            .collect::<Vec<_>>()
            .join(", ");

        let edit = match &layer.arguments {
            None => insert(self.position(line, layer.end_column), &format!("({})", pairs)),
            Some(arguments) => {
                let text = self.line_text(line);
                let closed = layer.end_column > 0
                    && text.as_bytes().get(layer.end_column as usize - 1) == Some(&b')');
                let at = if closed { layer.end_column - 1 } else { layer.end_column };
                let separator = if arguments.trim().is_empty() { "" } else { ", " };
                insert(self.position(line, at), &format!("{}{}", separator, pairs))
            }
        };

        let title = if missing.len() == 1 {
            format!("Add missing parameter '{}'", missing[0])
        } else {
            format!("Add missing parameters {}", missing.join(", "))
        };
        Some((title, vec![edit]))
    }

    fn add_input_layer(&self) -> Option<(String, Vec<TextEdit>)> {
        let (line, _) = self.start();
        let model = self.structure.models.iter().find(|m| m.start_line == line)?;
        let layer = format!("Input(shape={})", placeholder_for("shape"));

        let edit = if model.end_line == Some(model.start_line) {
            insert(self.position(line, model.body_column), &format!(" {}", layer))
        } else {
            let indent = format!("{}{}", self.indentation_of(line), INDENT);
            insert(
                Position {
                    line: line + 1,
                    character: 0,
                },
                &format!("{}{}\n", indent, layer),
            )
        };
        Some(("Add an Input layer".to_string(), vec![edit]))
    }

    fn add_flatten(&self) -> Option<(String, Vec<TextEdit>)> {
        let (line, column) = self.start();
        let layer = self.structure.layer_at(line, column)?;
        let text = self.line_text(line);
        let own_line = text.trim_start().len() == text.len() - layer.column as usize;

        let edit = if own_line {
            insert(
                Position { line, character: 0 },
                &format!("{}Flatten()\n", self.indentation_of(line)),
            )
        } else {
            insert(self.position(line, layer.column), "Flatten() ")
        };
        Some(("Insert Flatten() before the Dense layer".to_string(), vec![edit]))
    }

    fn add_compile(&self) -> Option<(String, Vec<TextEdit>)> {
        let last_line = self.doc.line_count().saturating_sub(1) as u32;
        let last_text = self.line_text(last_line);
        let prefix = if last_text.trim().is_empty() { "" } else { "\n" };
        Some((
            "Add a compile() statement".to_string(),
            vec![insert(
                self.position(last_line, last_text.len() as u32),
                &format!("{}\n{}\n", prefix, COMPILE_STATEMENT),
            )],
        ))
    }

    fn fix_indentation(&self) -> Option<(String, Vec<TextEdit>)> {
        let (line, _) = self.start();
        let model = self.structure.model_at_line(line)?;
        let current = self.indentation_of(line);
        let wanted = format!("{}{}", self.indentation_of(model.start_line), INDENT);

        Some((
            "Indent the layer inside its model".to_string(),
            vec![TextEdit {
                range: Range {
                    start: Position { line, character: 0 },
                    end: self.position(line, current.len() as u32),
                },
                new_text: wanted,
            }],
        ))
    }

    fn replace_deprecated(&self) -> Option<(String, Vec<TextEdit>)> {
        let (line, column) = self.start();
        let layer = self.structure.layer_at(line, column)?;
        let replacement = replacement_for(&layer.layer_type)?;
        let name = layer.name_range();

        Some((
            format!("Replace '{}' with '{}'", layer.layer_type, replacement),
            vec![TextEdit {
                range: Range {
                    start: self.position(line, name.start.character),
                    end: self.position(line, name.end.character),
                },
                new_text: replacement.to_string(),
            }],
        ))
    }
}

fn insert(position: Position, text: &str) -> TextEdit {
    TextEdit {
        range: Range {
            start: position,
            end: position,
        },
        new_text: text.to_string(),
    }
}
