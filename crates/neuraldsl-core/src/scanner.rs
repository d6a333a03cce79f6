//! Structural scanner for NeuralDSL documents.
//!
//! The scanner makes a single left-to-right pass over the document's lines.
//! It tracks model blocks with a brace counter, extracts layer declarations
//! inside them and picks up `compile`/`fit`/`train` statements anywhere.
//! It is purely constructive: problems are recorded in
//! [`ModelStructure::errors`] and rejected later by the validator.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ScanError;
use crate::params::{find_closing, parse_parameters};
use crate::structure::{Layer, Model, ModelStructure, TrainingConfig, TrainingKind};
use crate::text::strip_line_comment;

/// Identifiers that are statements, never layers.
const RESERVED: &[&str] = &["model", "compile", "fit", "train"];

fn model_header_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*model\s+(\w+)\s*\{").ok()).as_ref()
}

fn training_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^\s*(train)|\b(compile|fit))\s*\(").ok()).as_ref()
}

fn bare_layer_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*[,;]?\s*$").ok()).as_ref()
}

/// Scan a whole document.
pub fn scan_text(text: &str) -> ModelStructure {
    let lines: Vec<&str> = text.lines().collect();
    scan(&lines)
}

/// Scan a document given as lines.
pub fn scan(lines: &[&str]) -> ModelStructure {
    let mut structure = ModelStructure::default();
    let mut current: Option<Model> = None;
    let mut depth = 0usize;

    for (line_num, raw) in lines.iter().enumerate() {
        let line_num = line_num as u32;
        let code = strip_line_comment(raw);
        if code.trim().is_empty() {
            continue;
        }

        let mut body_start = 0;

        if let Some(caps) = model_header_pattern().and_then(|re| re.captures(code)) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let column = (whole.as_str().len() - whole.as_str().trim_start().len()) as u32;

            match &current {
                Some(parent) => {
                    structure.errors.push(ScanError::NestedModel {
                        name: name.as_str().to_string(),
                        parent: parent.name.clone(),
                        parent_line: parent.start_line,
                        line: line_num,
                        column,
                    });
                    // The nested header's brace still counts toward the parent.
                    depth += 1;
                }
                None => {
                    current = Some(Model {
                        name: name.as_str().to_string(),
                        start_line: line_num,
                        end_line: None,
                        column,
                        body_column: whole.end() as u32,
                        layers: Vec::new(),
                    });
                    depth = 1;
                }
            }
            body_start = whole.end();
        }

        if let Some(model) = current.as_mut() {
            let rest = &code[body_start..];
            let close = closing_brace(rest, &mut depth);
            let body = match close {
                Some(idx) => &rest[..idx],
                None => rest,
            };

            for layer in layer_declarations(body, line_num, body_start as u32) {
                structure.layers.push(layer.clone());
                model.layers.push(layer);
            }

            if close.is_some() {
                model.end_line = Some(line_num);
                if let Some(done) = current.take() {
                    log::trace!("scanned model '{}' with {} layers", done.name, done.layers.len());
                    structure.models.push(done);
                }
            }
        }

        structure.training.extend(training_statements(code, line_num));
    }

    if let Some(model) = current {
        structure.errors.push(ScanError::UnclosedModel {
            name: model.name.clone(),
            line: model.start_line,
            column: model.column,
        });
        structure.models.push(model);
    }

    structure
}

/// Advance the brace counter over `text`; returns the byte index of the
/// brace that brings it back to zero.
fn closing_brace(text: &str, depth: &mut usize) -> Option<usize> {
    for (i, c) in crate::text::unquoted_chars(text) {
        match c {
            '{' => *depth += 1,
            '}' => {
                *depth = depth.saturating_sub(1);
                if *depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract layer declarations from the part of a line that lies inside a
/// model body. `offset` is the byte column where `body` starts.
fn layer_declarations(body: &str, line: u32, offset: u32) -> Vec<Layer> {
    let mut layers: Vec<Layer> = declarations(body)
        .into_iter()
        .filter(|d| !RESERVED.contains(&d.name))
        .map(|d| Layer {
            layer_type: d.name.to_string(),
            line,
            column: offset + d.start as u32,
            end_column: offset + d.end as u32,
            arguments: Some(d.arguments.to_string()),
            parameters: parse_parameters(d.arguments),
        })
        .collect();

    if layers.is_empty() {
        if let Some(name) = bare_layer_pattern()
            .and_then(|re| re.captures(body))
            .and_then(|caps| caps.get(1))
            .filter(|m| !RESERVED.contains(&m.as_str()))
        {
            layers.push(Layer {
                layer_type: name.as_str().to_string(),
                line,
                column: offset + name.start() as u32,
                end_column: offset + name.end() as u32,
                arguments: None,
                parameters: Default::default(),
            });
        }
    }

    layers
}

/// Collect `compile(...)`, `fit(...)` and `train(...)` statements on a line.
fn training_statements(code: &str, line: u32) -> Vec<TrainingConfig> {
    let Some(re) = training_pattern() else {
        return Vec::new();
    };

    let mut statements = Vec::new();
    for caps in re.captures_iter(code) {
        let Some(keyword) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let Some(kind) = TrainingKind::from_keyword(keyword.as_str()) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };

        let open = whole.end() - 1;
        let (arguments, end) = match find_closing(code, open) {
            Some(close) => (&code[open + 1..close], close + 1),
            None => (&code[open + 1..], code.len()),
        };

        statements.push(TrainingConfig {
            kind,
            line,
            column: keyword.start() as u32,
            end_column: end as u32,
            parameters: parse_parameters(arguments),
        });
    }

    statements
}

/// A `Name(...)` call found at nesting depth zero.
#[derive(Debug, PartialEq)]
struct Declaration<'a> {
    name: &'a str,
    start: usize,
    end: usize,
    arguments: &'a str,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index just past the string literal opening at `start`.
fn skip_string(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Find every `Name(...)` declaration in `segment`. Dotted paths such as
/// `layers.Dense(...)` yield their last component. Argument lists are
/// skipped wholesale, so calls nested inside them are not reported.
fn declarations(segment: &str) -> Vec<Declaration<'_>> {
    let bytes = segment.as_bytes();
    let len = bytes.len();
    let mut found = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == b'"' || b == b'\'' {
            i = skip_string(segment, i);
            continue;
        }

        if !is_word_byte(b) {
            i += 1;
            continue;
        }

        let start = i;
        while i < len
            && (is_word_byte(bytes[i]) || (bytes[i] == b'.' && i + 1 < len && is_word_byte(bytes[i + 1])))
        {
            i += 1;
        }
        if b.is_ascii_digit() {
            continue;
        }

        let path = &segment[start..i];
        let name_offset = path.rfind('.').map_or(0, |dot| dot + 1);

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= len || bytes[j] != b'(' {
            continue;
        }

        let (arguments, end) = match find_closing(segment, j) {
            Some(close) => (&segment[j + 1..close], close + 1),
            None => (&segment[j + 1..], len),
        };

        found.push(Declaration {
            name: &path[name_offset..],
            start: start + name_offset,
            end,
            arguments,
        });
        i = end;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_model_closes_on_final_brace() {
        for n in [0usize, 1, 3, 7] {
            let mut lines = vec!["model M {".to_string()];
            for i in 0..n {
                lines.push(format!("    Dense(units={})", i + 1));
            }
            lines.push("}".to_string());
            let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

            let structure = scan(&refs);
            assert_eq!(structure.models.len(), 1);
            let model = &structure.models[0];
            assert_eq!(model.end_line, Some((lines.len() - 1) as u32), "n = {n}");
            assert_eq!(model.layers.len(), n);
            assert_eq!(structure.layers.len(), n);
            assert!(structure.errors.is_empty());
        }
    }

    #[test]
    fn test_single_line_model() {
        let structure = scan_text(
            "model M { Input(shape=(28,28,1)) Conv2D(filters=32, kernel_size=(3,3)) Dense(units=10) }",
        );
        let model = &structure.models[0];
        assert_eq!(model.end_line, Some(0));

        let types: Vec<&str> = model.layers.iter().map(|l| l.layer_type.as_str()).collect();
        assert_eq!(types, vec!["Input", "Conv2D", "Dense"]);
        assert_eq!(model.layers[0].parameter("shape"), Some("(28,28,1)"));
        assert_eq!(model.layers[1].parameter("kernel_size"), Some("(3,3)"));
        assert_eq!(model.layers[2].parameter("units"), Some("10"));
    }

    #[test]
    fn test_layer_columns_point_at_keyword() {
        let structure = scan_text("model T { Dense() }");
        let layer = &structure.layers[0];
        assert_eq!(layer.column, 10);
        assert_eq!(layer.end_column, 17);
        assert_eq!(layer.arguments.as_deref(), Some(""));
        assert!(layer.parameters.is_empty());
    }

    #[test]
    fn test_unclosed_model_is_recorded() {
        let structure = scan_text("model Broken {\n    Dense(units=10)\n");
        assert_eq!(structure.models.len(), 1);
        assert_eq!(structure.models[0].end_line, None);
        assert!(matches!(
            structure.errors.as_slice(),
            [ScanError::UnclosedModel { name, line: 0, .. }] if name == "Broken"
        ));
    }

    #[test]
    fn test_nested_model_is_recorded_and_braces_still_balance() {
        let text = "model Outer {\n  model Inner {\n    Dense(units=1)\n  }\n  Dense(units=2)\n}";
        let structure = scan_text(text);

        assert_eq!(structure.models.len(), 1);
        assert_eq!(structure.models[0].end_line, Some(5));
        assert_eq!(structure.models[0].layers.len(), 2);
        assert!(matches!(
            structure.errors.as_slice(),
            [ScanError::NestedModel { name, parent, line: 1, .. }] if name == "Inner" && parent == "Outer"
        ));
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let text = "# model Fake {\nmodel Real {\n\n    // Dense(units=1)\n    Dense(units=2) # trailing\n}";
        let structure = scan_text(text);
        assert_eq!(structure.models.len(), 1);
        assert_eq!(structure.models[0].name, "Real");
        assert_eq!(structure.layers.len(), 1);
        assert_eq!(structure.layers[0].parameter("units"), Some("2"));
    }

    #[test]
    fn test_bare_keyword_is_a_layer() {
        let structure = scan_text("model M {\n  Flatten\n  Dense(units=1)\n}");
        let layer = &structure.layers[0];
        assert_eq!(layer.layer_type, "Flatten");
        assert_eq!(layer.arguments, None);
    }

    #[test]
    fn test_dotted_layer_paths_use_last_component() {
        let structure = scan_text("model M {\n  layers.Dense(units=4)\n}");
        assert_eq!(structure.layers[0].layer_type, "Dense");
        assert_eq!(structure.layers[0].column, 9);
    }

    #[test]
    fn test_training_statements_inside_and_outside_models() {
        let text = "model M {\n  Dense(units=1)\n  compile(optimizer='adam', loss='mse')\n}\nfit(epochs=10, batch_size=32)\ntrain(optimizer='sgd')";
        let structure = scan_text(text);

        let kinds: Vec<TrainingKind> = structure.training.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TrainingKind::Compile, TrainingKind::Fit, TrainingKind::Train]);
        assert_eq!(structure.layers.len(), 1, "compile must not be scanned as a layer");
        assert_eq!(structure.training[1].parameter("epochs"), Some("10"));
        assert_eq!(structure.training[0].line, 2);
    }

    #[test]
    fn test_braces_in_strings_do_not_close_models() {
        let structure = scan_text("model M {\n  Dense(units=1, name='}')\n}");
        assert_eq!(structure.models[0].end_line, Some(2));
    }

    #[test]
    fn test_scanner_never_panics() {
        for text in ["", "}", "{{{{", "model", "model {", "model M {(", "\u{0}\u{ffff}", "model M { 'unterminated"] {
            let _ = scan_text(text);
        }
    }
}
