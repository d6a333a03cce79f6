//! Layer parameter rules: required parameters, value types and ranges,
//! known activation and padding names, deprecated layer types.

use super::catalog::{replacement_for, required_parameters, value_class, ValueClass};
use super::RuleContext;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Range};
use crate::structure::Layer;
use crate::text::{find_similar, parse_number, unquote};

pub(crate) fn check_layer_parameters(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for layer in &ctx.structure.layers {
        if ctx.options.is_deprecated(&layer.layer_type) {
            let mut diagnostic = Diagnostic::warning(
                DiagnosticCode::DeprecatedLayer,
                format!("Layer '{}' is deprecated", layer.layer_type),
                layer.name_range(),
            );
            if let Some(replacement) = replacement_for(&layer.layer_type) {
                diagnostic = diagnostic.with_suggestion(format!("Use '{}' instead", replacement));
            }
            out.push(diagnostic);
        }

        for required in required_parameters(&layer.layer_type) {
            if !layer.parameters.contains_key(*required) {
                out.push(Diagnostic::error(
                    DiagnosticCode::MissingRequiredParameter,
                    format!(
                        "Layer '{}' is missing required parameter '{}'",
                        layer.layer_type, required
                    ),
                    layer.range(),
                ));
            }
        }

        for (name, value) in &layer.parameters {
            let Some(class) = value_class(name) else {
                continue;
            };
            let range = ctx
                .parameter_range(layer.line, layer.column, layer.end_column, name, value)
                .unwrap_or_else(|| layer.range());
            if let Some(diagnostic) = check_value(layer, name, value, class, range) {
                out.push(diagnostic);
            }
        }
    }
}

fn check_value(layer: &Layer, name: &str, value: &str, class: ValueClass, range: Range) -> Option<Diagnostic> {
    match class {
        ValueClass::Numeric => {
            let Some(number) = parse_number(value) else {
                return Some(Diagnostic::error(
                    DiagnosticCode::InvalidParameterType,
                    format!(
                        "Parameter '{}' of layer '{}' must be a number, got '{}'",
                        name, layer.layer_type, value
                    ),
                    range,
                ));
            };

            let valid = if name == "rate" {
                (0.0..1.0).contains(&number)
            } else {
                number > 0.0 && number.fract() == 0.0
            };
            if valid {
                return None;
            }

            let expected = if name == "rate" {
                "a value in [0, 1)"
            } else {
                "a positive integer"
            };
            Some(Diagnostic::error(
                DiagnosticCode::InvalidParameterValue,
                format!(
                    "Parameter '{}' of layer '{}' must be {}, got {}",
                    name, layer.layer_type, expected, value
                ),
                range,
            ))
        }
        ValueClass::Tuple => {
            let trimmed = value.trim();
            if trimmed.starts_with('(') && trimmed.ends_with(')') {
                return None;
            }
            Some(Diagnostic::error(
                DiagnosticCode::InvalidParameterType,
                format!(
                    "Parameter '{}' of layer '{}' must be a tuple such as (3, 3), got '{}'",
                    name, layer.layer_type, value
                ),
                range,
            ))
        }
        ValueClass::Choice(known) => {
            let name_value = unquote(value);
            if known.contains(&name_value) || name_value == "None" {
                return None;
            }

            let diagnostic = Diagnostic::warning(
                DiagnosticCode::UnknownParameterValue,
                format!(
                    "Unknown {} '{}' for layer '{}'. Valid values: {}",
                    name,
                    name_value,
                    layer.layer_type,
                    known.join(", ")
                ),
                range,
            );
            Some(match find_similar(name_value, known) {
                Some(similar) => diagnostic.with_suggestion(format!("Did you mean '{}'?", similar)),
                None => diagnostic,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
    use crate::options::ValidationOptions;
    use crate::validation::analyze;

    fn diagnostics_for(body: &str) -> Vec<Diagnostic> {
        let text = format!(
            "model M {{\n  Input(shape=(8,))\n  {}\n  Dense(units=1)\n}}\ncompile(optimizer='adam', loss='mse')",
            body
        );
        analyze(&text, &ValidationOptions::default()).diagnostics
    }

    fn find(diagnostics: &[Diagnostic], code: DiagnosticCode) -> Option<&Diagnostic> {
        diagnostics.iter().find(|d| d.code == code)
    }

    #[test]
    fn test_missing_required_parameter_message() {
        let diagnostics = diagnostics_for("Conv2D(kernel_size=(3, 3))");
        let diag = find(&diagnostics, DiagnosticCode::MissingRequiredParameter).expect("missing filters");
        assert_eq!(diag.message, "Layer 'Conv2D' is missing required parameter 'filters'");
        assert_eq!(diag.range.start.line, 2);
        assert_eq!(diag.range.start.character, 2);
    }

    #[test]
    fn test_non_numeric_units() {
        let diagnostics = diagnostics_for("Dense(units=many)");
        let diag = find(&diagnostics, DiagnosticCode::InvalidParameterType).expect("invalid type");
        assert!(diag.message.contains("must be a number"));
        assert_eq!(diag.severity, Severity::Error);
        // Range covers `units=many`.
        assert_eq!(diag.range.start.character, 8);
        assert_eq!(diag.range.end.character, 18);
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(find(&diagnostics_for("Dense(units=0)"), DiagnosticCode::InvalidParameterValue).is_some());
        assert!(find(&diagnostics_for("Dense(units=2.5)"), DiagnosticCode::InvalidParameterValue).is_some());
        assert!(find(&diagnostics_for("Dropout(rate=1.0)"), DiagnosticCode::InvalidParameterValue).is_some());
        assert!(find(&diagnostics_for("Dropout(rate=0)"), DiagnosticCode::InvalidParameterValue).is_none());
        assert!(find(&diagnostics_for("Dense(units=\"32\")"), DiagnosticCode::InvalidParameterType).is_none());
    }

    #[test]
    fn test_tuple_parameters_need_parentheses() {
        let diagnostics = diagnostics_for("MaxPooling2D(pool_size=2)");
        let diag = find(&diagnostics, DiagnosticCode::InvalidParameterType).expect("tuple expected");
        assert!(diag.message.contains("must be a tuple"));
        assert!(find(&diagnostics_for("MaxPooling2D(pool_size=(2, 2))"), DiagnosticCode::InvalidParameterType).is_none());
    }

    #[test]
    fn test_unknown_activation_suggests_close_match() {
        let diagnostics = diagnostics_for("Dense(units=4, activation=\"softmx\")");
        let diag = find(&diagnostics, DiagnosticCode::UnknownParameterValue).expect("unknown activation");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.suggestion.as_deref(), Some("Did you mean 'softmax'?"));
        assert!(!diag.message.contains("Did you mean"));
        assert!(diag.message.contains("relu"));
    }

    #[test]
    fn test_unknown_padding() {
        let diagnostics = diagnostics_for("Conv2D(filters=4, kernel_size=(3, 3), padding='full')");
        let diag = find(&diagnostics, DiagnosticCode::UnknownParameterValue).expect("unknown padding");
        assert!(diag.message.contains("valid, same"));
    }

    #[test]
    fn test_deprecated_layer_suggests_replacement() {
        let diagnostics = diagnostics_for("SimpleRNN(units=8)");
        let diag = find(&diagnostics, DiagnosticCode::DeprecatedLayer).expect("deprecated layer");
        assert!(diag.message.contains("'SimpleRNN' is deprecated"));
        assert_eq!(diag.suggestion.as_deref(), Some("Use 'LSTM' instead"));
        assert_eq!(diag.range.end.character - diag.range.start.character, "SimpleRNN".len() as u32);
    }

    #[test]
    fn test_deprecated_layers_are_configurable() {
        let options = ValidationOptions {
            deprecated_layers: vec!["GRU".to_string()],
            ..Default::default()
        };
        let analysis = analyze("model M {\n  Input(shape=(4,))\n  GRU(units=4)\n  SimpleRNN(units=4)\n  Dense(units=1)\n}", &options);
        let deprecated: Vec<_> = analysis
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::DeprecatedLayer)
            .collect();
        assert_eq!(deprecated.len(), 1);
        assert!(deprecated[0].message.contains("'GRU'"));
    }
}
