//! Validation options.
//!
//! Options arrive either as LSP settings JSON (camelCase keys such as
//! `maxNumberOfProblems`) or from a TOML config file (snake_case keys), so
//! every multi-word field accepts both spellings.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default quiescence window before a changed document is re-validated.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default cap on reported diagnostics per document.
pub const DEFAULT_MAX_PROBLEMS: usize = 100;

/// Caller-supplied switches for one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOptions {
    /// When false, documents receive no diagnostics at all.
    pub enable: bool,
    /// Enables style rules and promotes parameter/training warnings to errors.
    pub strict: bool,
    /// Diagnostics beyond this count are dropped.
    #[serde(alias = "max_number_of_problems")]
    pub max_number_of_problems: usize,
    /// Regular expressions matched against the document identifier.
    #[serde(alias = "ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    /// Debounce window for re-validation after edits.
    #[serde(alias = "debounce_ms")]
    pub debounce_ms: u64,
    /// Layer types reported as deprecated.
    #[serde(alias = "deprecated_layers")]
    pub deprecated_layers: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            enable: true,
            strict: false,
            max_number_of_problems: DEFAULT_MAX_PROBLEMS,
            ignore_patterns: Vec::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            deprecated_layers: vec!["SimpleRNN".to_string()],
        }
    }
}

impl ValidationOptions {
    /// Compile the ignore patterns. Patterns that fail to compile are
    /// skipped.
    pub fn ignore_set(&self) -> IgnorePatterns {
        IgnorePatterns::compile(&self.ignore_patterns)
    }

    /// Whether `layer_type` is listed as deprecated.
    pub fn is_deprecated(&self, layer_type: &str) -> bool {
        self.deprecated_layers.iter().any(|l| l == layer_type)
    }
}

/// Compiled [`ValidationOptions::ignore_patterns`].
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<Regex>,
}

impl IgnorePatterns {
    pub fn compile(sources: &[String]) -> Self {
        let patterns = sources
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Ignoring invalid ignore pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Whether `document_id` matches any pattern.
    pub fn is_match(&self, document_id: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(document_id))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ValidationOptions::default();
        assert!(options.enable);
        assert!(!options.strict);
        assert_eq!(options.max_number_of_problems, 100);
        assert_eq!(options.debounce_ms, 300);
        assert!(options.is_deprecated("SimpleRNN"));
    }

    #[test]
    fn test_camel_case_settings() {
        let options: ValidationOptions = serde_json::from_str(
            r#"{"strict": true, "maxNumberOfProblems": 5, "ignorePatterns": ["\\.gen\\.neural$"]}"#,
        )
        .unwrap();
        assert!(options.strict);
        assert!(options.enable, "missing keys fall back to defaults");
        assert_eq!(options.max_number_of_problems, 5);
        assert!(options.ignore_set().is_match("file:///tmp/model.gen.neural"));
        assert!(!options.ignore_set().is_match("file:///tmp/model.neural"));
    }

    #[test]
    fn test_snake_case_aliases() {
        let options: ValidationOptions =
            serde_json::from_str(r#"{"max_number_of_problems": 7, "debounce_ms": 50}"#).unwrap();
        assert_eq!(options.max_number_of_problems, 7);
        assert_eq!(options.debounce_ms, 50);
    }

    #[test]
    fn test_invalid_ignore_pattern_is_skipped() {
        let options = ValidationOptions {
            ignore_patterns: vec!["(".to_string(), "scratch".to_string()],
            ..Default::default()
        };
        let ignore = options.ignore_set();
        assert_eq!(ignore.len(), 1);
        assert!(ignore.is_match("scratch.neural"));
        assert!(!ignore.is_match("model.neural"));
    }
}
