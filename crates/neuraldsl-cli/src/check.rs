//! The `check` command: validate files from disk.

use neuraldsl_core::{ValidationOptions, Validator};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::report::FileReport;

/// Exit code when every file is free of errors.
pub const EXIT_OK: i32 = 0;
/// Exit code when at least one file has error diagnostics.
pub const EXIT_ERRORS: i32 = 1;
/// Exit code when a file could not be read.
pub const EXIT_UNREADABLE: i32 = 2;

/// Result of checking a set of files.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    pub reports: Vec<FileReport>,
    pub unreadable: Vec<(PathBuf, io::Error)>,
}

impl CheckOutcome {
    pub fn exit_code(&self) -> i32 {
        if !self.unreadable.is_empty() {
            EXIT_UNREADABLE
        } else if self.reports.iter().any(|r| r.analysis.error_count() > 0) {
            EXIT_ERRORS
        } else {
            EXIT_OK
        }
    }
}

/// Read and validate every file. Unreadable files are collected, not fatal.
pub fn check_files(files: &[PathBuf], options: &ValidationOptions) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    let validator = Validator::new(options.clone());

    for path in files {
        match fs::read_to_string(path) {
            Ok(text) => {
                let file = path.display().to_string();
                let analysis = validator.analyze_document(&file, &text);
                log::debug!("{}: {} diagnostics", file, analysis.diagnostics.len());
                outcome.reports.push(FileReport { file, analysis });
            }
            Err(e) => {
                log::debug!("Cannot read {}: {}", path.display(), e);
                outcome.unreadable.push((path.clone(), e));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = "model Net {\n    Input(shape=(4,))\n    Dropout(rate=0.1)\n    Dense(units=2, activation=\"softmax\")\n}\ncompile(optimizer=\"adam\", loss=\"mse\")\n";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_clean_files_exit_zero() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "net.neural", VALID);

        let outcome = check_files(&[path], &ValidationOptions::default());
        assert!(outcome.reports[0].analysis.diagnostics.is_empty());
        assert_eq!(outcome.exit_code(), EXIT_OK);
    }

    #[test]
    fn test_errors_exit_one() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.neural", VALID);
        let bad = write(&dir, "bad.neural", "model T { Dense() }");

        let outcome = check_files(&[good, bad], &ValidationOptions::default());
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.exit_code(), EXIT_ERRORS);
    }

    #[test]
    fn test_warnings_alone_exit_zero() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.neural", "");

        let outcome = check_files(&[path], &ValidationOptions::default());
        assert_eq!(outcome.reports[0].analysis.warning_count(), 1);
        assert_eq!(outcome.exit_code(), EXIT_OK);
    }

    #[test]
    fn test_unreadable_file_exit_two() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.neural", "model T { Dense() }");
        let missing = dir.path().join("missing.neural");

        let outcome = check_files(&[bad, missing.clone()], &ValidationOptions::default());
        assert_eq!(outcome.unreadable[0].0, missing);
        assert_eq!(outcome.exit_code(), EXIT_UNREADABLE);
    }

    #[test]
    fn test_ignore_patterns_match_file_paths() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "model.gen.neural", "model T { Dense() }");
        let options = ValidationOptions {
            ignore_patterns: vec![r"\.gen\.neural$".to_string()],
            ..Default::default()
        };

        let outcome = check_files(&[path], &options);
        assert!(outcome.reports[0].analysis.diagnostics.is_empty());
        assert_eq!(outcome.exit_code(), EXIT_OK);
    }
}
