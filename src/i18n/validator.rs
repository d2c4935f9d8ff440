//! Translation coverage validation.
//!
//! Compares every language tree against the default language tree to catch
//! keys that will silently fall back, keys the site never asks for, shape
//! conflicts and broken `{placeholder}` sets.

use crate::i18n::{LocaleTable, TranslationNode};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Language the report is about
    pub language: String,

    /// Problems that render wrong text (shape conflicts, placeholder drift)
    pub errors: Vec<String>,

    /// Gaps that are covered by the fallback language
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for translation trees.
pub struct TranslationValidator;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate every non-default language of the table, sorted by code.
    pub fn validate_table(table: &LocaleTable) -> Vec<ValidationReport> {
        let default = table.default_language();
        let Some(reference) = table.tree(default) else {
            return Vec::new();
        };

        table
            .languages()
            .into_iter()
            .filter(|code| *code != default)
            .filter_map(|code| {
                table
                    .tree(code)
                    .map(|tree| Self::validate_tree(code, reference, tree))
            })
            .collect()
    }

    /// Validate one translation tree against the reference tree.
    pub fn validate_tree(
        language: &str,
        reference: &TranslationNode,
        translated: &TranslationNode,
    ) -> ValidationReport {
        let mut report = ValidationReport::new(language);
        compare(reference, translated, "", &mut report);
        report.errors.sort();
        report.warnings.sort();
        report
    }

    /// Extract the sorted set of `{name}` placeholders from a string.
    pub fn extract_placeholders(text: &str) -> BTreeSet<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{(\w+)\}").unwrap());

        regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn compare(
    reference: &TranslationNode,
    translated: &TranslationNode,
    path: &str,
    report: &mut ValidationReport,
) {
    match (reference, translated) {
        (TranslationNode::Text(expected), TranslationNode::Text(actual)) => {
            let expected_vars = TranslationValidator::extract_placeholders(expected);
            let actual_vars = TranslationValidator::extract_placeholders(actual);
            if expected_vars != actual_vars {
                report.errors.push(format!(
                    "Placeholder mismatch at '{}': expected {:?}, found {:?}",
                    path, expected_vars, actual_vars
                ));
            }
            if actual.trim().is_empty() {
                report.warnings.push(format!("Empty translation at '{}'", path));
            }
        }
        (TranslationNode::Branch(expected), TranslationNode::Branch(actual)) => {
            for (key, child) in expected {
                let child_path = join(path, key);
                match actual.get(key) {
                    Some(translated_child) => {
                        compare(child, translated_child, &child_path, report)
                    }
                    None => report
                        .warnings
                        .push(format!("Missing key '{}' (falls back)", child_path)),
                }
            }
            for key in actual.keys().filter(|key| !expected.contains_key(*key)) {
                report
                    .warnings
                    .push(format!("Unknown key '{}'", join(path, key)));
            }
        }
        (TranslationNode::Text(_), TranslationNode::Branch(_)) => report
            .errors
            .push(format!("Expected text at '{}', found a section", path)),
        (TranslationNode::Branch(_), TranslationNode::Text(_)) => report
            .errors
            .push(format!("Expected a section at '{}', found text", path)),
    }
}
