//! Locale table: per-language translation trees and key-path resolution.
//!
//! Translation data lives in `locales/<code>.json` and is embedded at compile
//! time. The table is parsed once on first access and never mutated.

use crate::i18n::{I18nError, Language};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded translation documents, one per registered language.
const LOCALE_SOURCES: &[(&str, &str)] = &[
    ("fr", include_str!("../../locales/fr.json")),
    ("en", include_str!("../../locales/en.json")),
    ("de", include_str!("../../locales/de.json")),
    ("es", include_str!("../../locales/es.json")),
    ("it", include_str!("../../locales/it.json")),
    ("pt", include_str!("../../locales/pt.json")),
    ("nl", include_str!("../../locales/nl.json")),
    ("pl", include_str!("../../locales/pl.json")),
];

/// A node of a translation tree: either a leaf string or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Text(String),
    Branch(HashMap<String, TranslationNode>),
}

impl TranslationNode {
    /// Child node for `segment`, if this node is a branch containing it.
    pub fn get(&self, segment: &str) -> Option<&TranslationNode> {
        match self {
            TranslationNode::Branch(children) => children.get(segment),
            TranslationNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TranslationNode::Text(text) => Some(text),
            TranslationNode::Branch(_) => None,
        }
    }

    /// Dot-separated paths of every leaf below this node, sorted.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(self, "", &mut paths);
        paths.sort();
        paths
    }
}

fn collect_leaf_paths(node: &TranslationNode, prefix: &str, out: &mut Vec<String>) {
    match node {
        TranslationNode::Text(_) => out.push(prefix.to_string()),
        TranslationNode::Branch(children) => {
            for (key, child) in children {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_leaf_paths(child, &path, out);
            }
        }
    }
}

/// How a key path was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Found in the requested language.
    Direct,
    /// Missing in the requested language, found in the default language.
    Fallback,
    /// Missing everywhere; the key path itself was returned.
    Missing,
}

/// Mapping from language code to its translation tree.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    default_language: String,
    trees: HashMap<String, TranslationNode>,
}

static TABLE: OnceLock<LocaleTable> = OnceLock::new();

impl LocaleTable {
    /// Get the process-wide table built from the embedded locale files.
    ///
    /// # Panics
    /// Panics if the embedded JSON is malformed. The shipped locale files are
    /// covered by tests, so this indicates a broken build.
    pub fn global() -> &'static LocaleTable {
        TABLE.get_or_init(|| {
            LocaleTable::from_sources(Language::default_language().code(), LOCALE_SOURCES)
                .expect("Embedded locale data should be valid")
        })
    }

    /// Build a table from `(language_code, json_document)` pairs.
    pub fn from_sources(default_language: &str, sources: &[(&str, &str)]) -> Result<Self, I18nError> {
        let mut trees = HashMap::with_capacity(sources.len());
        for (code, json) in sources {
            let tree: TranslationNode =
                serde_json::from_str(json).map_err(|source| I18nError::InvalidTree {
                    language: code.to_string(),
                    source,
                })?;
            trees.insert(code.to_string(), tree);
        }
        Self::new(default_language, trees)
    }

    /// Build a table from already parsed trees.
    ///
    /// Every root must be a branch and the default language must be present.
    pub fn new(
        default_language: &str,
        trees: HashMap<String, TranslationNode>,
    ) -> Result<Self, I18nError> {
        if let Some((code, _)) = trees
            .iter()
            .find(|(_, tree)| matches!(tree, TranslationNode::Text(_)))
        {
            return Err(I18nError::RootNotBranch(code.clone()));
        }
        if !trees.contains_key(default_language) {
            return Err(I18nError::MissingDefault(default_language.to_string()));
        }

        Ok(Self {
            default_language: default_language.to_string(),
            trees,
        })
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn tree(&self, language: &str) -> Option<&TranslationNode> {
        self.trees.get(language)
    }

    /// Codes of every language that has a tree, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Look a key path up in a single language, without fallback.
    pub fn lookup(&self, language: &str, key_path: &str) -> Option<&str> {
        self.trees
            .get(language)
            .and_then(|tree| walk(tree, key_path))
    }

    /// Resolve a key path for a language.
    ///
    /// Returns the leaf string from the requested language, else from the
    /// default language, else `key_path` itself.
    pub fn resolve<'a>(&'a self, language: &str, key_path: &'a str) -> &'a str {
        self.resolve_detailed(language, key_path).0
    }

    /// Like [`LocaleTable::resolve`], also reporting where the value came from.
    pub fn resolve_detailed<'a>(&'a self, language: &str, key_path: &'a str) -> (&'a str, Resolution) {
        let is_default = language == self.default_language;

        if !is_default {
            if let Some(text) = self.lookup(language, key_path) {
                return (text, Resolution::Direct);
            }
        }

        match self.lookup(&self.default_language, key_path) {
            Some(text) if is_default => (text, Resolution::Direct),
            Some(text) => (text, Resolution::Fallback),
            None => (key_path, Resolution::Missing),
        }
    }
}

/// Walk `tree` segment by segment. The final node must be a leaf.
fn walk<'a>(tree: &'a TranslationNode, key_path: &str) -> Option<&'a str> {
    if key_path.is_empty() {
        return None;
    }

    let mut node = tree;
    for segment in key_path.split('.') {
        node = node.get(segment)?;
    }
    node.as_text()
}
