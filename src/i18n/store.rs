//! Persistence for the visitor's language preference.
//!
//! The preference is a single scalar. It is read once at startup and written
//! on every explicit language change.

use crate::i18n::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Storage backend for the language preference.
pub trait PreferenceStore: Send + Sync {
    /// Stored language code, if any.
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, language: Language) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    language: String,
}

/// Preference stored as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("No language preference at {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let stored: StoredPreference = serde_json::from_str(&content)
            .with_context(|| format!("Invalid language preference in {}", self.path.display()))?;

        Ok(Some(stored.language))
    }

    fn save(&self, language: Language) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let stored = StoredPreference {
            language: language.code().to_string(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!("Saved language preference '{}'", language);
        Ok(())
    }
}

/// In-process store, for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    value: Mutex<Option<String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(code: &str) -> Self {
        Self {
            value: Mutex::new(Some(code.to_string())),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<String>> {
        let value = self
            .value
            .lock()
            .map_err(|_| anyhow::anyhow!("Preference store lock poisoned"))?;
        Ok(value.clone())
    }

    fn save(&self, language: Language) -> Result<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|_| anyhow::anyhow!("Preference store lock poisoned"))?;
        *value = Some(language.code().to_string());
        Ok(())
    }
}

/// Read the stored preference and turn it into a language.
///
/// Missing, unreadable or unsupported values yield the default language.
pub fn initial_language(store: &dyn PreferenceStore) -> Language {
    match store.load() {
        Ok(Some(code)) => Language::from_code(&code).unwrap_or_else(|e| {
            warn!("Ignoring stored language preference: {}", e);
            Language::default_language()
        }),
        Ok(None) => Language::default_language(),
        Err(e) => {
            warn!("Failed to load language preference: {:#}", e);
            Language::default_language()
        }
    }
}
