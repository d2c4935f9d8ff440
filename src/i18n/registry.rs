//! Language registry: Single source of truth for all supported languages.
//!
//! This module provides a centralized registry of every language the site is
//! published in. It uses a singleton pattern with `OnceLock` to ensure
//! thread-safe initialization and access.

use std::sync::OnceLock;

/// Configuration for a supported language.
///
/// Contains the metadata shown in the language picker, the enabled status,
/// and whether the language is the fallback for missing translations.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "fr", "de")
    pub code: &'static str,

    /// English name of the language (e.g., "French", "German")
    pub name: &'static str,

    /// Native name of the language (e.g., "Français", "Deutsch")
    pub native_name: &'static str,

    /// Whether this is the default/fallback language (exactly one should be true)
    pub is_default: bool,

    /// Whether this language is offered to visitors
    pub enabled: bool,
}

/// Global language registry singleton.
///
/// Initialized once on first access and immutable thereafter.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language exists
    /// * `None` if the language is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get all enabled languages, in picker order.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Get all languages (including disabled ones).
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the default (fallback) language configuration.
    ///
    /// # Panics
    /// Panics if no default language is found or if several are flagged
    /// (this indicates an error in the static registry data).
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }

    /// Check if a language code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

/// The eight languages the site ships with. French is the reference
/// language every other translation falls back to.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "fr",
            name: "French",
            native_name: "Français",
            is_default: true,
            enabled: true,
        },
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: false,
            enabled: true,
        },
        LanguageConfig {
            code: "de",
            name: "German",
            native_name: "Deutsch",
            is_default: false,
            enabled: true,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_default: false,
            enabled: true,
        },
        LanguageConfig {
            code: "it",
            name: "Italian",
            native_name: "Italiano",
            is_default: false,
            enabled: true,
        },
        LanguageConfig {
            code: "pt",
            name: "Portuguese",
            native_name: "Português",
            is_default: false,
            enabled: true,
        },
        LanguageConfig {
            code: "nl",
            name: "Dutch",
            native_name: "Nederlands",
            is_default: false,
            enabled: true,
        },
        LanguageConfig {
            code: "pl",
            name: "Polish",
            native_name: "Polski",
            is_default: false,
            enabled: true,
        },
    ]
}
