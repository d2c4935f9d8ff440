//! Language type: validated language representation.
//!
//! A `Language` can only be built from a code that the registry knows and
//! has enabled, so holders of a `Language` never need to re-check it.

use crate::i18n::{I18nError, LanguageConfig, LanguageRegistry};
use serde::{Serialize, Serializer};

/// A validated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "fr", "en")
    code: &'static str,
}

impl Language {
    pub const FRENCH: Language = Language { code: "fr" };

    pub const ENGLISH: Language = Language { code: "en" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is registered and enabled
    /// * `Err(I18nError::UnknownLanguage)` if the code is not registered
    /// * `Err(I18nError::DisabledLanguage)` if the language is switched off
    pub fn from_code(code: &str) -> Result<Language, I18nError> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => Err(I18nError::DisabledLanguage(code.to_string())),
            None => Err(I18nError::UnknownLanguage(code.to_string())),
        }
    }

    /// Get the default language, used as the translation fallback.
    pub fn default_language() -> Language {
        let config = LanguageRegistry::get().default_language();
        Language { code: config.code }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a Language built through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English name of the language (e.g., "German").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name of the language (e.g., "Deutsch").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::default_language()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}
