use thiserror::Error;

/// Errors raised while building the locale table or selecting a language.
///
/// Key lookups never fail: a missing translation resolves to the key path.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("Unknown language code: '{0}'")]
    UnknownLanguage(String),

    #[error("Language '{0}' is not enabled")]
    DisabledLanguage(String),

    #[error("Default language '{0}' has no translation tree")]
    MissingDefault(String),

    #[error("Invalid translation data for '{language}': {source}")]
    InvalidTree {
        language: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Translation root for '{0}' must be an object")]
    RootNotBranch(String),
}
