//! Language session: the explicit "current language" state.
//!
//! The session is owned by the composition root and shared by reference.
//! `set_language` is its only mutator; every lookup reads the language at
//! call time, so a change is visible to all subsequent lookups.

use crate::i18n::{
    initial_language, I18nError, Language, LocaleTable, PreferenceStore, Resolution,
    TranslationMetrics,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct LanguageSession {
    table: &'static LocaleTable,
    current: RwLock<Language>,
    store: Arc<dyn PreferenceStore>,
    transition_delay: Duration,
    transitions_in_flight: AtomicUsize,
    metrics: TranslationMetrics,
}

impl LanguageSession {
    /// Create a session over the embedded locale table, starting from the
    /// stored preference (or the default language).
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self::with_table(LocaleTable::global(), store)
    }

    pub fn with_table(table: &'static LocaleTable, store: Arc<dyn PreferenceStore>) -> Self {
        let language = initial_language(store.as_ref());
        info!("Language session starting in '{}'", language);

        Self {
            table,
            current: RwLock::new(language),
            store,
            transition_delay: Duration::ZERO,
            transitions_in_flight: AtomicUsize::new(0),
            metrics: TranslationMetrics::new(),
        }
    }

    /// Set how long `transition_to` waits before applying a change.
    pub fn with_transition_delay(mut self, delay: Duration) -> Self {
        self.transition_delay = delay;
        self
    }

    pub fn current_language(&self) -> Language {
        // The guarded value is a Copy code; a poisoned lock still holds a valid one.
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Switch the current language and persist the preference.
    ///
    /// Persistence failures are logged; the in-memory change still applies.
    pub fn set_language(&self, code: &str) -> Result<Language, I18nError> {
        let language = Language::from_code(code)?;

        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            *current = language;
        }
        self.metrics.record_language_change();
        info!("Language changed to '{}'", language);

        if let Err(e) = self.store.save(language) {
            warn!("Failed to persist language preference: {:#}", e);
        }

        Ok(language)
    }

    /// Switch language after the configured transition delay.
    ///
    /// `is_transitioning` reports true while the delay runs. Unsupported
    /// codes fail immediately, without a transition.
    pub async fn transition_to(&self, code: &str) -> Result<Language, I18nError> {
        Language::from_code(code)?;

        let _in_flight = TransitionGuard::enter(&self.transitions_in_flight);
        if !self.transition_delay.is_zero() {
            tokio::time::sleep(self.transition_delay).await;
        }
        self.set_language(code)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitions_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Translate a key path in the current language.
    pub fn t<'a>(&'a self, key_path: &'a str) -> &'a str {
        self.t_in(self.current_language().code(), key_path)
    }

    /// Translate a key path in an explicit language.
    pub fn t_in<'a>(&'a self, language: &str, key_path: &'a str) -> &'a str {
        let (text, resolution) = self.table.resolve_detailed(language, key_path);
        self.metrics.record(resolution);
        match resolution {
            Resolution::Fallback => debug!("'{}' missing in '{}', using default", key_path, language),
            Resolution::Missing => debug!("Missing translation for '{}'", key_path),
            Resolution::Direct => {}
        }
        text
    }

    /// Translate in the current language and fill `{name}` placeholders.
    pub fn t_with(&self, key_path: &str, vars: &[(&str, &str)]) -> String {
        interpolate(self.t(key_path), vars)
    }

    /// Translate in an explicit language and fill `{name}` placeholders.
    pub fn t_in_with(&self, language: &str, key_path: &str, vars: &[(&str, &str)]) -> String {
        interpolate(self.t_in(language, key_path), vars)
    }

    pub fn table(&self) -> &'static LocaleTable {
        self.table
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }
}

/// Counts one transition in flight until dropped, including when the
/// transition future is cancelled mid-delay.
struct TransitionGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> TransitionGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Replace each `{name}` in `template` with its value from `vars`.
/// Unknown placeholders are left untouched.
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let mut text = template.to_string();
    for (name, value) in vars {
        text = text.replace(&format!("{{{}}}", name), value);
    }
    text
}
