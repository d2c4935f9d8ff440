//! Internationalization (i18n) module for the site's eight languages.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Validated `Language` type
//! - `table`: Embedded translation trees and key-path resolution with fallback
//! - `session`: Current-language state shared by the composition root
//! - `store`: Persistence of the visitor's language preference
//! - `validator`: Coverage checks of each language against the default
//! - `metrics`: Lookup counters (direct hits, fallbacks, misses)
//!
//! # Example
//!
//! ```rust,ignore
//! use finsite::i18n::{LanguageSession, LocaleTable, MemoryPreferenceStore};
//!
//! // Stateless lookup with fallback to French
//! let title = LocaleTable::global().resolve("de", "home.hero.title");
//!
//! // Stateful lookup through the session
//! let session = LanguageSession::new(Arc::new(MemoryPreferenceStore::new()));
//! session.set_language("en")?;
//! let home = session.t("nav.home");
//! ```

mod error;
mod language;
mod metrics;
mod registry;
mod session;
mod store;
mod table;
mod validator;

pub use error::I18nError;
pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use session::{interpolate, LanguageSession};
pub use store::{initial_language, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use table::{LocaleTable, Resolution, TranslationNode};
pub use validator::{TranslationValidator, ValidationReport};
