//! Translation metrics and observability.
//!
//! Counts how lookups were answered so missing translations show up in the
//! `/api/i18n/metrics` report instead of only in rendered pages.

use crate::i18n::Resolution;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lookup counters for one language session.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Lookups answered by the requested language
    direct_hits: AtomicUsize,

    /// Lookups answered by the default language
    fallbacks: AtomicUsize,

    /// Lookups that returned the raw key path
    misses: AtomicUsize,

    /// Number of language changes applied
    language_changes: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one lookup.
    pub fn record(&self, resolution: Resolution) {
        let counter = match resolution {
            Resolution::Direct => &self.direct_hits,
            Resolution::Fallback => &self.fallbacks,
            Resolution::Missing => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_language_change(&self) {
        self.language_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn direct_hits(&self) -> usize {
        self.direct_hits.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn language_changes(&self) -> usize {
        self.language_changes.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let direct_hits = self.direct_hits();
        let fallbacks = self.fallbacks();
        let misses = self.misses();
        let total_lookups = direct_hits + fallbacks + misses;
        let coverage_rate = if total_lookups > 0 {
            (direct_hits as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            total_lookups,
            direct_hits,
            fallbacks,
            misses,
            coverage_rate,
            language_changes: self.language_changes(),
        }
    }
}

/// Snapshot of the lookup counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub total_lookups: usize,

    pub direct_hits: usize,

    pub fallbacks: usize,

    pub misses: usize,

    /// Share of lookups answered by the requested language (0-100)
    pub coverage_rate: f64,

    pub language_changes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_record_each_resolution() {
        let metrics = TranslationMetrics::new();

        metrics.record(Resolution::Direct);
        metrics.record(Resolution::Direct);
        metrics.record(Resolution::Fallback);
        metrics.record(Resolution::Missing);

        assert_eq!(metrics.direct_hits(), 2);
        assert_eq!(metrics.fallbacks(), 1);
        assert_eq!(metrics.misses(), 1);
    }

    #[test]
    fn test_record_language_change() {
        let metrics = TranslationMetrics::new();
        metrics.record_language_change();
        assert_eq!(metrics.language_changes(), 1);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();

        assert_eq!(report.total_lookups, 0);
        assert_eq!(report.coverage_rate, 0.0);
    }

    #[test]
    fn test_report_coverage_rate() {
        let metrics = TranslationMetrics::new();
        for _ in 0..3 {
            metrics.record(Resolution::Direct);
        }
        metrics.record(Resolution::Fallback);

        let report = metrics.report();
        assert_eq!(report.total_lookups, 4);
        assert!((report.coverage_rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record(Resolution::Missing);

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["misses"], 1);
        assert_eq!(json["total_lookups"], 1);
    }
}
