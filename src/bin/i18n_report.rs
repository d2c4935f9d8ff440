//! Translation coverage report for the embedded locale files.
//!
//! Usage:
//!   cargo run --bin i18n-report
//!
//! Prints, per language, the keys that fall back to the default language and
//! any errors (shape conflicts, placeholder mismatches). Exits with status 1
//! when at least one language has errors.

use anyhow::Result;
use finsite::i18n::{LanguageRegistry, LocaleTable, TranslationValidator};
use tracing::info;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("finsite=info".parse()?),
        )
        .init();

    let table = LocaleTable::global();
    let registry = LanguageRegistry::get();
    let reference_keys = table
        .tree(table.default_language())
        .map(|tree| tree.leaf_paths().len())
        .unwrap_or(0);

    info!(
        "Checking {} languages against '{}' ({} keys)",
        table.languages().len(),
        table.default_language(),
        reference_keys
    );

    let reports = TranslationValidator::validate_table(table);
    let mut failed = false;

    println!("\n{}", "=".repeat(60));
    println!("TRANSLATION COVERAGE");
    println!("{}", "=".repeat(60));

    for report in &reports {
        let name = registry
            .get_by_code(&report.language)
            .map(|config| config.native_name)
            .unwrap_or("?");
        let missing = report
            .warnings
            .iter()
            .filter(|w| w.starts_with("Missing key"))
            .count();
        let translated = reference_keys.saturating_sub(missing);

        println!(
            "\n[{}] {} - {}/{} keys translated",
            report.language, name, translated, reference_keys
        );

        if report.is_clean() {
            println!("  ok");
            continue;
        }
        for error in &report.errors {
            println!("  ERROR   {}", error);
        }
        for warning in &report.warnings {
            println!("  warning {}", warning);
        }
        failed |= report.has_errors();
    }

    println!("\n{}", "=".repeat(60));

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
