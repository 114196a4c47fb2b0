//! Offline scoring of text lines, for tuning thresholds.

use anyhow::anyhow;
use console::style;

use autoverify::config::Settings;
use autoverify::matching::{extract, normalize, MatchStrategy, StrategyKind};
use autoverify::models::PhotoCategory;

/// Score `lines` against `reference` the way a photo's OCR output would be.
pub fn cmd_score(
    settings: &Settings,
    category: &str,
    reference: &str,
    strategy: Option<&str>,
    lines: &[String],
) -> anyhow::Result<()> {
    let category = PhotoCategory::from_str(category)
        .ok_or_else(|| anyhow!("Unknown category '{}' (expected odometer or plate)", category))?;

    let (configured, thresholds) = settings.matching();
    let kind = match strategy {
        Some(name) => StrategyKind::from_str(name).ok_or_else(|| {
            anyhow!(
                "Unknown strategy '{}' (expected membership or levenshtein)",
                name
            )
        })?,
        None => configured,
    };
    let strategy = kind.build(thresholds);

    println!(
        "{} Scoring {} lines against {:?} ({} strategy, threshold {})",
        style("→").cyan(),
        category,
        reference,
        strategy.name(),
        thresholds.for_category(category)
    );

    for line in lines {
        match normalize(line) {
            Some(token) => println!(
                "  {} {:?} -> {:?}",
                style("+").green(),
                line,
                token.digit_runs
            ),
            None => println!("  {} {:?} {}", style("-").dim(), line, style("rejected").dim()),
        }
    }

    let result = extract(category, lines, reference, strategy.as_ref());
    let verdict = if result.matched {
        style("matched").green().bold()
    } else {
        style("not matched").red().bold()
    };
    println!(
        "{} Aggregated {:?}: {}",
        style("→").cyan(),
        result.aggregated_digits,
        verdict
    );

    Ok(())
}
