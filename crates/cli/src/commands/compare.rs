//! `docportal compare`: Page-wise comparison of two documents.

use std::path::Path;

use docportal_analysis::{DocumentComparator, Stage, combine_documents};
use docportal_config::AppConfig;

use crate::loader::load_document;

pub async fn run(
    config: AppConfig,
    reference: &Path,
    actual: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (provider, model) = super::default_provider(&config)?;

    let reference = load_document(reference)?;
    let actual = load_document(actual)?;
    let combined = combine_documents(&reference, &actual);

    let comparator = DocumentComparator::new(provider, model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(Some(config.default_max_tokens))
        .with_large_payload_chars(config.conditioning.large_payload_chars);

    eprint!("  Comparing...");
    let report = comparator.compare(&combined).await?;
    eprint!("\r              \r");

    if json {
        println!("{}", serde_json::to_string_pretty(&report.result)?);
        return Ok(());
    }

    println!();
    println!("  {} → {}", reference.source, actual.source);
    println!();
    for line in report.result.render_table().lines() {
        println!("  {line}");
    }
    println!();
    println!(
        "  {} page(s), {} with changes{}",
        report.result.len(),
        report.result.changed_rows().count(),
        if report.stage == Stage::Repaired { " (reply repaired)" } else { "" }
    );
    println!();

    Ok(())
}
