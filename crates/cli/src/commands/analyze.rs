//! `docportal analyze`: Metadata extraction for one document.

use std::path::Path;

use docportal_analysis::{DocumentAnalyzer, Stage};
use docportal_config::AppConfig;

use crate::loader::load_document;

pub async fn run(
    config: AppConfig,
    file: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (provider, model) = super::default_provider(&config)?;
    let document = load_document(file)?;

    let analyzer = DocumentAnalyzer::new(provider, model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(Some(config.default_max_tokens))
        .with_conditioning(config.conditioning.clone());

    eprint!("  Analyzing...");
    let report = analyzer.analyze(&document.full_text()).await?;
    eprint!("\r              \r");

    if json {
        println!("{}", serde_json::to_string_pretty(&report.metadata)?);
        return Ok(());
    }

    let m = &report.metadata;
    println!();
    println!("  {}", document.source);
    println!("  {}", "=".repeat(document.source.chars().count()));
    println!("  Title:          {}", m.title);
    println!("  Author:         {}", m.author);
    println!("  Created:        {}", m.date_created);
    println!("  Last modified:  {}", m.last_modified_date);
    println!("  Publisher:      {}", m.publisher);
    println!("  Language:       {}", m.language);
    println!("  Pages:          {}", m.page_count);
    println!("  Tone:           {}", m.sentiment_tone);
    if !m.summary.is_empty() {
        println!("  Summary:");
        for point in &m.summary {
            println!("    - {point}");
        }
    }
    println!();
    println!(
        "  {} of {} fields populated (~{} prompt tokens{})",
        report.populated.len(),
        docportal_core::MetadataRecord::FIELDS.len(),
        report.metrics.approx_tokens_total,
        if report.stage == Stage::Repaired { ", repaired" } else { "" }
    );
    println!();

    Ok(())
}
