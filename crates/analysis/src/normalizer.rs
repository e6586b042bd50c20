//! Record normalization: validated records into deterministic results.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use docportal_core::record::{ChangeRecord, MetadataRecord, NO_CHANGE};
use serde::Serialize;

/// One row of a page-wise comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    /// Zero-based row index after sorting.
    #[serde(skip)]
    pub position: usize,
    #[serde(rename = "Page")]
    pub page: u32,
    #[serde(rename = "Changes")]
    pub changes: String,
}

/// Page-wise differences between two documents, ordered by page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ComparisonResult {
    rows: Vec<ComparisonRow>,
}

impl ComparisonResult {
    pub const COLUMNS: [&'static str; 2] = ["Page", "Changes"];

    /// Sort by page ascending. Rows reporting the same page keep the order
    /// the model emitted them in.
    pub fn from_records(mut records: Vec<ChangeRecord>) -> Self {
        records.sort_by_key(|record| record.page);
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| ComparisonRow {
                position,
                page: record.page,
                changes: record.changes,
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pages(&self) -> Vec<u32> {
        self.rows.iter().map(|row| row.page).collect()
    }

    /// Rows whose changes are not the `NO CHANGE` sentinel.
    pub fn changed_rows(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows
            .iter()
            .filter(|row| row.changes.trim() != NO_CHANGE)
    }

    pub fn into_records(self) -> Vec<ChangeRecord> {
        self.rows
            .into_iter()
            .map(|row| ChangeRecord::new(row.page, row.changes))
            .collect()
    }

    /// Plain-text table with a `Page` and a `Changes` column.
    pub fn render_table(&self) -> String {
        let page_width = self
            .rows
            .iter()
            .map(|row| row.page.to_string().len())
            .max()
            .unwrap_or(0)
            .max(Self::COLUMNS[0].len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<page_width$} | {}",
            Self::COLUMNS[0],
            Self::COLUMNS[1]
        );
        let _ = writeln!(out, "{}-+-{}", "-".repeat(page_width), "-".repeat(7));
        for row in &self.rows {
            let changes = row.changes.split_whitespace().collect::<Vec<_>>().join(" ");
            let _ = writeln!(out, "{:>page_width$} | {}", row.page, changes);
        }
        out
    }
}

/// A metadata record and the wire names of its populated fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetadata {
    pub record: MetadataRecord,
    pub populated: BTreeSet<&'static str>,
}

impl NormalizedMetadata {
    pub fn from_record(record: MetadataRecord) -> Self {
        let populated = record.populated_fields();
        Self { record, populated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docportal_core::record::PageCount;

    #[test]
    fn rows_sorted_by_page() {
        let result = ComparisonResult::from_records(vec![
            ChangeRecord::new(3, "c"),
            ChangeRecord::new(1, "a"),
            ChangeRecord::new(2, "b"),
        ]);
        assert_eq!(result.pages(), vec![1, 2, 3]);
        let positions: Vec<usize> = result.rows().iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_pages_keep_emission_order() {
        let result = ComparisonResult::from_records(vec![
            ChangeRecord::new(2, "second page, first note"),
            ChangeRecord::new(1, "first page"),
            ChangeRecord::new(2, "second page, second note"),
        ]);
        let changes: Vec<&str> = result.rows().iter().map(|r| r.changes.as_str()).collect();
        assert_eq!(
            changes,
            vec!["first page", "second page, first note", "second page, second note"]
        );
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = ComparisonResult::from_records(Vec::new());
        assert!(result.is_empty());
        assert!(result.render_table().starts_with("Page | Changes"));
    }

    #[test]
    fn serializes_with_wire_columns() {
        let result = ComparisonResult::from_records(vec![ChangeRecord::new(1, "NO CHANGE")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!([{"Page": 1, "Changes": "NO CHANGE"}]));
    }

    #[test]
    fn changed_rows_skip_sentinel() {
        let result = ComparisonResult::from_records(vec![
            ChangeRecord::new(1, "NO CHANGE"),
            ChangeRecord::new(2, "Figure 3 replaced"),
        ]);
        let changed: Vec<u32> = result.changed_rows().map(|r| r.page).collect();
        assert_eq!(changed, vec![2]);
    }

    #[test]
    fn table_has_one_line_per_row() {
        let result = ComparisonResult::from_records(vec![
            ChangeRecord::new(10, "multi\nline"),
            ChangeRecord::new(9, "x"),
        ]);
        let table = result.render_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "   9 | x");
        assert_eq!(lines[3], "  10 | multi line");
    }

    #[test]
    fn into_records_preserves_sorted_order() {
        let result = ComparisonResult::from_records(vec![
            ChangeRecord::new(2, "b"),
            ChangeRecord::new(1, "a"),
        ]);
        let records = result.into_records();
        assert_eq!(records[0], ChangeRecord::new(1, "a"));
    }

    #[test]
    fn metadata_populated_fields() {
        let record = MetadataRecord {
            summary: vec!["Key point".into()],
            title: "Annual Report".into(),
            author: String::new(),
            date_created: "2024-01-01".into(),
            last_modified_date: " ".into(),
            publisher: String::new(),
            language: "English".into(),
            page_count: PageCount::not_available(),
            sentiment_tone: "Positive".into(),
        };
        let normalized = NormalizedMetadata::from_record(record.clone());
        assert_eq!(normalized.record, record);
        assert_eq!(
            normalized.populated.into_iter().collect::<Vec<_>>(),
            vec!["DateCreated", "Language", "SentimentTone", "Summary", "Title"]
        );
    }
}
