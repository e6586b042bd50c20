//! Typed records produced by the reconciliation pipeline.
//!
//! Field names on the wire are PascalCase (`Title`, `PageCount`, `Page`,
//! `Changes`) because that is the shape the prompts ask the model for.
//! Unknown fields are rejected so a drifting reply is caught by validation
//! instead of being silently dropped.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel the model uses when the page count cannot be determined.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Sentinel for a page that is identical in both documents.
pub const NO_CHANGE: &str = "NO CHANGE";

/// Spellings of the "unknown page count" sentinel (case-insensitive).
const UNKNOWN_PAGE_COUNT: &[&str] = &["not available", "n/a", "na", "unknown"];

/// Page count of a document: an integer, or whatever text the model gave
/// instead. Text is kept verbatim, including numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageCount {
    Known(u32),
    Text(String),
}

impl PageCount {
    /// The "Not Available" sentinel.
    pub fn not_available() -> Self {
        PageCount::Text(NOT_AVAILABLE.to_string())
    }

    pub fn known(&self) -> Option<u32> {
        match self {
            PageCount::Known(n) => Some(*n),
            PageCount::Text(_) => None,
        }
    }

    /// Whether the value is blank or one of the sentinel spellings.
    pub fn is_unavailable(&self) -> bool {
        match self {
            PageCount::Known(_) => false,
            PageCount::Text(text) => {
                let normalized = text.trim().to_lowercase();
                normalized.is_empty() || UNKNOWN_PAGE_COUNT.contains(&normalized.as_str())
            }
        }
    }
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageCount::Known(n) => write!(f, "{n}"),
            PageCount::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for PageCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageCount::Known(n) => serializer.serialize_u32(*n),
            PageCount::Text(text) => serializer.serialize_str(text),
        }
    }
}

struct PageCountVisitor;

impl Visitor<'_> for PageCountVisitor {
    type Value = PageCount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PageCount, E> {
        u32::try_from(v)
            .map(PageCount::Known)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PageCount, E> {
        u64::try_from(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PageCount, E> {
        Ok(PageCount::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<PageCount, E> {
        Ok(PageCount::Text(v))
    }
}

impl<'de> Deserialize<'de> for PageCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PageCountVisitor)
    }
}

/// Structured metadata extracted from a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct MetadataRecord {
    #[serde(default)]
    pub summary: Vec<String>,
    pub title: String,
    pub author: String,
    pub date_created: String,
    pub last_modified_date: String,
    pub publisher: String,
    pub language: String,
    pub page_count: PageCount,
    pub sentiment_tone: String,
}

impl MetadataRecord {
    /// Wire names of every field, in declaration order.
    pub const FIELDS: [&'static str; 9] = [
        "Summary",
        "Title",
        "Author",
        "DateCreated",
        "LastModifiedDate",
        "Publisher",
        "Language",
        "PageCount",
        "SentimentTone",
    ];

    /// Wire names of the fields that carry a real value.
    ///
    /// Blank strings, an empty summary, and an unavailable page count are
    /// treated as unpopulated.
    pub fn populated_fields(&self) -> BTreeSet<&'static str> {
        let text_fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("DateCreated", &self.date_created),
            ("LastModifiedDate", &self.last_modified_date),
            ("Publisher", &self.publisher),
            ("Language", &self.language),
            ("SentimentTone", &self.sentiment_tone),
        ];

        let mut populated: BTreeSet<&'static str> = text_fields
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if self.summary.iter().any(|s| !s.trim().is_empty()) {
            populated.insert("Summary");
        }
        if !self.page_count.is_unavailable() {
            populated.insert("PageCount");
        }
        populated
    }
}

/// Differences found on one page of a document pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ChangeRecord {
    /// 1-based page number.
    pub page: u32,
    /// Page-wise differences, or `NO CHANGE`.
    pub changes: String,
}

impl ChangeRecord {
    pub fn new(page: u32, changes: impl Into<String>) -> Self {
        Self {
            page,
            changes: changes.into(),
        }
    }

    /// Whether the model reported the page as identical.
    pub fn is_unchanged(&self) -> bool {
        self.changes.trim() == NO_CHANGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> serde_json::Value {
        serde_json::json!({
            "Summary": ["Introduces the Transformer"],
            "Title": "Attention Is All You Need",
            "Author": "Vaswani et al.",
            "DateCreated": "2017-06-12",
            "LastModifiedDate": "2017-12-06",
            "Publisher": "NIPS",
            "Language": "English",
            "PageCount": 11,
            "SentimentTone": "Neutral"
        })
    }

    #[test]
    fn metadata_parses_known_page_count() {
        let record: MetadataRecord = serde_json::from_value(sample_metadata()).unwrap();
        assert_eq!(record.page_count, PageCount::Known(11));
        assert_eq!(record.title, "Attention Is All You Need");
    }

    #[test]
    fn page_count_sentinel_is_preserved_not_coerced() {
        let mut value = sample_metadata();
        value["PageCount"] = serde_json::json!("Not Available");
        let record: MetadataRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.page_count, PageCount::not_available());
        assert!(record.page_count.is_unavailable());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["PageCount"], "Not Available");
    }

    #[test]
    fn page_count_keeps_any_string_verbatim() {
        for text in ["12", "Approximately 12", "Not available (scanned copy)"] {
            let parsed: PageCount = serde_json::from_value(serde_json::json!(text)).unwrap();
            assert_eq!(parsed, PageCount::Text(text.to_string()));
            assert_eq!(parsed.known(), None);
            assert!(!parsed.is_unavailable());
            assert_eq!(serde_json::to_value(&parsed).unwrap(), serde_json::json!(text));
        }
    }

    #[test]
    fn page_count_rejects_negatives_and_fractions() {
        assert!(serde_json::from_str::<PageCount>("-3").is_err());
        assert!(serde_json::from_str::<PageCount>("2.5").is_err());
        assert!(serde_json::from_str::<PageCount>("\"n/a\"").unwrap().is_unavailable());
        assert!(PageCount::Text("  ".into()).is_unavailable());
    }

    #[test]
    fn descriptive_page_count_is_populated() {
        let mut value = sample_metadata();
        value["PageCount"] = serde_json::json!("Approximately 12");
        let record: MetadataRecord = serde_json::from_value(value).unwrap();
        assert!(record.populated_fields().contains("PageCount"));
    }

    #[test]
    fn summary_defaults_to_empty() {
        let mut value = sample_metadata();
        value.as_object_mut().unwrap().remove("Summary");
        let record: MetadataRecord = serde_json::from_value(value).unwrap();
        assert!(record.summary.is_empty());
        assert!(!record.populated_fields().contains("Summary"));
    }

    #[test]
    fn metadata_rejects_extra_fields() {
        let mut value = sample_metadata();
        value["Keywords"] = serde_json::json!(["nlp"]);
        assert!(serde_json::from_value::<MetadataRecord>(value).is_err());
    }

    #[test]
    fn populated_fields_skip_blank_values() {
        let mut value = sample_metadata();
        value["Publisher"] = serde_json::json!("  ");
        value["PageCount"] = serde_json::json!("Not Available");
        let record: MetadataRecord = serde_json::from_value(value).unwrap();
        let populated = record.populated_fields();
        assert!(populated.contains("Title"));
        assert!(populated.contains("Summary"));
        assert!(!populated.contains("Publisher"));
        assert!(!populated.contains("PageCount"));
        assert_eq!(populated.len(), 7);
    }

    #[test]
    fn change_record_wire_shape() {
        let record: ChangeRecord =
            serde_json::from_str(r#"{"Page": 3, "Changes": "NO CHANGE"}"#).unwrap();
        assert_eq!(record, ChangeRecord::new(3, NO_CHANGE));
        assert!(record.is_unchanged());
    }
}
