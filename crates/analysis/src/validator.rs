//! Structured response validation.
//!
//! A reply is either text (the usual case) or a value the backend already
//! decoded. Text is decoded as JSON as-is; failing that, the first markdown
//! code fence in it is decoded instead. Bare JSON inside prose is not
//! extracted.

use crate::schema::RecordSchema;
use docportal_core::error::ValidationFailure;
use docportal_core::provider::ProviderResponse;
use serde_json::Value;

/// A model reply as received, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    Text(String),
    Structured(Value),
}

impl RawReply {
    /// Prefer the backend's structured value; fall back to the message text.
    pub fn from_response(response: &ProviderResponse) -> Self {
        match &response.structured {
            Some(value) => RawReply::Structured(value.clone()),
            None => RawReply::Text(response.message.content.clone()),
        }
    }

    /// The reply exactly as it should be shown back to the model or a human.
    pub fn verbatim(&self) -> String {
        match self {
            RawReply::Text(text) => text.clone(),
            RawReply::Structured(value) => value.to_string(),
        }
    }

    /// First `max_chars` characters of the reply, for log previews.
    pub fn preview(&self, max_chars: usize) -> String {
        self.verbatim().chars().take(max_chars).collect()
    }
}

impl From<&str> for RawReply {
    fn from(text: &str) -> Self {
        RawReply::Text(text.to_string())
    }
}

impl From<Value> for RawReply {
    fn from(value: Value) -> Self {
        RawReply::Structured(value)
    }
}

/// Body of the first ```` ``` ```` fenced block in `text`, without its info
/// string. The block runs to the last closing fence.
pub fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let rest = &text[open + 3..];
    let close = rest.rfind("```")?;
    let body = &rest[..close];

    // An opening line without JSON on it is an info string (`json`).
    let body = match body.split_once('\n') {
        Some((info, after)) if !info.contains(['{', '[']) => after,
        _ => body,
    };
    Some(body.trim())
}

fn decode_text(text: &str) -> Result<Value, serde_json::Error> {
    let trimmed = text.trim();
    serde_json::from_str(trimmed).or_else(|e| match fenced_block(trimmed) {
        Some(body) => serde_json::from_str(body),
        None => Err(e),
    })
}

/// Validate `reply` against schema `S`.
pub fn validate<S: RecordSchema>(reply: &RawReply) -> Result<S::Output, ValidationFailure> {
    let value = match reply {
        RawReply::Structured(value) => value.clone(),
        RawReply::Text(text) => {
            decode_text(text).map_err(|e| ValidationFailure::decode(S::NAME, e.to_string()))?
        }
    };

    let output: S::Output = serde_json::from_value(value)
        .map_err(|e| ValidationFailure::shape(S::NAME, e.to_string()))?;

    S::check(&output).map_err(|detail| ValidationFailure::shape(S::NAME, detail))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ChangeListSchema, MetadataSchema};
    use docportal_core::error::FailureKind;
    use docportal_core::message::Message;
    use docportal_core::record::{ChangeRecord, PageCount};
    use serde_json::json;

    #[test]
    fn valid_text_reply() {
        let reply = RawReply::from(r#"[{"Page": 1, "Changes": "NO CHANGE"}]"#);
        let records = validate::<ChangeListSchema>(&reply).unwrap();
        assert_eq!(records, vec![ChangeRecord::new(1, "NO CHANGE")]);
    }

    #[test]
    fn valid_structured_reply() {
        let reply = RawReply::from(json!([{"Page": 2, "Changes": "Title updated"}]));
        let records = validate::<ChangeListSchema>(&reply).unwrap();
        assert_eq!(records[0].page, 2);
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let reply = RawReply::from("```json\n[{\"Page\": 1, \"Changes\": \"x\"}]\n```");
        assert!(validate::<ChangeListSchema>(&reply).is_ok());

        let bare = RawReply::from("  ```\n[]\n```  ");
        assert!(validate::<ChangeListSchema>(&bare).unwrap().is_empty());
    }

    #[test]
    fn fenced_block_after_preamble_is_accepted() {
        let reply = RawReply::from(
            "Here is the JSON:\n```json\n[{\"Page\": 2, \"Changes\": \"Date updated\"}]\n```\nLet me know!",
        );
        let records = validate::<ChangeListSchema>(&reply).unwrap();
        assert_eq!(records, vec![ChangeRecord::new(2, "Date updated")]);

        let inline = RawReply::from("```[{\"Page\": 1, \"Changes\": \"x\"}]```");
        assert_eq!(validate::<ChangeListSchema>(&inline).unwrap().len(), 1);
    }

    #[test]
    fn broken_fenced_block_is_decode_failure() {
        let reply = RawReply::from("Result:\n```json\n[{\"Page\": 1,\n```");
        assert_eq!(
            validate::<ChangeListSchema>(&reply).unwrap_err().kind,
            FailureKind::Decode
        );
        assert_eq!(fenced_block("no fence here"), None);
    }

    #[test]
    fn prose_is_decode_failure() {
        let reply = RawReply::from("Here are the changes: page 1 is the same.");
        let failure = validate::<ChangeListSchema>(&reply).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Decode);
        assert_eq!(failure.schema, "ChangeList");
    }

    #[test]
    fn json_embedded_in_prose_is_not_extracted() {
        let reply = RawReply::from("Sure! [{\"Page\": 1, \"Changes\": \"x\"}]");
        assert_eq!(
            validate::<ChangeListSchema>(&reply).unwrap_err().kind,
            FailureKind::Decode
        );
    }

    #[test]
    fn wrong_shape_is_shape_failure() {
        let object = RawReply::from(r#"{"Page": 1, "Changes": "x"}"#);
        assert_eq!(
            validate::<ChangeListSchema>(&object).unwrap_err().kind,
            FailureKind::Shape
        );

        let string_page = RawReply::from(json!([{"Page": "1", "Changes": "x"}]));
        assert_eq!(
            validate::<ChangeListSchema>(&string_page).unwrap_err().kind,
            FailureKind::Shape
        );
    }

    #[test]
    fn extra_field_is_shape_failure() {
        let reply = RawReply::from(json!([{"Page": 1, "Changes": "x", "Note": "extra"}]));
        assert_eq!(
            validate::<ChangeListSchema>(&reply).unwrap_err().kind,
            FailureKind::Shape
        );
    }

    #[test]
    fn non_positive_page_is_shape_failure() {
        let zero = RawReply::from(json!([{"Page": 0, "Changes": "x"}]));
        let failure = validate::<ChangeListSchema>(&zero).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Shape);
        assert!(failure.detail.contains("positive"));

        let negative = RawReply::from(json!([{"Page": -3, "Changes": "x"}]));
        assert_eq!(
            validate::<ChangeListSchema>(&negative).unwrap_err().kind,
            FailureKind::Shape
        );
    }

    #[test]
    fn metadata_with_sentinel_page_count() {
        let reply = RawReply::from(json!({
            "Title": "Report", "Author": "", "DateCreated": "", "LastModifiedDate": "",
            "Publisher": "", "Language": "English", "PageCount": "Not Available",
            "SentimentTone": "Neutral"
        }));
        let record = validate::<MetadataSchema>(&reply).unwrap();
        assert_eq!(record.page_count, PageCount::not_available());
        assert!(record.summary.is_empty());
    }

    #[test]
    fn metadata_page_count_accepts_any_text() {
        for page_count in ["12", "Approximately 12", "Not available (scanned copy)"] {
            let reply = RawReply::from(json!({
                "Title": "Report", "Author": "", "DateCreated": "", "LastModifiedDate": "",
                "Publisher": "", "Language": "English", "PageCount": page_count,
                "SentimentTone": "Neutral"
            }));
            let record = validate::<MetadataSchema>(&reply).unwrap();
            assert_eq!(record.page_count, PageCount::Text(page_count.to_string()));
        }
    }

    #[test]
    fn metadata_missing_field_is_shape_failure() {
        let reply = RawReply::from(json!({"Title": "Only a title"}));
        let failure = validate::<MetadataSchema>(&reply).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Shape);
    }

    #[test]
    fn structured_value_preferred_over_text() {
        let response = ProviderResponse {
            message: Message::assistant("not json"),
            structured: Some(json!([])),
            usage: None,
            model: "mock".into(),
        };
        assert_eq!(RawReply::from_response(&response), RawReply::Structured(json!([])));
    }

    #[test]
    fn verbatim_keeps_text_exactly() {
        let text = "  Sorry, I can't do that.\n";
        assert_eq!(RawReply::from(text).verbatim(), text);
    }
}
