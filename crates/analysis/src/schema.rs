//! The two record shapes the pipelines ask the model for.

use docportal_core::record::{ChangeRecord, MetadataRecord};
use serde::de::DeserializeOwned;

/// A fixed target shape for a structured model reply.
pub trait RecordSchema {
    /// The typed value a valid reply decodes into.
    type Output: DeserializeOwned + Send;

    /// Short name used in logs and errors.
    const NAME: &'static str;

    /// Instructions embedded in the prompt describing the expected JSON.
    fn format_instructions() -> String;

    /// One-paragraph shape description used by the repair prompt.
    fn repair_shape_hint() -> &'static str;

    /// Checks that serde cannot express. Returns a description of the
    /// first violation.
    fn check(_output: &Self::Output) -> Result<(), String> {
        Ok(())
    }
}

/// A single [`MetadataRecord`] object.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataSchema;

impl RecordSchema for MetadataSchema {
    type Output = MetadataRecord;

    const NAME: &'static str = "Metadata";

    fn format_instructions() -> String {
        concat!(
            "The output should be formatted as a single JSON object with exactly these keys:\n",
            "{\n",
            "  \"Summary\": [string, ...],      // key points of the document\n",
            "  \"Title\": string,\n",
            "  \"Author\": string,\n",
            "  \"DateCreated\": string,\n",
            "  \"LastModifiedDate\": string,\n",
            "  \"Publisher\": string,\n",
            "  \"Language\": string,\n",
            "  \"PageCount\": integer or \"Not Available\",\n",
            "  \"SentimentTone\": string\n",
            "}\n",
            "Do not add any other keys. Use an empty string for unknown text fields."
        )
        .to_string()
    }

    fn repair_shape_hint() -> &'static str {
        concat!(
            "The JSON must be a single OBJECT with keys:\n",
            "  Summary (list of strings), Title (string), Author (string),\n",
            "  DateCreated (string), LastModifiedDate (string), Publisher (string),\n",
            "  Language (string), PageCount (integer or \"Not Available\"),\n",
            "  SentimentTone (string)"
        )
    }
}

/// A list of [`ChangeRecord`] objects, one per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeListSchema;

impl RecordSchema for ChangeListSchema {
    type Output = Vec<ChangeRecord>;

    const NAME: &'static str = "ChangeList";

    fn format_instructions() -> String {
        concat!(
            "The output should be formatted as a JSON array of objects, one per page:\n",
            "[\n",
            "  {\"Page\": integer, \"Changes\": string},\n",
            "  ...\n",
            "]\n",
            "Page numbers start at 1. Use \"NO CHANGE\" when a page is identical in both documents."
        )
        .to_string()
    }

    fn repair_shape_hint() -> &'static str {
        concat!(
            "The JSON must be a LIST of objects, each with keys:\n",
            "  Page (integer), Changes (string)"
        )
    }

    fn check(output: &Self::Output) -> Result<(), String> {
        match output.iter().position(|record| record.page == 0) {
            Some(index) => Err(format!(
                "Page must be a positive integer (entry {index} has Page 0)"
            )),
            None => Ok(()),
        }
    }
}
