//! Plain-text documents split into pages.

/// Page separator emitted by common PDF-to-text converters.
pub const FORM_FEED: char = '\x0c';

/// A loaded document: its source name and the text of each page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: String,
    pub pages: Vec<String>,
}

impl Document {
    /// Split `text` into pages on form feeds. A trailing form feed does not
    /// add an empty last page.
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self {
            source: source.into(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with blank lines.
    pub fn full_text(&self) -> String {
        self.pages.join("\n\n")
    }

    /// Pages paired with their 1-based page number.
    pub fn numbered_pages(&self) -> impl Iterator<Item = (u32, &str)> {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| (i as u32 + 1, page.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_form_feed() {
        let doc = Document::from_text("report.txt", "page one\x0cpage two\x0c");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[1], "page two");
    }

    #[test]
    fn text_without_form_feed_is_one_page() {
        let doc = Document::from_text("notes.txt", "");
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.full_text(), "");
    }

    #[test]
    fn numbered_pages_start_at_one() {
        let doc = Document::from_text("a", "x\x0cy");
        let numbers: Vec<u32> = doc.numbered_pages().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
