//! Structured content units appended to a session document.

use serde::{Deserialize, Serialize};

/// Kind of a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementKind {
    #[default]
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "h")]
    Heading,
    #[serde(rename = "ol")]
    OrderedList,
}

impl ElementKind {
    /// Short marker used both in message bodies and in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Heading => "h",
            Self::OrderedList => "ol",
        }
    }

    /// Recognize a kind marker, case-insensitively.
    pub fn from_marker(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p" => Some(Self::Paragraph),
            "h" => Some(Self::Heading),
            "ol" => Some(Self::OrderedList),
            _ => None,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Element payload: literal text, or one entry per line for lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementContent {
    Text(String),
    Lines(Vec<String>),
}

/// One unit of document content. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "Type")]
    pub kind: ElementKind,
    #[serde(rename = "Content")]
    pub content: ElementContent,
}

impl Element {
    /// Build an element from raw message text.
    ///
    /// Ordered lists split on line breaks; other kinds keep the text as is.
    pub fn from_text(kind: ElementKind, text: &str) -> Self {
        let content = match kind {
            ElementKind::OrderedList => ElementContent::Lines(
                text.split('\n')
                    .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                    .collect(),
            ),
            ElementKind::Paragraph | ElementKind::Heading => ElementContent::Text(text.to_string()),
        };
        Self { kind, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn marker_recognition_is_case_insensitive() {
        assert_eq!(ElementKind::from_marker("P"), Some(ElementKind::Paragraph));
        assert_eq!(ElementKind::from_marker("h"), Some(ElementKind::Heading));
        assert_eq!(ElementKind::from_marker("Ol"), Some(ElementKind::OrderedList));
        assert_eq!(ElementKind::from_marker("ul"), None);
        assert_eq!(ElementKind::from_marker(""), None);
    }

    #[test]
    fn ordered_list_splits_lines() {
        let el = Element::from_text(ElementKind::OrderedList, "a\nb\nc");
        assert_eq!(
            el.content,
            ElementContent::Lines(vec!["a".into(), "b".into(), "c".into()])
        );

        let el = Element::from_text(ElementKind::OrderedList, "one\r\ntwo");
        assert_eq!(
            el.content,
            ElementContent::Lines(vec!["one".into(), "two".into()])
        );
    }

    #[test]
    fn paragraph_and_heading_keep_literal_text() {
        let el = Element::from_text(ElementKind::Paragraph, "a\nb c");
        assert_eq!(el.content, ElementContent::Text("a\nb c".into()));
        let el = Element::from_text(ElementKind::Heading, "Title");
        assert_eq!(el.content, ElementContent::Text("Title".into()));
    }

    #[test]
    fn serializes_in_stored_shape() {
        let el = Element::from_text(ElementKind::OrderedList, "x\ny");
        assert_eq!(
            serde_json::to_value(&el).unwrap(),
            json!({"Type": "ol", "Content": ["x", "y"]})
        );

        let back: Element =
            serde_json::from_value(json!({"Type": "h", "Content": "Hello"})).unwrap();
        assert_eq!(back, Element::from_text(ElementKind::Heading, "Hello"));
    }

    #[test]
    fn unknown_kind_fails_to_deserialize() {
        let result = serde_json::from_value::<Element>(json!({"Type": "ul", "Content": "x"}));
        assert!(result.is_err());
    }
}
