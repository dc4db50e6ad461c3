//! Inbound message parsing.
//!
//! The grammar is positional, over words separated by single spaces after
//! leading spaces are stripped:
//!
//! ```text
//! <id:6 chars> [<kind: p|h|ol>] <content...>
//! ```
//!
//! Edge cases, in order of precedence:
//! - fewer than two words: `InvalidMessageFormat`
//! - first word not exactly six characters: `InvalidIdentifierFormat`
//! - second word is a kind marker and more words follow: kind is set,
//!   content starts at word three
//! - second word is a kind marker and nothing follows: the marker is the
//!   content, kind stays paragraph
//! - second word is anything else: content starts at word two
//!
//! Consecutive spaces yield empty words, which are kept, so content
//! preserves the original spacing.

use super::element::{Element, ElementKind};
use crate::error::ParseError;

/// Width of a session identifier.
pub const SESSION_ID_LEN: usize = 6;

/// A parsed inbound message. Never persisted; consumed once by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Session named literally at the start of the body.
    pub session_id: Option<String>,
    pub kind: ElementKind,
    pub content: String,
}

impl InboundMessage {
    /// The element this message appends.
    pub fn to_element(&self) -> Element {
        Element::from_text(self.kind, &self.content)
    }
}

/// Whether `word` has the shape of a session identifier.
///
/// A word containing `/` can never name a document in the sessions
/// collection, so it is not an identifier.
pub fn is_session_id(word: &str) -> bool {
    word.chars().count() == SESSION_ID_LEN && !word.contains('/')
}

/// First word of a body, after leading spaces, if it looks like a session id.
pub fn leading_session_id(body: &str) -> Option<&str> {
    body.trim_start_matches(' ')
        .split(' ')
        .next()
        .filter(|w| is_session_id(w))
}

/// Parse a body that must start with a session identifier.
pub fn parse(raw: &str) -> Result<InboundMessage, ParseError> {
    let words: Vec<&str> = raw.trim_start_matches(' ').split(' ').collect();
    if words.len() < 2 {
        return Err(ParseError::InvalidMessageFormat);
    }

    let session_id = words[0];
    if !is_session_id(session_id) {
        return Err(ParseError::InvalidIdentifierFormat);
    }

    let (kind, rest) = match ElementKind::from_marker(words[1]) {
        Some(kind) if words.len() >= 3 => (kind, &words[2..]),
        _ => (ElementKind::Paragraph, &words[1..]),
    };

    Ok(InboundMessage {
        session_id: Some(session_id.to_string()),
        kind,
        content: rest.join(" "),
    })
}

/// Parse a body that carries no session identifier.
///
/// The whole body is content, unless the first word is a kind marker
/// followed by at least one more word.
pub fn parse_implicit(raw: &str) -> Result<InboundMessage, ParseError> {
    let body = raw.trim_start_matches(' ');
    if body.is_empty() {
        return Err(ParseError::InvalidMessageFormat);
    }

    let marker = body
        .split_once(' ')
        .and_then(|(first, rest)| ElementKind::from_marker(first).map(|kind| (kind, rest)));

    let (kind, content) = marker.unwrap_or((ElementKind::Paragraph, body));
    Ok(InboundMessage {
        session_id: None,
        kind,
        content: content.to_string(),
    })
}
