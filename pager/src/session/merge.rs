//! Applying an inbound message to a session snapshot.

use chrono::{DateTime, Utc};

use super::identity::SenderToken;
use crate::models::{InboundMessage, SessionDocument};

/// What an inbound message does to its session.
#[derive(Debug, Clone, Copy)]
pub enum MergeEvent<'a> {
    /// First contact: the sender takes the session and its transcript restarts.
    Claim(&'a SenderToken),
    /// Continuation: the message is appended as one element.
    Append(&'a InboundMessage),
}

/// Produce the next snapshot of `doc`. The input is left untouched; the
/// caller persists the result.
pub fn merge(doc: &SessionDocument, event: MergeEvent<'_>, now: DateTime<Utc>) -> SessionDocument {
    let mut next = doc.clone();
    next.updated_at = Some(now);

    match event {
        MergeEvent::Claim(token) => {
            next.synced_at = Some(now);
            next.elements.clear();
            next.claimed_by = Some(token.as_str().to_string());
        }
        MergeEvent::Append(message) => {
            next.elements.push(message.to_element());
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse, Element, ElementContent, ElementKind};
    use crate::session::hash_sender;

    fn session_with_notes() -> SessionDocument {
        let mut doc = SessionDocument::unclaimed(Utc::now());
        doc.elements
            .push(Element::from_text(ElementKind::Paragraph, "old note"));
        doc
    }

    #[test]
    fn claim_resets_transcript() {
        let doc = session_with_notes();
        let token = hash_sender(b"+15550000001");
        let now = Utc::now();

        let next = merge(&doc, MergeEvent::Claim(&token), now);

        assert!(next.elements.is_empty());
        assert_eq!(next.claimed_by.as_deref(), Some(token.as_str()));
        assert_eq!(next.synced_at, Some(now));
        assert_eq!(next.updated_at, Some(now));
        assert_eq!(next.created_at, doc.created_at);
        assert_eq!(doc.elements.len(), 1);
    }

    #[test]
    fn append_adds_one_element_in_order() {
        let mut doc = session_with_notes();
        doc.claimed_by = Some("tok".into());
        let message = parse("ABC123 ol a\nb\nc").unwrap();
        let now = Utc::now();

        let next = merge(&doc, MergeEvent::Append(&message), now);

        assert_eq!(next.elements.len(), 2);
        assert_eq!(
            next.elements[1].content,
            ElementContent::Lines(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(next.elements[0], doc.elements[0]);
        assert_eq!(next.claimed_by.as_deref(), Some("tok"));
        assert_eq!(next.synced_at, None);
        assert_eq!(next.updated_at, Some(now));
    }

    #[test]
    fn append_keeps_literal_text_for_headings() {
        let doc = session_with_notes();
        let message = parse("ABC123 h Agenda for today").unwrap();

        let next = merge(&doc, MergeEvent::Append(&message), Utc::now());

        assert_eq!(next.elements[1].kind, ElementKind::Heading);
        assert_eq!(
            next.elements[1].content,
            ElementContent::Text("Agenda for today".into())
        );
    }
}
