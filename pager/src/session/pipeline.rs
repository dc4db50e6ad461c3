//! Inbound message handling: resolve, merge, write back.

use chrono::Utc;
use tracing::info;

use super::merge::{merge, MergeEvent};
use super::reconcile::Reconciler;
use crate::config::{SessionMode, SessionSettings};
use crate::db::{doc_path, DocumentStore};
use crate::error::{PagerError, Result};
use crate::models::{parse, parse_implicit, SessionDocument};

/// What an inbound message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub path: String,
    /// The message claimed the session rather than adding to it.
    pub claimed: bool,
    /// Element count after the write.
    pub elements: usize,
}

/// Apply one inbound message from `from` to its session.
pub fn handle_inbound(
    store: &dyn DocumentStore,
    settings: &SessionSettings,
    body: &str,
    from: &str,
) -> Result<Outcome> {
    match settings.mode {
        SessionMode::Auto => handle_auto(store, &settings.sessions_collection, body, from),
        SessionMode::Explicit => handle_explicit(store, &settings.sessions_collection, body),
    }
}

/// Reconcile against the sender's sessions. A claim resets the transcript;
/// anything else appends the body, minus its session id when one was used.
fn handle_auto(
    store: &dyn DocumentStore,
    collection: &str,
    body: &str,
    from: &str,
) -> Result<Outcome> {
    let resolution = Reconciler::new(store, collection).reconcile(body, from)?;
    let now = Utc::now();

    let next = if resolution.is_claim {
        merge(&resolution.document, MergeEvent::Claim(&resolution.sender), now)
    } else {
        let message = if resolution.explicit {
            parse(body)?
        } else {
            parse_implicit(body)?
        };
        merge(&resolution.document, MergeEvent::Append(&message), now)
    };

    store.set(&resolution.path, &next.to_fields())?;
    info!(
        path = %resolution.path,
        claimed = resolution.is_claim,
        elements = next.elements.len(),
        "Session updated"
    );

    Ok(Outcome {
        path: resolution.path,
        claimed: resolution.is_claim,
        elements: next.elements.len(),
    })
}

/// Every body names its session; the session must already exist.
fn handle_explicit(store: &dyn DocumentStore, collection: &str, body: &str) -> Result<Outcome> {
    let message = parse(body)?;
    let id = message
        .session_id
        .as_deref()
        .ok_or(PagerError::NoSessionFound)?;
    let path = doc_path(collection, id);

    let doc = SessionDocument::from_fields(&store.get(&path)?)?;
    let next = merge(&doc, MergeEvent::Append(&message), Utc::now());
    store.set(&path, &next.to_fields())?;
    info!(path = %path, elements = next.elements.len(), "Session updated");

    Ok(Outcome {
        path,
        claimed: false,
        elements: next.elements.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::models::{ElementContent, ElementKind};
    use crate::session::hash_sender;
    use crate::session::reconcile::tests::{seed, RecordingStore};

    const ALICE: &str = "+15550000001";

    fn auto() -> SessionSettings {
        SessionSettings::default()
    }

    fn explicit() -> SessionSettings {
        SessionSettings {
            mode: SessionMode::Explicit,
            ..SessionSettings::default()
        }
    }

    fn load(store: &RecordingStore, path: &str) -> SessionDocument {
        SessionDocument::from_fields(&store.inner.get(path).unwrap()).unwrap()
    }

    #[test]
    fn test_claim_then_continue_conversation() {
        let store = RecordingStore::default();
        let path = seed(&store, "ABC123", None, 5);

        let outcome = handle_inbound(&store, &auto(), "ABC123", ALICE).unwrap();
        assert!(outcome.claimed);
        assert_eq!(outcome.elements, 0);
        let doc = load(&store, &path);
        assert_eq!(
            doc.claimed_by.as_deref(),
            Some(hash_sender(ALICE.as_bytes()).as_str())
        );
        assert!(doc.synced_at.is_some());

        let outcome = handle_inbound(&store, &auto(), "pick up dry cleaning", ALICE).unwrap();
        assert!(!outcome.claimed);
        assert_eq!(outcome.path, path);

        let outcome = handle_inbound(&store, &auto(), "ABC123 h Errands", ALICE).unwrap();
        assert!(!outcome.claimed);

        let outcome = handle_inbound(&store, &auto(), "ol milk\neggs", ALICE).unwrap();
        assert_eq!(outcome.elements, 3);

        let doc = load(&store, &path);
        assert_eq!(
            doc.elements[0].content,
            ElementContent::Text("pick up dry cleaning".into())
        );
        assert_eq!(doc.elements[1].kind, ElementKind::Heading);
        assert_eq!(doc.elements[1].content, ElementContent::Text("Errands".into()));
        assert_eq!(
            doc.elements[2].content,
            ElementContent::Lines(vec!["milk".into(), "eggs".into()])
        );
    }

    #[test]
    fn test_claim_discards_previous_transcript() {
        let store = RecordingStore::default();
        let path = seed(&store, "ABC123", None, 5);
        let mut doc = load(&store, &path);
        doc.elements.push(crate::models::Element::from_text(
            ElementKind::Paragraph,
            "left over",
        ));
        store.inner.set(&path, &doc.to_fields()).unwrap();

        handle_inbound(&store, &auto(), "ABC123 hi", ALICE).unwrap();
        assert!(load(&store, &path).elements.is_empty());
    }

    #[test]
    fn test_unknown_sender_writes_nothing() {
        let store = RecordingStore::default();
        let err = handle_inbound(&store, &auto(), "hello?", ALICE).unwrap_err();
        assert!(matches!(err, PagerError::NoSessionFound));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_bare_id_for_own_session_is_a_parse_error() {
        let store = RecordingStore::default();
        seed(&store, "ABC123", Some(ALICE), 5);

        let err = handle_inbound(&store, &auto(), "ABC123", ALICE).unwrap_err();
        assert!(matches!(
            err,
            PagerError::Parse(ParseError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_explicit_mode_appends_without_claiming() {
        let store = RecordingStore::default();
        let path = seed(&store, "ABC123", None, 5);

        let outcome = handle_inbound(&store, &explicit(), "ABC123 p note one", ALICE).unwrap();
        assert_eq!(outcome.path, path);
        assert!(!outcome.claimed);

        let doc = load(&store, &path);
        assert!(!doc.is_claimed());
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].content, ElementContent::Text("note one".into()));
    }

    #[test]
    fn test_explicit_mode_errors() {
        let store = RecordingStore::default();

        let err = handle_inbound(&store, &explicit(), "hello there", ALICE).unwrap_err();
        assert!(matches!(
            err,
            PagerError::Parse(ParseError::InvalidIdentifierFormat)
        ));

        let err = handle_inbound(&store, &explicit(), "ABC123 hello", ALICE).unwrap_err();
        assert!(matches!(err, PagerError::NotFound(_)));
        assert!(err.is_client_error());
        assert!(store.writes().is_empty());
    }
}
