//! Session reconciliation.
//!
//! Decides which session document an inbound message belongs to and keeps
//! each sender down to a single claimed session. The store has no
//! uniqueness constraint, so every call cleans up extra claims it sees:
//!
//! 1. Query sessions claimed by the sender token, newest first.
//! 2. If the body starts with a six-character word, fetch that session as an
//!    explicit reference. Not found means no reference.
//! 3. An explicit session that is unclaimed or already the sender's wins:
//!    every other claimed session is deleted, and the call is a claim event
//!    when the session was unclaimed.
//! 4. Otherwise all but the newest claimed session are deleted and the
//!    newest is used. No claimed session at all is `NoSessionFound`.
//!
//! Concurrent calls for one sender are not coordinated; the next call's
//! cleanup restores the invariant.

use tracing::{debug, info, warn};

use super::identity::{hash_sender, SenderToken};
use crate::db::{doc_path, DocumentStore, Filter, OrderBy, StoredDocument};
use crate::error::{PagerError, Result};
use crate::models::{leading_session_id, SessionDocument, CLAIMED_BY, CREATED_AT};

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Path of the session the message belongs to.
    pub path: String,
    /// Snapshot of that session as currently stored.
    pub document: SessionDocument,
    /// True when this call is the one claiming an unclaimed session.
    pub is_claim: bool,
    /// True when the session was named in the message body.
    pub explicit: bool,
    /// Token of the sender, recorded as the owner on a claim.
    pub sender: SenderToken,
}

/// Resolves inbound messages to sessions in one collection.
pub struct Reconciler<'a> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
}

impl<'a> Reconciler<'a> {
    pub const fn new(store: &'a dyn DocumentStore, collection: &'a str) -> Self {
        Self { store, collection }
    }

    /// Resolve the session for `body` sent by `sender`.
    pub fn reconcile(&self, body: &str, sender: &str) -> Result<Resolution> {
        let token = hash_sender(sender.as_bytes());

        let claimed = self.store.query(
            self.collection,
            &[Filter::eq(CLAIMED_BY, token.as_str())],
            &OrderBy::desc(CREATED_AT),
        )?;
        debug!(
            sender = token.short(),
            claimed = claimed.len(),
            "Loaded claimed sessions"
        );

        if let Some((path, document)) = self.explicit_candidate(body)? {
            if document.is_open_to(token.as_str()) {
                return self.resolve_explicit(path, document, &claimed, token);
            }
            warn!(
                sender = token.short(),
                path = %path,
                "Ignoring explicit reference to a session claimed by another sender"
            );
        }

        self.resolve_fallback(claimed, token)
    }

    /// Fetch the session named by the body's leading word, if any.
    fn explicit_candidate(&self, body: &str) -> Result<Option<(String, SessionDocument)>> {
        let Some(id) = leading_session_id(body) else {
            return Ok(None);
        };

        let path = doc_path(self.collection, id);
        match self.store.get(&path) {
            Ok(fields) => Ok(Some((path, SessionDocument::from_fields(&fields)?))),
            Err(PagerError::NotFound(_)) => {
                debug!(path = %path, "Explicit reference not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_explicit(
        &self,
        path: String,
        document: SessionDocument,
        claimed: &[StoredDocument],
        token: SenderToken,
    ) -> Result<Resolution> {
        for stale in claimed.iter().filter(|d| d.path != path) {
            info!(sender = token.short(), path = %stale.path, "Deleting stale claimed session");
            self.store.delete(&stale.path)?;
        }

        let is_claim = !document.is_claimed();
        if is_claim {
            info!(sender = token.short(), path = %path, "Claiming session");
        }

        Ok(Resolution {
            path,
            document,
            is_claim,
            explicit: true,
            sender: token,
        })
    }

    fn resolve_fallback(
        &self,
        claimed: Vec<StoredDocument>,
        token: SenderToken,
    ) -> Result<Resolution> {
        let mut claimed = claimed.into_iter();
        let Some(latest) = claimed.next() else {
            info!(sender = token.short(), "No session found for sender");
            return Err(PagerError::NoSessionFound);
        };

        for duplicate in claimed {
            info!(sender = token.short(), path = %duplicate.path, "Deleting duplicate claimed session");
            self.store.delete(&duplicate.path)?;
        }

        let document = SessionDocument::from_fields(&latest.fields)?;
        Ok(Resolution {
            path: latest.path,
            document,
            is_claim: false,
            explicit: false,
            sender: token,
        })
    }
}
