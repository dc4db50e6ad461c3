//! Creating empty sessions for senders to claim.

use chrono::Utc;
use tracing::{debug, info};

use crate::db::{doc_path, DocumentStore};
use crate::error::{PagerError, Result};
use crate::ids::generate_session_id;
use crate::models::SessionDocument;

const MAX_ATTEMPTS: usize = 16;

/// Create an unclaimed, empty session under a fresh identifier.
///
/// Returns the identifier a sender texts to claim it.
pub fn provision_session(store: &dyn DocumentStore, collection: &str) -> Result<String> {
    for _ in 0..MAX_ATTEMPTS {
        let id = generate_session_id();
        let path = doc_path(collection, &id);
        match store.get(&path) {
            Ok(_) => {
                debug!(id = %id, "Session id already taken, retrying");
            }
            Err(PagerError::NotFound(_)) => {
                store.set(&path, &SessionDocument::unclaimed(Utc::now()).to_fields())?;
                info!(path = %path, "Provisioned session");
                return Ok(id);
            }
            Err(e) => return Err(e),
        }
    }

    Err(PagerError::Store(format!(
        "Could not allocate a free session id after {MAX_ATTEMPTS} attempts"
    )))
}
