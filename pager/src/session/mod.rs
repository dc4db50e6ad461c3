//! Session reconciliation and message merging.

mod identity;
mod merge;
mod pipeline;
mod provision;
pub(crate) mod reconcile;

pub use identity::hash_sender;
pub use pipeline::handle_inbound;
pub use provision::provision_session;
