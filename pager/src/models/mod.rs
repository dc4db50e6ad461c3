//! Data models for session documents and inbound messages.

mod element;
mod message;
mod session;

pub use element::{Element, ElementContent, ElementKind};
pub use message::{is_session_id, leading_session_id, parse, parse_implicit, InboundMessage};
pub use session::{format_timestamp, SessionDocument, CLAIMED_BY, CREATED_AT};
