//! HTTP Basic authentication for the webhook.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("webhook credentials are not configured")]
    NotConfigured,

    #[error("no credentials found on request")]
    MissingHeader,

    #[error("malformed authorization header")]
    Malformed,

    #[error("credentials do not match")]
    Mismatch,
}

/// Expected webhook credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parse `"user pass"` as configured.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(u), Some(p), None) if !u.is_empty() && !p.is_empty() => Some(Self {
                username: u.to_string(),
                password: p.to_string(),
            }),
            _ => None,
        }
    }

    /// Value for an `Authorization` header carrying these credentials.
    pub fn header_value(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

/// Check a request's Basic credentials against the expected ones.
pub fn check(headers: &HeaderMap, expected: Option<&Credentials>) -> Result<(), AuthError> {
    let expected = expected.ok_or(AuthError::NotConfigured)?;

    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    let (scheme, encoded) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::Malformed);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed)?;
    let (username, password) = decoded.split_once(':').ok_or(AuthError::Malformed)?;

    if username == expected.username && password == expected.password {
        Ok(())
    } else {
        Err(AuthError::Mismatch)
    }
}
