//! Session identifier generation.
//!
//! Identifiers are typed by hand on a phone keypad, so the alphabet leaves
//! out characters that are easy to confuse (`0`/`O`, `1`/`I`/`L`).

use rand::prelude::IndexedRandom;

use crate::models::is_session_id;

const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generate a random six-character session identifier.
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    (0..6)
        .map(|_| char::from(*ALPHABET.choose(&mut rng).unwrap_or(&b'X')))
        .collect()
}
