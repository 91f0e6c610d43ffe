//! Identifier helpers.
//!
//! Server-assigned ids are opaque strings. Correlation ids for optimistic
//! sends are generated locally with a `tmp-` prefix so they can never
//! collide with an id the server hands out.

/// Prefix that marks a client-generated correlation id.
const TEMP_PREFIX: &str = "tmp-";

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a correlation id for an optimistic send.
pub fn new_temp_id() -> String {
    format!("{TEMP_PREFIX}{}", uuid::Uuid::new_v4())
}

/// Whether an id is a client-generated correlation id.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_PREFIX)
}
