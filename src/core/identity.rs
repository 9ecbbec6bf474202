//! Requester identity handed in by the command dispatcher.
//!
//! The host platform already knows who is speaking; the core never parses
//! raw payloads, it only consumes this shape.

#[derive(Debug, Clone)]
pub struct Requester {
    /// Display name shown in replies and stored as creator/recipient.
    pub display_name: String,
    /// Stable opaque identifier for ownership checks.
    pub session_key: String,
    /// Privileged requesters may evict staging claims and delete or rename
    /// projects they did not create.
    pub privileged: bool,
}

impl Requester {
    pub fn new(display_name: &str, session_key: &str, privileged: bool) -> Self {
        Self {
            display_name: display_name.to_string(),
            session_key: session_key.to_string(),
            privileged,
        }
    }
}
