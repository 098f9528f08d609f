//! Caller identity

use serde::{Deserialize, Serialize};

/// The authenticated caller of a request.
///
/// Resolved once by the auth middleware and carried through the request as an
/// extension. Resource ownership checks compare against `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    /// Stable identifier of the caller (the API key record id)
    pub id: String,
    /// Human-readable name of the key, for log and error messages
    pub name: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
