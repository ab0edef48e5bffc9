//! Current-user payload for the route-guard collaborator

use serde::{Deserialize, Serialize};

/// Identity attributes of the requesting user
///
/// Consumed by an authorization layer outside this workspace; the store
/// never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl CurrentUser {
    /// Create a user with just a username
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            is_admin: false,
        }
    }
}
