//! Authenticated user session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved user session.
///
/// Produced by whatever authenticated the user; read-only input to assertion
/// building. Empty string fields are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: String,
    /// When the user authenticated.
    pub create_time: DateTime<Utc>,
    /// When the session expires.
    pub expire_time: DateTime<Utc>,
    /// Session index reported in the authentication statement.
    pub index: String,

    /// Value of the transient name identifier.
    pub name_id: String,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Local user identifier.
    #[serde(default)]
    pub user_id: String,
    /// Full display name.
    #[serde(default)]
    pub user_fullname: String,
    /// Login name.
    #[serde(default)]
    pub user_name: String,
    /// Email address.
    #[serde(default)]
    pub user_email: String,
    /// Common name.
    #[serde(default)]
    pub user_common_name: String,
    /// Surname.
    #[serde(default)]
    pub user_surname: String,
    /// Given name.
    #[serde(default)]
    pub user_given_name: String,
}

impl Session {
    /// Creates a session with no user attributes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name_id: impl Into<String>,
        create_time: DateTime<Utc>,
        expire_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            create_time,
            expire_time,
            index: String::new(),
            name_id: name_id.into(),
            groups: Vec::new(),
            user_id: String::new(),
            user_fullname: String::new(),
            user_name: String::new(),
            user_email: String::new(),
            user_common_name: String::new(),
            user_surname: String::new(),
            user_given_name: String::new(),
        }
    }

    /// Sets the session index.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Adds a group membership.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}
