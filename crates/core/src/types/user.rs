//! User identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{Identified, UserId};
use super::status::Role;
use super::wire::timestamp;

/// The identity returned by login/register and persisted with the session.
///
/// Only `username` and `role` are guaranteed; the other fields are carried
/// when the backend provides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Backend user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display name.
    pub username: String,
    /// Account email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Authorization role.
    #[serde(default)]
    pub role: Role,
}

impl UserSummary {
    /// Whether this user passes the admin panel gate.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// A row from the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Backend user id.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Authorization role.
    #[serde(default)]
    pub role: Role,
    /// When the account was created.
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for UserRecord {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
