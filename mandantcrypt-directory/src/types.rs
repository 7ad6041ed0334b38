//! Wire types of the directory API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An organizational identity ("mandant") that owns a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub number: i64,
    #[serde(rename = "create_date")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "last_modified")]
    pub last_modified_at: NaiveDateTime,
    #[serde(rename = "latest_password_created", default)]
    pub latest_password_created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    /// Backend wire name such as `SEVEN_ZIP`.
    #[serde(default)]
    pub preferred_package_type: Option<String>,
    pub active: bool,
}

impl Identity {
    /// Whole days since the current password was created.
    pub fn password_age_days(&self, now: NaiveDateTime) -> Option<i64> {
        self.latest_password_created_at
            .map(|created| (now - created).num_days())
    }

    /// Preferred backend, if one is set and not blank.
    pub fn preferred_backend(&self) -> Option<&str> {
        self.preferred_package_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.name)
    }
}

/// Current password of an identity as returned by the server.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PasswordRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[zeroize(skip)]
    #[serde(default)]
    pub create_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub password_decrypted: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl fmt::Debug for PasswordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("create_date", &self.create_date)
            .field("created_by", &self.created_by)
            .finish_non_exhaustive()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
