use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::Id;

pub const FIRST_NAME_MAX: usize = 50;
pub const LAST_NAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 254;

/// A person in the address book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Id<Contact>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Path of the stored avatar, relative to the media root.
    pub avatar: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn create(first_name: String, last_name: String, email: String) -> Self {
        Self {
            id: Id::generate(),
            first_name,
            last_name,
            email,
            avatar: None,
            notes: String::new(),
            // Stored with microsecond precision.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}
