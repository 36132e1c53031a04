//! User types for feedhub.
//!
//! Feeds carry an owning user reference; the user model here is the
//! minimum needed for that foreign key. Authentication and API keys
//! belong to the surrounding service, not this crate.

use chrono::{DateTime, Utc};

/// A feed owner.
#[derive(Debug, Clone)]
pub struct User {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New user for creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
}

impl NewUser {
    /// Create a new user.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = NewUser::new("alice");
        assert_eq!(user.name, "alice");
    }
}
