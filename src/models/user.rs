//! This file defines a user of the application and its supporting types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::models::{DatabaseID, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to
/// better compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from a raw database ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw integer value of the user ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Every other entity in the app is exclusively scoped to one user; there is
/// no cross-user sharing.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserID,
    email: String,
    password_hash: PasswordHash,
}

impl User {
    /// Create a user from its parts.
    ///
    /// This does not insert the user into storage, see
    /// [UserStore::create](crate::stores::UserStore::create).
    pub fn new(id: DatabaseID, email: String, password_hash: PasswordHash) -> Self {
        Self {
            id: UserID::new(id),
            email,
            password_hash,
        }
    }

    /// The ID of the user.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The email address the user registered with.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The hash of the user's password.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}
