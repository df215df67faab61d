//! Defines the user store trait.

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create a new user with the given email and password hash.
    ///
    /// # Errors
    /// Returns an [Error::DuplicateEmail] if a user with `email` already
    /// exists.
    fn create(&mut self, email: &str, password_hash: PasswordHash) -> Result<User, Error>;

    /// Retrieve the user with the ID `id`.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Retrieve the user registered with `email`.
    fn get_by_email(&self, email: &str) -> Result<User, Error>;
}
