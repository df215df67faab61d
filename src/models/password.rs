//! Password hashing for user credentials.

use crate::Error;

/// A bcrypt hash of a user's password.
///
/// The raw password is only held long enough to hash or verify it, it is
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `raw_password` with bcrypt.
    ///
    /// # Errors
    /// Returns an [Error::HashingError] if the underlying hashing library
    /// fails.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        bcrypt::hash(raw_password, bcrypt::DEFAULT_COST)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap an existing hash string retrieved from storage.
    pub fn from_hash_string(hash: String) -> Self {
        Self(hash)
    }

    /// Check whether `raw_password` matches this hash.
    ///
    /// # Errors
    /// Returns an [Error::InvalidCredentials] if the password does not
    /// match, or an [Error::HashingError] if verification itself fails.
    pub fn verify(&self, raw_password: &str) -> Result<(), Error> {
        match bcrypt::verify(raw_password, &self.0) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::InvalidCredentials),
            Err(error) => Err(Error::HashingError(error.to_string())),
        }
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
