//! Defines the month marker store trait.

use crate::{Error, models::UserID};

/// A small per-user key-value store recording the last calendar month
/// (`"YYYY-M"`) for which automatic materialization ran.
///
/// The marker is purely an optimization to skip redundant store round-trips
/// within a month. Correctness of the once-per-month invariant comes from
/// the existence check in the materialization service, never from this
/// marker: losing or clearing it only costs one redundant (and harmless)
/// materialization pass.
pub trait MarkerStore {
    /// The last month automatic materialization ran for `user_id`, if any.
    fn get(&self, user_id: UserID) -> Result<Option<String>, Error>;

    /// Record `month_key` as the last processed month for `user_id`.
    fn set(&mut self, user_id: UserID, month_key: &str) -> Result<(), Error>;

    /// Forget the marker for `user_id`.
    fn remove(&mut self, user_id: UserID) -> Result<(), Error>;
}
