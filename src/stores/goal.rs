//! Defines the savings goal store trait.

use crate::{
    Error,
    models::{DatabaseID, GoalBuilder, GoalStatus, SavingsGoal, UserID},
};

/// Handles the creation and retrieval of savings goals.
///
/// All operations are scoped to a single user: rows belonging to other users
/// are reported as [Error::NotFound].
pub trait GoalStore {
    /// Create a new goal in the store.
    fn create(&mut self, builder: GoalBuilder) -> Result<SavingsGoal, Error>;

    /// Retrieve the goal `id` belonging to `user_id`.
    fn get(&self, id: DatabaseID, user_id: UserID) -> Result<SavingsGoal, Error>;

    /// Retrieve all goals belonging to `user_id`.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<SavingsGoal>, Error>;

    /// Set the status of the goal `id`.
    fn set_status(
        &mut self,
        id: DatabaseID,
        user_id: UserID,
        status: GoalStatus,
    ) -> Result<(), Error>;

    /// Hard-delete the goal `id`.
    ///
    /// Linked templates and expenses are not touched; see
    /// [delete_goal](crate::goal_service::delete_goal) for the full deletion
    /// flow.
    fn delete(&mut self, id: DatabaseID, user_id: UserID) -> Result<(), Error>;
}
