//! Defines the recurring template store trait.

use crate::{
    Error,
    models::{DatabaseID, RecurringTemplate, TemplateBuilder, TemplateUpdate, UserID},
};

/// Handles the creation and retrieval of recurring transaction templates.
///
/// All operations are scoped to a single user: rows belonging to other users
/// are reported as [Error::NotFound].
pub trait RecurringTemplateStore {
    /// Create a new template in the store.
    fn create(&mut self, builder: TemplateBuilder) -> Result<RecurringTemplate, Error>;

    /// Retrieve the template `id` belonging to `user_id`.
    fn get(&self, id: DatabaseID, user_id: UserID) -> Result<RecurringTemplate, Error>;

    /// Retrieve all templates belonging to `user_id`, active or not.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<RecurringTemplate>, Error>;

    /// Retrieve the active templates belonging to `user_id`. These are the
    /// templates the materialization service processes.
    fn get_active_by_user(&self, user_id: UserID) -> Result<Vec<RecurringTemplate>, Error>;

    /// Retrieve the active auto-contribution template for the goal
    /// `goal_id`, if one exists. At most one template per goal is active at
    /// a time.
    fn get_active_by_goal(
        &self,
        goal_id: DatabaseID,
        user_id: UserID,
    ) -> Result<Option<RecurringTemplate>, Error>;

    /// Retrieve all templates linked to the goal `goal_id`, active or not.
    fn get_by_goal(
        &self,
        goal_id: DatabaseID,
        user_id: UserID,
    ) -> Result<Vec<RecurringTemplate>, Error>;

    /// Merge `update` into the template `id` and return the updated
    /// template. Fields not set in `update` keep their current value.
    fn update(
        &mut self,
        id: DatabaseID,
        user_id: UserID,
        update: TemplateUpdate,
    ) -> Result<RecurringTemplate, Error>;

    /// Flip the active flag of the template `id`.
    fn set_active(&mut self, id: DatabaseID, user_id: UserID, active: bool) -> Result<(), Error>;

    /// Clear the goal link on all templates linked to the goal `goal_id`,
    /// keeping the templates themselves.
    fn clear_goal_link(&mut self, goal_id: DatabaseID, user_id: UserID) -> Result<(), Error>;

    /// Hard-delete the template `id`.
    ///
    /// Callers should clear the back-references on materialized transactions
    /// first, see
    /// [TransactionStore::clear_recurring_links](crate::stores::TransactionStore::clear_recurring_links).
    fn delete(&mut self, id: DatabaseID, user_id: UserID) -> Result<(), Error>;
}
