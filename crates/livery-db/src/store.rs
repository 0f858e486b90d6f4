//! Storage collaborator seen by the service layer.
//!
//! A unit of work opens one [`StoreTransaction`], takes its locks, reads what
//! it needs, applies a single [`ChangeSet`] and commits. Dropping a transaction
//! without calling [`StoreTransaction::commit`] discards every write made
//! through it.

use std::future::Future;

use uuid::Uuid;

use livery_core::model::{Event, EventSubtree, Mission, ResourceAssignment, ResourceRef, Ride};

use crate::change::ChangeSet;
use crate::error::DbResult;

pub trait Store: Send + Sync {
    type Tx: StoreTransaction + Send;

    /// ## Summary
    /// Opens a transaction.
    ///
    /// ## Errors
    /// Returns `DbError::LockTimeout` or a pool error when no transaction can be
    /// started in time; both are transient.
    fn begin(&self) -> impl Future<Output = DbResult<Self::Tx>> + Send;
}

pub trait StoreTransaction {
    /// ## Summary
    /// Serializes writers of the event's subtree until this transaction ends.
    ///
    /// Returns `false` if the event does not exist.
    ///
    /// ## Errors
    /// Returns `DbError::LockTimeout` when the lock is not granted in time.
    fn lock_event(&mut self, event_id: Uuid) -> impl Future<Output = DbResult<bool>> + Send;

    /// ## Summary
    /// Serializes writers of the given resources until this transaction ends.
    ///
    /// Locks are taken in [`ResourceRef`] order regardless of the order given.
    ///
    /// ## Errors
    /// Returns `DbError::LockTimeout` when a lock is not granted in time.
    fn lock_resources(
        &mut self,
        resources: &[ResourceRef],
    ) -> impl Future<Output = DbResult<()>> + Send;

    fn event(&mut self, event_id: Uuid) -> impl Future<Output = DbResult<Option<Event>>> + Send;

    /// ## Summary
    /// Loads the event, its missions, the rides attached to those missions,
    /// every assignment owned by the event or its missions, and its participants.
    ///
    /// ## Errors
    /// Returns an error if a read fails or a stored row cannot be decoded.
    fn event_subtree(
        &mut self,
        event_id: Uuid,
    ) -> impl Future<Output = DbResult<Option<EventSubtree>>> + Send;

    fn mission(&mut self, mission_id: Uuid)
    -> impl Future<Output = DbResult<Option<Mission>>> + Send;

    fn ride(&mut self, ride_id: Uuid) -> impl Future<Output = DbResult<Option<Ride>>> + Send;

    fn assignment(
        &mut self,
        assignment_id: Uuid,
    ) -> impl Future<Output = DbResult<Option<ResourceAssignment>>> + Send;

    /// Every assignment of `resource`, in any status.
    fn assignments_for_resource(
        &mut self,
        resource: ResourceRef,
    ) -> impl Future<Output = DbResult<Vec<ResourceAssignment>>> + Send;

    fn resource_exists(
        &mut self,
        resource: ResourceRef,
    ) -> impl Future<Output = DbResult<bool>> + Send;

    /// ## Summary
    /// Applies every mutation of `changes`, in order.
    ///
    /// ## Errors
    /// Returns an error if a write fails; the transaction must then be dropped.
    fn apply(&mut self, changes: &ChangeSet) -> impl Future<Output = DbResult<()>> + Send;

    /// ## Summary
    /// Makes every applied change visible to later transactions.
    ///
    /// ## Errors
    /// Returns an error if the commit fails; nothing is written in that case.
    fn commit(self) -> impl Future<Output = DbResult<()>> + Send;

    /// ## Summary
    /// Discards every applied change.
    ///
    /// ## Errors
    /// Returns an error if the backend fails to roll back.
    fn rollback(self) -> impl Future<Output = DbResult<()>> + Send;
}
