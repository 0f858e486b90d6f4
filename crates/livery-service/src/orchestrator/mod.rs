//! Entry point of the engine: every operation runs as one unit of work
//! against a [`Store`], retried on transient contention.

mod assign;
mod hierarchy;

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use livery_core::config::EngineConfig;
use livery_core::model::{Event, EventSubtree, Terminal};
use livery_db::{ChangeSet, Store, StoreTransaction};

use crate::clone::{CloneOptions, plan_clone};
use crate::error::{ServiceError, ServiceResult};
use crate::retry::{RetryPolicy, run_with_retry};
use crate::{fare, lifecycle};

pub use assign::{AssignResourceRequest, OverrideOutcome};

/// Named operations accepted by [`EventEngine::apply_operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Clone,
    Cancel,
    Complete,
    Delete,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for Operation {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clone" => Ok(Self::Clone),
            "cancel" => Ok(Self::Cancel),
            "complete" => Ok(Self::Complete),
            "delete" => Ok(Self::Delete),
            other => Err(ServiceError::ValidationError(format!(
                "unknown operation '{other}', expected one of clone, cancel, complete, delete"
            ))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`EventEngine::apply_operation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum OperationOutcome {
    /// The new event produced by `clone`.
    Cloned { event: Event },
    /// The event after `cancel` or `complete`.
    Updated { event: Event },
    Deleted {
        #[serde(rename = "eventId")]
        event_id: Uuid,
    },
}

impl OperationOutcome {
    /// The event the outcome carries, if it was not deleted.
    #[must_use]
    pub const fn event(&self) -> Option<&Event> {
        match self {
            Self::Cloned { event } | Self::Updated { event } => Some(event),
            Self::Deleted { .. } => None,
        }
    }
}

/// Orchestrates lifecycle, clone, fare and assignment operations over a store.
#[derive(Debug, Clone)]
pub struct EventEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: Store> EventEngine<S> {
    #[must_use]
    pub const fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, attempt: F) -> ServiceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        run_with_retry(operation, RetryPolicy::from(&self.config), attempt).await
    }

    /// ## Summary
    /// Loads the event with its missions, their rides, its assignments and participants.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` if the event does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_event_subtree(&self, event_id: Uuid) -> ServiceResult<EventSubtree> {
        self.run("get_event_subtree", move || self.subtree_once(event_id))
            .await
    }

    async fn subtree_once(&self, event_id: Uuid) -> ServiceResult<EventSubtree> {
        let mut tx = self.store.begin().await?;
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        tx.rollback().await?;
        Ok(subtree)
    }

    /// ## Summary
    /// Dispatches a named operation to the lifecycle or clone engine.
    ///
    /// `clone` returns the new event, `cancel` and `complete` the updated one,
    /// and `delete` the id of the removed event.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` for an unknown operation name,
    /// before any transaction is opened. Otherwise fails as the dispatched
    /// operation does.
    pub async fn apply_operation(
        &self,
        event_id: Uuid,
        operation: &str,
    ) -> ServiceResult<OperationOutcome> {
        let operation = operation.parse::<Operation>()?;
        self.execute(event_id, operation).await
    }

    /// ## Summary
    /// Runs a parsed operation; see [`Self::apply_operation`].
    ///
    /// ## Errors
    /// Fails as the dispatched operation does.
    #[tracing::instrument(skip(self))]
    pub async fn execute(
        &self,
        event_id: Uuid,
        operation: Operation,
    ) -> ServiceResult<OperationOutcome> {
        let outcome = match operation {
            Operation::Clone => OperationOutcome::Cloned {
                event: self
                    .clone_event_with(event_id, CloneOptions::default())
                    .await?,
            },
            Operation::Cancel => OperationOutcome::Updated {
                event: self.cancel(event_id).await?,
            },
            Operation::Complete => OperationOutcome::Updated {
                event: self.complete(event_id).await?,
            },
            Operation::Delete => {
                self.delete(event_id).await?;
                OperationOutcome::Deleted { event_id }
            }
        };
        tracing::info!("Operation applied");
        Ok(outcome)
    }

    /// ## Summary
    /// Cancels the event and cascades to its missions, their rides and its assignments.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown event and
    /// `ServiceError::InvalidTransition` for a completed one.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, event_id: Uuid) -> ServiceResult<Event> {
        self.run("cancel", move || {
            self.transition_once(event_id, Terminal::Cancelled)
        })
        .await
    }

    /// ## Summary
    /// Completes the event and cascades to its missions, their rides and its assignments.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown event and
    /// `ServiceError::InvalidTransition` for a cancelled one.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, event_id: Uuid) -> ServiceResult<Event> {
        self.run("complete", move || {
            self.transition_once(event_id, Terminal::Completed)
        })
        .await
    }

    async fn transition_once(&self, event_id: Uuid, target: Terminal) -> ServiceResult<Event> {
        let mut tx = self.store.begin().await?;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;

        let changes = lifecycle::plan_transition(&subtree, target)?;
        tx.apply(&changes).await?;
        let event = tx
            .event(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        tx.commit().await?;
        Ok(event)
    }

    /// ## Summary
    /// Deletes the event, its missions, assignments and participants.
    ///
    /// Rides of its missions are detached and kept.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` if the event does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, event_id: Uuid) -> ServiceResult<()> {
        self.run("delete", move || self.delete_once(event_id)).await
    }

    async fn delete_once(&self, event_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;

        tx.apply(&lifecycle::plan_delete(&subtree)).await?;
        tx.commit().await?;
        Ok(())
    }

    /// ## Summary
    /// Copies the event into a new `PLANNED` event, optionally moved to a new start.
    ///
    /// Every copied assignment is checked for conflicts, under the resource
    /// locks, before anything is written.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown event and
    /// `ServiceError::Conflict` listing every overlap the copy would create.
    #[tracing::instrument(skip(self, options), fields(shift_to = ?options.shift_to))]
    pub async fn clone_event_with(
        &self,
        event_id: Uuid,
        options: CloneOptions,
    ) -> ServiceResult<Event> {
        self.run("clone", || self.clone_once(event_id, &options))
            .await
    }

    async fn clone_once(&self, event_id: Uuid, options: &CloneOptions) -> ServiceResult<Event> {
        let mut tx = self.store.begin().await?;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let source = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;

        let plan = plan_clone(
            &source,
            options,
            &self.config.clone_title_suffix,
            Utc::now(),
        );
        let resources = plan.resources();
        tx.lock_resources(&resources).await?;
        let mut existing = Vec::new();
        for resource in &resources {
            existing.extend(tx.assignments_for_resource(*resource).await?);
        }
        plan.check_conflicts(&existing)?;

        let event = plan.event.clone();
        tracing::debug!(
            clone_id = %event.id,
            missions = plan.missions.len(),
            assignments = plan.assignments.len(),
            participants = plan.participants.len(),
            "Cloning event subtree"
        );
        tx.apply(&plan.into_changes()).await?;
        tx.commit().await?;
        Ok(event)
    }

    /// ## Summary
    /// Brings the stored total fare in line with the event's missions.
    ///
    /// Returns the total, or `None` for a fixed-price event. Running it twice
    /// writes nothing the second time.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` if the event does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn recompute_fare(&self, event_id: Uuid) -> ServiceResult<Option<Decimal>> {
        self.run("recompute_fare", move || self.recompute_fare_once(event_id))
            .await
    }

    async fn recompute_fare_once(&self, event_id: Uuid) -> ServiceResult<Option<Decimal>> {
        let mut tx = self.store.begin().await?;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;

        let total = fare::recompute(&subtree.event, &subtree.missions)?;
        if let Some((total, mutation)) = fare::plan_update(&subtree.event, &subtree.missions)? {
            tracing::debug!(%total, "Storing recomputed total fare");
            tx.apply(&ChangeSet::from(vec![mutation])).await?;
        }
        tx.commit().await?;
        Ok(total)
    }
}
