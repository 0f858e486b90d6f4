//! Double-booking detection for vehicles, venues and teams.
//!
//! All three resource kinds are checked the same way: two assignments conflict
//! when they name the same resource, neither is cancelled, and their half-open
//! windows overlap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use livery_core::model::ResourceAssignment;

/// One existing assignment that overlaps a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub conflicting_assignment_id: Uuid,
    pub resource_id: Uuid,
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,
}

/// A candidate assignment was refused; carries every overlap found.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Resource conflict: {} overlapping assignment(s)", .conflicts.len())]
pub struct ConflictError {
    pub conflicts: Vec<Conflict>,
}

/// ## Summary
/// Lists every assignment in `existing` that would double-book `candidate`'s resource.
///
/// Cancelled assignments and the candidate itself are ignored. Adjacent and
/// zero-length windows never conflict.
#[must_use]
pub fn find_conflicts(
    candidate: &ResourceAssignment,
    existing: &[ResourceAssignment],
) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|other| {
            other.id != candidate.id
                && other.resource == candidate.resource
                && other.status.holds_resource()
        })
        .filter_map(|other| {
            candidate.window.overlap(&other.window).map(|overlap| Conflict {
                conflicting_assignment_id: other.id,
                resource_id: other.resource.id(),
                overlap_start: overlap.start(),
                overlap_end: overlap.end(),
            })
        })
        .collect()
}

/// ## Summary
/// Accepts `candidate` for persistence if it conflicts with nothing in `existing`.
///
/// Must run under the resource lock that guarded the read of `existing`.
///
/// ## Errors
/// Returns `ConflictError` with the full conflict list otherwise.
pub fn try_assign(
    candidate: ResourceAssignment,
    existing: &[ResourceAssignment],
) -> Result<ResourceAssignment, ConflictError> {
    let conflicts = find_conflicts(&candidate, existing);
    if conflicts.is_empty() {
        Ok(candidate)
    } else {
        tracing::warn!(
            resource = %candidate.resource,
            conflicts = conflicts.len(),
            "Refusing double-booked assignment"
        );
        Err(ConflictError { conflicts })
    }
}
