//! Query builder functions for resource assignments.

use diesel::prelude::*;

use livery_core::model::{AssignmentStatus, ResourceRef};

use crate::db::schema::resource_assignment;

/// ## Summary
/// Returns a query to find an assignment by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> resource_assignment::BoxedQuery<'static, diesel::pg::Pg> {
    resource_assignment::table
        .filter(resource_assignment::id.eq(id))
        .into_boxed()
}

/// ## Summary
/// Returns a query to find every assignment owned by an event or one of its missions.
#[must_use]
pub fn for_event(event_id: uuid::Uuid) -> resource_assignment::BoxedQuery<'static, diesel::pg::Pg> {
    resource_assignment::table
        .filter(resource_assignment::event_id.eq(event_id))
        .order((resource_assignment::start_time.asc(), resource_assignment::id.asc()))
        .into_boxed()
}

/// ## Summary
/// Returns a query to find every assignment of a resource, in any status.
#[must_use]
pub fn for_resource(
    resource: ResourceRef,
) -> resource_assignment::BoxedQuery<'static, diesel::pg::Pg> {
    let query = resource_assignment::table.into_boxed();
    let query = match resource {
        ResourceRef::Vehicle(id) => query.filter(resource_assignment::vehicle_id.eq(id)),
        ResourceRef::Venue(id) => query.filter(resource_assignment::venue_id.eq(id)),
        ResourceRef::Team(id) => query.filter(resource_assignment::team_id.eq(id)),
    };
    query.order((resource_assignment::start_time.asc(), resource_assignment::id.asc()))
}

/// ## Summary
/// Returns a query to find the assignments of a resource that still hold it.
#[must_use]
pub fn holding(resource: ResourceRef) -> resource_assignment::BoxedQuery<'static, diesel::pg::Pg> {
    for_resource(resource)
        .filter(resource_assignment::status.ne(AssignmentStatus::Cancelled.as_str()))
}
