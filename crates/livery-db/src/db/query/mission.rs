//! Query builder functions for missions.

use diesel::prelude::*;

use crate::db::schema::mission;

/// ## Summary
/// Returns a query to find a mission by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> mission::BoxedQuery<'static, diesel::pg::Pg> {
    mission::table.filter(mission::id.eq(id)).into_boxed()
}

/// ## Summary
/// Returns a query to find the missions of an event in window order.
#[must_use]
pub fn for_event(event_id: uuid::Uuid) -> mission::BoxedQuery<'static, diesel::pg::Pg> {
    mission::table
        .filter(mission::event_id.eq(event_id))
        .order((mission::start_date.asc(), mission::id.asc()))
        .into_boxed()
}
