//! Query builder functions for rides.

use diesel::prelude::*;

use crate::db::schema::ride;

/// ## Summary
/// Returns a query to find a ride by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> ride::BoxedQuery<'static, diesel::pg::Pg> {
    ride::table.filter(ride::id.eq(id)).into_boxed()
}

/// ## Summary
/// Returns a query to find the rides attached to any of the given missions.
#[must_use]
pub fn for_missions(mission_ids: &[uuid::Uuid]) -> ride::BoxedQuery<'static, diesel::pg::Pg> {
    ride::table
        .filter(ride::mission_id.eq_any(mission_ids.to_vec()))
        .order((ride::pickup_time.asc(), ride::id.asc()))
        .into_boxed()
}

/// ## Summary
/// Returns a query to find rides not attached to any mission.
#[must_use]
pub fn detached() -> ride::BoxedQuery<'static, diesel::pg::Pg> {
    ride::table.filter(ride::mission_id.is_null()).into_boxed()
}
