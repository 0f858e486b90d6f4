//! Query builder functions for events.

use diesel::prelude::*;

use crate::db::schema::event;

/// ## Summary
/// Returns a query to select all events.
#[must_use]
pub fn all() -> event::BoxedQuery<'static, diesel::pg::Pg> {
    event::table.into_boxed()
}

/// ## Summary
/// Returns a query to find an event by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(event::id.eq(id))
}

/// ## Summary
/// Returns a query to find the events of a client, earliest first.
#[must_use]
pub fn for_client(client_id: uuid::Uuid) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event::client_id.eq(client_id))
        .order((event::start_date.asc(), event::id.asc()))
}
