//! Query builder functions for participants.

use diesel::prelude::*;

use crate::db::schema::participant;

/// ## Summary
/// Returns a query to find the participants of an event.
#[must_use]
pub fn for_event(event_id: uuid::Uuid) -> participant::BoxedQuery<'static, diesel::pg::Pg> {
    participant::table
        .filter(participant::event_id.eq(event_id))
        .order(participant::id.asc())
        .into_boxed()
}
