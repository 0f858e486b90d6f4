#![expect(clippy::expect_used)]
//! Engine integration tests against the in-memory store.

mod assignments;
mod clone;
mod fare;
mod helpers;
mod lifecycle;
