//! Select query builders. Each returns a boxed query so callers can add
//! filters, locking or pagination before loading.

pub mod assignment;
pub mod event;
pub mod mission;
pub mod participant;
pub mod ride;
