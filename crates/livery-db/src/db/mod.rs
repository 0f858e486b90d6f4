//! PostgreSQL backend.

pub mod connection;
pub mod migrations;
pub mod query;
pub mod schema;
pub mod transaction;

pub use connection::{DbConnection, DbPool, create_pool};
pub use transaction::{PgStore, PgTransaction};
