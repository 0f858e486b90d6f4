//! Storage for the livery engine: the transactional store abstraction, batched
//! change sets, and the in-memory and PostgreSQL backends.

pub mod change;
pub mod db;
pub mod error;
pub mod memory;
pub mod model;
pub mod store;

pub use change::{ChangeSet, Mutation};
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use store::{Store, StoreTransaction};
