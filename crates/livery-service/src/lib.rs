//! Event lifecycle and resource assignment engine.
//!
//! The pure planners ([`fare`], [`conflict`], [`lifecycle`], [`clone`]) decide
//! what a change looks like; [`EventEngine`] runs each change as one unit of
//! work against a [`livery_db::Store`].

pub mod clone;
pub mod conflict;
pub mod error;
pub mod fare;
pub mod lifecycle;
pub mod orchestrator;
pub mod retry;

#[cfg(test)]
mod fixtures;

pub use clone::CloneOptions;
pub use conflict::{Conflict, ConflictError};
pub use error::{ServiceError, ServiceResult};
pub use orchestrator::{
    AssignResourceRequest, EventEngine, Operation, OperationOutcome, OverrideOutcome,
};
