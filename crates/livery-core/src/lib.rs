//! Domain types shared by every livery crate: the event hierarchy, time
//! windows, status enums, configuration and core errors. No storage or
//! service dependencies live here.

pub mod config;
pub mod error;
pub mod model;
pub mod money;
pub mod window;
