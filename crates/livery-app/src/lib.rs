//! Maintenance surface of the livery engine: command parsing, backend
//! selection and JSON reporting for the `livery` binary.

pub mod backend;
pub mod cli;
pub mod logging;
