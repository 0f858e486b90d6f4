//! Command line surface of the `livery` binary.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use livery_core::model::EventSubtree;
use livery_db::Store;
use livery_service::{Conflict, EventEngine, OperationOutcome, ServiceError, ServiceResult};

#[derive(Debug, Parser)]
#[command(name = "livery")]
#[command(about = "Event lifecycle and resource assignment engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,

    #[command(flatten)]
    Engine(EngineCommand),
}

/// Commands that run through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum EngineCommand {
    /// Print an event with its missions, rides, assignments and participants
    Subtree { event_id: Uuid },

    /// Apply clone, cancel, complete or delete to an event
    Apply { operation: String, event_id: Uuid },

    /// Recompute the total fare of a mission-based event
    RecomputeFare { event_id: Uuid },
}

/// What a successful command prints.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Subtree(Box<EventSubtree>),
    Operation(OperationOutcome),
    #[serde(rename_all = "camelCase")]
    Fare {
        event_id: Uuid,
        /// `None` for fixed-price events.
        total_fare: Option<Decimal>,
    },
}

/// ## Summary
/// Runs an engine command and returns what it should print.
///
/// ## Errors
/// Returns the engine's error unchanged.
#[tracing::instrument(skip(engine))]
pub async fn run<S: Store>(
    engine: &EventEngine<S>,
    command: &EngineCommand,
) -> ServiceResult<CommandOutput> {
    match command {
        EngineCommand::Subtree { event_id } => {
            let subtree = engine.get_event_subtree(*event_id).await?;
            Ok(CommandOutput::Subtree(Box::new(subtree)))
        }
        EngineCommand::Apply {
            operation,
            event_id,
        } => Ok(CommandOutput::Operation(
            engine.apply_operation(*event_id, operation).await?,
        )),
        EngineCommand::RecomputeFare { event_id } => Ok(CommandOutput::Fare {
            event_id: *event_id,
            total_fare: engine.recompute_fare(*event_id).await?,
        }),
    }
}

/// Machine-readable form of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
}

impl ErrorReport {
    /// Process exit status for the error kind; never zero.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.error {
            "not_found" => 2,
            "invalid_transition" => 3,
            "conflict" => 4,
            "validation" => 5,
            "transaction_failure" => 6,
            "timeout" => 7,
            _ => 1,
        }
    }
}

impl From<&ServiceError> for ErrorReport {
    fn from(err: &ServiceError) -> Self {
        let conflicts = match err {
            ServiceError::Conflict(conflict) => conflict.conflicts.clone(),
            _ => Vec::new(),
        };
        Self {
            error: err.kind(),
            message: err.to_string(),
            conflicts,
        }
    }
}
