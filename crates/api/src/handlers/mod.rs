//! Request handlers, one module per resource.
//!
//! Every handler follows the same order: resolve the caller, validate the
//! body, check referenced records, write, publish the lifecycle event, and
//! answer with an envelope from [`crate::response`]. Side effects are never
//! awaited by the request.

pub mod activities;
pub mod clients;
pub mod invoices;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// JSON snapshot of a record for changed-field detection.
pub(crate) fn snapshot<T: Serialize>(record: &T) -> AppResult<Value> {
    serde_json::to_value(record)
        .map_err(|e| AppError::InternalError(format!("Failed to snapshot record: {e}")))
}
