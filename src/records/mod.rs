/// Record types
///
/// Plain data shapes, each bound to one table. Records move through the gateway
/// as JSON rows; field names are the column names.

pub mod agent;
pub mod catalog;
pub mod model;
pub mod process;
pub mod task;
pub mod tool;

use crate::gateway::{GatewayError, GatewayResult, Row, Table};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use agent::Agent;
pub use catalog::{ConfigEntry, Function, ModelType, Secret};
pub use model::{FineTuningStatus, Model, Quantization};
pub use process::{Process, ProcessAgent, ProcessTool, WorkflowStepRow, WorkflowTool};
pub use task::{Task, TaskInstance, TaskStatus};
pub use tool::Tool;

/// A record shape persisted in exactly one table
pub trait Record: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    const TABLE: Table;

    /// Persisted identifier; `None` until the first insert
    fn id(&self) -> Option<&str>;

    fn to_row(&self) -> GatewayResult<Row> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            _ => Err(GatewayError::NotAnObject(Self::TABLE.to_string())),
        }
    }

    fn from_row(row: Row) -> GatewayResult<Self> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }
}

/// `Some(id)` only for a non-empty identifier
pub(crate) fn persisted_id(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

/// Decode a batch of rows, failing on the first malformed one
pub fn from_rows<R: Record>(rows: Vec<Row>) -> GatewayResult<Vec<R>> {
    rows.into_iter().map(R::from_row).collect()
}
