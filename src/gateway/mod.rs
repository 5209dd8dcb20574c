/// Persistence gateway
///
/// Table-scoped select/insert/update/delete/upsert plus one raw SQL path.
/// Components receive the gateway as `Arc<dyn Gateway>`; the application entry
/// point owns the concrete instance and its connection pool.

pub mod error;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub use error::{GatewayError, GatewayResult};
pub use sqlite::SqliteGateway;

/// A single table row as column name -> JSON value
pub type Row = serde_json::Map<String, Value>;

/// Every table the application reads or writes
///
/// Table names are never taken from user input; SQL is built from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Models,
    ModelTypes,
    Agents,
    Tools,
    Tasks,
    TaskInstances,
    Processes,
    ProcessTools,
    ProcessAgents,
    WorkflowSteps,
    WorkflowTools,
    Secrets,
    Configs,
    Functions,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Models => "models",
            Table::ModelTypes => "model_types",
            Table::Agents => "agents",
            Table::Tools => "tools",
            Table::Tasks => "tasks",
            Table::TaskInstances => "task_instances",
            Table::Processes => "processes",
            Table::ProcessTools => "process_tools",
            Table::ProcessAgents => "process_agents",
            Table::WorkflowSteps => "workflow_steps",
            Table::WorkflowTools => "workflow_tools",
            Table::Secrets => "secrets",
            Table::Configs => "configs",
            Table::Functions => "functions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row selection: optional equality filter and optional ascending order
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub filter: Option<(String, Value)>,
    pub order_by: Option<String>,
}

impl Selection {
    /// Every row, storage order
    pub fn all() -> Self {
        Self::default()
    }

    /// Rows where `column = value`
    pub fn where_eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some((column.into(), value.into())),
            order_by: None,
        }
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }
}

/// One write inside a [`Batch`]
#[derive(Debug, Clone)]
pub enum Mutation {
    Insert { table: Table, row: Row },
    Update { table: Table, id: String, patch: Row },
    DeleteWhere { table: Table, column: String, value: Value },
}

/// Ordered list of writes applied in a single transaction
///
/// Either every mutation lands or none does.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    mutations: Vec<Mutation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table, row: Row) -> &mut Self {
        self.mutations.push(Mutation::Insert { table, row });
        self
    }

    pub fn update(&mut self, table: Table, id: impl Into<String>, patch: Row) -> &mut Self {
        self.mutations.push(Mutation::Update {
            table,
            id: id.into(),
            patch,
        });
        self
    }

    pub fn delete_where(
        &mut self,
        table: Table,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.mutations.push(Mutation::DeleteWhere {
            table,
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

/// Table access contract consumed by managers, pages, the wizard and the API
///
/// Every call is independent: no transaction spans two calls except
/// [`Gateway::apply`]. Callers log failures and keep their previous state.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Rows matching `selection`
    async fn select(&self, table: Table, selection: &Selection) -> GatewayResult<Vec<Row>>;

    /// Every row of `table`
    async fn list(&self, table: Table) -> GatewayResult<Vec<Row>> {
        self.select(table, &Selection::all()).await
    }

    /// Insert one row, assigning an `id` when absent, and return the stored row
    async fn insert(&self, table: Table, row: Row) -> GatewayResult<Row>;

    /// Insert several rows in order. An empty input is a no-op.
    async fn insert_many(&self, table: Table, rows: Vec<Row>) -> GatewayResult<Vec<Row>>;

    /// Overwrite the given columns of row `id` and return the stored row
    async fn update(&self, table: Table, id: &str, patch: Row) -> GatewayResult<Row>;

    /// Delete row `id`; `false` when nothing matched
    async fn delete(&self, table: Table, id: &str) -> GatewayResult<bool> {
        let removed = self
            .delete_where(table, "id", Value::String(id.to_string()))
            .await?;
        Ok(removed > 0)
    }

    /// Delete every row where `column = value`, returning the count
    async fn delete_where(&self, table: Table, column: &str, value: Value) -> GatewayResult<u64>;

    /// Insert or update rows keyed on `id`
    async fn upsert(&self, table: Table, rows: Vec<Row>) -> GatewayResult<Vec<Row>>;

    /// Raw parameterised SQL, positional `?` placeholders
    async fn execute_sql(&self, sql: &str, params: &[Value]) -> GatewayResult<Vec<Row>>;

    /// Apply a batch atomically
    async fn apply(&self, batch: Batch) -> GatewayResult<()>;
}
