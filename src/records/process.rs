/// Process aggregate rows
///
/// The process row is the parent; tool/agent associations and workflow steps
/// are child rows keyed by `process_id`, workflow tool links by step id.
use crate::{gateway::Table, records::Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Process {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Bumped on every successful graph save
    #[serde(default)]
    pub graph_version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Process {
    const TABLE: Table = Table::Processes;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessTool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub process_id: String,
    pub tool_id: String,
}

impl Record for ProcessTool {
    const TABLE: Table = Table::ProcessTools;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessAgent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub process_id: String,
    pub agent_id: String,
}

impl Record for ProcessAgent {
    const TABLE: Table = Table::ProcessAgents;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

/// Stored form of a workflow step; its tools live in `workflow_tools`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStepRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub process_id: String,
    pub task_id: String,
    pub agent_id: String,
    #[serde(default)]
    pub position: i64,
}

impl Record for WorkflowStepRow {
    const TABLE: Table = Table::WorkflowSteps;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub workflow_step_id: String,
    pub tool_id: String,
}

impl Record for WorkflowTool {
    const TABLE: Table = Table::WorkflowTools;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}
