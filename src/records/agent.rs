use crate::{gateway::Table, records::Record};
use serde::{Deserialize, Serialize};

/// An agent binds a model to the tools it may call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub tool_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Record for Agent {
    const TABLE: Table = Table::Agents;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}
