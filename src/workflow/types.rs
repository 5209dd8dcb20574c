/// Process graph held in memory while it is being authored
///
/// Tasks, tools and agents are referenced by id with their display fields;
/// workflow steps bind one task to one agent and any number of tools. Nothing
/// here touches storage until the process is saved.
use crate::records::{Agent, Record, Tool};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ToolRef {
    /// Reference to a stored tool; `None` before it has an id
    pub fn from_record(tool: &Tool) -> Option<Self> {
        Some(Self {
            id: tool.id()?.to_string(),
            name: tool.name.clone(),
            description: tool.description.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AgentRef {
    pub fn from_record(agent: &Agent) -> Option<Self> {
        Some(Self {
            id: agent.id()?.to_string(),
            name: agent.name.clone(),
            description: agent.description.clone(),
        })
    }
}

/// Ordered edge of the process graph: task -> agent, with tools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    #[serde(default)]
    pub id: String,
    pub task_id: String,
    pub agent_id: String,
    #[serde(default)]
    pub tool_ids: Vec<String>,
}

impl WorkflowStep {
    /// Both ends chosen
    pub fn is_complete(&self) -> bool {
        !self.task_id.is_empty() && !self.agent_id.is_empty()
    }
}

/// Process aggregate as edited by the wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessData {
    /// Assigned on first save
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<TaskRef>,
    #[serde(default)]
    pub tools: Vec<ToolRef>,
    #[serde(default)]
    pub agents: Vec<AgentRef>,
    #[serde(default)]
    pub workflow: Vec<WorkflowStep>,
    #[serde(default)]
    pub graph_version: i64,
}

impl ProcessData {
    pub fn persisted_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Append a task with a fresh temporary id; blank names are ignored
    pub fn add_task(&mut self, name: &str) -> Option<&TaskRef> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.tasks.push(TaskRef {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        });
        self.tasks.last()
    }

    pub fn remove_task(&mut self, id: &str) {
        self.tasks.retain(|task| task.id != id);
    }

    /// Add the tool if absent, remove it if present
    pub fn toggle_tool(&mut self, tool: &ToolRef) {
        match self.tools.iter().position(|t| t.id == tool.id) {
            Some(index) => {
                self.tools.remove(index);
            }
            None => self.tools.push(tool.clone()),
        }
    }

    pub fn toggle_agent(&mut self, agent: &AgentRef) {
        match self.agents.iter().position(|a| a.id == agent.id) {
            Some(index) => {
                self.agents.remove(index);
            }
            None => self.agents.push(agent.clone()),
        }
    }

    pub fn has_tool(&self, id: &str) -> bool {
        self.tools.iter().any(|tool| tool.id == id)
    }

    pub fn has_agent(&self, id: &str) -> bool {
        self.agents.iter().any(|agent| agent.id == id)
    }

    pub fn has_task(&self, id: &str) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn task_name(&self, id: &str) -> Option<&str> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.name.as_str())
    }

    pub fn agent_name(&self, id: &str) -> Option<&str> {
        self.agents.iter().find(|a| a.id == id).map(|a| a.name.as_str())
    }

    pub fn tool_name(&self, id: &str) -> Option<&str> {
        self.tools.iter().find(|t| t.id == id).map(|t| t.name.as_str())
    }

    pub fn remove_workflow_step(&mut self, id: &str) {
        self.workflow.retain(|step| step.id != id);
    }

    /// Drop repeated ids, keeping the first occurrence
    ///
    /// Applies to tasks, tools, agents and each step's tool list. Payloads
    /// that did not come through the toggles may carry repeats.
    pub fn dedup_references(&mut self) {
        dedup_by_key(&mut self.tasks, |task| task.id.clone());
        dedup_by_key(&mut self.tools, |tool| tool.id.clone());
        dedup_by_key(&mut self.agents, |agent| agent.id.clone());
        for step in &mut self.workflow {
            dedup_by_key(&mut step.tool_ids, String::clone);
        }
    }
}

fn dedup_by_key<T>(items: &mut Vec<T>, key: impl Fn(&T) -> String) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
}
