/// Five-step process creation wizard
///
/// Definition -> Tasks -> Tools -> Agents -> Workflow. All edits stay in memory;
/// only [`ProcessWizard::save`] touches storage.
use crate::{
    forms::toggle_id,
    gateway::{Gateway, GatewayResult, Selection, Table},
    records::{self, Agent, Tool},
    workflow::{
        storage::{ProcessStorage, SaveReport},
        types::{AgentRef, ProcessData, ToolRef, WorkflowStep},
    },
};
use std::{fmt, sync::Arc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Definition,
    Tasks,
    Tools,
    Agents,
    Workflow,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        Self::Definition,
        Self::Tasks,
        Self::Tools,
        Self::Agents,
        Self::Workflow,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Definition => "Process Definition",
            Self::Tasks => "Tasks",
            Self::Tools => "Tools",
            Self::Agents => "Agents",
            Self::Workflow => "Workflow",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

pub struct ProcessWizard {
    storage: ProcessStorage,
    gateway: Arc<dyn Gateway>,
    current_step: usize,
    process: ProcessData,
    step_draft: WorkflowStep,
    available_tools: Vec<ToolRef>,
    available_agents: Vec<AgentRef>,
}

impl ProcessWizard {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self::with_process(gateway, ProcessData::default())
    }

    /// Start from an existing graph, e.g. one read back from storage
    pub fn with_process(gateway: Arc<dyn Gateway>, process: ProcessData) -> Self {
        Self {
            storage: ProcessStorage::new(gateway.clone()),
            gateway,
            current_step: 0,
            process,
            step_draft: WorkflowStep::default(),
            available_tools: Vec::new(),
            available_agents: Vec::new(),
        }
    }

    /// Fetch the tool and agent catalogues offered by the Tools and Agents steps
    ///
    /// A failed fetch is logged and leaves the previous list in place.
    pub async fn load_catalogue(&mut self) {
        let by_name = Selection::all().order_by("name");

        match self
            .gateway
            .select(Table::Tools, &by_name)
            .await
            .and_then(records::from_rows::<Tool>)
        {
            Ok(tools) => {
                self.available_tools = tools.iter().filter_map(ToolRef::from_record).collect()
            }
            Err(e) => tracing::error!("Error fetching tools: {}", e),
        }

        match self
            .gateway
            .select(Table::Agents, &by_name)
            .await
            .and_then(records::from_rows::<Agent>)
        {
            Ok(agents) => {
                self.available_agents = agents.iter().filter_map(AgentRef::from_record).collect()
            }
            Err(e) => tracing::error!("Error fetching agents: {}", e),
        }
    }

    pub fn process(&self) -> &ProcessData {
        &self.process
    }

    pub fn available_tools(&self) -> &[ToolRef] {
        &self.available_tools
    }

    pub fn available_agents(&self) -> &[AgentRef] {
        &self.available_agents
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step(&self) -> WizardStep {
        WizardStep::ALL[self.current_step]
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    /// Save is offered only on the last step
    pub fn is_last_step(&self) -> bool {
        self.current_step == WizardStep::ALL.len() - 1
    }

    pub fn next(&mut self) {
        if !self.is_last_step() {
            self.current_step += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current_step = self.current_step.saturating_sub(1);
    }

    pub fn set_name(&mut self, name: &str) {
        self.process.name = name.to_string();
    }

    pub fn set_description(&mut self, description: &str) {
        self.process.description = description.to_string();
    }

    /// Append a task; `false` for a blank name
    pub fn add_task(&mut self, name: &str) -> bool {
        self.process.add_task(name).is_some()
    }

    pub fn remove_task(&mut self, id: &str) {
        self.process.remove_task(id);
    }

    /// Toggle a catalogue tool; `false` if the id is not offered
    pub fn toggle_tool(&mut self, id: &str) -> bool {
        match self.available_tools.iter().find(|tool| tool.id == id) {
            Some(tool) => {
                self.process.toggle_tool(tool);
                true
            }
            None if self.process.has_tool(id) => {
                self.process.tools.retain(|tool| tool.id != id);
                true
            }
            None => false,
        }
    }

    pub fn toggle_agent(&mut self, id: &str) -> bool {
        match self.available_agents.iter().find(|agent| agent.id == id) {
            Some(agent) => {
                self.process.toggle_agent(agent);
                true
            }
            None if self.process.has_agent(id) => {
                self.process.agents.retain(|agent| agent.id != id);
                true
            }
            None => false,
        }
    }

    pub fn step_draft(&self) -> &WorkflowStep {
        &self.step_draft
    }

    /// Choose the draft step's task among the process tasks
    pub fn select_step_task(&mut self, task_id: &str) -> bool {
        if !self.process.has_task(task_id) {
            return false;
        }
        self.step_draft.task_id = task_id.to_string();
        true
    }

    /// Choose the draft step's agent among the process agents
    pub fn select_step_agent(&mut self, agent_id: &str) -> bool {
        if !self.process.has_agent(agent_id) {
            return false;
        }
        self.step_draft.agent_id = agent_id.to_string();
        true
    }

    /// Toggle one of the process tools on the draft step
    pub fn toggle_step_tool(&mut self, tool_id: &str) -> bool {
        if !self.process.has_tool(tool_id) {
            return false;
        }
        toggle_id(&mut self.step_draft.tool_ids, tool_id);
        true
    }

    pub fn can_add_workflow_step(&self) -> bool {
        self.step_draft.is_complete()
    }

    /// Append the draft step and clear it; `false` until task and agent are chosen
    pub fn add_workflow_step(&mut self) -> bool {
        if !self.can_add_workflow_step() {
            return false;
        }
        let mut step = std::mem::take(&mut self.step_draft);
        step.id = Uuid::new_v4().to_string();
        self.process.workflow.push(step);
        true
    }

    pub fn remove_workflow_step(&mut self, id: &str) {
        self.process.remove_workflow_step(id);
    }

    /// Persist the process graph
    ///
    /// On failure the error is logged and returned; the process id is kept if
    /// the header had already been stored.
    pub async fn save(&mut self) -> GatewayResult<SaveReport> {
        match self.storage.save(&mut self.process).await {
            Ok(report) => {
                tracing::info!(
                    "✅ Process saved successfully: {} (graph version {})",
                    report.process_id,
                    report.graph_version
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Error saving process: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;
    use serde_json::json;

    async fn wizard() -> (Arc<SqliteGateway>, ProcessWizard) {
        let gateway = Arc::new(SqliteGateway::in_memory().await.unwrap());
        (gateway.clone(), ProcessWizard::new(gateway))
    }

    async fn seed(gateway: &SqliteGateway, table: Table, name: &str) -> String {
        let mut row = crate::gateway::Row::new();
        row.insert("name".to_string(), json!(name));
        let stored = gateway.insert(table, row).await.unwrap();
        stored["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn navigation_is_clamped() {
        let (_, mut wizard) = wizard().await;

        wizard.previous();
        assert_eq!(wizard.current_step(), 0);
        assert_eq!(wizard.step(), WizardStep::Definition);

        for _ in 0..10 {
            wizard.next();
        }
        assert_eq!(wizard.current_step(), 4);
        assert!(wizard.is_last_step());

        wizard.previous();
        assert_eq!(wizard.step(), WizardStep::Agents);
    }

    #[tokio::test]
    async fn catalogue_is_sorted_by_name() {
        let (gateway, mut wizard) = wizard().await;
        seed(&gateway, Table::Tools, "Zeta").await;
        seed(&gateway, Table::Tools, "Alpha").await;

        wizard.load_catalogue().await;

        let names: Vec<_> = wizard.available_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn failed_catalogue_fetch_keeps_previous_lists() {
        let (gateway, mut wizard) = wizard().await;
        seed(&gateway, Table::Agents, "Analyst").await;
        wizard.load_catalogue().await;

        gateway.close().await;
        wizard.load_catalogue().await;

        assert_eq!(wizard.available_agents().len(), 1);
    }

    #[tokio::test]
    async fn toggling_unknown_ids_is_rejected() {
        let (_, mut wizard) = wizard().await;
        assert!(!wizard.toggle_tool("nope"));
        assert!(!wizard.toggle_agent("nope"));
        assert!(wizard.process().tools.is_empty());
    }

    #[tokio::test]
    async fn workflow_step_needs_task_and_agent() {
        let (gateway, mut wizard) = wizard().await;
        let agent_id = seed(&gateway, Table::Agents, "Analyst").await;
        let tool_id = seed(&gateway, Table::Tools, "Search").await;
        wizard.load_catalogue().await;

        assert!(wizard.add_task("Summarize"));
        assert!(!wizard.add_task("  "));
        let task_id = wizard.process().tasks[0].id.clone();

        assert!(wizard.select_step_task(&task_id));
        assert!(!wizard.add_workflow_step());
        assert!(wizard.process().workflow.is_empty());

        assert!(!wizard.select_step_agent(&agent_id));
        assert!(wizard.toggle_agent(&agent_id));
        assert!(wizard.select_step_agent(&agent_id));

        assert!(!wizard.toggle_step_tool(&tool_id));
        wizard.toggle_tool(&tool_id);
        assert!(wizard.toggle_step_tool(&tool_id));

        assert!(wizard.add_workflow_step());
        assert_eq!(wizard.step_draft(), &WorkflowStep::default());

        let step = &wizard.process().workflow[0];
        assert_eq!(step.task_id, task_id);
        assert_eq!(step.tool_ids, vec![tool_id]);

        let step_id = step.id.clone();
        wizard.remove_workflow_step(&step_id);
        assert!(wizard.process().workflow.is_empty());
    }

    #[tokio::test]
    async fn save_assigns_the_process_id() {
        let (_, mut wizard) = wizard().await;
        wizard.set_name("Quarterly report");
        wizard.set_description("Summaries for the board");

        let report = wizard.save().await.unwrap();

        assert_eq!(wizard.process().id.as_deref(), Some(report.process_id.as_str()));
        assert_eq!(wizard.process().graph_version, 1);
    }
}
