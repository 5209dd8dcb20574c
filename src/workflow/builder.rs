/// Canvas-based process builder
///
/// Holds the canvas together with the catalogues its side panels offer. Saving
/// a model, agent or tool updates the row when the record already has an id and
/// inserts it otherwise; the local list is reconciled from the stored row.
use crate::{
    forms::Choice,
    gateway::{Gateway, GatewayResult, Selection},
    records::{self, Agent, Model, Process, Record, Task, TaskInstance, Tool},
    workflow::canvas::{Canvas, CanvasEdge, CanvasNode, NodeKind},
};
use std::sync::Arc;

pub struct ProcessBuilder {
    gateway: Arc<dyn Gateway>,
    canvas: Canvas,
    models: Vec<Model>,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    processes: Vec<Process>,
    tools: Vec<Tool>,
}

impl ProcessBuilder {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            canvas: Canvas::new(),
            models: Vec::new(),
            agents: Vec::new(),
            tasks: Vec::new(),
            processes: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Fetch every catalogue; each failure is logged and keeps its old list
    pub async fn load(&mut self) {
        fetch_into(self.gateway.as_ref(), &mut self.models).await;
        fetch_into(self.gateway.as_ref(), &mut self.agents).await;
        fetch_into(self.gateway.as_ref(), &mut self.tasks).await;
        fetch_into(self.gateway.as_ref(), &mut self.processes).await;
        fetch_into(self.gateway.as_ref(), &mut self.tools).await;
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn add_node(&mut self, kind: NodeKind) -> &CanvasNode {
        self.canvas.add_node(kind)
    }

    pub fn connect(&mut self, source: &str, target: &str) -> &CanvasEdge {
        self.canvas.connect(source, target)
    }

    pub fn remove_node(&mut self, id: &str) -> bool {
        self.canvas.remove_node(id)
    }

    pub async fn save_model(&mut self, model: &Model) -> GatewayResult<Model> {
        let saved = persist(self.gateway.as_ref(), model).await?;
        reconcile(&mut self.models, &saved);
        Ok(saved)
    }

    pub async fn save_agent(&mut self, agent: &Agent) -> GatewayResult<Agent> {
        let saved = persist(self.gateway.as_ref(), agent).await?;
        reconcile(&mut self.agents, &saved);
        Ok(saved)
    }

    pub async fn save_tool(&mut self, tool: &Tool) -> GatewayResult<Tool> {
        let saved = persist(self.gateway.as_ref(), tool).await?;
        reconcile(&mut self.tools, &saved);
        Ok(saved)
    }

    /// Store a task instance and place it on the canvas as a task node
    pub async fn save_task_instance(&mut self, instance: &TaskInstance) -> GatewayResult<TaskInstance> {
        let saved = persist(self.gateway.as_ref(), instance).await?;
        if let Some(id) = saved.id() {
            let mut data = serde_json::to_value(&saved)?;
            if let Some(task) = self.tasks.iter().find(|t| t.id() == Some(saved.task_id.as_str())) {
                data["name"] = serde_json::Value::String(task.name.clone());
            }
            self.canvas.add_record_node(id, NodeKind::Task, data);
        }
        Ok(saved)
    }

    pub fn model_choices(&self) -> Vec<Choice> {
        choices(&self.models, |m| &m.name)
    }

    pub fn agent_choices(&self) -> Vec<Choice> {
        choices(&self.agents, |a| &a.name)
    }

    pub fn task_choices(&self) -> Vec<Choice> {
        choices(&self.tasks, |t| &t.name)
    }

    pub fn process_choices(&self) -> Vec<Choice> {
        choices(&self.processes, |p| &p.name)
    }

    pub fn tool_choices(&self) -> Vec<Choice> {
        choices(&self.tools, |t| &t.name)
    }
}

async fn fetch_into<R: Record>(gateway: &dyn Gateway, list: &mut Vec<R>) {
    let fetched = gateway
        .select(R::TABLE, &Selection::all())
        .await
        .and_then(records::from_rows::<R>);
    match fetched {
        Ok(items) => *list = items,
        Err(e) => tracing::error!("Error fetching {}: {}", R::TABLE, e),
    }
}

/// Update when the record has an id, insert otherwise
async fn persist<R: Record>(gateway: &dyn Gateway, record: &R) -> GatewayResult<R> {
    let row = record.to_row()?;
    let stored = match record.id() {
        Some(id) => gateway.update(R::TABLE, id, row).await,
        None => gateway.insert(R::TABLE, row).await,
    };

    match stored {
        Ok(stored) => R::from_row(stored),
        Err(e) => {
            tracing::error!("Error saving {}: {}", R::TABLE, e);
            Err(e)
        }
    }
}

/// Drop any entry with the saved id, then append the saved record
fn reconcile<R: Record>(list: &mut Vec<R>, saved: &R) {
    if let Some(id) = saved.id() {
        list.retain(|item| item.id() != Some(id));
    }
    list.push(saved.clone());
}

fn choices<R: Record>(items: &[R], name: impl Fn(&R) -> &String) -> Vec<Choice> {
    items
        .iter()
        .filter_map(|item| Some(Choice::new(item.id()?, name(item).as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{SqliteGateway, Table};

    async fn builder() -> (Arc<SqliteGateway>, ProcessBuilder) {
        let gateway = Arc::new(SqliteGateway::in_memory().await.unwrap());
        (gateway.clone(), ProcessBuilder::new(gateway))
    }

    #[tokio::test]
    async fn saving_twice_keeps_one_list_entry() {
        let (gateway, mut builder) = builder().await;

        let created = builder.save_tool(&Tool::new("Scraper", "v1")).await.unwrap();
        assert!(created.id().is_some());

        let mut edited = created.clone();
        edited.description = "v2".to_string();
        builder.save_tool(&edited).await.unwrap();

        assert_eq!(builder.tools().len(), 1);
        assert_eq!(builder.tools()[0].description, "v2");
        assert_eq!(gateway.list(Table::Tools).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saved_model_moves_to_the_end() {
        let (_, mut builder) = builder().await;
        let first = Model {
            name: "a".to_string(),
            ..Model::default()
        };
        let second = Model {
            name: "b".to_string(),
            ..Model::default()
        };
        let first = builder.save_model(&first).await.unwrap();
        builder.save_model(&second).await.unwrap();

        builder.save_model(&first).await.unwrap();

        let names: Vec<_> = builder.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn task_instance_lands_on_the_canvas() {
        let (_, mut builder) = builder().await;
        let instance = TaskInstance {
            input: "quarterly.csv".to_string(),
            ..TaskInstance::default()
        };

        let saved = builder.save_task_instance(&instance).await.unwrap();

        let id = saved.id().unwrap();
        let node = builder.canvas().node(id).unwrap();
        assert_eq!(node.kind, NodeKind::Task);
        assert_eq!(node.data["input"], "quarterly.csv");
    }

    #[tokio::test]
    async fn load_fills_choices() {
        let (gateway, mut builder) = builder().await;
        let mut row = crate::gateway::Row::new();
        row.insert("name".to_string(), serde_json::json!("Analyst"));
        gateway.insert(Table::Agents, row).await.unwrap();

        builder.load().await;

        let choices = builder.agent_choices();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].name, "Analyst");
    }

    #[tokio::test]
    async fn failed_save_leaves_lists_alone() {
        let (gateway, mut builder) = builder().await;
        builder.save_tool(&Tool::new("Keep", "")).await.unwrap();
        gateway.close().await;

        assert!(builder.save_tool(&Tool::new("Lost", "")).await.is_err());
        assert_eq!(builder.tools().len(), 1);
        assert!(builder.canvas().nodes().is_empty());
    }
}
