/// Process graph persistence
///
/// Saves a [`ProcessData`] into the process tables and reads it back. The
/// header and the tasks are written first as individual calls; the association
/// sets and workflow steps are then replaced in one atomic batch that also bumps
/// the process `graph_version`.
use crate::{
    gateway::{Batch, Gateway, GatewayError, GatewayResult, Row, Selection, Table},
    records::{self, Agent, Process, Record, Task, Tool, WorkflowStepRow, WorkflowTool},
    workflow::types::{AgentRef, ProcessData, TaskRef, ToolRef, WorkflowStep},
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counts written by one successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub process_id: String,
    pub graph_version: i64,
    pub tasks: usize,
    pub tools: usize,
    pub agents: usize,
    pub workflow_steps: usize,
    pub workflow_tools: usize,
}

#[derive(Clone)]
pub struct ProcessStorage {
    gateway: Arc<dyn Gateway>,
}

impl ProcessStorage {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Persist the whole process graph
    ///
    /// `process.id` is set as soon as the header is stored, so a failure in a
    /// later phase still leaves the caller holding the new id. The first failing
    /// phase aborts the save. Repeated references are collapsed first.
    pub async fn save(&self, process: &mut ProcessData) -> GatewayResult<SaveReport> {
        process.dedup_references();

        let header = self.save_header(process).await?;
        let process_id = stored_id(&header)?;
        process.id = Some(process_id.clone());
        tracing::debug!("💾 Stored process header {}", process_id);

        self.save_tasks(&process_id, &process.tasks).await?;

        let previous_version = header.graph_version;
        let existing_steps = self
            .gateway
            .select(
                Table::WorkflowSteps,
                &Selection::where_eq("process_id", process_id.as_str()),
            )
            .await?;

        let mut batch = Batch::new();

        batch.delete_where(Table::ProcessTools, "process_id", process_id.as_str());
        for tool in &process.tools {
            batch.insert(
                Table::ProcessTools,
                row(json!({ "process_id": process_id, "tool_id": tool.id })),
            );
        }

        batch.delete_where(Table::ProcessAgents, "process_id", process_id.as_str());
        for agent in &process.agents {
            batch.insert(
                Table::ProcessAgents,
                row(json!({ "process_id": process_id, "agent_id": agent.id })),
            );
        }

        for step in &existing_steps {
            if let Some(Value::String(step_id)) = step.get("id") {
                batch.delete_where(Table::WorkflowTools, "workflow_step_id", step_id.as_str());
            }
        }
        batch.delete_where(Table::WorkflowSteps, "process_id", process_id.as_str());

        let mut workflow_tools = 0;
        for (position, step) in process.workflow.iter().enumerate() {
            let step_id = Uuid::new_v4().to_string();
            batch.insert(
                Table::WorkflowSteps,
                row(json!({
                    "id": step_id,
                    "process_id": process_id,
                    "task_id": step.task_id,
                    "agent_id": step.agent_id,
                    "position": position,
                })),
            );
            for tool_id in &step.tool_ids {
                batch.insert(
                    Table::WorkflowTools,
                    row(json!({ "workflow_step_id": step_id, "tool_id": tool_id })),
                );
                workflow_tools += 1;
            }
        }

        let graph_version = previous_version + 1;
        batch.update(
            Table::Processes,
            process_id.as_str(),
            row(json!({ "graph_version": graph_version })),
        );

        tracing::debug!("📝 Applying process graph batch ({} writes)", batch.len());
        self.gateway.apply(batch).await?;
        process.graph_version = graph_version;

        Ok(SaveReport {
            process_id,
            graph_version,
            tasks: process.tasks.len(),
            tools: process.tools.len(),
            agents: process.agents.len(),
            workflow_steps: process.workflow.len(),
            workflow_tools,
        })
    }

    /// Read a process graph back; `None` when the process does not exist
    pub async fn load(&self, id: &str) -> GatewayResult<Option<ProcessData>> {
        let mut headers = self
            .gateway
            .select(Table::Processes, &Selection::where_eq("id", id))
            .await?;
        let Some(header) = headers.pop() else {
            return Ok(None);
        };
        let header = Process::from_row(header)?;

        let by_process = Selection::where_eq("process_id", id);

        let tasks: Vec<Task> = records::from_rows(
            self.gateway
                .select(Table::Tasks, &by_process.clone().order_by("created_at"))
                .await?,
        )?;

        let tool_names: HashMap<String, Tool> = records::from_rows::<Tool>(
            self.gateway.list(Table::Tools).await?,
        )?
        .into_iter()
        .filter_map(|tool| Some((tool.id()?.to_string(), tool)))
        .collect();
        let agent_names: HashMap<String, Agent> = records::from_rows::<Agent>(
            self.gateway.list(Table::Agents).await?,
        )?
        .into_iter()
        .filter_map(|agent| Some((agent.id()?.to_string(), agent)))
        .collect();

        let tools = self
            .gateway
            .select(Table::ProcessTools, &by_process)
            .await?
            .into_iter()
            .filter_map(|assoc| text(&assoc, "tool_id"))
            .map(|tool_id| match tool_names.get(&tool_id) {
                Some(tool) => ToolRef {
                    id: tool_id,
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                },
                None => ToolRef {
                    name: tool_id.clone(),
                    id: tool_id,
                    description: String::new(),
                },
            })
            .collect();

        let agents = self
            .gateway
            .select(Table::ProcessAgents, &by_process)
            .await?
            .into_iter()
            .filter_map(|assoc| text(&assoc, "agent_id"))
            .map(|agent_id| match agent_names.get(&agent_id) {
                Some(agent) => AgentRef {
                    id: agent_id,
                    name: agent.name.clone(),
                    description: agent.description.clone(),
                },
                None => AgentRef {
                    name: agent_id.clone(),
                    id: agent_id,
                    description: String::new(),
                },
            })
            .collect();

        let step_rows: Vec<WorkflowStepRow> = records::from_rows(
            self.gateway
                .select(Table::WorkflowSteps, &by_process.clone().order_by("position"))
                .await?,
        )?;
        let mut workflow = Vec::with_capacity(step_rows.len());
        for step in step_rows {
            let step_id = step.id().unwrap_or_default().to_string();
            let tool_ids = records::from_rows::<WorkflowTool>(
                self.gateway
                    .select(
                        Table::WorkflowTools,
                        &Selection::where_eq("workflow_step_id", step_id.as_str()),
                    )
                    .await?,
            )?
            .into_iter()
            .map(|link| link.tool_id)
            .collect();
            workflow.push(WorkflowStep {
                id: step_id,
                task_id: step.task_id,
                agent_id: step.agent_id,
                tool_ids,
            });
        }

        Ok(Some(ProcessData {
            id: header.id,
            name: header.name,
            description: header.description,
            tasks: tasks
                .into_iter()
                .filter_map(|task| {
                    Some(TaskRef {
                        id: task.id()?.to_string(),
                        name: task.name,
                    })
                })
                .collect(),
            tools,
            agents,
            workflow,
            graph_version: header.graph_version,
        }))
    }

    /// Process headers ordered by name
    pub async fn list(&self) -> GatewayResult<Vec<Process>> {
        let rows = self
            .gateway
            .select(Table::Processes, &Selection::all().order_by("name"))
            .await?;
        records::from_rows(rows)
    }

    /// Delete a process; its tasks, associations and steps go with it
    pub async fn delete(&self, id: &str) -> GatewayResult<bool> {
        self.gateway.delete(Table::Processes, id).await
    }

    async fn save_header(&self, process: &ProcessData) -> GatewayResult<Process> {
        let mut header = row(json!({
            "name": process.name,
            "description": process.description,
        }));

        let stored = match process.persisted_id() {
            Some(id) => {
                // Same shape as the CURRENT_TIMESTAMP column default
                header.insert(
                    "updated_at".to_string(),
                    Value::String(chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()),
                );
                self.gateway.update(Table::Processes, id, header).await?
            }
            None => self.gateway.insert(Table::Processes, header).await?,
        };

        Process::from_row(stored)
    }

    async fn save_tasks(&self, process_id: &str, tasks: &[TaskRef]) -> GatewayResult<()> {
        let rows = tasks
            .iter()
            .map(|task| {
                row(json!({
                    "id": task.id,
                    "process_id": process_id,
                    "name": task.name,
                }))
            })
            .collect::<Vec<_>>();

        if !rows.is_empty() {
            self.gateway.upsert(Table::Tasks, rows).await?;
        }
        Ok(())
    }
}

fn stored_id(process: &Process) -> GatewayResult<String> {
    process
        .id()
        .map(str::to_string)
        .ok_or_else(|| GatewayError::NotFound {
            table: Table::Processes.to_string(),
            id: String::new(),
        })
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;
    use async_trait::async_trait;

    /// Gateway call that [`FailingGateway`] rejects
    #[derive(Clone, Copy, PartialEq)]
    enum FailOn {
        Upsert,
        Apply,
    }

    /// SQLite gateway that errors on one kind of call and passes the rest through
    struct FailingGateway {
        inner: Arc<SqliteGateway>,
        fail_on: FailOn,
    }

    impl FailingGateway {
        fn refuse(&self, call: FailOn) -> GatewayResult<()> {
            if self.fail_on == call {
                Err(GatewayError::Database(sqlx::Error::PoolClosed))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Gateway for FailingGateway {
        async fn select(&self, table: Table, selection: &Selection) -> GatewayResult<Vec<Row>> {
            self.inner.select(table, selection).await
        }

        async fn insert(&self, table: Table, row: Row) -> GatewayResult<Row> {
            self.inner.insert(table, row).await
        }

        async fn insert_many(&self, table: Table, rows: Vec<Row>) -> GatewayResult<Vec<Row>> {
            self.inner.insert_many(table, rows).await
        }

        async fn update(&self, table: Table, id: &str, patch: Row) -> GatewayResult<Row> {
            self.inner.update(table, id, patch).await
        }

        async fn delete_where(&self, table: Table, column: &str, value: Value) -> GatewayResult<u64> {
            self.inner.delete_where(table, column, value).await
        }

        async fn upsert(&self, table: Table, rows: Vec<Row>) -> GatewayResult<Vec<Row>> {
            self.refuse(FailOn::Upsert)?;
            self.inner.upsert(table, rows).await
        }

        async fn execute_sql(&self, sql: &str, params: &[Value]) -> GatewayResult<Vec<Row>> {
            self.inner.execute_sql(sql, params).await
        }

        async fn apply(&self, batch: Batch) -> GatewayResult<()> {
            self.refuse(FailOn::Apply)?;
            self.inner.apply(batch).await
        }
    }

    fn failing(inner: &Arc<SqliteGateway>, fail_on: FailOn) -> ProcessStorage {
        ProcessStorage::new(Arc::new(FailingGateway {
            inner: inner.clone(),
            fail_on,
        }))
    }

    fn tool_ref(id: &str) -> ToolRef {
        ToolRef {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
        }
    }

    fn agent_ref(id: &str) -> AgentRef {
        AgentRef {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
        }
    }

    async fn column_values(
        gateway: &SqliteGateway,
        table: Table,
        process_id: &str,
        column: &str,
    ) -> Vec<String> {
        let mut values: Vec<String> = gateway
            .select(table, &Selection::where_eq("process_id", process_id))
            .await
            .unwrap()
            .iter()
            .filter_map(|row| text(row, column))
            .collect();
        values.sort();
        values
    }

    async fn stored_version(gateway: &SqliteGateway, process_id: &str) -> i64 {
        let rows = gateway
            .select(Table::Processes, &Selection::where_eq("id", process_id))
            .await
            .unwrap();
        rows[0]["graph_version"].as_i64().unwrap()
    }

    async fn storage() -> (Arc<SqliteGateway>, ProcessStorage) {
        let gateway = Arc::new(SqliteGateway::in_memory().await.unwrap());
        (gateway.clone(), ProcessStorage::new(gateway))
    }

    async fn seed(gateway: &SqliteGateway, table: Table, name: &str) -> String {
        let stored = gateway
            .insert(table, row(json!({ "name": name })))
            .await
            .unwrap();
        stored["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn empty_process_saves_header_only() {
        let (gateway, storage) = storage().await;
        let mut process = ProcessData {
            name: "Empty".to_string(),
            ..ProcessData::default()
        };

        let report = storage.save(&mut process).await.unwrap();

        assert_eq!(process.id.as_deref(), Some(report.process_id.as_str()));
        assert_eq!(report.graph_version, 1);
        assert_eq!(gateway.list(Table::Processes).await.unwrap().len(), 1);
        assert!(gateway.list(Table::Tasks).await.unwrap().is_empty());
        assert!(gateway.list(Table::WorkflowSteps).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_returns_what_was_saved() {
        let (gateway, storage) = storage().await;
        let tool_id = seed(&gateway, Table::Tools, "Search").await;
        let agent_id = seed(&gateway, Table::Agents, "Researcher").await;

        let mut process = ProcessData {
            name: "Research".to_string(),
            description: "find things".to_string(),
            ..ProcessData::default()
        };
        let task_id = process.add_task("Collect").unwrap().id.clone();
        process.tools.push(ToolRef {
            id: tool_id.clone(),
            name: "Search".to_string(),
            description: String::new(),
        });
        process.agents.push(AgentRef {
            id: agent_id.clone(),
            name: "Researcher".to_string(),
            description: String::new(),
        });
        process.workflow.push(WorkflowStep {
            id: "draft".to_string(),
            task_id: task_id.clone(),
            agent_id: agent_id.clone(),
            tool_ids: vec![tool_id.clone()],
        });

        let report = storage.save(&mut process).await.unwrap();
        assert_eq!(report.workflow_tools, 1);

        let loaded = storage.load(&report.process_id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Research");
        assert_eq!(loaded.tasks, process.tasks);
        assert_eq!(loaded.tools[0].name, "Search");
        assert_eq!(loaded.agents[0].id, agent_id);
        assert_eq!(loaded.workflow.len(), 1);
        assert_eq!(loaded.workflow[0].task_id, task_id);
        assert_eq!(loaded.workflow[0].tool_ids, vec![tool_id]);
        assert_ne!(loaded.workflow[0].id, "draft");
        assert_eq!(loaded.graph_version, 1);
    }

    #[tokio::test]
    async fn resave_replaces_associations_and_bumps_version() {
        let (gateway, storage) = storage().await;
        let first = seed(&gateway, Table::Tools, "First").await;
        let second = seed(&gateway, Table::Tools, "Second").await;

        let mut process = ProcessData {
            name: "P".to_string(),
            ..ProcessData::default()
        };
        process.tools.push(ToolRef {
            id: first.clone(),
            name: "First".to_string(),
            description: String::new(),
        });
        storage.save(&mut process).await.unwrap();

        process.tools = vec![ToolRef {
            id: second.clone(),
            name: "Second".to_string(),
            description: String::new(),
        }];
        let report = storage.save(&mut process).await.unwrap();

        assert_eq!(report.graph_version, 2);
        let header = &gateway.list(Table::Processes).await.unwrap()[0];
        for column in ["created_at", "updated_at"] {
            let stamp = header[column].as_str().unwrap();
            assert!(
                chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok(),
                "{} = {}",
                column,
                stamp
            );
        }
        let assocs = gateway.list(Table::ProcessTools).await.unwrap();
        assert_eq!(assocs.len(), 1);
        assert_eq!(assocs[0]["tool_id"], json!(second));
        assert_eq!(gateway.list(Table::Processes).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_cascades_to_children() {
        let (gateway, storage) = storage().await;
        let agent_id = seed(&gateway, Table::Agents, "A").await;
        let mut process = ProcessData {
            name: "Doomed".to_string(),
            ..ProcessData::default()
        };
        let task_id = process.add_task("T").unwrap().id.clone();
        process.agents.push(AgentRef {
            id: agent_id.clone(),
            name: "A".to_string(),
            description: String::new(),
        });
        process.workflow.push(WorkflowStep {
            task_id,
            agent_id,
            ..WorkflowStep::default()
        });
        let report = storage.save(&mut process).await.unwrap();

        assert!(storage.delete(&report.process_id).await.unwrap());

        for table in [
            Table::Processes,
            Table::Tasks,
            Table::ProcessAgents,
            Table::WorkflowSteps,
        ] {
            assert!(gateway.list(table).await.unwrap().is_empty(), "{}", table);
        }
        assert!(storage.load(&report.process_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn closed_pool_fails_before_any_id_is_assigned() {
        let (gateway, storage) = storage().await;
        gateway.close().await;

        let mut process = ProcessData {
            name: "Unreachable".to_string(),
            ..ProcessData::default()
        };
        assert!(storage.save(&mut process).await.is_err());
        assert!(process.id.is_none());
    }

    #[tokio::test]
    async fn task_failure_keeps_id_and_previous_graph() {
        let (gateway, storage) = storage().await;
        let agent_id = seed(&gateway, Table::Agents, "Analyst").await;
        let first_tool = seed(&gateway, Table::Tools, "First").await;
        let second_tool = seed(&gateway, Table::Tools, "Second").await;

        let mut process = ProcessData {
            name: "Digest".to_string(),
            ..ProcessData::default()
        };
        let task_id = process.add_task("Summarize").unwrap().id.clone();
        process.tools.push(tool_ref(&first_tool));
        process.agents.push(agent_ref(&agent_id));
        process.workflow.push(WorkflowStep {
            task_id,
            agent_id: agent_id.clone(),
            ..WorkflowStep::default()
        });
        let first = storage.save(&mut process).await.unwrap();

        process.tools = vec![tool_ref(&second_tool)];
        process.agents.clear();
        process.add_task("Publish");
        assert!(failing(&gateway, FailOn::Upsert).save(&mut process).await.is_err());

        assert_eq!(process.id.as_deref(), Some(first.process_id.as_str()));
        assert_eq!(process.graph_version, 1);
        assert_eq!(stored_version(&gateway, &first.process_id).await, 1);
        assert_eq!(
            column_values(&gateway, Table::ProcessTools, &first.process_id, "tool_id").await,
            vec![first_tool]
        );
        assert_eq!(
            column_values(&gateway, Table::ProcessAgents, &first.process_id, "agent_id").await,
            vec![agent_id]
        );
        assert_eq!(gateway.list(Table::Tasks).await.unwrap().len(), 1);
        assert_eq!(gateway.list(Table::WorkflowSteps).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn task_failure_on_first_save_still_assigns_the_id() {
        let (gateway, _) = storage().await;
        let mut process = ProcessData {
            name: "Fresh".to_string(),
            ..ProcessData::default()
        };
        process.add_task("Collect");

        assert!(failing(&gateway, FailOn::Upsert).save(&mut process).await.is_err());

        let id = process.id.clone().unwrap();
        assert_eq!(stored_version(&gateway, &id).await, 0);
        assert!(gateway.list(Table::Tasks).await.unwrap().is_empty());

        let report = ProcessStorage::new(gateway.clone()).save(&mut process).await.unwrap();
        assert_eq!(report.process_id, id);
        assert_eq!(gateway.list(Table::Processes).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_failure_leaves_associations_and_version_alone() {
        let (gateway, storage) = storage().await;
        let agent_id = seed(&gateway, Table::Agents, "Analyst").await;
        let tool_id = seed(&gateway, Table::Tools, "Search").await;

        let mut process = ProcessData {
            name: "Digest".to_string(),
            ..ProcessData::default()
        };
        let task_id = process.add_task("Summarize").unwrap().id.clone();
        process.tools.push(tool_ref(&tool_id));
        process.agents.push(agent_ref(&agent_id));
        process.workflow.push(WorkflowStep {
            task_id: task_id.clone(),
            agent_id: agent_id.clone(),
            tool_ids: vec![tool_id.clone()],
            ..WorkflowStep::default()
        });
        let first = storage.save(&mut process).await.unwrap();
        let steps_before = gateway.list(Table::WorkflowSteps).await.unwrap();

        process.tools.clear();
        process.agents.clear();
        process.workflow.clear();
        assert!(failing(&gateway, FailOn::Apply).save(&mut process).await.is_err());

        assert_eq!(process.id.as_deref(), Some(first.process_id.as_str()));
        assert_eq!(process.graph_version, 1);
        assert_eq!(stored_version(&gateway, &first.process_id).await, 1);
        assert_eq!(
            column_values(&gateway, Table::ProcessTools, &first.process_id, "tool_id").await,
            vec![tool_id]
        );
        assert_eq!(
            column_values(&gateway, Table::ProcessAgents, &first.process_id, "agent_id").await,
            vec![agent_id]
        );
        assert_eq!(gateway.list(Table::WorkflowSteps).await.unwrap(), steps_before);
        assert_eq!(gateway.list(Table::WorkflowTools).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_references_are_stored_once() {
        let (gateway, storage) = storage().await;
        let agent_id = seed(&gateway, Table::Agents, "Analyst").await;
        let tool_id = seed(&gateway, Table::Tools, "Search").await;

        let mut process = ProcessData {
            name: "Repeats".to_string(),
            tasks: vec![
                TaskRef {
                    id: "t1".to_string(),
                    name: "Summarize".to_string(),
                },
                TaskRef {
                    id: "t1".to_string(),
                    name: "Summarize".to_string(),
                },
            ],
            tools: vec![tool_ref(&tool_id), tool_ref(&tool_id)],
            agents: vec![agent_ref(&agent_id), agent_ref(&agent_id)],
            workflow: vec![WorkflowStep {
                task_id: "t1".to_string(),
                agent_id: agent_id.clone(),
                tool_ids: vec![tool_id.clone(), tool_id.clone()],
                ..WorkflowStep::default()
            }],
            ..ProcessData::default()
        };

        let report = storage.save(&mut process).await.unwrap();

        assert_eq!(report.tools, 1);
        assert_eq!(report.agents, 1);
        assert_eq!(report.workflow_tools, 1);
        assert_eq!(gateway.list(Table::Tasks).await.unwrap().len(), 1);
        assert_eq!(gateway.list(Table::ProcessTools).await.unwrap().len(), 1);
        assert_eq!(gateway.list(Table::ProcessAgents).await.unwrap().len(), 1);
        assert_eq!(gateway.list(Table::WorkflowTools).await.unwrap().len(), 1);
    }
}
