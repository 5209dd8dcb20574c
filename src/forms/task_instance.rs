use crate::{
    forms::{pick, toggle_id, Choice, Form, FormError, FormState},
    records::TaskInstance,
};

/// Task instance form: task/agent/process selects, input/output text, status
#[derive(Debug, Clone)]
pub struct TaskInstanceForm {
    state: FormState<TaskInstance>,
    tasks: Vec<Choice>,
    agents: Vec<Choice>,
    processes: Vec<Choice>,
    tools: Vec<Choice>,
}

impl TaskInstanceForm {
    pub fn new(
        instance: Option<&TaskInstance>,
        tasks: Vec<Choice>,
        agents: Vec<Choice>,
        processes: Vec<Choice>,
        tools: Vec<Choice>,
    ) -> Self {
        Self {
            state: FormState::new(instance),
            tasks,
            agents,
            processes,
            tools,
        }
    }

    pub fn reset(&mut self, instance: Option<&TaskInstance>) {
        self.state.reset(instance);
    }

    pub fn tools(&self) -> &[Choice] {
        &self.tools
    }

    pub fn toggle_tool(&mut self, tool_id: &str) {
        toggle_id(&mut self.state.draft_mut().tool_ids, tool_id);
    }
}

impl Form for TaskInstanceForm {
    type Record = TaskInstance;

    fn draft(&self) -> &TaskInstance {
        self.state.draft()
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        match field {
            "task_id" => self.state.draft_mut().task_id = pick(field, value, &self.tasks)?,
            "agent_id" => self.state.draft_mut().agent_id = pick(field, value, &self.agents)?,
            "process_id" => {
                self.state.draft_mut().process_id = pick(field, value, &self.processes)?
            }
            "input" => self.state.draft_mut().input = value.to_string(),
            "output" => self.state.draft_mut().output = value.to_string(),
            "status" => {
                self.state.draft_mut().status =
                    value.parse().map_err(|e: String| FormError::invalid(field, e))?
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), FormError> {
        Ok(())
    }
}
