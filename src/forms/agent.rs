use crate::{
    forms::{pick, require_name, toggle_id, Choice, Form, FormError, FormState},
    records::Agent,
};

/// Agent form: model select plus tool checkboxes
#[derive(Debug, Clone)]
pub struct AgentForm {
    state: FormState<Agent>,
    models: Vec<Choice>,
    tools: Vec<Choice>,
}

impl AgentForm {
    pub fn new(agent: Option<&Agent>, models: Vec<Choice>, tools: Vec<Choice>) -> Self {
        Self {
            state: FormState::new(agent),
            models,
            tools,
        }
    }

    pub fn reset(&mut self, agent: Option<&Agent>) {
        self.state.reset(agent);
    }

    pub fn models(&self) -> &[Choice] {
        &self.models
    }

    pub fn tools(&self) -> &[Choice] {
        &self.tools
    }

    pub fn toggle_tool(&mut self, tool_id: &str) {
        toggle_id(&mut self.state.draft_mut().tool_ids, tool_id);
    }

    pub fn is_tool_selected(&self, tool_id: &str) -> bool {
        self.state.draft().tool_ids.iter().any(|id| id == tool_id)
    }
}

impl Form for AgentForm {
    type Record = Agent;

    fn draft(&self) -> &Agent {
        self.state.draft()
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        match field {
            "name" => self.state.draft_mut().name = value.to_string(),
            "description" => self.state.draft_mut().description = value.to_string(),
            "model_id" => {
                let model_id = pick(field, value, &self.models)?;
                self.state.draft_mut().model_id = Some(model_id);
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), FormError> {
        require_name(&self.state.draft().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> AgentForm {
        AgentForm::new(
            None,
            vec![Choice::new("m1", "tiny-llm")],
            vec![Choice::new("t1", "Search"), Choice::new("t2", "Calculator")],
        )
    }

    #[test]
    fn model_select_only_accepts_offered_models() {
        let mut form = form();
        assert!(form.set("model_id", "m9").is_err());
        form.set("model_id", "m1").unwrap();
        assert_eq!(form.draft().model_id.as_deref(), Some("m1"));
    }

    #[test]
    fn toggling_a_tool_twice_restores_the_list() {
        let mut form = form();
        form.toggle_tool("t1");
        let before = form.draft().tool_ids.clone();

        form.toggle_tool("t2");
        assert!(form.is_tool_selected("t2"));
        form.toggle_tool("t2");

        assert_eq!(form.draft().tool_ids, before);
    }

    #[test]
    fn edit_mode_seeds_from_record() {
        let agent = Agent {
            id: Some("a1".to_string()),
            name: "Analyst".to_string(),
            tool_ids: vec!["t1".to_string()],
            ..Agent::default()
        };
        let form = AgentForm::new(Some(&agent), Vec::new(), Vec::new());
        assert_eq!(form.draft(), &agent);
        assert_eq!(form.text("tool_ids").unwrap(), "t1");
    }
}
