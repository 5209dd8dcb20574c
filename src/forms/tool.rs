use crate::{
    forms::{require_name, Form, FormError, FormState},
    records::Tool,
};

#[derive(Debug, Clone)]
pub struct ToolForm {
    state: FormState<Tool>,
}

impl ToolForm {
    pub fn new(tool: Option<&Tool>) -> Self {
        Self {
            state: FormState::new(tool),
        }
    }

    pub fn reset(&mut self, tool: Option<&Tool>) {
        self.state.reset(tool);
    }
}

impl Form for ToolForm {
    type Record = Tool;

    fn draft(&self) -> &Tool {
        self.state.draft()
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        let draft = self.state.draft_mut();
        match field {
            "name" => draft.name = value.to_string(),
            "description" => draft.description = value.to_string(),
            "configuration" => draft.configuration = value.to_string(),
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), FormError> {
        require_name(&self.state.draft().name)
    }
}
