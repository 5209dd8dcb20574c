/// Record forms
///
/// Each form owns a draft of one record, edited one controlled input at a time
/// from its text value. Submitting checks the native input constraints and
/// hands the draft to a caller supplied callback; forms never touch the gateway.

pub mod agent;
pub mod model;
pub mod task_instance;
pub mod tool;

use crate::records::Record;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use agent::AgentForm;
pub use model::ModelForm;
pub use task_instance::TaskInstanceForm;
pub use tool::ToolForm;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl FormError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Select option: an id shown by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub name: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Draft seeded from an optional source record
///
/// The draft is reseeded whenever a different source is provided.
#[derive(Debug, Clone)]
pub struct FormState<R: Record + PartialEq> {
    source: Option<R>,
    draft: R,
}

impl<R: Record + PartialEq> FormState<R> {
    /// Edit mode with `Some(record)`, create mode with `None`
    pub fn new(record: Option<&R>) -> Self {
        Self {
            source: record.cloned(),
            draft: record.cloned().unwrap_or_default(),
        }
    }

    /// Reseed from `record` if it differs from the current source
    pub fn reset(&mut self, record: Option<&R>) {
        if self.source.as_ref() != record {
            *self = Self::new(record);
        }
    }

    pub fn is_editing(&self) -> bool {
        self.source.is_some()
    }

    pub fn draft(&self) -> &R {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut R {
        &mut self.draft
    }
}

/// Controlled-input form over one record
pub trait Form {
    type Record: Record;

    fn draft(&self) -> &Self::Record;

    /// Apply one input change: `field` is the column name, `value` the raw text
    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError>;

    /// Native input constraints
    fn validate(&self) -> Result<(), FormError>;

    /// Render a field as input text; list fields join with ", "
    fn text(&self, field: &str) -> Option<String> {
        let row = self.draft().to_row().ok()?;
        let text = match row.get(field)? {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        Some(text)
    }

    /// Validate and pass a copy of the draft to `on_save`
    fn submit<F>(&self, on_save: F) -> Result<(), FormError>
    where
        F: FnOnce(Self::Record),
    {
        self.validate()?;
        on_save(self.draft().clone());
        Ok(())
    }
}

/// Split comma-separated input into list items
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

pub(crate) fn parse_f64(field: &str, value: &str) -> Result<f64, FormError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| FormError::invalid(field, format!("'{}' is not a number", value)))
}

pub(crate) fn parse_i64(field: &str, value: &str) -> Result<i64, FormError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| FormError::invalid(field, format!("'{}' is not a whole number", value)))
}

pub(crate) fn require_name(name: &str) -> Result<(), FormError> {
    if name.trim().is_empty() {
        Err(FormError::Required("name"))
    } else {
        Ok(())
    }
}

/// Selected id must be one of the offered options
pub(crate) fn pick(field: &str, value: &str, options: &[Choice]) -> Result<String, FormError> {
    if options.iter().any(|choice| choice.id == value) {
        Ok(value.to_string())
    } else {
        Err(FormError::invalid(field, format!("'{}' is not an option", value)))
    }
}

/// Add `id` when absent, remove it when present
pub fn toggle_id(ids: &mut Vec<String>, id: &str) {
    if let Some(index) = ids.iter().position(|existing| existing == id) {
        ids.remove(index);
    } else {
        ids.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(split_list("en, fr,de , "), vec!["en", "fr", "de"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn join_list_uses_comma_space() {
        let items = vec!["GPU".to_string(), "16GB RAM".to_string()];
        assert_eq!(join_list(&items), "GPU, 16GB RAM");
        assert_eq!(split_list(&join_list(&items)), items);
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let mut ids = vec!["a".to_string(), "b".to_string()];
        toggle_id(&mut ids, "c");
        assert_eq!(ids, vec!["a", "b", "c"]);
        toggle_id(&mut ids, "c");
        assert_eq!(ids, vec!["a", "b"]);

        toggle_id(&mut ids, "a");
        toggle_id(&mut ids, "a");
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b"]);
    }

    #[test]
    fn parse_helpers_reject_garbage() {
        assert!(parse_f64("temperature", "abc").is_err());
        assert!(parse_f64("temperature", "NaN").is_err());
        assert_eq!(parse_i64("batch_size", " 4 ").unwrap(), 4);
    }
}
