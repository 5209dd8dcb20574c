/// Read-only catalogue records: secrets, configs, functions and model types
use crate::{gateway::Table, records::Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Secret {
    const TABLE: Table = Table::Secrets;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl Record for ConfigEntry {
    const TABLE: Table = Table::Configs;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
}

impl Record for Function {
    const TABLE: Table = Table::Functions;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl Record for ModelType {
    const TABLE: Table = Table::ModelTypes;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}
