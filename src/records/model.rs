/// Model definitions: prompt templates, decoding parameters and versioning metadata
use crate::{gateway::Table, records::Record};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub model_type: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub system_message: String,
    #[serde(default)]
    pub user_message: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub model_source_url: String,
    #[serde(default = "default_context_window")]
    pub context_window_size: i64,
    #[serde(default)]
    pub usage_example: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub fine_tuning_status: FineTuningStatus,
    #[serde(default)]
    pub fine_tuning_dataset: String,
    #[serde(default)]
    pub supported_languages: Vec<String>,
    #[serde(default)]
    pub input_format: Vec<String>,
    #[serde(default)]
    pub output_format: Vec<String>,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default)]
    pub quantization: Quantization,
    #[serde(default)]
    pub hardware_requirements: Vec<String>,
    #[serde(default)]
    pub inference_time: f64,
    #[serde(default)]
    pub model_size: f64,
    #[serde(default)]
    pub inference_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Price per 1000 tokens
    #[serde(default)]
    pub pricing: f64,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_context_window() -> i64 {
    2048
}

fn default_max_sequence_length() -> i64 {
    512
}

fn default_batch_size() -> i64 {
    1
}

fn default_max_tokens() -> i64 {
    100
}

fn default_top_p() -> f64 {
    1.0
}

impl Default for Model {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            model_type: String::new(),
            tasks: Vec::new(),
            system_message: String::new(),
            user_message: String::new(),
            temperature: default_temperature(),
            model_source_url: String::new(),
            context_window_size: default_context_window(),
            usage_example: String::new(),
            api_key: String::new(),
            version: String::new(),
            author: String::new(),
            license: String::new(),
            fine_tuning_status: FineTuningStatus::default(),
            fine_tuning_dataset: String::new(),
            supported_languages: Vec::new(),
            input_format: Vec::new(),
            output_format: Vec::new(),
            max_sequence_length: default_max_sequence_length(),
            batch_size: default_batch_size(),
            quantization: Quantization::default(),
            hardware_requirements: Vec::new(),
            inference_time: 0.0,
            model_size: 0.0,
            inference_url: String::new(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            pricing: 0.0,
            last_updated: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            created_at: None,
        }
    }
}

impl Record for Model {
    const TABLE: Table = Table::Models;

    fn id(&self) -> Option<&str> {
        super::persisted_id(&self.id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineTuningStatus {
    #[default]
    #[serde(rename = "Not fine-tuned")]
    NotFineTuned,
    #[serde(rename = "Fine-tuned")]
    FineTuned,
    #[serde(rename = "In progress")]
    InProgress,
}

impl FineTuningStatus {
    pub const ALL: [FineTuningStatus; 3] = [Self::NotFineTuned, Self::FineTuned, Self::InProgress];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFineTuned => "Not fine-tuned",
            Self::FineTuned => "Fine-tuned",
            Self::InProgress => "In progress",
        }
    }
}

impl fmt::Display for FineTuningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FineTuningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| format!("unknown fine-tuning status '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantization {
    #[default]
    None,
    #[serde(rename = "INT8")]
    Int8,
    #[serde(rename = "FP16")]
    Fp16,
}

impl Quantization {
    pub const ALL: [Quantization; 3] = [Self::None, Self::Int8, Self::Fp16];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Int8 => "INT8",
            Self::Fp16 => "FP16",
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quantization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.label() == s)
            .ok_or_else(|| format!("unknown quantization '{}'", s))
    }
}
