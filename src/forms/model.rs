use crate::{
    forms::{parse_f64, parse_i64, require_name, split_list, Form, FormError, FormState},
    records::Model,
};

/// Model categories offered by the type select
pub const MODEL_TYPES: [&str; 7] = [
    "Multimodal",
    "Computer Vision",
    "Natural Language Processing",
    "Audio",
    "Tabular",
    "Reinforcement Learning",
    "Other",
];

/// Tasks selectable for a model type; empty for unknown types
pub fn tasks_for_type(model_type: &str) -> &'static [&'static str] {
    match model_type {
        "Multimodal" => &["Image-Text-to-Text", "Document Question Answering"],
        "Computer Vision" => &["Image Classification", "Object Detection", "Image Segmentation"],
        "Natural Language Processing" => &[
            "Text Classification",
            "Named Entity Recognition",
            "Machine Translation",
        ],
        "Audio" => &["Speech Recognition", "Speaker Identification", "Music Generation"],
        "Tabular" => &["Regression", "Classification", "Anomaly Detection"],
        "Reinforcement Learning" => &["Game Playing", "Robotics Control", "Resource Management"],
        "Other" => &["Custom Task"],
        _ => &[],
    }
}

const TEMPERATURE_STEP: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ModelForm {
    state: FormState<Model>,
}

impl ModelForm {
    pub fn new(model: Option<&Model>) -> Self {
        Self {
            state: FormState::new(model),
        }
    }

    pub fn reset(&mut self, model: Option<&Model>) {
        self.state.reset(model);
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_editing()
    }

    /// Tasks the task select offers for the current type
    pub fn task_options(&self) -> &'static [&'static str] {
        tasks_for_type(&self.state.draft().model_type)
    }
}

impl Form for ModelForm {
    type Record = Model;

    fn draft(&self) -> &Model {
        self.state.draft()
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        let draft = self.state.draft_mut();
        match field {
            "name" => draft.name = value.to_string(),
            "description" => draft.description = value.to_string(),
            "type" => draft.model_type = value.to_string(),
            "tasks" => {
                let options = tasks_for_type(&draft.model_type);
                if !options.is_empty() && !options.contains(&value) {
                    return Err(FormError::invalid(
                        field,
                        format!("'{}' is not a {} task", value, draft.model_type),
                    ));
                }
                draft.tasks = vec![value.to_string()];
            }
            "system_message" => draft.system_message = value.to_string(),
            "user_message" => draft.user_message = value.to_string(),
            "temperature" => draft.temperature = parse_f64(field, value)?,
            "model_source_url" => draft.model_source_url = value.to_string(),
            "context_window_size" => draft.context_window_size = parse_i64(field, value)?,
            "usage_example" => draft.usage_example = value.to_string(),
            "api_key" => draft.api_key = value.to_string(),
            "version" => draft.version = value.to_string(),
            "author" => draft.author = value.to_string(),
            "license" => draft.license = value.to_string(),
            "fine_tuning_status" => {
                draft.fine_tuning_status =
                    value.parse().map_err(|e: String| FormError::invalid(field, e))?
            }
            "fine_tuning_dataset" => draft.fine_tuning_dataset = value.to_string(),
            "supported_languages" => draft.supported_languages = split_list(value),
            "input_format" => draft.input_format = split_list(value),
            "output_format" => draft.output_format = split_list(value),
            "max_sequence_length" => draft.max_sequence_length = parse_i64(field, value)?,
            "batch_size" => draft.batch_size = parse_i64(field, value)?,
            "quantization" => {
                draft.quantization = value.parse().map_err(|e: String| FormError::invalid(field, e))?
            }
            "hardware_requirements" => draft.hardware_requirements = split_list(value),
            "inference_time" => draft.inference_time = parse_f64(field, value)?,
            "model_size" => draft.model_size = parse_f64(field, value)?,
            "inference_url" => draft.inference_url = value.to_string(),
            "max_tokens" => draft.max_tokens = parse_i64(field, value)?,
            "top_p" => draft.top_p = parse_f64(field, value)?,
            "pricing" => draft.pricing = parse_f64(field, value)?,
            "last_updated" => draft.last_updated = value.to_string(),
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), FormError> {
        let model = self.state.draft();
        require_name(&model.name)?;

        if !(0.0..=1.0).contains(&model.temperature) {
            return Err(FormError::invalid("temperature", "must be between 0 and 1"));
        }
        let steps = model.temperature / TEMPERATURE_STEP;
        if (steps - steps.round()).abs() > 1e-9 {
            return Err(FormError::invalid("temperature", "must be a multiple of 0.1"));
        }

        for (field, value) in [
            ("context_window_size", model.context_window_size),
            ("max_sequence_length", model.max_sequence_length),
            ("batch_size", model.batch_size),
            ("max_tokens", model.max_tokens),
        ] {
            if value < 0 {
                return Err(FormError::invalid(field, "must not be negative"));
            }
        }

        for (field, value) in [
            ("inference_time", model.inference_time),
            ("model_size", model.model_size),
            ("pricing", model.pricing),
        ] {
            if value < 0.0 {
                return Err(FormError::invalid(field, "must not be negative"));
            }
        }

        Ok(())
    }
}
