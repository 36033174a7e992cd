use std::{collections::HashMap, fmt::Display};

use lazy_static::lazy_static;

use super::pipelines::Pipeline;

/// BERT model variants
pub mod bert {
    /// The base model type
    pub static MODEL_TYPE: &str = "bert";

    /// bert-base-uncased
    pub static BASE_UNCASED: &str = "bert-base-uncased";

    /// bert-base-cased
    pub static BASE_CASED: &str = "bert-base-cased";

    /// bert-base-multilingual-cased
    pub static BASE_MULTILINGUAL_CASED: &str = "bert-base-multilingual-cased";

    /// All available BERT models
    pub static ALL_MODELS: &[&str; 3] = &[BASE_UNCASED, BASE_CASED, BASE_MULTILINGUAL_CASED];

    /// Casing matters for entities, so the cased model is the default
    pub static DEFAULT_TOKEN_CLASSIFICATION_MODEL: &str = BASE_CASED;
}

lazy_static! {
    /// Available models for each pipeline
    pub static ref MODELS_BY_PIPELINE: HashMap<Pipeline, &'static [&'static str]> =
        HashMap::from([(Pipeline::TokenClassification, bert::ALL_MODELS.as_slice())]);
}

/// Available Models
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Model {
    /// The BERT family of models, with the specific model name contained within
    Bert(String),
}

impl Model {
    /// Get the model type
    pub fn model_type(&self) -> &str {
        match self {
            Model::Bert(_) => bert::MODEL_TYPE,
        }
    }

    /// Check if the model is valid for the given pipeline
    pub fn is_supported(&self, pipeline: &Pipeline) -> bool {
        let Model::Bert(name) = self;

        MODELS_BY_PIPELINE
            .get(pipeline)
            .map(|models| models.contains(&name.as_str()))
            .unwrap_or(false)
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Model::Bert(name) = self;

        write!(f, "{}", name)
    }
}

impl TryFrom<&str> for Model {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if bert::ALL_MODELS.contains(&value) {
            Ok(Model::Bert(value.to_string()))
        } else {
            Err(ModelError::Unknown(value.to_string()))
        }
    }
}

/// Model Error
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// No model found for the given string
    #[error("no model found for {0}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_known_models() {
        let model = Model::try_from("bert-base-uncased").unwrap();

        assert_eq!(model, Model::Bert("bert-base-uncased".to_string()));
        assert_eq!(model.model_type(), "bert");
        assert!(model.is_supported(&Pipeline::TokenClassification));
    }

    #[test]
    fn rejects_unknown_models() {
        let err = Model::try_from("gpt2").unwrap_err();

        assert_eq!(err.to_string(), "no model found for gpt2");
    }
}
