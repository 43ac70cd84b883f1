use serde::{Deserialize, Serialize};

use crate::classifier::InputSize;

/// Models bundled with the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// Binary cat/dog classifier taking 299x299 RGB input.
    CatOrDog,
}

/// Where a model artifact lives and how to check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub file_name: String,
    /// Expected SHA-256 of the artifact. `None` skips verification.
    pub model_hash: Option<String>,
}

/// Shape and vocabulary of a model, needed before it is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    pub input_size: InputSize,
    pub labels: Vec<String>,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::CatOrDog => ModelInfo {
                name: "cat-or-dog".to_string(),
                file_name: "model.onnx".to_string(),
                model_hash: None,
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::CatOrDog => ModelCharacteristics {
                input_size: InputSize::new(299, 299),
                labels: vec!["cat".to_string(), "dog".to_string()],
            },
        }
    }
}
