use ort::Error as OrtError;
use thiserror::Error;

use crate::model_manager::ModelError;

/// Represents the different ways a classification call can fail.
///
/// Every variant carries only owned strings so outcomes can be cloned and
/// compared on the presentation side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// The model artifact could not be located, verified, parsed or instantiated
    #[error("Unable to create a request: {0}")]
    ModelLoad(String),
    /// No image was supplied for the call
    #[error("Image doesn't exist")]
    NoImage,
    /// The image could not be decoded or converted to the model's input format
    #[error("Unable to convert the image: {0}")]
    Conversion(String),
    /// The model ran but its output could not be read as a ranked classification
    #[error("Unable to get the results: {0}")]
    ClassificationUnavailable(String),
    /// The request could not be run at all
    #[error("Failed to get the description: {0}")]
    Execution(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::Execution(err.to_string())
    }
}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        ClassifierError::ModelLoad(err.to_string())
    }
}
