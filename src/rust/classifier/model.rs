use std::fmt;
use ndarray::ArrayView4;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::preprocess::InputSize;

/// A single (label, confidence) pair produced by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub identifier: String,
    pub confidence: f32,
}

impl Observation {
    pub fn new(identifier: impl Into<String>, confidence: f32) -> Self {
        Self {
            identifier: identifier.into(),
            confidence,
        }
    }
}

/// What a model hands back for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Labelled scores, in whatever order the model produced them
    Classifications(Vec<Observation>),
    /// Anything that is not a classification (feature vectors, mismatched tensors, ...)
    Other { kind: String },
}

/// A loaded, read-only image model.
///
/// Implementations must be safe to share across threads: the same instance
/// serves every request for the lifetime of the process.
pub trait ImageModel: Send + Sync + fmt::Debug {
    /// Human readable model name, used in logs
    fn name(&self) -> &str;

    /// The spatial size the model expects its input tensor to have
    fn input_size(&self) -> InputSize;

    /// Labels the model can produce, in output order
    fn labels(&self) -> &[String];

    /// Runs the model on a `[1, 3, height, width]` tensor with values in `[0, 1]`.
    ///
    /// # Errors
    /// - `Execution` if the model could not be run on the input
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<ModelOutput, ClassifierError>;
}
