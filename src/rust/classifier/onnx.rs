use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use log::{debug, error, info};
use ndarray::{Array1, ArrayView4};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::model::{ImageModel, ModelOutput, Observation};
use super::preprocess::InputSize;
use super::utils::{is_probability_distribution, softmax};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelCharacteristics;

lazy_static! {
    /// Every artifact loaded in this process, keyed by path. Entries are never replaced.
    static ref LOADED_MODELS: Mutex<HashMap<PathBuf, Arc<OnnxModel>>> = Mutex::new(HashMap::new());
}

/// An image classifier backed by an ONNX Runtime session.
///
/// The model is expected to:
/// - Accept one input of shape `[1, 3, height, width]` with values in `[0, 1]`
/// - Output one score per label, either as probabilities or as logits
#[derive(Debug)]
pub struct OnnxModel {
    name: String,
    session: Session,
    input_name: String,
    input_size: InputSize,
    labels: Vec<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxModel>();
    }
};

impl OnnxModel {
    /// Loads an ONNX model from disk.
    ///
    /// # Errors
    /// - `ModelLoad` if the file does not exist
    /// - `ModelLoad` if the session cannot be created from the file
    /// - `ModelLoad` if the model has no inputs or outputs
    pub fn load(
        path: &Path,
        characteristics: &ModelCharacteristics,
        config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::ModelLoad(format!("Model file not found: {:?}", path)));
        }
        if characteristics.labels.is_empty() {
            return Err(ClassifierError::ModelLoad("Model must declare at least one label".into()));
        }

        let session = create_session_builder(config)
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| {
                error!("Failed to create session from {:?}: {}", path, e);
                ClassifierError::ModelLoad(format!("Failed to load model: {}", e))
            })?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        let input_name = session.inputs[0].name.clone();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());

        Ok(Self {
            name,
            session,
            input_name,
            input_size: characteristics.input_size,
            labels: characteristics.labels.clone(),
        })
    }

    /// Loads the model at `path` once per process and hands out shared references afterwards.
    pub fn load_shared(
        path: &Path,
        characteristics: &ModelCharacteristics,
        config: &RuntimeConfig,
    ) -> Result<Arc<Self>, ClassifierError> {
        let mut loaded = LOADED_MODELS
            .lock()
            .map_err(|_| ClassifierError::ModelLoad("Model cache is poisoned".into()))?;

        if let Some(model) = loaded.get(path) {
            debug!("Reusing loaded model {:?}", path);
            return Ok(Arc::clone(model));
        }

        info!("Loading model from {:?}", path);
        let model = Arc::new(Self::load(path, characteristics, config)?);
        loaded.insert(path.to_path_buf(), Arc::clone(&model));
        Ok(model)
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelLoad(
                "Model must have at least 1 input for the image tensor".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelLoad(
                "Model must have at least 1 output for class scores".to_string(),
            ));
        }
        Ok(())
    }

    fn scores_to_output(&self, scores: Array1<f32>) -> ModelOutput {
        if scores.len() != self.labels.len() {
            return ModelOutput::Other {
                kind: format!("tensor of {} values for {} labels", scores.len(), self.labels.len()),
            };
        }

        let probabilities = if is_probability_distribution(&scores) {
            scores
        } else {
            softmax(&scores)
        };

        ModelOutput::Classifications(
            self.labels
                .iter()
                .zip(probabilities.iter())
                .map(|(label, &confidence)| Observation::new(label.clone(), confidence))
                .collect(),
        )
    }
}

/// Output the model produced but that does not hold f32 class scores,
/// such as an int64 label tensor or a sequence of maps.
fn unreadable_output(output_type: &impl fmt::Debug) -> ModelOutput {
    ModelOutput::Other {
        kind: format!("{:?}", output_type),
    }
}

impl ImageModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> InputSize {
        self.input_size
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<ModelOutput, ClassifierError> {
        let input_dyn = input.into_dyn();
        let pixels = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&pixels)
                .map_err(|e| ClassifierError::Execution(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::Execution(format!("Failed to run model: {}", e)))?;
        let output_tensor = match outputs[0].try_extract_tensor::<f32>() {
            Ok(tensor) => tensor,
            Err(e) => {
                debug!("Output is not an f32 tensor: {}", e);
                return Ok(unreadable_output(&self.session.outputs[0].output_type));
            }
        };

        let scores = Array1::from_iter(output_tensor.iter().cloned());
        Ok(self.scores_to_output(scores))
    }
}
