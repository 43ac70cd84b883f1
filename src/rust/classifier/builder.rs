use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use log::{debug, info, error};

use super::error::ClassifierError;
use super::model::ImageModel;
use super::onnx::OnnxModel;
use super::preprocess::CropScaleOption;
use super::request::ClassificationRequest;
use super::ClassifierInfo;
use crate::{BuiltinModel, ModelCharacteristics, ModelManager, runtime::RuntimeConfig};

#[derive(Debug)]
enum ModelSource {
    Builtin(BuiltinModel),
    Custom {
        path: PathBuf,
        characteristics: ModelCharacteristics,
    },
    Loaded(Arc<dyn ImageModel>),
}

/// Builds classification requests bound to a single model.
///
/// The model is loaded lazily on the first `build_request` call and reused by
/// every request after that. A failed load is not remembered, so a later call
/// may succeed once the artifact is in place.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    source: Option<ModelSource>,
    model_hash: Option<String>,
    crop_and_scale: CropScaleOption,
    runtime_config: RuntimeConfig,
    model_manager: Option<ModelManager>,
    model: Mutex<Option<Arc<dyn ImageModel>>>,
}

impl RequestBuilder {
    /// Creates a new RequestBuilder with center cropping and default runtime settings
    ///
    /// # Example
    /// ```
    /// use cat_or_dog::RequestBuilder;
    ///
    /// let builder = RequestBuilder::new();
    /// assert!(!builder.is_model_loaded());
    /// ```
    pub fn new() -> Self {
        Self {
            source: None,
            model_hash: None,
            crop_and_scale: CropScaleOption::CenterCrop,
            runtime_config: RuntimeConfig::default(),
            model_manager: None,
            model: Mutex::new(None),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets where bundled models are looked up. Defaults to `ModelManager::new_default()`.
    pub fn with_model_manager(mut self, manager: ModelManager) -> Self {
        self.model_manager = Some(manager);
        self
    }

    /// Sets how images are fitted into the model input
    pub fn with_crop_and_scale(mut self, option: CropScaleOption) -> Self {
        self.crop_and_scale = option;
        self
    }

    /// Pins the SHA-256 the model artifact must match, bundled or custom
    pub fn with_model_hash(mut self, hash: impl Into<String>) -> Self {
        self.model_hash = Some(hash.into());
        self
    }

    fn ensure_unset(&self) -> Result<(), ClassifierError> {
        if self.source.is_some() {
            return Err(ClassifierError::ModelLoad("Model already set".to_string()));
        }
        Ok(())
    }

    /// Uses a bundled model. The artifact is located when the first request is built.
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use cat_or_dog::{BuiltinModel, RequestBuilder};
    ///
    /// let builder = RequestBuilder::new().with_model(BuiltinModel::CatOrDog)?;
    /// let request = builder.build_request()?;
    /// println!("Using {}", request.model_name());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        self.ensure_unset()?;
        self.source = Some(ModelSource::Builtin(model));
        Ok(self)
    }

    /// Uses an ONNX file outside the models directory
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The path is empty
    ///   - A model is already set
    ///   - The file doesn't exist
    pub fn with_custom_model(
        mut self,
        model_path: impl AsRef<Path>,
        characteristics: ModelCharacteristics,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(ClassifierError::ModelLoad("Model path cannot be empty".to_string()));
        }
        self.ensure_unset()?;
        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!("Model file not found: {:?}", model_path)));
        }

        self.source = Some(ModelSource::Custom {
            path: model_path.to_path_buf(),
            characteristics,
        });
        Ok(self)
    }

    /// Uses a model that is already in memory
    pub fn with_loaded_model(mut self, model: Arc<dyn ImageModel>) -> Result<Self, ClassifierError> {
        self.ensure_unset()?;
        self.source = Some(ModelSource::Loaded(model));
        Ok(self)
    }

    pub fn crop_and_scale(&self) -> CropScaleOption {
        self.crop_and_scale
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model
            .lock()
            .map(|model| model.is_some())
            .unwrap_or(false)
    }

    /// Returns information about the loaded model, if it has been loaded
    pub fn info(&self) -> Option<ClassifierInfo> {
        let model = self.model.lock().ok()?.clone()?;
        Some(ClassifierInfo {
            model_name: model.name().to_string(),
            input_size: model.input_size(),
            labels: model.labels().to_vec(),
            crop_and_scale: self.crop_and_scale,
        })
    }

    fn load_model(&self) -> Result<Arc<dyn ImageModel>, ClassifierError> {
        let mut cached = self
            .model
            .lock()
            .map_err(|_| ClassifierError::ModelLoad("Model lock is poisoned".into()))?;

        if let Some(model) = cached.as_ref() {
            return Ok(Arc::clone(model));
        }

        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ClassifierError::ModelLoad("No model configured".into()))?;

        let model: Arc<dyn ImageModel> = match source {
            ModelSource::Builtin(builtin) => {
                let manager = match &self.model_manager {
                    Some(manager) => manager.clone(),
                    None => ModelManager::new_default().map_err(|e| {
                        error!("Failed to create model manager: {}", e);
                        ClassifierError::ModelLoad(format!("Failed to create model manager: {}", e))
                    })?,
                };

                let mut model_info = builtin.get_model_info();
                if self.model_hash.is_some() {
                    model_info.model_hash = self.model_hash.clone();
                }
                let path = manager.locate_model(&model_info)?;
                let loaded = OnnxModel::load_shared(&path, &builtin.characteristics(), &self.runtime_config)?;
                loaded as Arc<dyn ImageModel>
            }
            ModelSource::Custom { path, characteristics } => {
                if let Some(expected) = &self.model_hash {
                    ModelManager::check_hash(path, expected)?;
                    info!("Custom model {:?} verified", path);
                }
                let loaded = OnnxModel::load_shared(path, characteristics, &self.runtime_config)?;
                loaded as Arc<dyn ImageModel>
            }
            ModelSource::Loaded(model) => Arc::clone(model),
        };

        info!("Model '{}' ready", model.name());
        *cached = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Builds a request bound to the model, loading it first if needed.
    ///
    /// # Errors
    /// - `ModelLoad` if no model is configured
    /// - `ModelLoad` if the artifact is missing or cannot be parsed
    /// - `ModelLoad` if a pinned hash does not match the artifact
    pub fn build_request(&self) -> Result<ClassificationRequest, ClassifierError> {
        let model = self.load_model()?;
        debug!("Building request for '{}' with {:?}", model.name(), self.crop_and_scale);
        Ok(ClassificationRequest::new(model, self.crop_and_scale))
    }
}
