use std::fmt;
use std::sync::Arc;

use super::error::ClassifierError;
use super::model::ImageModel;
use super::preprocess::{prepare_input, CropScaleOption, Image};
use super::result::ClassificationResult;

/// One-shot unit of work: a loaded model plus the policy used to fit images into it.
#[derive(Clone)]
pub struct ClassificationRequest {
    model: Arc<dyn ImageModel>,
    crop_and_scale: CropScaleOption,
}

impl fmt::Debug for ClassificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRequest")
            .field("model", &self.model.name())
            .field("crop_and_scale", &self.crop_and_scale)
            .finish()
    }
}

impl ClassificationRequest {
    pub fn new(model: Arc<dyn ImageModel>, crop_and_scale: CropScaleOption) -> Self {
        Self { model, crop_and_scale }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn crop_and_scale(&self) -> CropScaleOption {
        self.crop_and_scale
    }

    /// Classifies `image`. Blocks for the duration of inference.
    ///
    /// # Errors
    /// - `Conversion` if the image cannot be turned into the model's input
    /// - `Execution` if the model fails to run
    /// - `ClassificationUnavailable` if the output cannot be interpreted
    pub fn perform(&self, image: &Image) -> Result<ClassificationResult, ClassifierError> {
        let input = prepare_input(image, self.crop_and_scale, self.model.input_size())?;
        let output = self.model.predict(input.view())?;
        ClassificationResult::from_output(output)
    }
}
