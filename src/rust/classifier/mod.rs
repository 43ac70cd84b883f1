mod error;
mod model;
mod onnx;
mod preprocess;
mod request;
mod result;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use model::{ImageModel, ModelOutput, Observation};
pub use onnx::OnnxModel;
pub use preprocess::{apply_crop_scale, image_to_tensor, prepare_input, CropScaleOption, Image, InputSize};
pub use request::ClassificationRequest;
pub use result::ClassificationResult;
pub use builder::RequestBuilder;

/// Information about the model a builder has loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierInfo {
    /// Name of the loaded model
    pub model_name: String,
    /// Spatial size of the model input
    pub input_size: InputSize,
    /// Labels the model can produce
    pub labels: Vec<String>,
    /// Policy used to fit images into the input size
    pub crop_and_scale: CropScaleOption,
}
