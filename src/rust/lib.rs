//! Cat-or-dog image classification behind a single screen.
//!
//! The user picks or captures a photo, a pre-trained binary classifier runs off
//! the interactive task, and the screen shows "This is a cat" or "This is a dog".
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use cat_or_dog::{BuiltinModel, Image, Orchestrator, RequestBuilder, Screen};
//!
//! let builder = RequestBuilder::new().with_model(BuiltinModel::CatOrDog)?;
//! let mut screen = Screen::new(Orchestrator::new(builder));
//!
//! screen.set_image(Some(Image::open("pet.jpg")?));
//! screen.classify().await;
//! println!("{}", screen.result_text());
//! # Ok(())
//! # }
//! ```
//!
//! # Bring your own model
//!
//! Anything implementing [`ImageModel`] can back the requests, which is how
//! the tests drive the flow without an ONNX artifact:
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use cat_or_dog::{ClassifierError, Image, ImageModel, InputSize, ModelOutput, Observation, RequestBuilder};
//!
//! #[derive(Debug)]
//! struct AlwaysDog(Vec<String>);
//!
//! impl ImageModel for AlwaysDog {
//!     fn name(&self) -> &str { "always-dog" }
//!     fn input_size(&self) -> InputSize { InputSize::new(8, 8) }
//!     fn labels(&self) -> &[String] { &self.0 }
//!     fn predict(&self, _input: ndarray::ArrayView4<'_, f32>) -> Result<ModelOutput, ClassifierError> {
//!         Ok(ModelOutput::Classifications(vec![Observation::new("dog", 0.93), Observation::new("cat", 0.07)]))
//!     }
//! }
//!
//! let builder = RequestBuilder::new()
//!     .with_loaded_model(Arc::new(AlwaysDog(vec!["cat".into(), "dog".into()])))?;
//! let result = builder
//!     .build_request()?
//!     .perform(&Image::from_rgba8(2, 2, vec![255u8; 16]))?;
//! assert_eq!(result.label(), "dog");
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod runtime;
pub mod model_manager;
pub mod models;
pub mod orchestrator;
pub mod screen;

pub use classifier::{
    apply_crop_scale, image_to_tensor, prepare_input, ClassificationRequest, ClassificationResult,
    ClassifierError, ClassifierInfo, CropScaleOption, Image, ImageModel, InputSize, ModelOutput,
    Observation, OnnxModel, RequestBuilder,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use orchestrator::{CallState, ClassificationTask, Completion, Orchestrator, Outcome};
pub use screen::{Alert, ImageSource, MediaPicker, Screen};

/// Installs `env_logger` unless a logger is already in place.
pub fn init_logger() {
    let _ = env_logger::try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_logger_twice() {
        super::init_logger();
        super::init_logger();
    }
}
