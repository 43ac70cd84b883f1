#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cat_or_dog::{
    ClassifierError, Image, ImageModel, InputSize, ModelOutput, Observation, Orchestrator,
    RequestBuilder,
};
use env_logger::{Builder, Env};
use ndarray::ArrayView4;

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Model returning a scripted output and counting how often it ran.
#[derive(Debug)]
pub struct MockModel {
    labels: Vec<String>,
    output: Mutex<Result<ModelOutput, ClassifierError>>,
    calls: AtomicUsize,
    last_shape: Mutex<Option<Vec<usize>>>,
}

impl MockModel {
    pub fn returning(observations: &[(&str, f32)]) -> Arc<Self> {
        Self::with_output(Ok(ModelOutput::Classifications(
            observations
                .iter()
                .map(|(label, confidence)| Observation::new(*label, *confidence))
                .collect(),
        )))
    }

    pub fn with_output(output: Result<ModelOutput, ClassifierError>) -> Arc<Self> {
        Arc::new(Self {
            labels: vec!["cat".to_string(), "dog".to_string()],
            output: Mutex::new(output),
            calls: AtomicUsize::new(0),
            last_shape: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_shape(&self) -> Option<Vec<usize>> {
        self.last_shape.lock().unwrap().clone()
    }
}

impl ImageModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    fn input_size(&self) -> InputSize {
        InputSize::new(16, 12)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<ModelOutput, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_shape.lock().unwrap() = Some(input.shape().to_vec());
        self.output.lock().unwrap().clone()
    }
}

pub fn orchestrator_with(model: Arc<MockModel>) -> Orchestrator {
    let builder = RequestBuilder::new()
        .with_loaded_model(model)
        .expect("fresh builder accepts a model");
    Orchestrator::new(builder)
}

/// A small opaque test picture.
pub fn sample_image() -> Image {
    let mut pixels = Vec::with_capacity(40 * 30 * 4);
    for y in 0..30u32 {
        for x in 0..40u32 {
            pixels.extend_from_slice(&[(x * 6) as u8, (y * 8) as u8, 128, 255]);
        }
    }
    Image::from_rgba8(40, 30, pixels)
}
