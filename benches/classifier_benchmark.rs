use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cat_or_dog::{
    ClassifierError, CropScaleOption, Image, ImageModel, InputSize, ModelOutput, Observation,
    Orchestrator, RequestBuilder, prepare_input,
};
use ndarray::ArrayView4;
use std::sync::Arc;

/// Scores the mean red intensity, so inference cost is one pass over the tensor.
#[derive(Debug)]
struct MeanRedModel {
    labels: Vec<String>,
}

impl ImageModel for MeanRedModel {
    fn name(&self) -> &str {
        "mean-red"
    }

    fn input_size(&self) -> InputSize {
        InputSize::new(299, 299)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<ModelOutput, ClassifierError> {
        let red = input.index_axis(ndarray::Axis(1), 0).mean().unwrap_or(0.0);
        Ok(ModelOutput::Classifications(vec![
            Observation::new("dog", red),
            Observation::new("cat", 1.0 - red),
        ]))
    }
}

fn photo(width: u32, height: u32) -> Image {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 90, 255]);
        }
    }
    Image::from_rgba8(width, height, pixels)
}

fn builder() -> RequestBuilder {
    RequestBuilder::new()
        .with_loaded_model(Arc::new(MeanRedModel {
            labels: vec!["cat".into(), "dog".into()],
        }))
        .unwrap()
}

fn bench_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Preprocessing");
    group.sample_size(30);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let size = InputSize::new(299, 299);
    let sizes = [("vga", photo(640, 480)), ("hd", photo(1920, 1080))];
    let options = [
        ("center_crop", CropScaleOption::CenterCrop),
        ("scale_fit", CropScaleOption::ScaleFit),
        ("scale_fill", CropScaleOption::ScaleFill),
    ];

    for (size_name, image) in &sizes {
        for (option_name, option) in options {
            group.bench_function(format!("{}_{}", option_name, size_name), |b| b.iter(|| {
                prepare_input(black_box(image), option, size).unwrap()
            }));
        }
    }

    group.finish();
}

fn bench_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("Request");
    group.sample_size(30);

    let request = builder().build_request().unwrap();
    let image = photo(640, 480);
    group.bench_function("perform", |b| b.iter(|| {
        request.perform(black_box(&image)).unwrap()
    }));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = Orchestrator::new(builder());
    group.bench_function("orchestrated_round_trip", |b| b.iter(|| {
        runtime.block_on(orchestrator.classify(Some(image.clone())))
    }));

    group.finish();
}

criterion_group!(
    benches,
    bench_preprocessing,
    bench_request
);
criterion_main!(benches);
