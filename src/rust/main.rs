use std::path::PathBuf;

use anyhow::Result;
use cat_or_dog::{
    BuiltinModel, CropScaleOption, Image, ImageSource, MediaPicker, ModelManager, Orchestrator,
    RequestBuilder, Screen,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CropMode {
    CenterCrop,
    ScaleFit,
    ScaleFill,
}

impl From<CropMode> for CropScaleOption {
    fn from(mode: CropMode) -> Self {
        match mode {
            CropMode::CenterCrop => CropScaleOption::CenterCrop,
            CropMode::ScaleFit => CropScaleOption::ScaleFit,
            CropMode::ScaleFill => CropScaleOption::ScaleFill,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to classify, as if picked from the photo library
    image: Option<PathBuf>,

    /// Take the photo with the camera instead
    #[arg(long)]
    camera: bool,

    /// Use this ONNX file instead of the bundled model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory holding the bundled models
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Expected SHA-256 of the bundled model
    #[arg(long)]
    sha256: Option<String>,

    /// How the photo is fitted into the model input
    #[arg(long, value_enum, default_value_t = CropMode::CenterCrop)]
    crop_and_scale: CropMode,

    /// Press "classify" this many times
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,
}

/// Reads photos from disk. There is no camera on this device.
struct FilePicker {
    path: Option<PathBuf>,
}

impl MediaPicker for FilePicker {
    fn is_source_available(&self, source: ImageSource) -> bool {
        source == ImageSource::PhotoLibrary
    }

    fn pick(&mut self, _source: ImageSource) -> Option<Image> {
        let path = self.path.as_ref()?;
        match Image::open(path) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    generation: u64,
    label: Option<&'a str>,
    confidence: Option<f32>,
    text: &'a str,
    alert: Option<&'a cat_or_dog::Alert>,
}

fn build_request_builder(args: &Args) -> Result<RequestBuilder> {
    let mut builder = RequestBuilder::new().with_crop_and_scale(args.crop_and_scale.into());

    if let Some(dir) = &args.models_dir {
        builder = builder.with_model_manager(ModelManager::new(dir)?);
    }
    if let Some(hash) = &args.sha256 {
        builder = builder.with_model_hash(hash.clone());
    }

    let builder = match &args.model {
        Some(path) => builder.with_custom_model(path, BuiltinModel::CatOrDog.characteristics())?,
        None => builder.with_model(BuiltinModel::CatOrDog)?,
    };
    Ok(builder)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Cat or Dog ===");
    let builder = build_request_builder(&args)?;
    let mut screen = Screen::new(Orchestrator::new(builder));

    let mut picker = FilePicker { path: args.image.clone() };
    if args.camera {
        screen.take_photo(&mut picker);
    } else {
        screen.choose_photo(&mut picker);
    }

    if let Some(alert) = screen.dismiss_alert() {
        println!("[{}] {}", alert.title, alert.message);
    }

    for attempt in 0..args.repeat.max(1) {
        let start_time = Instant::now();
        let completion = screen.classify().await;
        info!("Attempt {} finished in {:.2?}", attempt + 1, start_time.elapsed());

        if args.json {
            let report = Report {
                generation: completion.generation,
                label: completion.outcome.label(),
                confidence: match &completion.outcome {
                    cat_or_dog::Outcome::Succeeded { confidence, .. } => Some(*confidence),
                    cat_or_dog::Outcome::Failed(_) => None,
                },
                text: screen.result_text(),
                alert: screen.alert(),
            };
            println!("{}", serde_json::to_string(&report)?);
        } else if let Some(alert) = screen.alert() {
            println!("[{}] {}", alert.title, alert.message);
        } else {
            println!("{}", screen.result_text());
        }
        screen.dismiss_alert();
    }

    Ok(())
}
