use std::fs;
use std::io;
use std::path::Path;

use image::{imageops, imageops::FilterType, DynamicImage, RgbaImage};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// How an arbitrary image is fitted into the model's input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropScaleOption {
    /// Scale so the shorter side fits, then keep the central region
    #[default]
    CenterCrop,
    /// Scale so the longer side fits, then pad the remainder with black
    ScaleFit,
    /// Stretch to the target size, ignoring aspect ratio
    ScaleFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A user supplied picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Image {
    /// An encoded file payload (JPEG or PNG)
    Encoded(Vec<u8>),
    /// Raw RGBA8 pixels, row major
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

impl Image {
    pub fn from_encoded(bytes: impl Into<Vec<u8>>) -> Self {
        Image::Encoded(bytes.into())
    }

    pub fn from_rgba8(width: u32, height: u32, pixels: impl Into<Vec<u8>>) -> Self {
        Image::Rgba8 {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Reads an encoded image file without decoding it.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Image::Encoded(fs::read(path)?))
    }

    /// True when there is nothing to classify.
    pub fn is_empty(&self) -> bool {
        match self {
            Image::Encoded(bytes) => bytes.is_empty(),
            Image::Rgba8 { width, height, pixels } => *width == 0 || *height == 0 || pixels.is_empty(),
        }
    }

    /// Decodes the image into pixels.
    ///
    /// # Errors
    /// - `Conversion` if the payload cannot be decoded
    /// - `Conversion` if a raw buffer does not match its dimensions
    /// - `Conversion` if the decoded image has no pixels
    pub fn decode(&self) -> Result<DynamicImage, ClassifierError> {
        let decoded = match self {
            Image::Encoded(bytes) => image::load_from_memory(bytes)
                .map_err(|e| ClassifierError::Conversion(format!("Failed to decode image: {}", e)))?,
            Image::Rgba8 { width, height, pixels } => {
                let buffer = RgbaImage::from_raw(*width, *height, pixels.clone()).ok_or_else(|| {
                    ClassifierError::Conversion(format!(
                        "Pixel buffer of {} bytes does not match {}x{} RGBA",
                        pixels.len(),
                        width,
                        height
                    ))
                })?;
                DynamicImage::ImageRgba8(buffer)
            }
        };

        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ClassifierError::Conversion("Image has no pixels".into()));
        }
        Ok(decoded)
    }
}

/// Region of the source kept by a center crop with the target's aspect ratio.
/// Returns `(x, y, width, height)`.
pub(crate) fn center_crop_region(source: (u32, u32), target: InputSize) -> (u32, u32, u32, u32) {
    let (width, height) = (source.0 as u64, source.1 as u64);
    let (tw, th) = (target.width.max(1) as u64, target.height.max(1) as u64);

    let crop_w = width.min(height * tw / th).max(1);
    let crop_h = height.min(width * th / tw).max(1);
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;
    (x as u32, y as u32, crop_w as u32, crop_h as u32)
}

/// Fits `image` into `size` according to `option`.
pub fn apply_crop_scale(image: &DynamicImage, option: CropScaleOption, size: InputSize) -> DynamicImage {
    match option {
        CropScaleOption::CenterCrop => {
            let (x, y, w, h) = center_crop_region((image.width(), image.height()), size);
            image
                .crop_imm(x, y, w, h)
                .resize_exact(size.width, size.height, FilterType::Triangle)
        }
        CropScaleOption::ScaleFit => {
            let scaled = image.resize(size.width, size.height, FilterType::Triangle).to_rgb8();
            let mut canvas = DynamicImage::new_rgb8(size.width, size.height).to_rgb8();
            let x = (size.width - scaled.width()) / 2;
            let y = (size.height - scaled.height()) / 2;
            imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
            DynamicImage::ImageRgb8(canvas)
        }
        CropScaleOption::ScaleFill => image.resize_exact(size.width, size.height, FilterType::Triangle),
    }
}

/// Converts an image of exactly `size` into an NCHW tensor scaled to `[0, 1]`.
pub fn image_to_tensor(image: &DynamicImage, size: InputSize) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (height, width) = (size.height as usize, size.width as usize);
    Array4::from_shape_fn((1, 3, height, width), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        pixel[c] as f32 / 255.0
    })
}

/// Decodes, fits and converts `image` into the model's input tensor.
///
/// # Errors
/// - `Conversion` for anything `Image::decode` rejects
/// - `Conversion` if the model declares an empty input size
pub fn prepare_input(
    image: &Image,
    option: CropScaleOption,
    size: InputSize,
) -> Result<Array4<f32>, ClassifierError> {
    if size.width == 0 || size.height == 0 {
        return Err(ClassifierError::Conversion(format!(
            "Model input size {}x{} is empty",
            size.width, size.height
        )));
    }
    let decoded = image.decode()?;
    log::debug!(
        "Fitting {}x{} image into {}x{} with {:?}",
        decoded.width(),
        decoded.height(),
        size.width,
        size.height,
        option
    );
    let fitted = apply_crop_scale(&decoded, option, size);
    Ok(image_to_tensor(&fitted, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn test_center_crop_region_landscape() {
        assert_eq!(center_crop_region((200, 100), InputSize::new(10, 10)), (50, 0, 100, 100));
    }

    #[test]
    fn test_center_crop_region_portrait() {
        assert_eq!(center_crop_region((100, 300), InputSize::new(10, 10)), (0, 100, 100, 100));
    }

    #[test]
    fn test_center_crop_keeps_middle() {
        // Left and right thirds red, middle third blue
        let mut img = ImageBuffer::from_pixel(300, 100, Rgb([255u8, 0, 0]));
        for x in 100..200 {
            for y in 0..100 {
                img.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }
        let fitted = apply_crop_scale(
            &DynamicImage::ImageRgb8(img),
            CropScaleOption::CenterCrop,
            InputSize::new(10, 10),
        )
        .to_rgb8();
        assert_eq!(fitted.dimensions(), (10, 10));
        let center = fitted.get_pixel(5, 5);
        assert!(center[0] < 5 && center[2] > 250);
    }

    #[test]
    fn test_scale_fit_pads_with_black() {
        let fitted = apply_crop_scale(
            &solid(200, 100, [255, 255, 255]),
            CropScaleOption::ScaleFit,
            InputSize::new(20, 20),
        )
        .to_rgb8();
        assert_eq!(fitted.dimensions(), (20, 20));
        assert_eq!(fitted.get_pixel(10, 0), &Rgb([0, 0, 0]));
        assert!(fitted.get_pixel(10, 10)[0] > 250);
    }

    #[test]
    fn test_tensor_layout_and_normalization() {
        let tensor = image_to_tensor(&solid(4, 4, [255, 128, 0]), InputSize::new(4, 4));
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert!((tensor[[0, 1, 3, 3]] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 2, 2, 1]], 0.0);
    }

    #[test]
    fn test_raw_buffer_mismatch_is_conversion_error() {
        let image = Image::from_rgba8(4, 4, vec![0u8; 10]);
        assert!(matches!(image.decode(), Err(ClassifierError::Conversion(_))));
    }

    #[test]
    fn test_garbage_bytes_are_conversion_error() {
        let image = Image::from_encoded(b"definitely not a jpeg".to_vec());
        let result = prepare_input(&image, CropScaleOption::CenterCrop, InputSize::new(8, 8));
        assert!(matches!(result, Err(ClassifierError::Conversion(_))));
    }

    #[test]
    fn test_prepare_raw_rgba() {
        let buffer = ImageBuffer::from_pixel(6, 3, Rgba([0u8, 255, 0, 255]));
        let image = Image::from_rgba8(6, 3, buffer.into_raw());
        let tensor = prepare_input(&image, CropScaleOption::CenterCrop, InputSize::new(2, 2)).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
        assert!(tensor[[0, 1, 1, 1]] > 0.99);
        assert!(tensor[[0, 0, 1, 1]] < 0.01);
    }

    #[test]
    fn test_empty_images() {
        assert!(Image::from_encoded(Vec::new()).is_empty());
        assert!(Image::from_rgba8(0, 4, vec![]).is_empty());
        assert!(!Image::from_rgba8(1, 1, vec![0, 0, 0, 255]).is_empty());
    }
}
