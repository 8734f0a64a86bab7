use crate::{
    config::{Normalization, PreprocessingConfig},
    model::Tensor,
};
use image::{imageops::FilterType, DynamicImage, GrayImage, RgbImage, RgbaImage};
use thiserror::Error;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidImageError {
    #[error("Error decoding image: {0}")]
    Decode(String),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} bytes, {width}x{height} {format:?} needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        format: PixelFormat,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Bgra8,
    Luma8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Luma8 => 1,
        }
    }
}

/// An image handed over by a capture or UI collaborator.
#[derive(Debug, Clone)]
pub enum InputImage {
    /// Compressed bytes (PNG, JPEG, ...); the format is guessed from the content.
    Encoded(Vec<u8>),
    Pixels {
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

impl InputImage {
    pub fn encoded(data: impl Into<Vec<u8>>) -> Self {
        InputImage::Encoded(data.into())
    }

    pub fn pixels(data: impl Into<Vec<u8>>, width: u32, height: u32, format: PixelFormat) -> Self {
        InputImage::Pixels {
            data: data.into(),
            width,
            height,
            format,
        }
    }

    fn into_dynamic(self) -> Result<DynamicImage, InvalidImageError> {
        match self {
            InputImage::Encoded(data) => {
                let reader = image::ImageReader::new(std::io::Cursor::new(data))
                    .with_guessed_format()
                    .map_err(|e| InvalidImageError::Decode(e.to_string()))?;
                reader
                    .decode()
                    .map_err(|e| InvalidImageError::Decode(e.to_string()))
            }
            InputImage::Pixels {
                data,
                width,
                height,
                format,
            } => {
                if width == 0 || height == 0 {
                    return Err(InvalidImageError::EmptyImage { width, height });
                }
                let expected = width as usize * height as usize * format.bytes_per_pixel();
                if data.len() != expected {
                    return Err(InvalidImageError::BufferSize {
                        width,
                        height,
                        format,
                        expected,
                        actual: data.len(),
                    });
                }
                let image: Option<DynamicImage> = match format {
                    PixelFormat::Rgb8 => RgbImage::from_raw(width, height, data).map(Into::into),
                    PixelFormat::Rgba8 => RgbaImage::from_raw(width, height, data).map(Into::into),
                    PixelFormat::Bgra8 => {
                        let mut data = data;
                        for px in data.chunks_exact_mut(4) {
                            px.swap(0, 2);
                        }
                        RgbaImage::from_raw(width, height, data).map(Into::into)
                    }
                    PixelFormat::Luma8 => GrayImage::from_raw(width, height, data).map(Into::into),
                };
                image.ok_or(InvalidImageError::BufferSize {
                    width,
                    height,
                    format,
                    expected,
                    actual: expected,
                })
            }
        }
    }
}

/// Turns input images into model tensors: centre crop to a square, resize,
/// scale channels.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    input_size: u32,
    normalization: Normalization,
}

impl ImagePreprocessor {
    pub fn new(config: &PreprocessingConfig) -> Self {
        Self {
            input_size: config.input_size.max(1),
            normalization: config.normalization,
        }
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn prepare(&self, image: InputImage) -> Result<Tensor, InvalidImageError> {
        let original = image.into_dynamic()?;
        let (width, height) = (original.width(), original.height());
        if width == 0 || height == 0 {
            return Err(InvalidImageError::EmptyImage { width, height });
        }

        let side = width.min(height);
        let cropped = original.crop_imm((width - side) / 2, (height - side) / 2, side, side);
        let size = self.input_size;
        let rgb = cropped
            .resize_exact(size, size, FilterType::CatmullRom)
            .to_rgb8();

        let mut input = Tensor::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = self.scale(c, pixel[c]);
            }
        }

        tracing::debug!(width, height, size, "Prepared input tensor");
        Ok(input)
    }

    fn scale(&self, channel: usize, value: u8) -> f32 {
        let unit = value as f32 / 255.;
        match self.normalization {
            Normalization::Unit => unit,
            Normalization::Imagenet => (unit - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(&PreprocessingConfig::default())
    }
}
