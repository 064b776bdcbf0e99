
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

use super::ExtractionError;

pub const DEFAULT_INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

/// Model input: a square RGB image in height × width × channel order with
/// every component scaled into `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    size: u32,
    data: Vec<f32>,
}

impl ImageTensor {
    /// Side length in pixels
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> [f32; CHANNELS] {
        let offset = (y as usize * self.size as usize + x as usize) * CHANNELS;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    /// Rows of pixels, the shape a `[H, W, 3]` tensor takes in JSON
    #[inline]
    pub fn to_rows(&self) -> Vec<Vec<[f32; CHANNELS]>> {
        self.data
            .chunks_exact(self.size as usize * CHANNELS)
            .map(|row| {
                row.chunks_exact(CHANNELS)
                    .map(|px| [px[0], px[1], px[2]])
                    .collect()
            })
            .collect()
    }
}

/// Map an 8-bit channel value from `[0, 255]` to `[-1, 1]`
#[inline]
pub fn scale_channel(value: u8) -> f32 {
    f32::from(value) / 127.5 - 1.0
}

#[inline]
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyImage);
    }

    image::load_from_memory(bytes).map_err(|e| ExtractionError::Decode(e.to_string()))
}

/// Resize to `size`×`size` (cover, centre-cropped), drop alpha and scale.
#[inline]
pub fn preprocess(image: &DynamicImage, size: u32) -> ImageTensor {
    debug!(
        "Preprocessing {}x{} image to {}x{}",
        image.width(),
        image.height(),
        size,
        size
    );

    let rgb = image.resize_to_fill(size, size, FilterType::Triangle).to_rgb8();

    let data = rgb
        .pixels()
        .flat_map(|pixel| pixel.0.map(scale_channel))
        .collect();

    ImageTensor { size, data }
}
