use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::{ExtractionError, FeatureExtractor, FeatureVector, ImageSource};

/// Encode a single-colour PNG in memory
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("should encode png");
    buffer.into_inner()
}

/// Deterministic extractor keyed by URL. Unknown URLs fail like an
/// unreachable host; byte sources get `bytes_vector`.
pub struct StubExtractor {
    pub by_url: HashMap<String, FeatureVector>,
    pub bytes_vector: FeatureVector,
    pub dimension: usize,
    pub calls: AtomicUsize,
}

impl StubExtractor {
    pub fn new(dimension: usize) -> Self {
        Self {
            by_url: HashMap::new(),
            bytes_vector: vec![1.0; dimension],
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_url(mut self, url: &str, vector: FeatureVector) -> Self {
        self.by_url.insert(url.to_string(), vector);
        self
    }

    pub fn with_bytes_vector(mut self, vector: FeatureVector) -> Self {
        self.bytes_vector = vector;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeatureExtractor for StubExtractor {
    async fn extract(&self, source: ImageSource) -> Result<FeatureVector, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match source {
            ImageSource::Bytes(_) => Ok(self.bytes_vector.clone()),
            ImageSource::Url(url) => {
                self.by_url
                    .get(url.as_str())
                    .cloned()
                    .ok_or_else(|| ExtractionError::Fetch {
                        url: url.to_string(),
                        message: "connection refused".to_string(),
                    })
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
