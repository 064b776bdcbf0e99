use thiserror::Error;

/// Failures while turning an image source into a feature vector
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No image source provided")]
    MissingSource,

    #[error("Provide either an image file or an image URL, not both")]
    AmbiguousSource,

    #[error("Image data is empty")]
    EmptyImage,

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch image from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Feature model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Feature model inference failed: {0}")]
    Inference(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ExtractionError {
    /// Errors caused by what the caller supplied rather than by this service
    #[inline]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSource
                | Self::AmbiguousSource
                | Self::EmptyImage
                | Self::InvalidDataUri(_)
                | Self::InvalidUrl(_)
                | Self::Fetch { .. }
                | Self::Decode(_)
        )
    }
}
