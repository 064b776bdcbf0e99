
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::ExtractionError;
use super::fetch::ImageFetcher;
use super::model::{FeatureModel, ModelLoader};
use super::preprocess::{decode_image, preprocess};
use super::remote::RemoteModelClient;
use super::source::ImageSource;
use super::vector::FeatureVector;
use crate::config::Config;

/// Turns an image source into a raw (non-normalized) feature vector.
///
/// This is the seam the search service and the batch generator depend on;
/// tests substitute deterministic implementations.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn extract(&self, source: ImageSource) -> Result<FeatureVector, ExtractionError>;

    /// Embedding length the underlying model produces
    fn dimension(&self) -> usize;
}

/// Production extractor: fetch, decode, preprocess, then run the feature model.
///
/// The model is loaded on the first extraction and reused for the lifetime of
/// the extractor. A failed load is not cached.
pub struct ImageFeatureExtractor {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn FeatureModel>>,
    fetcher: ImageFetcher,
    dimension: usize,
}

impl ImageFeatureExtractor {
    #[inline]
    pub fn new(loader: Arc<dyn ModelLoader>, fetcher: ImageFetcher, dimension: usize) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
            fetcher,
            dimension,
        }
    }

    /// Extractor backed by the configured model server
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let client =
            RemoteModelClient::new(&config.model).context("Failed to initialize model client")?;

        Ok(Self::new(
            Arc::new(client),
            ImageFetcher::new(&config.fetch),
            config.model.embedding_dimension as usize,
        ))
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn FeatureModel>, ExtractionError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                info!("Loading feature model");
                let loader = Arc::clone(&self.loader);
                let model = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| {
                        ExtractionError::ModelUnavailable(format!("model loader panicked: {}", e))
                    })??;
                info!("Feature model ready (input {}px)", model.input_size());
                Ok::<_, ExtractionError>(model)
            })
            .await?;

        Ok(Arc::clone(model))
    }
}

#[async_trait]
impl FeatureExtractor for ImageFeatureExtractor {
    async fn extract(&self, source: ImageSource) -> Result<FeatureVector, ExtractionError> {
        let model = self.model().await?;
        let fetcher = self.fetcher.clone();

        debug!("Extracting features from {}", source.describe());

        let features = tokio::task::spawn_blocking(move || {
            let bytes = match source {
                ImageSource::Bytes(bytes) => bytes,
                ImageSource::Url(url) => fetcher.fetch(&url)?,
            };

            let image = decode_image(&bytes)?;
            let tensor = preprocess(&image, model.input_size());
            model.infer(&tensor)
        })
        .await
        .map_err(|e| ExtractionError::Inference(format!("extraction task panicked: {}", e)))??;

        if features.len() != self.dimension {
            return Err(ExtractionError::DimensionMismatch {
                expected: self.dimension,
                actual: features.len(),
            });
        }

        Ok(features)
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }
}
