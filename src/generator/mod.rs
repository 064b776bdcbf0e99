// Offline embedding generation for a whole catalog


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use url::Url;

use crate::Result;
use crate::catalog::{CatalogDocument, Product};
use crate::config::ConfigError;
use crate::embeddings::{FeatureExtractor, ImageSource, normalize};

/// Summary of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Products read from the input
    pub total: usize,
    /// Products that received an embedding
    pub succeeded: usize,
    /// Products without any image
    pub skipped: usize,
    /// Products whose extraction failed or produced an unusable vector
    pub failed: usize,
    pub elapsed: Duration,
}

impl GenerationReport {
    #[inline]
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    fn record(&mut self, outcome: &ProductOutcome) {
        match outcome {
            ProductOutcome::Embedded(_) => self.succeeded += 1,
            ProductOutcome::Skipped => self.skipped += 1,
            ProductOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// What happened to a single product
#[derive(Debug, Clone, PartialEq)]
pub enum ProductOutcome {
    Embedded(Vec<f32>),
    Skipped,
    Failed(String),
}

/// Computes embeddings for every product, a fixed-size batch at a time
pub struct BatchGenerator {
    extractor: Arc<dyn FeatureExtractor>,
    concurrency: usize,
    expected_dimension: usize,
    show_progress: bool,
}

impl BatchGenerator {
    /// # Arguments
    /// * `extractor` - Feature extractor used for every product image
    /// * `concurrency` - Extractions in flight per batch, at least 1
    #[inline]
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        concurrency: usize,
    ) -> std::result::Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(concurrency));
        }

        let expected_dimension = extractor.dimension();
        Ok(Self {
            extractor,
            concurrency,
            expected_dimension,
            show_progress: console::user_attended_stderr(),
        })
    }

    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Read `input`, embed every product and atomically write the result to `output`
    #[inline]
    pub async fn generate(&self, input: &Path, output: &Path) -> Result<GenerationReport> {
        info!("Starting embedding generation from {}", input.display());

        let input_path = input.to_path_buf();
        let mut document = tokio::task::spawn_blocking(move || CatalogDocument::read(&input_path))
            .await
            .map_err(|e| anyhow::anyhow!("catalog reader panicked: {}", e))??;

        let products = std::mem::take(&mut document.products);
        let (products, report) = self.process(products).await;
        document.products = products;

        info!("Writing results to {}", output.display());
        write_document(document, output.to_path_buf()).await?;

        info!(
            "Generation complete: {} succeeded, {} skipped, {} failed of {} products, took {:?}",
            report.succeeded, report.skipped, report.failed, report.total, report.elapsed
        );

        Ok(report)
    }

    /// Embed `products` in order, returning them with `embedding` filled or emptied
    #[inline]
    pub async fn process(&self, products: Vec<Product>) -> (Vec<Product>, GenerationReport) {
        let start = Instant::now();
        let mut report = GenerationReport {
            total: products.len(),
            ..GenerationReport::default()
        };

        info!(
            "Found {} products to process with a concurrency limit of {}",
            products.len(),
            self.concurrency
        );

        let bar = if self.show_progress {
            ProgressBar::new(products.len() as u64).with_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut updated = Vec::with_capacity(products.len());
        let mut remaining = products.into_iter();
        let mut batch_number = 0_usize;

        loop {
            let batch: Vec<Product> = remaining.by_ref().take(self.concurrency).collect();
            if batch.is_empty() {
                break;
            }
            batch_number += 1;
            debug!("Processing batch {} ({} products)", batch_number, batch.len());

            let outcomes = join_all(batch.iter().map(|product| self.embed_product(product))).await;

            for (mut product, outcome) in batch.into_iter().zip(outcomes) {
                report.record(&outcome);
                product.embedding = match outcome {
                    ProductOutcome::Embedded(values) => values,
                    ProductOutcome::Skipped | ProductOutcome::Failed(_) => Vec::new(),
                };
                bar.set_message(product.title.clone());
                bar.inc(1);
                updated.push(product);
            }
        }

        bar.finish_and_clear();
        report.elapsed = start.elapsed();
        (updated, report)
    }

    /// Embed a single product from its first image
    #[inline]
    pub async fn embed_product(&self, product: &Product) -> ProductOutcome {
        let Some(image) = product.primary_image() else {
            debug!("Product {} has no images, skipping", product.id);
            return ProductOutcome::Skipped;
        };

        let source = match Url::parse(image) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => ImageSource::Url(url),
            _ => return self.failed(product, format!("invalid image URL {image}")),
        };

        let features = match self.extractor.extract(source).await {
            Ok(features) => features,
            Err(e) => return self.failed(product, e.to_string()),
        };

        let embedding = normalize(features);
        if embedding.is_degenerate() {
            return self.failed(product, "model returned a zero vector".to_string());
        }
        if embedding.len() != self.expected_dimension {
            return self.failed(
                product,
                format!(
                    "expected {} dimensions, got {}",
                    self.expected_dimension,
                    embedding.len()
                ),
            );
        }

        ProductOutcome::Embedded(embedding.into_vec())
    }

    fn failed(&self, product: &Product, reason: String) -> ProductOutcome {
        warn!(
            "Failed to generate embedding for '{}' ({}): {}",
            product.title, product.id, reason
        );
        ProductOutcome::Failed(reason)
    }
}

async fn write_document(document: CatalogDocument, output: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || document.write_atomic(&output))
        .await
        .map_err(|e| anyhow::anyhow!("catalog writer panicked: {}", e))??;
    Ok(())
}
