// Search module
// Brute-force top-K ranking over the catalog and the image search service

pub mod similarity;


use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Catalog, Product};
use crate::embeddings::{ExtractionError, FeatureExtractor, ImageSource, NormalizedVector, normalize};

pub use similarity::{LocalCosine, SimilarityError, SimilarityProvider, cosine_similarity};

pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// A catalog product paired with its similarity to the query
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoredResult<'a> {
    pub score: f32,
    pub product: &'a Product,
}

/// Rank `catalog` against `query` with in-process cosine similarity
#[inline]
pub fn search<'a>(query: &NormalizedVector, catalog: &'a Catalog, k: usize) -> Vec<ScoredResult<'a>> {
    search_with(&LocalCosine, query, catalog, k)
}

/// Rank every eligible product in `catalog` against `query`.
///
/// # Arguments
/// * `provider` - Scoring backend
/// * `query` - Normalized query embedding
/// * `catalog` - Products to rank
/// * `k` - Maximum number of results to return
///
/// # Returns
/// * `Vec<ScoredResult>` - Best match first. Products without an embedding,
///   with a degenerate one, or with a length other than the query's are
///   skipped. Equal scores keep catalog order.
#[inline]
pub fn search_with<'a>(
    provider: &dyn SimilarityProvider,
    query: &NormalizedVector,
    catalog: &'a Catalog,
    k: usize,
) -> Vec<ScoredResult<'a>> {
    if k == 0 || query.is_empty() || query.is_degenerate() {
        debug!("Query cannot match anything, returning no results");
        return Vec::new();
    }

    if catalog.dimension().is_some_and(|d| d != query.len()) {
        warn!(
            "Query has {} dimensions but the catalog uses {:?}",
            query.len(),
            catalog.dimension()
        );
    }

    let mut results: Vec<ScoredResult<'a>> = catalog
        .entries()
        .iter()
        .filter_map(|entry| {
            let embedding = entry.searchable_embedding()?;
            if embedding.len() != query.len() {
                return None;
            }

            match provider.score(query.as_slice(), embedding.as_slice()) {
                Ok(score) => Some(ScoredResult {
                    score,
                    product: &entry.product,
                }),
                Err(e) => {
                    debug!("Skipping product {}: {}", entry.product.id, e);
                    None
                }
            }
        })
        .collect();

    // sort_by is stable, so ties stay in catalog order
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(k);

    debug!(
        "Ranked {} results using {}",
        results.len(),
        provider.name()
    );
    results
}

/// Image in, ranked products out: extract, normalize, then rank
pub struct SearchService {
    catalog: Arc<Catalog>,
    extractor: Arc<dyn FeatureExtractor>,
    provider: Box<dyn SimilarityProvider>,
    limit: usize,
}

impl SearchService {
    #[inline]
    pub fn new(catalog: Arc<Catalog>, extractor: Arc<dyn FeatureExtractor>) -> Self {
        Self {
            catalog,
            extractor,
            provider: Box::new(LocalCosine),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    #[inline]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[inline]
    pub fn with_provider(mut self, provider: Box<dyn SimilarityProvider>) -> Self {
        self.provider = provider;
        self
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Find the products most similar to the image behind `source`
    #[inline]
    pub async fn search_image(
        &self,
        source: ImageSource,
    ) -> Result<Vec<ScoredResult<'_>>, ExtractionError> {
        let features = self.extractor.extract(source).await?;
        let query = normalize(features);
        Ok(self.search_vector(&query))
    }

    #[inline]
    pub fn search_vector(&self, query: &NormalizedVector) -> Vec<ScoredResult<'_>> {
        search_with(self.provider.as_ref(), query, &self.catalog, self.limit)
    }
}
