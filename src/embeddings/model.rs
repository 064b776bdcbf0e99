use std::sync::Arc;

use super::ExtractionError;
use super::preprocess::ImageTensor;

/// A loaded, read-only feature network: preprocessed image in, raw embedding out.
///
/// Implementations are shared across threads after loading and must not keep
/// per-call mutable state.
pub trait FeatureModel: Send + Sync {
    /// Square input resolution the network expects
    fn input_size(&self) -> u32;

    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ExtractionError>;
}

/// Produces the feature model on first use.
///
/// `load` is blocking and may be slow (health checks, weight loading).
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn FeatureModel>, ExtractionError>;
}
