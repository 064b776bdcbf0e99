// Embeddings module
// Image sources, preprocessing, the feature model seam and vector maths

pub mod errors;
pub mod extractor;
pub mod fetch;
pub mod model;
pub mod preprocess;
pub mod remote;
pub mod source;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::ExtractionError;
pub use extractor::{FeatureExtractor, ImageFeatureExtractor};
pub use fetch::ImageFetcher;
pub use model::{FeatureModel, ModelLoader};
pub use preprocess::{ImageTensor, decode_image, preprocess};
pub use remote::RemoteModelClient;
pub use source::ImageSource;
pub use vector::{FeatureVector, NormalizedVector, normalize};
