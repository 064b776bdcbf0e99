use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisualSearchError>;

#[derive(Error, Debug)]
pub enum VisualSearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] embeddings::ExtractionError),

    #[error("Similarity error: {0}")]
    Similarity(#[from] search::SimilarityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod catalog;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod generator;
pub mod search;
pub mod server;
