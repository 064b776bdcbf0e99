// Product catalog: the JSON document, its records and the in-memory index

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::embeddings::{NormalizedVector, normalize};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Catalog {0} has no 'products' array")]
    MissingProducts(PathBuf),
    #[error("Failed to write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Product identifier, kept in whichever JSON form the catalog uses.
///
/// Identifiers that are neither integers nor strings are carried verbatim in
/// `Other`. A record without an `id` key gets `Missing`, which is never
/// written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(i64),
    Text(String),
    Other(Value),
    #[default]
    #[serde(skip)]
    Missing,
}

impl ProductId {
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for ProductId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(value) => write!(f, "{value}"),
            Self::Missing => f.write_str("<no id>"),
        }
    }
}

/// A single catalog record. Fields this crate does not interpret are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "ProductId::is_missing")]
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "lenient_embedding")]
    pub embedding: Vec<f32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Canonical image, the first listed
    #[inline]
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `null`, an empty array, or an array of numbers. An array with
/// `null` holes (how non-finite floats end up after a JSON round trip) is
/// treated as missing.
fn lenient_embedding<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<f32>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.into_iter().collect::<Option<Vec<f32>>>().unwrap_or_default())
}

/// The whole catalog file: `{ "products": [...] }` plus any other top-level keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub products: Vec<Product>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogDocument {
    #[inline]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            extra: Map::new(),
        }
    }

    /// Read and parse a catalog file
    #[inline]
    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    /// Parse catalog JSON; `origin` is only used in error messages
    #[inline]
    pub fn parse(content: &str, origin: &Path) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(content).map_err(|source| CatalogError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        if !value.get("products").is_some_and(Value::is_array) {
            return Err(CatalogError::MissingProducts(origin.to_path_buf()));
        }

        serde_json::from_value(value).map_err(|source| CatalogError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Write to `path` through a temporary file in the same directory, so
    /// readers never observe a partially written catalog.
    #[inline]
    pub fn write_atomic(&self, path: &Path) -> Result<(), CatalogError> {
        let json = serde_json::to_vec_pretty(self)?;
        let write_error = |source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
        temp.write_all(&json).map_err(write_error)?;
        temp.write_all(b"\n").map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(path).map_err(|e| write_error(e.error))?;

        debug!("Wrote catalog to {}", path.display());
        Ok(())
    }
}

/// A product together with its normalized embedding, when it has a usable one
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub product: Product,
    pub embedding: Option<NormalizedVector>,
}

impl CatalogEntry {
    #[inline]
    pub fn new(mut product: Product) -> Self {
        let embedding = if product.embedding.is_empty() {
            None
        } else if product.embedding.iter().all(|v| v.is_finite()) {
            Some(normalize(std::mem::take(&mut product.embedding)))
        } else {
            warn!(
                "Product {} has non-finite embedding values, excluding it from search",
                product.id
            );
            None
        };

        Self { product, embedding }
    }

    /// Embedding usable for ranking: present and not degenerate
    #[inline]
    pub fn searchable_embedding(&self) -> Option<&NormalizedVector> {
        self.embedding.as_ref().filter(|v| !v.is_degenerate())
    }
}

/// In-memory catalog, built once and read concurrently afterwards
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    dimension: Option<usize>,
}

impl Catalog {
    /// Load a catalog file, normalizing every embedding once
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let document = CatalogDocument::read(path)?;
        let catalog = Self::from_products(document.products);

        info!(
            "Loaded {} products ({} with embeddings) from {}",
            catalog.len(),
            catalog.embedded_count(),
            path.display()
        );

        Ok(catalog)
    }

    #[inline]
    pub fn from_products(products: Vec<Product>) -> Self {
        let entries: Vec<CatalogEntry> = products.into_iter().map(CatalogEntry::new).collect();
        let dimension = modal_dimension(&entries);

        if let Some(dimension) = dimension {
            let mismatched = entries
                .iter()
                .filter_map(CatalogEntry::searchable_embedding)
                .filter(|v| v.len() != dimension)
                .count();
            if mismatched > 0 {
                warn!(
                    "{} products have embeddings whose length differs from {}",
                    mismatched, dimension
                );
            }
        }

        Self { entries, dimension }
    }

    #[inline]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of products that can take part in ranking
    #[inline]
    pub fn embedded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.searchable_embedding().is_some())
            .count()
    }

    /// Most common embedding length among searchable products
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

fn modal_dimension(entries: &[CatalogEntry]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for embedding in entries.iter().filter_map(CatalogEntry::searchable_embedding) {
        *counts.entry(embedding.len()).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(len_a, count_a), (len_b, count_b)| {
            count_a.cmp(count_b).then_with(|| len_b.cmp(len_a))
        })
        .map(|(len, _)| len)
}
