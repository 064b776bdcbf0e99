use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::embeddings::{ImageFeatureExtractor, ImageSource};
use crate::generator::{BatchGenerator, GenerationReport};
use crate::search::{ScoredResult, SearchService};

/// Load the catalog and wire the extractor into a search service.
/// A catalog that cannot be loaded is fatal.
#[inline]
pub fn build_search_service(config: &Config) -> Result<Arc<SearchService>> {
    let catalog_path = &config.server.catalog_path;
    let catalog = Catalog::load(catalog_path).map_err(|e| {
        error!("Failed to load catalog: {}", e);
        e
    })?;

    let extractor =
        ImageFeatureExtractor::from_config(config).context("Failed to create feature extractor")?;

    Ok(Arc::new(
        SearchService::new(Arc::new(catalog), Arc::new(extractor))
            .with_limit(config.server.results_limit),
    ))
}

/// Start the HTTP search server
#[inline]
pub async fn serve(config: &Config) -> Result<()> {
    let service = build_search_service(config)?;
    crate::server::serve(service, &config.server).await
}

/// Run the batch embedding generator over the configured input file
#[inline]
pub async fn generate(config: &Config) -> Result<GenerationReport> {
    let extractor =
        ImageFeatureExtractor::from_config(config).context("Failed to create feature extractor")?;
    let generator = BatchGenerator::new(Arc::new(extractor), config.generator.concurrency)?;

    println!(
        "🚀 Generating embeddings: {} -> {}",
        config.generator.input_path.display(),
        config.generator.output_path.display()
    );

    let report = generator
        .generate(&config.generator.input_path, &config.generator.output_path)
        .await
        .context("Embedding generation failed")?;

    print!("{}", format_report(&report, &config.generator.output_path));
    Ok(report)
}

/// One-off query from the command line
#[inline]
pub async fn search(config: &Config, source: ImageSource) -> Result<()> {
    let service = build_search_service(config)?;
    info!("Searching for {}", source.describe());

    let results = service
        .search_image(source)
        .await
        .context("Search failed")?;

    print!("{}", format_results(&results));
    Ok(())
}

/// Read a local image for the `search --file` command
#[inline]
pub fn read_image_file(path: &Path) -> Result<ImageSource> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    Ok(ImageSource::from_parts(Some(bytes), None)?)
}

pub fn format_results(results: &[ScoredResult<'_>]) -> String {
    if results.is_empty() {
        return "No matching products found.\n".to_string();
    }

    let mut out = format!("🔍 Top {} matches\n", results.len());
    let _ = writeln!(out, "{}", "=".repeat(50));
    for (rank, result) in results.iter().enumerate() {
        let product = result.product;
        let _ = writeln!(
            out,
            "{:>2}. [{:.4}] {} ({})",
            rank + 1,
            result.score,
            product.title,
            product.id
        );
        if !product.category.is_empty() {
            let _ = writeln!(out, "      Category: {}", product.category);
        }
        if let Some(image) = product.primary_image() {
            let _ = writeln!(out, "      Image: {}", image);
        }
    }
    out
}

pub fn format_report(report: &GenerationReport, output: &Path) -> String {
    let mut out = String::new();
    out.push_str("\n--- Generation Complete ---\n");
    let _ = writeln!(
        out,
        "✅ Generated embeddings for {} of {} products",
        report.succeeded, report.total
    );
    let _ = writeln!(out, "⏭️  Skipped (no images): {}", report.skipped);
    let _ = writeln!(out, "❌ Failed: {}", report.failed);
    let _ = writeln!(out, "⏱️  Duration: {:?}", report.elapsed);
    let _ = writeln!(out, "📄 Written to {}", output.display());
    out
}
