use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::AppState;
use super::error::ApiError;
use crate::catalog::{Product, ProductId};
use crate::embeddings::{ExtractionError, ImageSource};
use crate::search::ScoredResult;

/// JSON search body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<'a> {
    pub results: Vec<SearchHit<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit<'a> {
    pub score: f32,
    pub product: ProductView<'a>,
}

/// Product as returned to clients: everything except the embedding
#[derive(Debug, Serialize)]
pub struct ProductView<'a> {
    #[serde(skip_serializing_if = "ProductId::is_missing")]
    pub id: &'a ProductId,
    pub title: &'a str,
    pub category: &'a str,
    pub images: &'a [String],
    #[serde(flatten)]
    pub extra: &'a Map<String, Value>,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            id: &product.id,
            title: &product.title,
            category: &product.category,
            images: &product.images,
            extra: &product.extra,
        }
    }
}

impl<'a> From<&ScoredResult<'a>> for SearchHit<'a> {
    fn from(result: &ScoredResult<'a>) -> Self {
        Self {
            score: result.score,
            product: ProductView::from(result.product),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub products: usize,
    pub embedded: usize,
    pub dimension: Option<usize>,
}

pub async fn search(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let source = read_image_source(request, state.max_upload_bytes).await?;
    info!("Search request for {}", source.describe());

    let results = state.service.search_image(source).await?;
    debug!("Returning {} results", results.len());

    let response = SearchResponse {
        results: results.iter().map(SearchHit::from).collect(),
    };
    Ok(Json(response).into_response())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalog = state.service.catalog();
    Json(HealthResponse {
        status: "ok".to_string(),
        products: catalog.len(),
        embedded: catalog.embedded_count(),
        dimension: catalog.dimension(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Pull the query image out of a multipart upload or a JSON body
async fn read_image_source(request: Request, limit: usize) -> Result<ImageSource, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        let mut bytes = None;
        let mut url = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::from_multipart(e, limit))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::from_multipart(e, limit))?;
                    // browsers send an empty part when no file was chosen
                    if !data.is_empty() {
                        bytes = Some(data.to_vec());
                    }
                }
                "imageUrl" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::from_multipart(e, limit))?;
                    url = Some(text);
                }
                other => debug!("Ignoring multipart field '{}'", other),
            }
        }

        Ok(ImageSource::from_parts(bytes, url.as_deref())?)
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<SearchRequest>::from_request(request, &())
            .await
            .map_err(|rejection| ApiError::from_json(rejection, limit))?;

        Ok(ImageSource::from_parts(None, body.image_url.as_deref())?)
    } else {
        Err(ExtractionError::MissingSource.into())
    }
}
