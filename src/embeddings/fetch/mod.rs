
use std::time::Duration;

use tracing::debug;
use ureq::Agent;
use url::Url;

use super::ExtractionError;
use crate::config::FetchConfig;

/// Blocking HTTP client for downloading product and query images
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    agent: Agent,
    max_bytes: u64,
}

impl ImageFetcher {
    #[inline]
    pub fn new(config: &FetchConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .user_agent(&config.user_agent)
            .build()
            .into();

        Self {
            agent,
            max_bytes: config.max_image_bytes,
        }
    }

    /// Download an image. Anything other than a 200 response carrying an
    /// image (or untyped binary) body is an error.
    #[inline]
    pub fn fetch(&self, url: &Url) -> Result<Vec<u8>, ExtractionError> {
        debug!("Fetching image from {}", url);

        let fetch_error = |message: String| ExtractionError::Fetch {
            url: url.to_string(),
            message,
        };

        let mut response = match self.agent.get(url.as_str()).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => {
                return Err(fetch_error(format!("HTTP error {}", code)));
            }
            Err(e) => return Err(fetch_error(e.to_string())),
        };

        let status = response.status().as_u16();
        if status != 200 {
            return Err(fetch_error(format!("unexpected HTTP status {}", status)));
        }

        if let Some(content_type) = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
        {
            if !is_image_content_type(content_type) {
                return Err(fetch_error(format!(
                    "response is not an image (content-type: {})",
                    content_type
                )));
            }
        }

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(|e| fetch_error(format!("failed to read body: {}", e)))?;

        if bytes.is_empty() {
            return Err(fetch_error("response body is empty".to_string()));
        }

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    media_type.starts_with("image/") || media_type == "application/octet-stream"
}
