#[cfg(test)]
mod tests;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;

use super::ExtractionError;

/// Where a query or catalog image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Url(Url),
}

impl ImageSource {
    /// Build a source from an optional upload and an optional URL string.
    /// Exactly one of the two must be present.
    #[inline]
    pub fn from_parts(bytes: Option<Vec<u8>>, url: Option<&str>) -> Result<Self, ExtractionError> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        match (bytes, url) {
            (Some(_), Some(_)) => Err(ExtractionError::AmbiguousSource),
            (Some(bytes), None) if bytes.is_empty() => Err(ExtractionError::EmptyImage),
            (Some(bytes), None) => Ok(Self::Bytes(bytes)),
            (None, Some(url)) => Self::from_url_or_data_uri(url),
            (None, None) => Err(ExtractionError::MissingSource),
        }
    }

    /// Parse a remote URL, decoding inline `data:image/...;base64,` URIs to bytes
    #[inline]
    pub fn from_url_or_data_uri(value: &str) -> Result<Self, ExtractionError> {
        let value = value.trim();

        if value
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
        {
            return decode_data_uri(value).map(Self::Bytes);
        }

        let url = Url::parse(value).map_err(|e| ExtractionError::InvalidUrl(format!("{value}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ExtractionError::InvalidUrl(format!(
                "URL must use HTTP or HTTPS scheme: {value}"
            )));
        }

        Ok(Self::Url(url))
    }

    /// Short label for log lines; never prints inline image data
    #[inline]
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            Self::Url(url) => url.to_string(),
        }
    }
}

/// Decode a base64 image data URI (`data:image/png;base64,....`)
#[inline]
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ExtractionError> {
    let rest = uri
        .get(5..)
        .ok_or_else(|| ExtractionError::InvalidDataUri("truncated data URI".to_string()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExtractionError::InvalidDataUri("missing ',' separator".to_string()))?;

    let mut parts = header.split(';');
    let media_type = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !media_type.starts_with("image/") {
        return Err(ExtractionError::InvalidDataUri(format!(
            "unsupported media type '{media_type}'"
        )));
    }

    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ExtractionError::InvalidDataUri(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned)
        .map_err(|e| ExtractionError::InvalidDataUri(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ExtractionError::EmptyImage);
    }

    Ok(bytes)
}
