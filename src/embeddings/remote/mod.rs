
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::ExtractionError;
use super::model::{FeatureModel, ModelLoader};
use super::preprocess::{CHANNELS, ImageTensor};
use crate::config::ModelConfig;

const AVAILABLE_STATE: &str = "AVAILABLE";

/// Client for a feature network hosted behind the TensorFlow Serving REST API
#[derive(Debug, Clone)]
pub struct RemoteModelClient {
    base_url: Url,
    model: String,
    output: Option<String>,
    input_size: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [&'a [Vec<[f32; CHANNELS]>]; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ModelStatusResponse {
    model_version_status: Vec<ModelVersionStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelVersionStatus {
    pub version: String,
    pub state: String,
}

impl RemoteModelClient {
    #[inline]
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .context("Failed to generate model server URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            output: config.output.clone().filter(|o| !o.trim().is_empty()),
            input_size: config.input_size,
            agent,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[cfg(test)]
    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    /// Verify the server is reachable and has a servable version of the model
    #[inline]
    pub fn health_check(&self) -> Result<(), ExtractionError> {
        debug!("Checking model '{}' at {}", self.model, self.base_url);

        let versions = self.model_status()?;

        if versions.iter().any(|v| v.state == AVAILABLE_STATE) {
            info!(
                "Model '{}' is available at {} (versions: {})",
                self.model,
                self.base_url,
                versions
                    .iter()
                    .map(|v| v.version.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(())
        } else {
            let states: Vec<&str> = versions.iter().map(|v| v.state.as_str()).collect();
            warn!("Model '{}' has no available version: {:?}", self.model, states);
            Err(ExtractionError::ModelUnavailable(format!(
                "model '{}' has no available version (states: {:?})",
                self.model, states
            )))
        }
    }

    #[inline]
    pub fn model_status(&self) -> Result<Vec<ModelVersionStatus>, ExtractionError> {
        let url = self.endpoint("")?;

        let response_text = self
            .agent
            .get(url.as_str())
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| classify_error("model status request failed", e))?;

        let status: ModelStatusResponse = serde_json::from_str(&response_text).map_err(|e| {
            ExtractionError::ModelUnavailable(format!("failed to parse model status: {}", e))
        })?;

        Ok(status.model_version_status)
    }

    /// Run one image through the network and return the configured output, flattened
    #[inline]
    pub fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ExtractionError> {
        let url = self.endpoint(":predict")?;

        let rows = input.to_rows();
        let request_json = serde_json::to_string(&PredictRequest {
            instances: [rows.as_slice()],
        })
        .map_err(|e| ExtractionError::Inference(format!("failed to serialize request: {}", e)))?;

        debug!(
            "Requesting prediction from {} ({} byte payload)",
            url,
            request_json.len()
        );

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| classify_error("prediction request failed", e))?;

        let response: PredictResponse = serde_json::from_str(&response_text).map_err(|e| {
            ExtractionError::Inference(format!("failed to parse prediction response: {}", e))
        })?;

        let prediction = response
            .predictions
            .first()
            .ok_or_else(|| ExtractionError::Inference("model returned no predictions".to_string()))?;

        let embedding = flatten_prediction(prediction, self.output.as_deref())?;
        debug!("Model returned {} dimensions", embedding.len());

        Ok(embedding)
    }

    fn endpoint(&self, suffix: &str) -> Result<Url, ExtractionError> {
        self.base_url
            .join(&format!("v1/models/{}{}", self.model, suffix))
            .map_err(|e| ExtractionError::ModelUnavailable(format!("invalid model URL: {}", e)))
    }
}

impl FeatureModel for RemoteModelClient {
    #[inline]
    fn input_size(&self) -> u32 {
        self.input_size
    }

    #[inline]
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ExtractionError> {
        self.predict(input)
    }
}

impl ModelLoader for RemoteModelClient {
    #[inline]
    fn load(&self) -> Result<Arc<dyn FeatureModel>, ExtractionError> {
        self.health_check()?;
        Ok(Arc::new(self.clone()))
    }
}

fn classify_error(context: &str, error: ureq::Error) -> ExtractionError {
    match error {
        ureq::Error::StatusCode(404) => {
            ExtractionError::ModelUnavailable(format!("{}: model not found (HTTP 404)", context))
        }
        ureq::Error::StatusCode(code) if code >= 500 => {
            ExtractionError::Inference(format!("{}: server error (HTTP {})", context, code))
        }
        ureq::Error::StatusCode(code) => {
            ExtractionError::Inference(format!("{}: request rejected (HTTP {})", context, code))
        }
        other => ExtractionError::ModelUnavailable(format!("{}: {}", context, other)),
    }
}

/// Pick the requested output out of one prediction and flatten it row-major.
///
/// Single-output signatures return bare (possibly nested) arrays; multi-output
/// signatures return an object keyed by output name.
pub(crate) fn flatten_prediction(
    prediction: &Value,
    output: Option<&str>,
) -> Result<Vec<f32>, ExtractionError> {
    let selected = match prediction {
        Value::Object(outputs) => match output {
            Some(name) => outputs.get(name).ok_or_else(|| {
                ExtractionError::Inference(format!("model response has no output named '{}'", name))
            })?,
            None if outputs.len() == 1 => outputs.values().next().ok_or_else(|| {
                ExtractionError::Inference("model response has no outputs".to_string())
            })?,
            None => {
                return Err(ExtractionError::Inference(format!(
                    "model returned {} outputs; set model.output to choose one",
                    outputs.len()
                )));
            }
        },
        other => other,
    };

    let mut values = Vec::new();
    collect_numbers(selected, &mut values)?;

    if values.is_empty() {
        return Err(ExtractionError::Inference(
            "model returned an empty embedding".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ExtractionError::Inference(
            "model returned non-finite values".to_string(),
        ));
    }

    Ok(values)
}

fn collect_numbers(value: &Value, out: &mut Vec<f32>) -> Result<(), ExtractionError> {
    match value {
        Value::Number(number) => {
            let v = number.as_f64().ok_or_else(|| {
                ExtractionError::Inference(format!("non-numeric model output: {}", number))
            })?;
            out.push(v as f32);
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(|item| collect_numbers(item, out)),
        other => Err(ExtractionError::Inference(format!(
            "unexpected value in model output: {}",
            other
        ))),
    }
}
