//! Cloud Vision REST client.

use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use super::types::{BatchAnnotateImagesRequest, BatchAnnotateImagesResponse};
use super::{AnnotatorConnector, ImageAnnotator};
use crate::auth::TokenProvider;
use crate::config::VisionConfig;
use crate::error::VisionError;

/// Creates [`VisionClient`]s on demand
pub struct VisionConnector {
    config: VisionConfig,
    scope: String,
    tokens: Arc<TokenProvider>,
}

impl VisionConnector {
    pub fn new(config: VisionConfig, scope: impl Into<String>, tokens: Arc<TokenProvider>) -> Self {
        Self {
            config,
            scope: scope.into(),
            tokens,
        }
    }
}

impl AnnotatorConnector for VisionConnector {
    type Annotator = VisionClient;

    fn connect(&self) -> Result<VisionClient, VisionError> {
        let base_url = self.config.base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(self.config.request_timeout())
            .build()
            .map_err(|e| VisionError::Connection {
                url: base_url.clone(),
                source: e,
            })?;

        debug!(url = %base_url, "Vision client opened");
        Ok(VisionClient {
            client,
            base_url,
            scope: self.scope.clone(),
            tokens: self.tokens.clone(),
        })
    }
}

/// Open Vision API session. Released when dropped.
pub struct VisionClient {
    client: Client,
    base_url: String,
    scope: String,
    tokens: Arc<TokenProvider>,
}

impl VisionClient {
    pub fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate", self.base_url)
    }
}

impl ImageAnnotator for VisionClient {
    async fn batch_annotate(
        &self,
        request: &BatchAnnotateImagesRequest,
    ) -> Result<BatchAnnotateImagesResponse, VisionError> {
        let url = self.annotate_url();
        let builder = self
            .tokens
            .authorize(self.client.post(&url), &self.scope)
            .await
            .map_err(VisionError::Credentials)?;

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| VisionError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(VisionError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| VisionError::InvalidResponse { source: e })
    }
}

impl Drop for VisionClient {
    fn drop(&mut self) {
        debug!(url = %self.base_url, "Vision client released");
    }
}
