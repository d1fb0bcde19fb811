//! # HTTP Encoder
//!
//! Client for a text-embeddings-inference style `/embed_all` endpoint,
//! which returns one hidden-state row per token instead of a pooled
//! vector. Pooling stays on our side so every backend goes through the
//! same attention-masked mean.
//!
//! The client is blocking. It must be constructed, used and dropped on a
//! blocking worker thread, never directly inside an async task.

use std::time::Duration;

use serde::Serialize;

use crate::config::EncoderConfig;
use crate::encoder::{Encoder, TokenStates};
use crate::error::EmbeddingError;

#[derive(Serialize)]
struct EmbedAllRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

/// Blocking HTTP client for a token-level embedding service.
#[derive(Debug)]
pub struct HttpEncoder {
    client: reqwest::blocking::Client,
    endpoint: url::Url,
    model: String,
    dimension: usize,
    max_tokens: usize,
}

impl HttpEncoder {
    /// Build the client from configuration.
    pub fn new(config: EncoderConfig) -> Result<Self, EmbeddingError> {
        let endpoint = config.embed_all_url()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                if let Some(token) = &config.token {
                    headers.insert(
                        reqwest::header::AUTHORIZATION,
                        reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                            .map_err(|_| EmbeddingError::EncoderUnavailable {
                                reason: "invalid encoder token characters".into(),
                            })?,
                    );
                }
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| EmbeddingError::EncoderUnavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        tracing::info!(endpoint = %endpoint, model = %config.model, "HTTP encoder configured");
        Ok(Self {
            client,
            endpoint,
            model: config.model,
            dimension: config.dimension,
            max_tokens: config.max_tokens,
        })
    }
}

impl Encoder for HttpEncoder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn encode(&self, text: &str) -> Result<TokenStates, EmbeddingError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedAllRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .map_err(|e| EmbeddingError::EncoderUnavailable {
                reason: if e.is_timeout() {
                    format!("embed_all timed out: {e}")
                } else {
                    format!("embed_all: {e}")
                },
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(EmbeddingError::EncoderUnavailable {
                reason: format!("embed_all: HTTP {status}: {}", truncate_body(&body)),
            });
        }

        // Shape: [batch][token][hidden]; a single input yields batch size 1.
        let batch: Vec<Vec<Vec<f32>>> =
            resp.json().map_err(|e| EmbeddingError::MalformedOutput {
                reason: format!("embed_all response: {e}"),
            })?;
        let mut hidden = batch
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::MalformedOutput {
                reason: "embed_all returned an empty batch".into(),
            })?;
        hidden.truncate(self.max_tokens);
        let attention_mask = vec![1; hidden.len()];
        Ok(TokenStates {
            hidden,
            attention_mask,
        })
    }
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
