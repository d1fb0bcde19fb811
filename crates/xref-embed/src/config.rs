//! Encoder endpoint configuration.
//!
//! The HTTP encoder talks to a text-embeddings-inference style service.
//! Configuration comes from the environment so that the same binary runs
//! against a local model server or a shared deployment.

use url::Url;

use crate::{DEFAULT_DIMENSION, DEFAULT_MAX_TOKENS};

/// Configuration for the HTTP encoder.
///
/// Custom `Debug` implementation redacts the bearer token.
#[derive(Clone)]
pub struct EncoderConfig {
    /// Base URL of the inference service.
    pub url: Url,
    /// Optional bearer token.
    pub token: Option<String>,
    /// Model identifier recorded on every embedding.
    pub model: String,
    /// Expected hidden-state width.
    pub dimension: usize,
    /// Truncation length in tokens.
    pub max_tokens: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl EncoderConfig {
    /// Default model served by the inference endpoint.
    pub const DEFAULT_MODEL: &'static str = "xlm-roberta-base";

    /// Configuration for `url` with default model settings.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            model: Self::DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: 30,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `XREF_ENCODER_URL` (required)
    /// - `XREF_ENCODER_TOKEN` (optional)
    /// - `XREF_ENCODER_MODEL` (default: `xlm-roberta-base`)
    /// - `XREF_EMBEDDING_DIM` (default: 768)
    /// - `XREF_MAX_TOKENS` (default: 512)
    /// - `XREF_ENCODER_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("XREF_ENCODER_URL").map_err(|_| ConfigError::MissingUrl)?;
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("XREF_ENCODER_URL".to_string(), e.to_string()))?;

        Ok(Self {
            url,
            token: std::env::var("XREF_ENCODER_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            model: std::env::var("XREF_ENCODER_MODEL")
                .unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string()),
            dimension: env_number("XREF_EMBEDDING_DIM", DEFAULT_DIMENSION)?,
            max_tokens: env_number("XREF_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            timeout_secs: env_number("XREF_ENCODER_TIMEOUT_SECS", 30)?,
        })
    }

    /// The `/embed_all` endpoint under the base URL.
    pub fn embed_all_url(&self) -> Result<Url, ConfigError> {
        let base = self.url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/embed_all"))
            .map_err(|e| ConfigError::InvalidUrl("XREF_ENCODER_URL".to_string(), e.to_string()))
    }
}

fn env_number<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let value = match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw.clone()))?,
        Err(_) => default,
    };
    if value <= T::from(0) {
        return Err(ConfigError::InvalidNumber(var.to_string(), "0".to_string()));
    }
    Ok(value)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("XREF_ENCODER_URL environment variable is required")]
    MissingUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid positive number for {0}: {1:?}")]
    InvalidNumber(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let mut cfg = EncoderConfig::new(Url::parse("http://127.0.0.1:8080").unwrap());
        cfg.token = Some("secret-token".into());
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn embed_all_url_joins_path() {
        let cfg = EncoderConfig::new(Url::parse("http://127.0.0.1:8080/tei/").unwrap());
        assert_eq!(
            cfg.embed_all_url().unwrap().as_str(),
            "http://127.0.0.1:8080/tei/embed_all"
        );
    }

    #[test]
    fn env_number_defaults_and_validates() {
        assert_eq!(env_number::<usize>("XREF_NONEXISTENT_VAR_4711", 512).unwrap(), 512);
        std::env::set_var("XREF_TEST_BAD_NUMBER", "zero");
        let bad = env_number::<usize>("XREF_TEST_BAD_NUMBER", 1);
        std::env::remove_var("XREF_TEST_BAD_NUMBER");
        assert!(bad.is_err());
        std::env::set_var("XREF_TEST_ZERO_NUMBER", "0");
        let zero = env_number::<u64>("XREF_TEST_ZERO_NUMBER", 1);
        std::env::remove_var("XREF_TEST_ZERO_NUMBER");
        assert!(zero.is_err());
    }
}
