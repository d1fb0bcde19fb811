//! # Embedding Generator
//!
//! Orchestrates language detection, abbreviation expansion, encoding,
//! pooling and normalization, and owns the degraded fallback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encoder::Encoder;
use crate::error::EmbeddingError;
use crate::fallback::{hash_embedding, mark_degraded};
use crate::language::{detect_language, expand_abbreviations};
use crate::pooling::{l2_normalize, mean_pool};

/// Output of [`EmbeddingGenerator::generate`].
///
/// Semantic and degraded vectors are kept apart at the type level so that
/// hash-derived similarities can never be mixed with genuine ones
/// unnoticed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedVector {
    /// Produced by the encoder.
    Semantic { vector: Vec<f32>, model: String },
    /// Produced by the hash fallback after an encoder failure.
    Degraded { vector: Vec<f32>, reason: String },
}

impl GeneratedVector {
    pub fn vector(&self) -> &[f32] {
        match self {
            Self::Semantic { vector, .. } | Self::Degraded { vector, .. } => vector,
        }
    }

    pub fn into_vector(self) -> Vec<f32> {
        match self {
            Self::Semantic { vector, .. } | Self::Degraded { vector, .. } => vector,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Produces unit-length requirement embeddings from normalized text.
#[derive(Clone)]
pub struct EmbeddingGenerator {
    encoder: Arc<dyn Encoder>,
}

impl std::fmt::Debug for EmbeddingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGenerator")
            .field("model", &self.encoder.model_id())
            .field("dimension", &self.encoder.dimension())
            .finish()
    }
}

impl EmbeddingGenerator {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self { encoder }
    }

    /// Model identifier of the underlying encoder.
    pub fn model_id(&self) -> &str {
        self.encoder.model_id()
    }

    /// Dimension of every vector this generator returns.
    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// Embed `text`.
    ///
    /// # Errors
    ///
    /// [`EmbeddingError::EmptyInput`] when `text` is blank. Encoder failures
    /// are not errors: they yield [`GeneratedVector::Degraded`].
    pub fn generate(&self, text: &str) -> Result<GeneratedVector, EmbeddingError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let language = detect_language(trimmed);
        let prepared = expand_abbreviations(trimmed, language);

        match self.encode(&prepared) {
            Ok(vector) => Ok(GeneratedVector::Semantic {
                vector,
                model: self.encoder.model_id().to_string(),
            }),
            Err(e) => {
                tracing::warn!(
                    model = self.encoder.model_id(),
                    language = language.code(),
                    error = %e,
                    "encoder failed; using hash fallback embedding"
                );
                mark_degraded();
                metrics::counter!("xref_embeddings_degraded_total").increment(1);
                Ok(GeneratedVector::Degraded {
                    vector: hash_embedding(&prepared, self.dimension()),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let states = self.encoder.encode(text)?;
        let mut pooled = mean_pool(&states)?;
        if pooled.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                actual: pooled.len(),
            });
        }
        l2_normalize(&mut pooled)?;
        Ok(pooled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{HashingEncoder, TokenStates, UnavailableEncoder};
    use crate::fallback::degraded_mode;
    use crate::pooling::cosine_similarity;

    fn hashing(dim: usize) -> EmbeddingGenerator {
        EmbeddingGenerator::new(Arc::new(HashingEncoder::new(dim)))
    }

    #[test]
    fn blank_input_is_rejected() {
        let gen = hashing(32);
        assert!(matches!(gen.generate(""), Err(EmbeddingError::EmptyInput)));
        assert!(matches!(gen.generate(" \n\t"), Err(EmbeddingError::EmptyInput)));
    }

    #[test]
    fn semantic_vectors_are_unit_length_and_reproducible() {
        let gen = hashing(64);
        let a = gen.generate("[A.9.1] Access control policy").unwrap();
        let b = gen.generate("[A.9.1] Access control policy").unwrap();
        assert!(!a.is_degraded());
        assert_eq!(a, b);
        let norm: f32 = a.vector().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn shared_vocabulary_raises_similarity() {
        let gen = hashing(256);
        let a = gen.generate("access control policy for users").unwrap();
        let b = gen.generate("access control policy for staff").unwrap();
        let c = gen.generate("backup retention schedule").unwrap();
        let ab = cosine_similarity(a.vector(), b.vector());
        let ac = cosine_similarity(a.vector(), c.vector());
        assert!(ab > ac);
    }

    #[test]
    fn abbreviations_expand_before_encoding() {
        let gen = hashing(64);
        let short = gen.generate("Appoint a CISO").unwrap();
        let long = gen
            .generate("Appoint a chief information security officer")
            .unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn encoder_failure_degrades() {
        let gen = EmbeddingGenerator::new(Arc::new(UnavailableEncoder::new(48)));
        let v = gen.generate("Encrypt data at rest").unwrap();
        assert!(v.is_degraded());
        assert_eq!(v.vector().len(), 48);
        assert!(degraded_mode());
        // The fallback is deterministic.
        assert_eq!(v, gen.generate("Encrypt data at rest").unwrap());
    }

    struct WrongWidth;

    impl Encoder for WrongWidth {
        fn model_id(&self) -> &str {
            "wrong-width"
        }
        fn dimension(&self) -> usize {
            8
        }
        fn max_tokens(&self) -> usize {
            512
        }
        fn encode(&self, _text: &str) -> Result<TokenStates, EmbeddingError> {
            Ok(TokenStates {
                hidden: vec![vec![1.0; 4]],
                attention_mask: vec![1],
            })
        }
    }

    #[test]
    fn dimension_mismatch_degrades() {
        let gen = EmbeddingGenerator::new(Arc::new(WrongWidth));
        let v = gen.generate("text").unwrap();
        assert!(v.is_degraded());
        assert_eq!(v.vector().len(), 8);
    }
}
