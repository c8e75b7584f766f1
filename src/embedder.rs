//! Text-to-vector encoding via a pretrained sentence-embedding model.
//!
//! The model itself is a black box behind the [`TextEncoder`] trait: the
//! pipeline only relies on encoding being order-preserving and
//! dimension-stable. The production implementation wraps
//! [`fastembed::TextEmbedding`] and loads weights lazily on first use, so
//! constructing an [`Embedder`] is cheap and side-effect free.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{Error, Result};

/// Maps text to fixed-dimension vectors.
///
/// Implementations must preserve input order and produce vectors of a
/// single, stable dimensionality.
pub trait TextEncoder {
    /// Encode a batch of texts, one vector per input, in input order.
    fn encode_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Encode a single query string.
    fn encode_query(&mut self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode_batch(&[query.to_string()])?;
        vectors.pop().ok_or_else(|| {
            Error::Embedding("encoder returned no vector for query".into())
        })
    }
}

/// The default sentence-embedding model (`all-MiniLM-L6-v2`).
pub fn default_model() -> EmbeddingModel {
    EmbeddingModel::AllMiniLML6V2
}

/// Lazily-loaded sentence-embedding model.
///
/// The model is not loaded (or downloaded) until the first call to
/// [`TextEncoder::encode_batch`] or [`TextEncoder::encode_query`].
pub struct Embedder {
    model: Option<TextEmbedding>,
    model_name: EmbeddingModel,
}

impl Default for Embedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder {
    /// Create an embedder using the default model.
    pub fn new() -> Self {
        Self::with_model(default_model())
    }

    /// Create an embedder with an explicit model.
    pub fn with_model(model_name: EmbeddingModel) -> Self {
        Self {
            model: None,
            model_name,
        }
    }

    /// Returns `true` if the model has been loaded into memory.
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Ensures the model is loaded, downloading weights if needed.
    fn ensure_loaded(&mut self) -> Result<&mut TextEmbedding> {
        if self.model.is_none() {
            let model = TextEmbedding::try_new(
                InitOptions::new(self.model_name.clone())
                    .with_show_download_progress(true),
            )
            .map_err(|e| Error::Embedding(e.to_string()))?;
            self.model = Some(model);
        }

        Ok(self.model.as_mut().unwrap())
    }
}

impl TextEncoder for Embedder {
    fn encode_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.ensure_loaded()?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_loaded_until_first_use() {
        let embedder = Embedder::new();
        assert!(!embedder.is_loaded());
    }

    #[test]
    fn empty_batch_skips_model_load() {
        let mut embedder = Embedder::new();
        let vectors = embedder.encode_batch(&[]).unwrap();
        assert!(vectors.is_empty());
        assert!(!embedder.is_loaded());
    }
}
