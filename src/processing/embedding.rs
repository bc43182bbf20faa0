use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("unknown embedding model: {0}")]
    UnknownModel(String),
    #[error("failed to initialize embedder: {0}")]
    Init(String),
    #[error("failed to generate embedding: {0}")]
    Embed(String),
    #[error("encoder returned {returned} embeddings for {requested} texts")]
    CountMismatch { requested: usize, returned: usize },
}

/// Maps text to fixed-length vectors.
pub trait Encoder {
    /// Encode every text in order. The output has one vector per input.
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError>;

    fn encode_one(&mut self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut embeddings = self.encode(&[text.to_string()])?;
        if embeddings.len() != 1 {
            return Err(EncoderError::CountMismatch {
                requested: 1,
                returned: embeddings.len(),
            });
        }
        Ok(embeddings.remove(0))
    }
}

/// Resolve a configured model name to a fastembed model.
pub fn embedding_model(name: &str) -> Result<EmbeddingModel, EncoderError> {
    match name {
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        "multilingual-e5-base" => Ok(EmbeddingModel::MultilingualE5Base),
        "multilingual-e5-large" => Ok(EmbeddingModel::MultilingualE5Large),
        "paraphrase-multilingual-minilm-l12-v2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        "paraphrase-multilingual-mpnet-base-v2" => Ok(EmbeddingModel::ParaphraseMLMpnetBaseV2),
        other => Err(EncoderError::UnknownModel(other.to_string())),
    }
}

/// [`Encoder`] backed by a local fastembed ONNX model.
pub struct FastEmbedEncoder {
    embedder: TextEmbedding,
}

impl FastEmbedEncoder {
    /// Load the model, downloading it into `cache_dir` on first use.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self, EncoderError> {
        let mut options =
            InitOptions::new(embedding_model(model_name)?).with_show_download_progress(false);
        if let Some(cache_dir) = cache_dir {
            options = options.with_cache_dir(cache_dir);
        }

        let embedder =
            TextEmbedding::try_new(options).map_err(|error| EncoderError::Init(format!("{error:?}")))?;

        Ok(Self { embedder })
    }
}

impl Encoder for FastEmbedEncoder {
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .embedder
            .embed(texts.to_vec(), None)
            .map_err(|error| EncoderError::Embed(format!("{error:?}")))?;

        if embeddings.len() != texts.len() {
            return Err(EncoderError::CountMismatch {
                requested: texts.len(),
                returned: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub(crate) fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Cosine similarity of two vectors. Zero vectors and length mismatches
/// score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let a = normalize_embedding(a);
    let b = normalize_embedding(b);
    let dot = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>();
    if dot.is_finite() { dot.clamp(-1.0, 1.0) } else { 0.0 }
}
