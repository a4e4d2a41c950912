//! Tokenizer capability handed to downstream consumers.

use std::path::Path;

use crate::error::{DatasetError, Result};

/// Turns transcript text into token ids.
pub trait Tokenize: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>>;
}

/// Wrapper around a Hugging Face `tokenizers` tokenizer.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| DatasetError::Tokenizer(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Load a tokenizer from serialized JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_bytes(bytes)
            .map_err(|e| DatasetError::Tokenizer(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

impl Tokenize for HfTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| DatasetError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl std::fmt::Debug for HfTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTokenizer")
            .field("vocab_size", &self.vocab_size())
            .finish()
    }
}
