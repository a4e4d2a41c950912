//! Audio decoding, normalization and spectral features.

pub mod decoder;
pub mod mel;
pub mod mixer;
pub mod resample;

use std::path::Path;

use ndarray::Array2;

use crate::error::Result;

/// Decoded clip at its native layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// `(channels, frames)` samples in `[-1, 1]`.
    pub samples: Array2<f32>,
    /// Native sample rate in Hz.
    pub sample_rate: u32,
}

impl RawAudio {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.samples.nrows()
    }
}

/// Turns a file path into samples and a native sample rate.
///
/// Implementations must not keep the file open after `load` returns.
pub trait AudioLoader: Send + Sync {
    /// Decode the clip at `path`. Missing or undecodable files yield
    /// [`DatasetError::AudioLoad`](crate::DatasetError::AudioLoad).
    fn load(&self, path: &Path) -> Result<RawAudio>;
}
