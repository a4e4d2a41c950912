use mel_spec::prelude::{MelSpectrogram, Spectrogram};
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// STFT and filterbank geometry, fixed for the lifetime of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelConfig {
    /// FFT window length in samples.
    pub fft_size: usize,
    /// Hop between successive frames in samples.
    pub hop_size: usize,
    /// Number of mel bins.
    pub n_mels: usize,
}

impl Default for MelConfig {
    fn default() -> Self {
        Self {
            fft_size: 400,
            hop_size: 160,
            n_mels: 80,
        }
    }
}

impl MelConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.fft_size == 0 || self.hop_size == 0 || self.n_mels == 0 {
            return Err(DatasetError::config(format!(
                "mel geometry must be non-zero, got {self:?}"
            )));
        }
        if self.hop_size > self.fft_size {
            return Err(DatasetError::config(format!(
                "hop size {} exceeds FFT size {}",
                self.hop_size, self.fft_size
            )));
        }
        let bins = self.fft_size / 2 + 1;
        if self.n_mels > bins {
            return Err(DatasetError::config(format!(
                "{} mel bins requested but a {}-point FFT has only {bins} frequency bins",
                self.n_mels, self.fft_size
            )));
        }
        Ok(())
    }
}

/// Mel spectrogram of every channel of a `(channels, frames)` waveform.
///
/// Returns `(channels, time_frames, n_mels)`.
pub fn mel_spectrogram(
    waveform: ArrayView2<'_, f32>,
    sample_rate: u32,
    config: &MelConfig,
) -> Result<Array3<f32>> {
    let (channels, frames) = waveform.dim();
    if channels == 0 || frames == 0 {
        return Err(DatasetError::Feature("waveform is empty".to_string()));
    }
    if frames < config.fft_size {
        return Err(DatasetError::Feature(format!(
            "waveform has {frames} samples, fewer than one {}-sample window",
            config.fft_size
        )));
    }

    let per_channel = waveform
        .axis_iter(Axis(0))
        .map(|channel| channel_mel(channel, sample_rate, config))
        .collect::<Result<Vec<_>>>()?;

    let views: Vec<_> = per_channel.iter().map(|m| m.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| DatasetError::Feature(e.to_string()))
}

/// `(time_frames, n_mels)` for one channel.
fn channel_mel(pcm: ArrayView1<'_, f32>, sample_rate: u32, config: &MelConfig) -> Result<Array2<f32>> {
    let hop_size = config.hop_size;
    let n_mels = config.n_mels;

    let mut stft = Spectrogram::new(config.fft_size, hop_size);
    let mut mel = MelSpectrogram::new(config.fft_size, sample_rate as f64, n_mels);

    let pcm = pcm.to_vec();
    let mut flat: Vec<f32> = Vec::new();

    for chunk in pcm.chunks(hop_size) {
        // pad last hop
        let mut hop = vec![0.0f32; hop_size];
        hop[..chunk.len()].copy_from_slice(chunk);

        if let Some(fft_frame) = stft.add(&hop) {
            let mel_frame = mel.add(&fft_frame);
            if mel_frame.len() != n_mels {
                return Err(DatasetError::Feature(format!(
                    "mel frame has {} bins, expected {n_mels}",
                    mel_frame.len()
                )));
            }
            flat.extend(mel_frame.iter().map(|&v| v as f32));
        }
    }

    let time_frames = flat.len() / n_mels;
    if time_frames == 0 {
        return Err(DatasetError::Feature("no spectrogram frames produced".to_string()));
    }

    Array2::from_shape_vec((time_frames, n_mels), flat)
        .map_err(|e| DatasetError::Feature(e.to_string()))
}
