//! Waveform normalization and feature extraction.

use ndarray::{Array2, Array3};

use crate::audio::{
    RawAudio,
    mel::{MelConfig, mel_spectrogram},
    mixer::{ChannelLayout, mix_channels},
    resample::resample,
};
use crate::error::Result;

/// Waveform at the configured output layout and rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// `(channels, frames)` samples.
    pub samples: Array2<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Waveform {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of frames per channel.
    pub fn frames(&self) -> usize {
        self.samples.ncols()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Pure normalization pipeline: resample, then mix, then extract features.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of concurrent fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessing {
    layout: ChannelLayout,
    sample_rate: u32,
    mel: MelConfig,
}

impl Preprocessing {
    pub fn new(layout: ChannelLayout, sample_rate: u32, mel: MelConfig) -> Self {
        Self {
            layout,
            sample_rate,
            mel,
        }
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn mel_config(&self) -> &MelConfig {
        &self.mel
    }

    /// Bring a decoded clip to the output rate and channel layout.
    ///
    /// Resampling runs on the source layout before any mixing.
    pub fn preprocess_waveform(&self, audio: &RawAudio) -> Result<Waveform> {
        let resampled = resample(audio.samples.view(), audio.sample_rate, self.sample_rate)?;
        let samples = mix_channels(resampled.view(), self.layout);
        Ok(Waveform {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    /// `(channels, time_frames, n_mels)` mel spectrogram of a normalized waveform.
    pub fn extract_features(&self, waveform: &Waveform) -> Result<Array3<f32>> {
        mel_spectrogram(waveform.samples.view(), waveform.sample_rate, &self.mel)
    }
}
