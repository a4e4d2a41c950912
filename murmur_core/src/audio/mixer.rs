//! Channel mixing between source layouts and the configured output layout.

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{DatasetError, Result};

/// Output channel layout of normalized waveforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// One channel.
    Mono,
    /// Two channels.
    Stereo,
}

impl ChannelLayout {
    /// Number of channels in this layout.
    pub fn count(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

impl TryFrom<i64> for ChannelLayout {
    type Error = DatasetError;

    fn try_from(channels: i64) -> Result<Self> {
        match channels {
            1 => Ok(ChannelLayout::Mono),
            2 => Ok(ChannelLayout::Stereo),
            other => Err(DatasetError::config(format!(
                "only mono (1) and stereo (2) output is supported, got {other} channels"
            ))),
        }
    }
}

/// Mix a `(channels, frames)` clip into `layout`.
///
/// Averages down to mono and duplicates mono into stereo. Every other
/// combination, including an already-matching layout, passes through.
pub fn mix_channels(samples: ArrayView2<'_, f32>, layout: ChannelLayout) -> Array2<f32> {
    let source = samples.nrows();
    match layout {
        ChannelLayout::Mono if source > 1 => {
            let mean = samples.sum_axis(Axis(0)) / source as f32;
            mean.insert_axis(Axis(0))
        }
        ChannelLayout::Stereo if source == 1 => {
            Array2::from_shape_fn((2, samples.ncols()), |(_, f)| samples[[0, f]])
        }
        _ => samples.to_owned(),
    }
}
