use audioadapter_buffers::direct::InterleavedSlice;
use ndarray::{Array2, ArrayView2};
use rubato::{Fft, FixedSync, Resampler};

use super::decoder::deinterleave;
use crate::error::{DatasetError, Result};

/// Input chunk size of the FFT resampler. Fine for offline full-clip work.
const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 1;

/// Resample a `(channels, frames)` clip from `rate_in` to `rate_out`.
///
/// Every channel runs through the same band-limited FFT resampler
/// independently; equal rates return a copy of the input.
pub fn resample(samples: ArrayView2<'_, f32>, rate_in: u32, rate_out: u32) -> Result<Array2<f32>> {
    if rate_in == rate_out {
        return Ok(samples.to_owned());
    }
    if rate_in == 0 || rate_out == 0 {
        return Err(DatasetError::Resample(format!(
            "cannot resample between {rate_in} Hz and {rate_out} Hz"
        )));
    }

    let (channels, frames_in) = samples.dim();
    if channels == 0 || frames_in == 0 {
        return Ok(Array2::zeros((channels, 0)));
    }

    let mut resampler = Fft::<f32>::new(
        rate_in as usize,
        rate_out as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        channels,
        FixedSync::Input,
    )
    .map_err(|e| DatasetError::Resample(format!("failed to construct FFT resampler: {e}")))?;

    // frame-major walk of the transposed view yields interleaved order
    let interleaved: Vec<f32> = samples.t().iter().copied().collect();

    let frames_out = resampler.process_all_needed_output_len(frames_in);
    let mut out = vec![0.0f32; frames_out * channels];

    let input_adapter = InterleavedSlice::new(&interleaved, channels, frames_in)
        .map_err(|e| DatasetError::Resample(format!("bad input adapter: {e}")))?;
    let mut output_adapter = InterleavedSlice::new_mut(&mut out, channels, frames_out)
        .map_err(|e| DatasetError::Resample(format!("bad output adapter: {e}")))?;

    let (_frames_read, frames_written) = resampler
        .process_all_into_buffer(&input_adapter, &mut output_adapter, frames_in, None)
        .map_err(|e| DatasetError::Resample(e.to_string()))?;

    out.truncate(frames_written * channels);
    tracing::debug!(rate_in, rate_out, channels, frames_in, frames_written, "resampled clip");

    Ok(deinterleave(&out, channels))
}
