use std::path::Path;

use ndarray::Array2;
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use super::{AudioLoader, RawAudio};
use crate::error::{DatasetError, Result};

/// Decodes clips with Symphonia, keeping the native channel layout and rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaLoader;

impl AudioLoader for SymphoniaLoader {
    fn load(&self, path: &Path) -> Result<RawAudio> {
        decode_file(path)
    }
}

/// Decode an audio file to channel-major f32 samples at its native rate.
pub fn decode_file(path: &Path) -> Result<RawAudio> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::audio(path, e))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DatasetError::audio(path, format!("unsupported format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DatasetError::audio(path, "no supported audio tracks found"))?;

    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DatasetError::audio(path, format!("failed to create decoder: {e}")))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut stats = PacketStats::default();

    // Prefer codec params, fall back to the first decoded buffer's spec.
    let mut sample_rate: Option<u32> = track.codec_params.sample_rate;
    let mut channels: Option<usize> = track.codec_params.channels.map(|c| c.count());

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::ResetRequired) => {
                return Err(DatasetError::audio(path, "decoder reset required (chained streams)"));
            }
            // end of stream
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(DatasetError::audio(path, format!("error reading packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => {
                stats.skipped += 1;
                continue;
            }
            Err(SymphoniaError::ResetRequired) => {
                return Err(DatasetError::audio(path, "decoder reset required mid-stream"));
            }
            Err(e) => return Err(DatasetError::audio(path, format!("unrecoverable decode error: {e}"))),
        };

        sample_rate.get_or_insert(decoded.spec().rate);
        channels.get_or_insert(decoded.spec().channels.count());

        let mut sbuf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sbuf.copy_interleaved_ref(decoded);

        interleaved.extend_from_slice(sbuf.samples());
        stats.decoded += 1;
    }

    stats.finish(path)?;

    let sample_rate =
        sample_rate.ok_or_else(|| DatasetError::audio(path, "could not determine sample rate"))?;
    let channels = channels
        .filter(|&c| c > 0)
        .ok_or_else(|| DatasetError::audio(path, "could not determine channel count"))?;

    if interleaved.is_empty() {
        return Err(DatasetError::audio(path, "decoded audio was empty"));
    }

    let samples = deinterleave(&interleaved, channels);
    tracing::debug!(
        path = %path.display(),
        sample_rate,
        channels,
        frames = samples.ncols(),
        "decoded clip"
    );

    Ok(RawAudio {
        samples,
        sample_rate,
    })
}

/// Packet outcomes for one clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PacketStats {
    pub(crate) decoded: usize,
    pub(crate) skipped: usize,
}

impl PacketStats {
    /// Warn about skipped packets; a clip where every packet failed is an error.
    pub(crate) fn finish(self, path: &Path) -> Result<()> {
        if self.skipped == 0 {
            return Ok(());
        }
        if self.decoded == 0 {
            return Err(DatasetError::audio(
                path,
                format!("all {} packets failed to decode", self.skipped),
            ));
        }
        tracing::warn!(
            path = %path.display(),
            skipped = self.skipped,
            decoded = self.decoded,
            "skipped corrupt packets"
        );
        Ok(())
    }
}

/// Split interleaved samples into a `(channels, frames)` matrix.
///
/// A trailing partial frame is dropped.
pub(crate) fn deinterleave(interleaved: &[f32], channels: usize) -> Array2<f32> {
    let frames = interleaved.len() / channels;
    Array2::from_shape_fn((channels, frames), |(c, f)| interleaved[f * channels + c])
}
