//! Random-access speech corpus reader.
//!
//! Opens a Common Voice style corpus (`clips/` plus `train.tsv`, `test.tsv`,
//! `dev.tsv`) and serves records of normalized waveform, transcript and mel
//! spectrogram by index. Audio is decoded, resampled, channel-mixed and
//! featurized on every fetch; nothing is cached.
//!
//! ```no_run
//! use std::sync::Arc;
//! use murmur_core::{CommonVoiceDataset, HfTokenizer};
//!
//! # fn main() -> murmur_core::Result<()> {
//! let dataset = CommonVoiceDataset::builder("/data/cv-corpus/en")
//!     .split("train")
//!     .out_channels(1)
//!     .out_sample_rate(16_000)
//!     .tokenizer(Arc::new(HfTokenizer::from_file("tokenizer.json")?))
//!     .build()?;
//!
//! let record = dataset.fetch(0)?;
//! println!("{} -> {:?}", record.sentence, record.features.dim());
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod preprocess;
pub mod table;
pub mod tokenizer;

pub use audio::{
    AudioLoader, RawAudio, decoder::SymphoniaLoader, mel::MelConfig, mixer::ChannelLayout,
};
pub use config::{DatasetConfig, Split, SubsetSelector};
pub use dataset::{CLIPS_DIR, CommonVoiceDataset, DatasetBuilder, Record};
pub use error::{DatasetError, Result, SharedResult};
pub use preprocess::{Preprocessing, Waveform};
pub use table::{MetadataTable, SpeakerInfo, TableLoader, TableRow, TsvTableLoader};
pub use tokenizer::{HfTokenizer, Tokenize};
