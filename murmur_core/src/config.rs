//! Dataset configuration and subset selection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::mel::MelConfig;
use crate::error::{DatasetError, Result};

/// Default number of output channels (stereo).
pub const DEFAULT_OUT_CHANNELS: i64 = 2;

/// Default output sample rate in Hz.
pub const DEFAULT_OUT_SAMPLE_RATE: u32 = 16_000;

/// Construction arguments for a [`CommonVoiceDataset`](crate::CommonVoiceDataset).
///
/// Exactly one of `split` and `table` must be set. Values are validated by
/// [`DatasetBuilder::build`](crate::DatasetBuilder::build), not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Corpus root containing `clips/` and the split tables.
    pub root: PathBuf,

    /// Named split: one of `train`, `test`, `dev`.
    #[serde(default)]
    pub split: Option<String>,

    /// Explicit table path, used as given.
    #[serde(default)]
    pub table: Option<PathBuf>,

    /// 1 for mono, 2 for stereo.
    #[serde(default = "default_out_channels")]
    pub out_channels: i64,

    /// Rate every waveform is normalized to.
    #[serde(default = "default_out_sample_rate")]
    pub out_sample_rate: u32,

    #[serde(default)]
    pub mel: MelConfig,
}

fn default_out_channels() -> i64 {
    DEFAULT_OUT_CHANNELS
}

fn default_out_sample_rate() -> u32 {
    DEFAULT_OUT_SAMPLE_RATE
}

impl DatasetConfig {
    /// Defaults for everything but the root; no subset selected yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            split: None,
            table: None,
            out_channels: DEFAULT_OUT_CHANNELS,
            out_sample_rate: DEFAULT_OUT_SAMPLE_RATE,
            mel: MelConfig::default(),
        }
    }

    /// Read a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Named partition of the corpus, each backed by `<name>.tsv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
    Dev,
}

impl Split {
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
            Split::Dev => "dev",
        }
    }

    /// Table file name inside the corpus root.
    pub fn file_name(self) -> String {
        format!("{}.tsv", self.as_str())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            "dev" => Ok(Split::Dev),
            other => Err(DatasetError::config(format!(
                "split must be one of train, test or dev, got {other:?}"
            ))),
        }
    }
}

/// Which metadata table backs a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsetSelector {
    /// `<root>/<split>.tsv`.
    Split(Split),
    /// A table path given directly.
    TablePath(PathBuf),
}

impl SubsetSelector {
    /// Validate the two mutually exclusive options into a selector.
    pub fn resolve(split: Option<&str>, table: Option<&Path>) -> Result<Self> {
        match (split, table) {
            (Some(name), None) => Ok(SubsetSelector::Split(name.parse()?)),
            (Some(_), Some(_)) => Err(DatasetError::config(
                "use only one of a split name or a table path",
            )),
            (None, None) => Err(DatasetError::config(
                "must supply either a split name or a table path",
            )),
            (None, Some(path)) => Ok(SubsetSelector::TablePath(path.to_path_buf())),
        }
    }

    /// Location of the table for a corpus rooted at `root`.
    pub fn table_path(&self, root: &Path) -> PathBuf {
        match self {
            SubsetSelector::Split(split) => root.join(split.file_name()),
            SubsetSelector::TablePath(path) => path.clone(),
        }
    }
}

impl fmt::Display for SubsetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsetSelector::Split(split) => write!(f, "{}", split.file_name()),
            SubsetSelector::TablePath(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names() {
        assert_eq!("train".parse::<Split>().unwrap(), Split::Train);
        assert_eq!("dev".parse::<Split>().unwrap(), Split::Dev);
        assert!(matches!(
            "validated".parse::<Split>(),
            Err(DatasetError::Configuration(_))
        ));
        assert_eq!(Split::Test.file_name(), "test.tsv");
    }

    #[test]
    fn test_selector_cases() {
        let root = Path::new("/corpus");

        let split = SubsetSelector::resolve(Some("test"), None).unwrap();
        assert_eq!(split, SubsetSelector::Split(Split::Test));
        assert_eq!(split.table_path(root), PathBuf::from("/corpus/test.tsv"));

        let explicit = SubsetSelector::resolve(None, Some(Path::new("/tables/other.tsv"))).unwrap();
        assert_eq!(explicit.table_path(root), PathBuf::from("/tables/other.tsv"));

        assert!(matches!(
            SubsetSelector::resolve(Some("train"), Some(Path::new("x.tsv"))),
            Err(DatasetError::Configuration(_))
        ));
        assert!(matches!(
            SubsetSelector::resolve(None, None),
            Err(DatasetError::Configuration(_))
        ));
        assert!(matches!(
            SubsetSelector::resolve(Some("holdout"), None),
            Err(DatasetError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: DatasetConfig =
            serde_json::from_str(r#"{ "root": "/data/cv", "split": "dev" }"#).unwrap();
        assert_eq!(config.out_channels, 2);
        assert_eq!(config.out_sample_rate, 16_000);
        assert_eq!(config.mel, MelConfig::default());
        assert_eq!(config.split.as_deref(), Some("dev"));
        assert!(config.table.is_none());
    }

    #[test]
    fn test_config_json_overrides() {
        let config: DatasetConfig = serde_json::from_str(
            r#"{ "root": "/data/cv", "table": "/t.tsv", "out_channels": 1,
                 "out_sample_rate": 22050, "mel": { "n_mels": 128 } }"#,
        )
        .unwrap();
        assert_eq!(config.out_channels, 1);
        assert_eq!(config.out_sample_rate, 22_050);
        assert_eq!(config.mel.n_mels, 128);
        assert_eq!(config.mel.fft_size, 400);
    }
}
