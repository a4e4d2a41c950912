//! Random-access Common Voice dataset.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array3;

use crate::audio::{AudioLoader, decoder::SymphoniaLoader, mel::MelConfig, mixer::ChannelLayout};
use crate::config::{DatasetConfig, SubsetSelector};
use crate::error::{DatasetError, Result, SharedResult};
use crate::preprocess::{Preprocessing, Waveform};
use crate::table::{MetadataTable, REQUIRED_COLUMNS, TableLoader, TableRow, TsvTableLoader};
use crate::tokenizer::Tokenize;

/// Name of the audio directory under the corpus root.
pub const CLIPS_DIR: &str = "clips";

/// One fetched example. Built fresh on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Normalized waveform at the dataset's output layout and rate.
    pub waveform: Waveform,
    /// Raw transcript.
    pub sentence: String,
    /// `(channels, time_frames, n_mels)` mel spectrogram.
    pub features: Array3<f32>,
}

/// Collects construction arguments and collaborators for a [`CommonVoiceDataset`].
pub struct DatasetBuilder {
    config: DatasetConfig,
    tokenizer: Option<Arc<dyn Tokenize>>,
    audio_loader: Arc<dyn AudioLoader>,
    table_loader: Arc<dyn TableLoader>,
}

impl DatasetBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(DatasetConfig::new(root))
    }

    /// Start from a fully populated config, e.g. one read from JSON.
    pub fn from_config(config: DatasetConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            audio_loader: Arc::new(SymphoniaLoader),
            table_loader: Arc::new(TsvTableLoader),
        }
    }

    /// Select a named split (`train`, `test` or `dev`).
    pub fn split(mut self, name: impl Into<String>) -> Self {
        self.config.split = Some(name.into());
        self
    }

    /// Use an explicit table file instead of a named split.
    pub fn table(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.table = Some(path.into());
        self
    }

    pub fn out_channels(mut self, channels: i64) -> Self {
        self.config.out_channels = channels;
        self
    }

    pub fn out_sample_rate(mut self, rate: u32) -> Self {
        self.config.out_sample_rate = rate;
        self
    }

    pub fn mel(mut self, mel: MelConfig) -> Self {
        self.config.mel = mel;
        self
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenize>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn audio_loader(mut self, loader: Arc<dyn AudioLoader>) -> Self {
        self.audio_loader = loader;
        self
    }

    pub fn table_loader(mut self, loader: Arc<dyn TableLoader>) -> Self {
        self.table_loader = loader;
        self
    }

    /// Validate every argument, then read the metadata table once.
    ///
    /// No audio is touched here.
    pub fn build(self) -> Result<CommonVoiceDataset> {
        let DatasetBuilder {
            config,
            tokenizer,
            audio_loader,
            table_loader,
        } = self;

        if !config.root.exists() {
            return Err(DatasetError::config(format!(
                "{} doesn't exist, please provide a valid path to the dataset",
                config.root.display()
            )));
        }
        let layout = ChannelLayout::try_from(config.out_channels)?;
        if config.out_sample_rate == 0 {
            return Err(DatasetError::config("output sample rate must be positive"));
        }
        config.mel.validate()?;

        let selector = SubsetSelector::resolve(config.split.as_deref(), config.table.as_deref())?;
        let tokenizer = tokenizer.ok_or_else(|| DatasetError::config("tokenizer is required"))?;

        let root = std::path::absolute(&config.root)?;
        let table_path = selector.table_path(&root);
        let table = table_loader.load(&table_path)?;
        for column in REQUIRED_COLUMNS {
            if !table.has_column(column) {
                return Err(DatasetError::Table {
                    path: table_path,
                    reason: format!("missing required column {column:?}"),
                });
            }
        }

        let dataset = CommonVoiceDataset {
            clips_dir: root.join(CLIPS_DIR),
            root,
            selector,
            table,
            preprocessing: Preprocessing::new(layout, config.out_sample_rate, config.mel),
            tokenizer,
            audio_loader,
        };
        tracing::info!(
            table = %table_path.display(),
            rows = dataset.len(),
            channels = layout.count(),
            sample_rate = config.out_sample_rate,
            "opened corpus subset"
        );
        Ok(dataset)
    }
}

/// Read-only index over one corpus subset.
///
/// The table is loaded once and never changes, so index `i` always names the
/// same row. Each fetch opens, decodes and releases its own clip and nothing
/// is cached; fetches may run concurrently from any number of threads.
pub struct CommonVoiceDataset {
    root: PathBuf,
    clips_dir: PathBuf,
    selector: SubsetSelector,
    table: MetadataTable,
    preprocessing: Preprocessing,
    tokenizer: Arc<dyn Tokenize>,
    audio_loader: Arc<dyn AudioLoader>,
}

impl CommonVoiceDataset {
    pub fn builder(root: impl Into<PathBuf>) -> DatasetBuilder {
        DatasetBuilder::new(root)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Absolute corpus root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips_dir
    }

    pub fn selector(&self) -> &SubsetSelector {
        &self.selector
    }

    pub fn out_channels(&self) -> ChannelLayout {
        self.preprocessing.layout()
    }

    pub fn out_sample_rate(&self) -> u32 {
        self.preprocessing.sample_rate()
    }

    pub fn preprocessing(&self) -> &Preprocessing {
        &self.preprocessing
    }

    /// Tokenizer for downstream consumers; fetches never call it.
    pub fn tokenizer(&self) -> &dyn Tokenize {
        self.tokenizer.as_ref()
    }

    /// Full metadata row, including columns records leave out.
    pub fn row(&self, index: usize) -> Result<&TableRow> {
        self.table.row(index).ok_or_else(|| DatasetError::Index {
            index,
            len: self.len(),
        })
    }

    /// Absolute path of the clip behind `index`.
    pub fn audio_path(&self, index: usize) -> Result<PathBuf> {
        Ok(self.clips_dir.join(self.row(index)?.path()))
    }

    /// Load, normalize and featurize one example.
    pub fn fetch(&self, index: usize) -> Result<Record> {
        let row = self.row(index)?;
        let path = self.clips_dir.join(row.path());
        tracing::debug!(index, path = %path.display(), "fetching record");

        let raw = self.audio_loader.load(&path)?;
        let waveform = self.preprocessing.preprocess_waveform(&raw)?;
        let features = self.preprocessing.extract_features(&waveform)?;

        Ok(Record {
            waveform,
            sentence: row.sentence().to_string(),
            features,
        })
    }

    /// Fetch each index on its own, in order. The first failure aborts.
    pub fn fetch_many(&self, indices: &[usize]) -> Result<Vec<Record>> {
        indices.iter().map(|&index| self.fetch(index)).collect()
    }

    /// Lazily fetch every record in table order.
    pub fn records(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        (0..self.len()).map(move |index| self.fetch(index))
    }

    /// Human-readable summary of the subset.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CommonVoiceDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CommonVoice Dataset")?;
        writeln!(f, "-------------------")?;
        writeln!(f, "Loading {} from {} directory.", self.selector, self.root.display())?;
        writeln!(f, "Number of Examples: {}", self.len())?;
        writeln!(f, "Sampling Rate: {}", self.out_sample_rate())?;
        write!(f, "Output Channels: {}", self.out_channels().count())
    }
}

impl fmt::Debug for CommonVoiceDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonVoiceDataset")
            .field("root", &self.root)
            .field("selector", &self.selector)
            .field("rows", &self.len())
            .field("preprocessing", &self.preprocessing)
            .finish_non_exhaustive()
    }
}

/// Lets burn data loaders draw records directly.
///
/// Rows that fail to load come back as `Some(Err(..))` so iteration continues
/// past them; `None` only marks an index past the end of the table.
impl burn::data::dataset::Dataset<SharedResult<Record>> for CommonVoiceDataset {
    fn get(&self, index: usize) -> Option<SharedResult<Record>> {
        match self.fetch(index) {
            Err(DatasetError::Index { .. }) => None,
            result => Some(result.map_err(Arc::new)),
        }
    }

    fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RawAudio;
    use ndarray::Array2;
    use std::fs;

    struct NullTokenizer;

    impl Tokenize for NullTokenizer {
        fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text.bytes().map(u32::from).collect())
        }
    }

    /// Produces one second of a ramp at 8 kHz for any path under `clips/`.
    struct RampLoader {
        channels: usize,
    }

    impl AudioLoader for RampLoader {
        fn load(&self, path: &Path) -> Result<RawAudio> {
            if path.file_name().and_then(|n| n.to_str()) == Some("missing.wav") {
                return Err(DatasetError::audio(path, "no such file"));
            }
            Ok(RawAudio {
                samples: Array2::from_shape_fn((self.channels, 8_000), |(c, i)| {
                    ((i as f32 * 0.002) + c as f32 * 0.1).sin() * 0.3
                }),
                sample_rate: 8_000,
            })
        }
    }

    fn corpus(rows: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(CLIPS_DIR)).unwrap();
        let mut tsv = String::from("client_id\tpath\tsentence\n");
        for (path, sentence) in rows {
            tsv.push_str(&format!("anon\t{path}\t{sentence}\n"));
        }
        fs::write(dir.path().join("train.tsv"), tsv).unwrap();
        dir
    }

    fn builder(root: &Path) -> DatasetBuilder {
        CommonVoiceDataset::builder(root)
            .split("train")
            .tokenizer(Arc::new(NullTokenizer))
            .audio_loader(Arc::new(RampLoader { channels: 2 }))
    }

    #[test]
    fn test_len_matches_rows() {
        let dir = corpus(&[("a.wav", "one"), ("b.wav", "two"), ("c.wav", "three")]);
        let dataset = builder(dir.path()).build().unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.clips_dir(), dataset.root().join("clips"));
        assert_eq!(dataset.row(1).unwrap().sentence(), "two");
    }

    #[test]
    fn test_missing_root_rejected() {
        let err = builder(Path::new("/no/such/corpus")).build().unwrap_err();
        assert!(matches!(err, DatasetError::Configuration(_)));
    }

    #[test]
    fn test_bad_channel_counts_rejected() {
        let dir = corpus(&[("a.wav", "one")]);
        for channels in [0, 3, -1] {
            let err = builder(dir.path()).out_channels(channels).build().unwrap_err();
            assert!(matches!(err, DatasetError::Configuration(_)), "{channels}");
        }
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let dir = corpus(&[("a.wav", "one")]);
        let err = builder(dir.path()).out_sample_rate(0).build().unwrap_err();
        assert!(matches!(err, DatasetError::Configuration(_)));
    }

    #[test]
    fn test_selector_conflicts_rejected() {
        let dir = corpus(&[("a.wav", "one")]);
        let both = builder(dir.path())
            .table(dir.path().join("train.tsv"))
            .build()
            .unwrap_err();
        assert!(matches!(both, DatasetError::Configuration(_)));

        let neither = CommonVoiceDataset::builder(dir.path())
            .tokenizer(Arc::new(NullTokenizer))
            .build()
            .unwrap_err();
        assert!(matches!(neither, DatasetError::Configuration(_)));
    }

    #[test]
    fn test_missing_tokenizer_rejected() {
        let dir = corpus(&[("a.wav", "one")]);
        let err = CommonVoiceDataset::builder(dir.path())
            .split("train")
            .build()
            .unwrap_err();
        assert!(matches!(err, DatasetError::Configuration(_)));
    }

    #[test]
    fn test_missing_column_rejected() {
        let dir = corpus(&[]);
        fs::write(dir.path().join("other.tsv"), "path\ttext\na.wav\thi\n").unwrap();
        let err = CommonVoiceDataset::builder(dir.path())
            .table(dir.path().join("other.tsv"))
            .tokenizer(Arc::new(NullTokenizer))
            .build()
            .unwrap_err();
        assert!(matches!(err, DatasetError::Table { .. }));
    }

    #[test]
    fn test_fetch_out_of_range() {
        let dir = corpus(&[("a.wav", "one")]);
        let dataset = builder(dir.path()).build().unwrap();
        assert!(matches!(
            dataset.fetch(1),
            Err(DatasetError::Index { index: 1, len: 1 })
        ));
        assert!(dataset.fetch(0).is_ok());
    }

    #[test]
    fn test_fetch_normalizes_to_mono() {
        let dir = corpus(&[("a.wav", "one")]);
        let dataset = builder(dir.path())
            .out_channels(1)
            .out_sample_rate(16_000)
            .build()
            .unwrap();
        let record = dataset.fetch(0).unwrap();
        assert_eq!(record.sentence, "one");
        assert_eq!(record.waveform.channels(), 1);
        assert_eq!(record.waveform.sample_rate, 16_000);
        assert_eq!(record.features.dim().0, 1);
    }

    #[test]
    fn test_fetch_is_deterministic() {
        let dir = corpus(&[("a.wav", "one")]);
        let dataset = builder(dir.path()).build().unwrap();
        let first = dataset.fetch(0).unwrap();
        let second = dataset.fetch(0).unwrap();
        let bits = |r: &Record| r.features.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_fetch_many_fans_out() {
        let dir = corpus(&[("a.wav", "one"), ("b.wav", "two")]);
        let dataset = builder(dir.path()).build().unwrap();
        let records = dataset.fetch_many(&[1, 0, 1]).unwrap();
        let sentences: Vec<_> = records.iter().map(|r| r.sentence.as_str()).collect();
        assert_eq!(sentences, vec!["two", "one", "two"]);
        assert!(matches!(
            dataset.fetch_many(&[0, 5]),
            Err(DatasetError::Index { index: 5, .. })
        ));
    }

    #[test]
    fn test_audio_failure_propagates() {
        let dir = corpus(&[("a.wav", "one"), ("missing.wav", "two")]);
        let dataset = builder(dir.path()).build().unwrap();
        assert!(matches!(dataset.fetch(1), Err(DatasetError::AudioLoad { .. })));
        assert_eq!(dataset.len(), 2);
        assert!(dataset.fetch(0).is_ok());
    }

    #[test]
    fn test_burn_iteration_continues_past_failed_row() {
        use burn::data::dataset::Dataset;

        let dir = corpus(&[
            ("a.wav", "one"),
            ("missing.wav", "two"),
            ("c.wav", "three"),
            ("d.wav", "four"),
        ]);
        let dataset = builder(dir.path()).build().unwrap();
        assert_eq!(Dataset::len(&dataset), 4);

        let items: Vec<SharedResult<Record>> = Dataset::iter(&dataset).collect();
        assert_eq!(items.len(), 4);
        assert!(matches!(
            items[1].as_ref().map_err(|e| e.as_ref()),
            Err(DatasetError::AudioLoad { .. })
        ));
        let sentences: Vec<_> = items
            .iter()
            .filter_map(|item| item.as_ref().ok())
            .map(|record| record.sentence.as_str())
            .collect();
        assert_eq!(sentences, vec!["one", "three", "four"]);
        assert!(Dataset::get(&dataset, 4).is_none());
    }

    #[test]
    fn test_describe() {
        let dir = corpus(&[("a.wav", "one")]);
        let dataset = builder(dir.path()).out_channels(1).build().unwrap();
        let summary = dataset.describe();
        assert!(summary.contains("train.tsv"));
        assert!(summary.contains(&dataset.root().display().to_string()));
        assert!(summary.contains("Number of Examples: 1"));
        assert!(summary.contains("Sampling Rate: 16000"));
        assert!(summary.contains("Output Channels: 1"));
    }

    #[test]
    fn test_tokenizer_exposed() {
        let dir = corpus(&[("a.wav", "hi")]);
        let dataset = builder(dir.path()).build().unwrap();
        assert_eq!(dataset.tokenizer().tokenize("hi").unwrap(), vec![104, 105]);
    }
}
