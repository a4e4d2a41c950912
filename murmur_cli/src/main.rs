use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use murmur_core::{CommonVoiceDataset, DatasetBuilder, DatasetConfig, HfTokenizer, Record};

#[derive(Parser)]
#[command(name = "murmur", version, about = "Inspect Common Voice style speech corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a corpus subset
    Describe {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Fetch records and print waveform and mel statistics
    Inspect {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Row indices to fetch
        #[arg(short, long, num_args = 1.., default_value = "0")]
        index: Vec<usize>,

        /// Also print speaker metadata
        #[arg(long)]
        speaker: bool,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// JSON dataset config; replaces the flags below
    #[arg(
        long,
        conflicts_with_all = ["root", "split", "table", "channels", "sample_rate"]
    )]
    config: Option<PathBuf>,

    /// Corpus root containing clips/ and the split tables
    #[arg(long, required_unless_present = "config")]
    root: Option<PathBuf>,

    /// Named split: train, test or dev
    #[arg(long)]
    split: Option<String>,

    /// Explicit table path
    #[arg(long)]
    table: Option<PathBuf>,

    /// Output channels (1 = mono, 2 = stereo)
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    channels: i64,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 16_000)]
    sample_rate: u32,

    /// Hugging Face tokenizer.json
    #[arg(long)]
    tokenizer: PathBuf,
}

impl DatasetArgs {
    fn open(self) -> Result<CommonVoiceDataset> {
        let config = match self.config {
            Some(path) => DatasetConfig::from_json_file(&path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => {
                let mut config = DatasetConfig::new(self.root.context("--root is required")?);
                config.split = self.split;
                config.table = self.table;
                config.out_channels = self.channels;
                config.out_sample_rate = self.sample_rate;
                config
            }
        };

        let tokenizer = HfTokenizer::from_file(&self.tokenizer)
            .with_context(|| format!("failed to load tokenizer {}", self.tokenizer.display()))?;

        DatasetBuilder::from_config(config)
            .tokenizer(Arc::new(tokenizer))
            .build()
            .context("failed to open dataset")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Describe { dataset } => {
            let dataset = dataset.open()?;
            println!("{}", dataset.describe());
        }
        Commands::Inspect {
            dataset,
            index,
            speaker,
        } => {
            let dataset = dataset.open()?;
            for i in index {
                let record = dataset
                    .fetch(i)
                    .with_context(|| format!("failed to fetch record {i}"))?;
                print_record(i, &record);
                if speaker {
                    let info = dataset.row(i)?.speaker();
                    println!(
                        "  speaker: age={} gender={} accent={}",
                        info.age.as_deref().unwrap_or("-"),
                        info.gender.as_deref().unwrap_or("-"),
                        info.accent.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_record(index: usize, record: &Record) {
    let mel = &record.features;
    let min = mel.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = mel.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let nan_count = mel.iter().filter(|x| x.is_nan()).count();
    let (channels, frames, n_mels) = mel.dim();

    println!("[{index}] {:?}", record.sentence);
    println!(
        "  waveform: {} ch x {} frames @ {} Hz ({:.2}s)",
        record.waveform.channels(),
        record.waveform.frames(),
        record.waveform.sample_rate,
        record.waveform.duration_secs()
    );
    println!("  mel: {channels} ch x {frames} frames x {n_mels} bins");
    println!("  mel stats: min={min}, max={max}, nan_count={nan_count}");
}
