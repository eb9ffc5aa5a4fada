//! Snore detector CLI
//!
//! # Usage
//!
//! ```bash
//! # Append labeled feature rows extracted from a recording
//! snore record --wav snore.wav --label 1 --dataset dataset.txt
//!
//! # Train a network and save it
//! snore train --dataset dataset.txt --model Network.txt
//!
//! # Score every window of a recording
//! snore detect --wav night.wav --model Network.txt
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use num::Complex;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use snore::{
    acquire::{self, SystemClock},
    config::{AcquisitionConfig, Config},
    dataset::Dataset,
    detect::Detector,
    features::{self, FeatureVector, Spectrum},
    store::{recording, FsStorage, Storage},
    tinn::{activation::Activation, Network},
    train::{self, Trainer},
};

#[derive(Parser)]
#[command(name = "snore")]
#[command(about = "Record, train and run a tiny acoustic classifier")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory that dataset and model paths are relative to
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract feature rows from a 16-bit WAV file and append them to a dataset
    Record {
        /// Input WAV file
        #[arg(short, long)]
        wav: PathBuf,

        /// Class of every window in the file (1 = snore, 0 = silence)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=1))]
        label: u8,

        /// Dataset file
        #[arg(short, long, default_value = "dataset.txt")]
        dataset: PathBuf,

        /// Start a new dataset instead of appending
        #[arg(long)]
        erase: bool,
    },

    /// Train a network on a dataset and save it
    Train {
        /// Dataset file
        #[arg(short, long, default_value = "dataset.txt")]
        dataset: PathBuf,

        /// Output network file
        #[arg(short, long, default_value = "Network.txt")]
        model: PathBuf,

        /// Number of epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Neurons in the hidden layer
        #[arg(long)]
        hidden: Option<usize>,

        /// Activation of the hidden layer
        #[arg(long, value_parser = parse_activation)]
        activation: Option<Activation>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Evaluate a saved network over a whole dataset
    Evaluate {
        /// Dataset file
        #[arg(short, long, default_value = "dataset.txt")]
        dataset: PathBuf,

        /// Network file
        #[arg(short, long, default_value = "Network.txt")]
        model: PathBuf,
    },

    /// Score every window of a WAV file with a saved network
    Detect {
        /// Input WAV file
        #[arg(short, long)]
        wav: PathBuf,

        /// Network file
        #[arg(short, long, default_value = "Network.txt")]
        model: PathBuf,
    },
}

fn parse_activation(s: &str) -> Result<Activation, String> {
    match s {
        "sigmoid" => Ok(Activation::Sigmoid),
        "relu" => Ok(Activation::Relu),
        _ => Err(format!("unknown activation '{}', expected sigmoid or relu", s)),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let storage = FsStorage::new(&cli.root);

    match cli.command {
        Commands::Record {
            wav,
            label,
            dataset,
            erase,
        } => record(&storage, &config, &wav, label, &dataset, erase),
        Commands::Train {
            dataset,
            model,
            epochs,
            hidden,
            activation,
            seed,
        } => {
            let training = &mut config.training;
            training.epochs = epochs.unwrap_or(training.epochs);
            training.hidden = hidden.unwrap_or(training.hidden);
            training.activation = activation.unwrap_or(training.activation);
            training.seed = seed.or(training.seed);
            train_model(&storage, &config, &dataset, &model)
        }
        Commands::Evaluate { dataset, model } => {
            let mut network = load_network(&storage, &config, &model)?;
            let recording = recording::load(&storage, &dataset, &config.dataset)?;
            let data = Dataset::from_recording(recording);
            let evaluation = train::evaluate(&mut network, &data, config.training.tolerance)
                .with_context(|| {
                    format!("evaluating {} on {}", model.display(), dataset.display())
                })?;
            println!(
                "{} errors on {} samples : error rate {:.2}%",
                evaluation.errors,
                evaluation.samples,
                evaluation.rate()
            );
            Ok(())
        }
        Commands::Detect { wav, model } => {
            let network = load_network(&storage, &config, &model)?;
            let mut detector = Detector::new(
                network,
                config.acquisition.bands,
                config.dataset.attenuation,
                config.detect.threshold,
            )
            .with_context(|| format!("{} does not fit the configured bands", model.display()))?;
            for (i, (features, spectrum)) in wav_features(&wav, &config.acquisition)?
                .into_iter()
                .enumerate()
            {
                let detection = detector.detect(&features)?;
                println!(
                    "{:5} {:6.3} {:8.1} Hz {}",
                    i,
                    detection.score,
                    spectrum.peak_hz,
                    if detection.detected { "SNORE" } else { "-" }
                );
            }
            Ok(())
        }
    }
}

fn record(
    storage: &FsStorage,
    config: &Config,
    wav: &Path,
    label: u8,
    dataset: &Path,
    erase: bool,
) -> anyhow::Result<()> {
    let bands = config.acquisition.bands;
    if erase || !storage.exists(dataset) {
        recording::create(storage, dataset, bands)?;
        tracing::info!(?dataset, bands, "dataset erased");
    } else {
        let existing = recording::load(storage, dataset, &config.dataset)?;
        if existing.bands != bands {
            bail!(
                "{} holds {} bands, configuration asks for {}",
                dataset.display(),
                existing.bands,
                bands
            );
        }
    }
    let rows = wav_features(wav, &config.acquisition)?;
    for (features, _) in &rows {
        recording::append(storage, dataset, features, label)?;
    }
    tracing::info!(rows = rows.len(), label, ?dataset, "recorded");
    Ok(())
}

fn train_model(
    storage: &FsStorage,
    config: &Config,
    dataset: &Path,
    model: &Path,
) -> anyhow::Result<()> {
    let recording = recording::load(storage, dataset, &config.dataset)?;
    tracing::info!(
        samples = recording.rows.len(),
        bands = recording.bands,
        "dataset read"
    );
    let mut data = Dataset::from_recording(recording);
    let mut rng = match config.training.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    data.shuffle(&mut rng);

    let mut trainer = Trainer::new(config.training.clone(), SystemClock::new());
    let (report, evaluations) = trainer.run(data)?;
    let network = trainer
        .into_network()
        .context("trainer finished without a network")?;
    network.save(storage.open_write(model)?)?;
    tracing::info!(?model, "network saved");

    println!(
        "Training done in {} ms after {} epochs, error {:.4}",
        report.elapsed_ms, report.epochs, report.error
    );
    println!(
        "Testing on unknown data: {} errors over {} samples : error rate {:.2}%",
        evaluations.test.errors,
        evaluations.test.samples,
        evaluations.test.rate()
    );
    println!(
        "Testing over the training set: {} errors on {} samples : error rate {:.2}%",
        evaluations.train.errors,
        evaluations.train.samples,
        evaluations.train.rate()
    );
    Ok(())
}

fn load_network(storage: &FsStorage, config: &Config, model: &Path) -> anyhow::Result<Network> {
    let reader = storage
        .open_read(model)
        .with_context(|| format!("loading network {}", model.display()))?;
    Ok(Network::load(reader, config.training.activation)?)
}

/// Frame a WAV file into acquisition windows and extract the features of each.
fn wav_features(
    path: &Path,
    config: &AcquisitionConfig,
) -> anyhow::Result<Vec<(FeatureVector, Spectrum)>> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        bail!("only 16-bit integer WAV files are supported");
    }
    let channels = usize::from(spec.channels.max(1));
    let samples: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    // Keep the first channel and rescale to the 12-bit range of the ADC.
    let readings: Vec<u16> = samples
        .iter()
        .step_by(channels)
        .map(|&s| ((i32::from(s) + 32768) >> 4) as u16)
        .collect();

    let layout = config.layout()?;
    let n = layout.samples();
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n];
    let mut rows = Vec::new();
    for frame in readings.chunks_exact(n) {
        for (x, &r) in buffer.iter_mut().zip(frame) {
            *x = Complex::new(f32::from(r), 0.0);
        }
        acquire::spectrum(&mut buffer, config.log2_samples, config.window);
        let amplitude = acquire::block_amplitude(frame, config);
        let summary = Spectrum::summarize(&buffer, spec.sample_rate as f32);
        rows.push((features::extract(&buffer, &layout, amplitude), summary));
    }
    Ok(rows)
}
