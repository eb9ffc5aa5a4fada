//! Runtime settings, loadable from a JSON file.

use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    features::{BandLayout, Magnitude},
    fft::window::WindowKind,
    tinn::activation::Activation,
};

/// All tunables of the recorder, the trainer and the detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sampling and feature extraction.
    pub acquisition: AcquisitionConfig,
    /// Dataset loading.
    pub dataset: DatasetConfig,
    /// Network shape and training schedule.
    pub training: TrainConfig,
    /// Inference.
    pub detect: DetectConfig,
}

impl Config {
    /// Parse a configuration; missing fields take their default value.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }
}

/// Sampling and feature extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// log2 of the number of samples per acquisition window.
    pub log2_samples: u32,
    /// Highest frequency of interest in kHz. Sampling runs at twice this rate.
    pub max_freq_khz: u32,
    /// Weighting applied before the transform.
    pub window: WindowKind,
    /// Number of frequency bands in a feature vector.
    pub bands: usize,
    /// Bin value averaged into each band.
    pub magnitude: Magnitude,
    /// Length of the peak-to-peak amplitude measurement.
    pub amplitude_window_us: u64,
    /// Subtracted from the raw peak-to-peak amplitude (microphone noise floor).
    pub amplitude_offset: u32,
    /// Upper bound of the amplitude.
    pub amplitude_max: u32,
}

impl AcquisitionConfig {
    /// Number of samples per acquisition window.
    pub fn samples(&self) -> usize {
        1 << self.log2_samples
    }

    /// Check the transform length and derive the band layout from it.
    pub fn layout(&self) -> Result<BandLayout> {
        if self.log2_samples == 0 || self.log2_samples > 16 {
            return Err(Error::InvalidLog2(self.log2_samples));
        }
        Ok(BandLayout::new(self.samples(), self.bands)?.with_magnitude(self.magnitude))
    }

    /// Sampling rate in Hz.
    pub fn sample_rate_hz(&self) -> u32 {
        2 * 1000 * self.max_freq_khz
    }

    /// Time between two samples in microseconds, rounded to the nearest integer.
    pub fn sampling_period_us(&self) -> u64 {
        let rate = u64::from(self.sample_rate_hz().max(1));
        (1_000_000 + rate / 2) / rate
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            log2_samples: 8,
            max_freq_khz: 20,
            window: WindowKind::Hamming,
            bands: 32,
            magnitude: Magnitude::Modulus,
            amplitude_window_us: 1000,
            amplitude_offset: 70,
            amplitude_max: 500,
        }
    }
}

/// Recording file loading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Every recorded value is divided by this when loaded.
    pub attenuation: f32,
    /// Rows past this count are ignored.
    pub max_rows: usize,
    /// Largest band count accepted from a recording header.
    pub max_inputs: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            attenuation: 500.0,
            max_rows: 1000,
            max_inputs: 128,
        }
    }
}

/// Network shape and training schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Share of the rows used for training, the rest is held out for testing.
    pub ratio: f32,
    /// Number of epochs.
    pub epochs: usize,
    /// Neurons in the hidden layer.
    pub hidden: usize,
    /// Activation of the hidden layer. The output layer is always sigmoid.
    pub activation: Activation,
    /// Rows trained on per epoch.
    pub batch: usize,
    /// Initial learning rate.
    pub learning_rate: f32,
    /// Learning rate multiplier applied after every epoch.
    pub anneal: f32,
    /// Training stops early once the batch error percentage is below this.
    pub max_error: f32,
    /// Early stopping is only considered past this epoch.
    pub warmup: usize,
    /// A prediction is correct if it is within this distance of the target.
    pub tolerance: f32,
    /// Seed for weight initialization and batch sampling.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            ratio: 0.8,
            epochs: 6000,
            hidden: 40,
            activation: Activation::Relu,
            batch: 50,
            learning_rate: 1.0,
            anneal: 0.9999,
            max_error: 0.0005,
            warmup: 2000,
            tolerance: 0.2,
            seed: None,
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Scores above this are detections.
    pub threshold: f32,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self { threshold: 0.9 }
    }
}
