//! Turns a transformed buffer into the band-averaged feature vector fed to the network.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    fft::Sample,
};

/// First bin of the lowest band. DC and the bins right above it carry the microphone bias
/// and are left out.
pub const FIRST_BIN: usize = 3;

/// The value of a spectrum bin that is averaged into a band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Magnitude {
    /// The complex modulus `|re + i·im|`.
    #[default]
    Modulus,
    /// The absolute real part `|re|`, as computed by the recording firmware. Use this to
    /// score or extend datasets recorded on the device.
    RealPart,
}

impl Magnitude {
    /// Reduce one bin to a magnitude.
    #[inline]
    pub fn of(self, x: &Sample) -> f32 {
        match self {
            Self::Modulus => x.norm(),
            Self::RealPart => x.re.abs(),
        }
    }
}

/// How the lower half of an `N`-point spectrum is split into contiguous bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandLayout {
    samples: usize,
    bands: usize,
    bins_per_band: usize,
    magnitude: Magnitude,
}

impl BandLayout {
    /// Split the `samples / 2` useful bins of a spectrum into `bands` equal bands.
    pub fn new(samples: usize, bands: usize) -> Result<Self> {
        let bins_per_band = if bands == 0 { 0 } else { samples / bands / 2 };
        if bins_per_band <= FIRST_BIN {
            return Err(Error::InvalidBands { samples, bands });
        }
        Ok(Self {
            samples,
            bands,
            bins_per_band,
            magnitude: Magnitude::default(),
        })
    }

    /// Average `magnitude` instead of the complex modulus.
    pub fn with_magnitude(self, magnitude: Magnitude) -> Self {
        Self { magnitude, ..self }
    }

    /// The bin magnitude averaged into each band.
    pub fn magnitude(&self) -> Magnitude {
        self.magnitude
    }

    /// Number of bands.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Transform length the layout was made for.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Number of bins covered by every band except the first one.
    pub fn bins_per_band(&self) -> usize {
        self.bins_per_band
    }

    /// The half-open range of bins averaged into band `band`.
    pub fn range(&self, band: usize) -> std::ops::Range<usize> {
        let start = band * self.bins_per_band;
        let end = start + self.bins_per_band;
        start.max(FIRST_BIN)..end
    }
}

/// One recorded sample at the raw integer scale of the recording file.
///
/// Band values depend on the [`Magnitude`] of the layout they were extracted with. Rows
/// recorded by the device firmware hold [`Magnitude::RealPart`] means, which differ from
/// the default [`Magnitude::Modulus`] for the same signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    /// Mean bin magnitude of each band.
    pub bands: Vec<u32>,
    /// Peak-to-peak amplitude of the signal.
    pub amplitude: u32,
}

impl FeatureVector {
    /// The network input: every band followed by the amplitude, divided by `attenuation`.
    pub fn to_input(&self, attenuation: f32) -> Vec<f32> {
        self.bands
            .iter()
            .chain(std::iter::once(&self.amplitude))
            .map(|&v| v as f32 / attenuation)
            .collect()
    }
}

/// Average the bin magnitudes of `spectrum` over every band in `layout`, using the
/// layout's [`Magnitude`].
///
/// # Panics
///
/// Panics if `spectrum` is shorter than the layout's transform length.
pub fn band_means(spectrum: &[Sample], layout: &BandLayout) -> Vec<u32> {
    assert!(spectrum.len() >= layout.samples(), "spectrum shorter than band layout");
    (0..layout.bands())
        .map(|band| {
            let bins = &spectrum[layout.range(band)];
            let sum: f32 = bins.iter().map(|x| layout.magnitude.of(x)).sum();
            (sum / bins.len() as f32) as u32
        })
        .collect()
}

/// Build the feature vector of one acquisition from its spectrum and amplitude.
pub fn extract(spectrum: &[Sample], layout: &BandLayout, amplitude: u32) -> FeatureVector {
    FeatureVector {
        bands: band_means(spectrum, layout),
        amplitude,
    }
}

/// The strongest bin of a spectrum, as shown next to the spectrum display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spectrum {
    /// Index of the strongest bin.
    pub peak_bin: usize,
    /// Frequency of the strongest bin.
    pub peak_hz: f32,
    /// Magnitude of the strongest bin.
    pub peak_magnitude: f32,
}

impl Spectrum {
    /// Find the strongest bin between bin 2 and the Nyquist bin.
    pub fn summarize(spectrum: &[Sample], sample_rate_hz: f32) -> Self {
        let n = spectrum.len();
        let mut peak_bin = 0;
        let mut peak_magnitude = 0.0f32;
        for (i, x) in spectrum.iter().enumerate().take(n / 2).skip(2) {
            let magnitude = x.norm();
            if magnitude > peak_magnitude {
                peak_bin = i;
                peak_magnitude = magnitude;
            }
        }
        let peak_hz = if n == 0 {
            0.0
        } else {
            peak_bin as f32 * sample_rate_hz / n as f32
        };
        Self {
            peak_bin,
            peak_hz,
            peak_magnitude,
        }
    }
}

/// A consumer of spectra, typically a display.
pub trait SpectrumSink {
    /// Show one spectrum and its summary.
    fn show(&mut self, spectrum: &[Sample], summary: &Spectrum);
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl SpectrumSink for NoDisplay {
    fn show(&mut self, _spectrum: &[Sample], _summary: &Spectrum) {}
}
