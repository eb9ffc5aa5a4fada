//! Inference over recorded feature vectors.

use crate::{
    error::{Error, Result},
    features::FeatureVector,
    tinn::Network,
};

/// The verdict on one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// The first network output.
    pub score: f32,
    /// Whether the score is above the threshold.
    pub detected: bool,
}

/// Scores feature vectors with a trained network.
#[derive(Debug)]
pub struct Detector {
    network: Network,
    attenuation: f32,
    threshold: f32,
}

impl Detector {
    /// Wrap a network that scores feature vectors of `bands` bands. Features are divided by
    /// `attenuation` before prediction, the same way recordings are when loaded for training.
    ///
    /// The network must take one input per band plus the amplitude.
    pub fn new(network: Network, bands: usize, attenuation: f32, threshold: f32) -> Result<Self> {
        check_inputs(&network, bands + 1)?;
        Ok(Self {
            network,
            attenuation,
            threshold,
        })
    }

    /// Return the wrapped network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Score one feature vector.
    pub fn detect(&mut self, features: &FeatureVector) -> Result<Detection> {
        check_inputs(&self.network, features.bands.len() + 1)?;
        let input = features.to_input(self.attenuation);
        let score = self.network.predict(&input)[0];
        Ok(Detection {
            score,
            detected: score > self.threshold,
        })
    }
}

fn check_inputs(network: &Network, inputs: usize) -> Result<()> {
    let expected = network.topology().inputs;
    if expected != inputs {
        return Err(Error::ShapeMismatch {
            what: "inputs",
            network: expected,
            data: inputs,
        });
    }
    Ok(())
}
