//! Neuron activation functions.

use serde::{Deserialize, Serialize};

/// The activation of a layer of neurons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `1 / (1 + e^-a)`.
    Sigmoid,
    /// `max(a, 0)`.
    Relu,
}

impl Activation {
    /// Apply the activation to a weighted sum.
    #[inline]
    pub fn apply(self, a: f32) -> f32 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-a).exp()),
            Self::Relu => {
                if a > 0.0 {
                    a
                } else {
                    0.0
                }
            }
        }
    }

    /// The derivative of the activation, expressed in terms of its own output.
    #[inline]
    pub fn derivative(self, out: f32) -> f32 {
        match self {
            Self::Sigmoid => out * (1.0 - out),
            Self::Relu => {
                if out > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}
