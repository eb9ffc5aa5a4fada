//! A tiny feed-forward network with exactly one hidden layer.
//!
//! All weights live in a single buffer: the input-to-hidden block (`hidden × inputs`,
//! row-major by hidden neuron) immediately followed by the hidden-to-output block
//! (`outputs × hidden`, row-major by output neuron). [`Network::input_weights`] and
//! [`Network::output_weights`] are borrowed views into that buffer, so an update made
//! through one is visible in [`Network::weights`]. There is one bias per layer.

use std::io::{BufRead, Write};

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::{
    error::{Error, Result},
    store::model,
};

pub mod activation;

use activation::Activation;

/// The layer sizes of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// Number of inputs.
    pub inputs: usize,
    /// Number of hidden neurons.
    pub hidden: usize,
    /// Number of outputs.
    pub outputs: usize,
}

impl Topology {
    /// Create a topology. Every layer needs at least one neuron, and the weight count must
    /// fit in a `usize`.
    pub fn new(inputs: usize, hidden: usize, outputs: usize) -> Result<Self> {
        let invalid = Error::InvalidTopology {
            inputs,
            hidden,
            outputs,
        };
        if inputs == 0 || hidden == 0 || outputs == 0 {
            return Err(invalid);
        }
        let weights = inputs
            .checked_add(outputs)
            .and_then(|n| n.checked_mul(hidden));
        if weights.is_none() {
            return Err(invalid);
        }
        Ok(Self {
            inputs,
            hidden,
            outputs,
        })
    }

    /// Number of weights in both blocks.
    pub fn weight_count(&self) -> usize {
        self.hidden * (self.inputs + self.outputs)
    }

    fn input_weight_count(&self) -> usize {
        self.hidden * self.inputs
    }
}

/// Number of biases. Always one per layer.
pub const BIASES: usize = 2;

/// A network owning its weights, biases and the activations of its last forward pass.
#[derive(Debug, Clone)]
pub struct Network {
    topology: Topology,
    activation: Activation,
    weights: Vec<f32>,
    biases: [f32; BIASES],
    hidden: Vec<f32>,
    output: Vec<f32>,
}

/// Half the squared distance between a target and an output.
#[inline]
fn err(a: f32, b: f32) -> f32 {
    0.5 * (a - b) * (a - b)
}

/// Partial derivative of [`err`] with respect to the output.
#[inline]
fn pderr(a: f32, b: f32) -> f32 {
    a - b
}

/// Sum of [`err`] over every output.
pub fn total_error(target: &[f32], output: &[f32]) -> f32 {
    target.iter().zip(output).map(|(t, o)| err(*t, *o)).sum()
}

impl Network {
    /// Create a network with all parameters and activations set to zero.
    pub fn zeroed(topology: Topology, activation: Activation) -> Self {
        Self {
            topology,
            activation,
            weights: vec![0.0; topology.weight_count()],
            biases: [0.0; BIASES],
            hidden: vec![0.0; topology.hidden],
            output: vec![0.0; topology.outputs],
        }
    }

    /// Create a network with every weight and bias drawn uniformly from `[-0.5, 0.5)`.
    pub fn build<R>(topology: Topology, activation: Activation, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::build_with(topology, activation, rng, Uniform::new(-0.5f32, 0.5))
    }

    /// Create a network with every weight and bias drawn from `distribution`.
    pub fn build_with<R, D>(
        topology: Topology,
        activation: Activation,
        rng: &mut R,
        distribution: D,
    ) -> Self
    where
        R: Rng + ?Sized,
        D: Distribution<f32>,
    {
        let mut network = Self::zeroed(topology, activation);
        network
            .weights
            .iter_mut()
            .for_each(|w| *w = distribution.sample(rng));
        network
            .biases
            .iter_mut()
            .for_each(|b| *b = distribution.sample(rng));
        network
    }

    /// Read a network saved with [`Network::save`].
    ///
    /// The activation of the hidden layer is not part of the file format.
    pub fn load<R: BufRead>(reader: R, activation: Activation) -> Result<Self> {
        model::read(reader, activation)
    }

    /// Write the topology, biases and weights as text.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        model::write(self, writer)
    }

    /// Release the network. Dropping it has the same effect.
    pub fn free(self) {}

    /// Return the layer sizes.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Return the activation of the hidden layer.
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Return both weight blocks, input-to-hidden first.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Return both weight blocks mutably, input-to-hidden first.
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// Return the input-to-hidden weights. Weight `j` of hidden neuron `i` is at
    /// `i * inputs + j`.
    pub fn input_weights(&self) -> &[f32] {
        &self.weights[..self.topology.input_weight_count()]
    }

    /// Return the hidden-to-output weights. Weight `j` of output neuron `i` is at
    /// `i * hidden + j`.
    pub fn output_weights(&self) -> &[f32] {
        &self.weights[self.topology.input_weight_count()..]
    }

    /// Return both weight blocks as separate mutable views.
    pub fn weight_blocks_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        let split = self.topology.input_weight_count();
        self.weights.split_at_mut(split)
    }

    /// Return the hidden and output layer biases.
    pub fn biases(&self) -> &[f32; BIASES] {
        &self.biases
    }

    /// Return the hidden and output layer biases mutably.
    pub fn biases_mut(&mut self) -> &mut [f32; BIASES] {
        &mut self.biases
    }

    /// Return the hidden activations of the last forward pass.
    pub fn hidden(&self) -> &[f32] {
        &self.hidden
    }

    /// Run forward propagation and return the outputs.
    ///
    /// The returned slice is owned by the network and overwritten by the next call to
    /// `predict` or `train`.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not have one value per network input.
    pub fn predict(&mut self, input: &[f32]) -> &[f32] {
        self.forward(input);
        &self.output
    }

    /// Train on a single example and return its error, summed over the outputs.
    ///
    /// The error is measured on the outputs of the forward pass, before the weights are
    /// updated. Biases are not trained.
    ///
    /// # Panics
    ///
    /// Panics if `input` or `target` do not match the topology.
    pub fn train(&mut self, input: &[f32], target: &[f32], rate: f32) -> f32 {
        assert_eq!(target.len(), self.topology.outputs, "unexpected target length");
        self.forward(input);
        self.backward(input, target, rate);
        total_error(target, &self.output)
    }

    fn forward(&mut self, input: &[f32]) {
        let Topology {
            inputs,
            hidden,
            outputs: _,
        } = self.topology;
        assert_eq!(input.len(), inputs, "unexpected input length");
        let (w, x) = self.weights.split_at(self.topology.input_weight_count());
        for (i, h) in self.hidden.iter_mut().enumerate() {
            let row = &w[i * inputs..(i + 1) * inputs];
            let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
            *h = self.activation.apply(sum + self.biases[0]);
        }
        for (i, o) in self.output.iter_mut().enumerate() {
            let row = &x[i * hidden..(i + 1) * hidden];
            let sum: f32 = row.iter().zip(&self.hidden).map(|(x, h)| x * h).sum();
            // The output layer is always sigmoid, whatever the hidden activation.
            *o = Activation::Sigmoid.apply(sum + self.biases[1]);
        }
    }

    fn backward(&mut self, input: &[f32], target: &[f32], rate: f32) {
        let Topology {
            inputs,
            hidden,
            outputs,
        } = self.topology;
        let split = self.topology.input_weight_count();
        let (w, x) = self.weights.split_at_mut(split);
        for i in 0..hidden {
            let mut sum = 0.0f32;
            for j in 0..outputs {
                let a = pderr(self.output[j], target[j]);
                let b = Activation::Sigmoid.derivative(self.output[j]);
                let k = j * hidden + i;
                sum += a * b * x[k];
                x[k] -= rate * a * b * self.hidden[i];
            }
            let delta = rate * sum * self.activation.derivative(self.hidden[i]);
            let row = &mut w[i * inputs..(i + 1) * inputs];
            for (w, x) in row.iter_mut().zip(input) {
                *w -= delta * x;
            }
        }
    }
}
