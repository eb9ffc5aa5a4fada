//! The training driver: split, mini-batch training with annealing, and evaluation.

use rand::{rngs::StdRng, Rng, SeedableRng};

pub use crate::config::TrainConfig;
use crate::{
    acquire::Clock,
    dataset::Dataset,
    error::{Error, Result},
    tinn::{Network, Topology},
};

/// Where a [`Trainer`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded yet.
    Idle,
    /// The dataset is split and ready.
    DatasetLoaded,
    /// The epoch loop is running.
    Training,
    /// A trained network waits to be evaluated.
    Evaluating,
    /// Both splits have been evaluated.
    Done,
}

/// Return the sizes of the training prefix and the testing suffix.
///
/// The training size is `ratio × rows` rounded down, computed in single precision.
pub fn split_sizes(ratio: f32, rows: usize) -> (usize, usize) {
    let train = ((ratio * rows as f32) as usize).min(rows);
    (train, rows - train)
}

/// Swap each of the first `batch` rows with a row drawn uniformly from the whole dataset.
///
/// Rows are drawn with replacement across slots, so a batch may hold the same row twice
/// and miss others.
///
/// # Panics
///
/// Panics if `batch` exceeds the number of rows.
pub fn sample_batch<R>(data: &mut Dataset, batch: usize, rng: &mut R)
where
    R: Rng + ?Sized,
{
    assert!(batch <= data.rows(), "batch larger than dataset");
    let rows = data.rows();
    for a in 0..batch {
        let b = rng.gen_range(0..rows);
        data.swap(a, b);
    }
}

/// Misclassification counts over one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    /// Samples with a prediction further than the tolerance from the target.
    pub errors: usize,
    /// Samples evaluated.
    pub samples: usize,
}

impl Evaluation {
    /// Misclassified samples as a percentage. Zero for an empty dataset.
    pub fn rate(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.errors as f32 * 100.0 / self.samples as f32
        }
    }
}

/// Count the samples of `data` the network gets wrong.
///
/// A sample is correct if every output is within `tolerance` of its target. Fails if the
/// row widths of `data` do not match the network's layers.
pub fn evaluate(network: &mut Network, data: &Dataset, tolerance: f32) -> Result<Evaluation> {
    let topology = network.topology();
    for (what, layer, width) in [
        ("inputs", topology.inputs, data.nips()),
        ("outputs", topology.outputs, data.nops()),
    ] {
        if layer != width {
            return Err(Error::ShapeMismatch {
                what,
                network: layer,
                data: width,
            });
        }
    }
    let mut evaluation = Evaluation {
        errors: 0,
        samples: data.rows(),
    };
    for (row, (input, target)) in data.iter().enumerate() {
        let prediction = network.predict(input);
        let wrong = target
            .iter()
            .zip(prediction)
            .any(|(t, p)| (t - p).abs() > tolerance);
        if wrong {
            evaluation.errors += 1;
            tracing::debug!(row, expected = ?target, prediction = ?prediction, "NOK");
        }
    }
    Ok(evaluation)
}

/// Outcome of the epoch loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainReport {
    /// Epochs actually run.
    pub epochs: usize,
    /// Mean batch error of the last epoch, in percent.
    pub error: f32,
    /// Learning rate after the last epoch.
    pub learning_rate: f32,
    /// Whether the error target was reached before the last epoch.
    pub stopped_early: bool,
    /// Wall time of the epoch loop.
    pub elapsed_ms: u64,
}

/// Results on both splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluations {
    /// The held-out rows.
    pub test: Evaluation,
    /// The rows trained on.
    pub train: Evaluation,
}

/// Drives a network from a loaded dataset to an evaluated model.
#[derive(Debug)]
pub struct Trainer<C> {
    config: TrainConfig,
    clock: C,
    rng: StdRng,
    phase: Phase,
    train: Dataset,
    test: Dataset,
    network: Option<Network>,
}

impl<C: Clock> Trainer<C> {
    /// Create an idle trainer. Randomness is seeded from `config.seed` if set.
    pub fn new(config: TrainConfig, clock: C) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            clock,
            rng,
            phase: Phase::Idle,
            train: Dataset::default(),
            test: Dataset::default(),
            network: None,
        }
    }

    /// Return the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Return the training split.
    pub fn training_set(&self) -> &Dataset {
        &self.train
    }

    /// Return the testing split.
    pub fn testing_set(&self) -> &Dataset {
        &self.test
    }

    /// Return the network once it has been trained.
    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    /// Take the network out of the trainer.
    pub fn into_network(self) -> Option<Network> {
        self.network
    }

    fn expect(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidPhase {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    fn enter(&mut self, phase: Phase) {
        tracing::info!(from = ?self.phase, to = ?phase, "trainer phase");
        self.phase = phase;
    }

    /// Split `dataset` positionally into a training prefix and a testing suffix.
    pub fn load(&mut self, dataset: Dataset) -> Result<()> {
        self.expect(Phase::Idle)?;
        let rows = dataset.rows();
        let (n_train, n_test) = split_sizes(self.config.ratio, rows);
        if n_train == 0 {
            return Err(Error::EmptySplit {
                rows,
                ratio: self.config.ratio,
            });
        }
        let (train, test) = dataset.split(n_train);
        tracing::info!(rows, train = n_train, test = n_test, "dataset loaded");
        self.train = train;
        self.test = test;
        self.enter(Phase::DatasetLoaded);
        Ok(())
    }

    /// Build a fresh network and run the epoch loop over the training split.
    pub fn train(&mut self) -> Result<TrainReport> {
        self.expect(Phase::DatasetLoaded)?;
        let topology = Topology::new(self.train.nips(), self.config.hidden, self.train.nops())?;
        self.enter(Phase::Training);

        let mut network = Network::build(topology, self.config.activation, &mut self.rng);
        let batch = self.config.batch.min(self.train.rows());
        if batch < self.config.batch {
            tracing::warn!(
                requested = self.config.batch,
                batch,
                "batch clamped to the training split"
            );
        }
        let epochs = self.config.epochs;
        let log_every = (epochs / 20).max(1);
        tracing::info!(batch, epochs, ?topology, "training");

        let start = self.clock.now_millis();
        let mut rate = self.config.learning_rate;
        let mut report = TrainReport {
            epochs: 0,
            error: 0.0,
            learning_rate: rate,
            stopped_early: false,
            elapsed_ms: 0,
        };
        for epoch in 0..=epochs {
            sample_batch(&mut self.train, batch, &mut self.rng);
            let mut error = 0.0f32;
            for row in 0..batch {
                error += network.train(self.train.input(row), self.train.target(row), rate);
            }
            let err = if batch == 0 {
                0.0
            } else {
                error / batch as f32 * 100.0
            };
            report.epochs = epoch + 1;
            report.error = err;
            if err < self.config.max_error && epoch > self.config.warmup {
                tracing::info!(epoch, error = err, rate, "error target reached");
                report.stopped_early = true;
                report.learning_rate = rate;
                break;
            }
            if epoch % log_every == 0 {
                tracing::info!(epoch, error = err, rate, "epoch");
            }
            rate *= self.config.anneal;
            report.learning_rate = rate;
        }
        report.elapsed_ms = self.clock.now_millis().saturating_sub(start);
        tracing::info!(elapsed_ms = report.elapsed_ms, "training done");

        self.network = Some(network);
        self.enter(Phase::Evaluating);
        Ok(report)
    }

    /// Evaluate the trained network on the testing and the training split.
    pub fn evaluate(&mut self) -> Result<Evaluations> {
        self.expect(Phase::Evaluating)?;
        let Some(network) = self.network.as_mut() else {
            return Err(Error::InvalidPhase {
                expected: Phase::Evaluating,
                found: self.phase,
            });
        };
        let tolerance = self.config.tolerance;
        let test = evaluate(network, &self.test, tolerance)?;
        tracing::info!(
            errors = test.errors,
            samples = test.samples,
            rate = test.rate(),
            "testing on unknown data"
        );
        let train = evaluate(network, &self.train, tolerance)?;
        tracing::info!(
            errors = train.errors,
            samples = train.samples,
            rate = train.rate(),
            "testing over the training set"
        );
        self.enter(Phase::Done);
        Ok(Evaluations { test, train })
    }

    /// Load, train and evaluate in one go.
    pub fn run(&mut self, dataset: Dataset) -> Result<(TrainReport, Evaluations)> {
        self.load(dataset)?;
        let report = self.train()?;
        let evaluations = self.evaluate()?;
        Ok((report, evaluations))
    }
}
