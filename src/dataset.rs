//! Data structures and methods for dealing with datasets.

use rand::Rng;

use crate::store::recording::Recording;

/// Parallel input and target rows.
///
/// Every row is its own allocation, so reordering rows moves pointers and never copies
/// row contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    inputs: Vec<Box<[f32]>>,
    targets: Vec<Box<[f32]>>,
    nips: usize,
    nops: usize,
}

impl Dataset {
    /// Create an empty dataset with the given row widths.
    pub fn new(nips: usize, nops: usize) -> Self {
        Self {
            inputs: Vec::new(),
            targets: Vec::new(),
            nips,
            nops,
        }
    }

    /// Build a single-output dataset whose target is the row label.
    pub fn from_recording(recording: Recording) -> Self {
        let mut dataset = Self::new(recording.inputs(), 1);
        for row in recording.rows {
            dataset.push(row.input, vec![f32::from(row.label)]);
        }
        dataset
    }

    /// Append a row.
    ///
    /// # Panics
    ///
    /// Panics if the row widths do not match the dataset.
    pub fn push(&mut self, input: Vec<f32>, target: Vec<f32>) {
        assert_eq!(input.len(), self.nips, "unexpected input width");
        assert_eq!(target.len(), self.nops, "unexpected target width");
        self.inputs.push(input.into_boxed_slice());
        self.targets.push(target.into_boxed_slice());
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Width of an input row.
    pub fn nips(&self) -> usize {
        self.nips
    }

    /// Width of a target row.
    pub fn nops(&self) -> usize {
        self.nops
    }

    /// Input row `row`.
    pub fn input(&self, row: usize) -> &[f32] {
        &self.inputs[row]
    }

    /// Target row `row`.
    pub fn target(&self, row: usize) -> &[f32] {
        &self.targets[row]
    }

    /// Iterate over `(input, target)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f32], &[f32])> {
        self.inputs
            .iter()
            .zip(&self.targets)
            .map(|(i, t)| (&i[..], &t[..]))
    }

    /// Swap two rows.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.inputs.swap(a, b);
        self.targets.swap(a, b);
    }

    /// Put the rows in a uniformly random order.
    pub fn shuffle<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for i in (1..self.rows()).rev() {
            let j = rng.gen_range(0..=i);
            self.swap(i, j);
        }
    }

    /// Move the first `n` rows into one dataset and the remaining rows into another.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.rows()`.
    pub fn split(mut self, n: usize) -> (Dataset, Dataset) {
        let inputs = self.inputs.split_off(n);
        let targets = self.targets.split_off(n);
        let rest = Dataset {
            inputs,
            targets,
            nips: self.nips,
            nops: self.nops,
        };
        (self, rest)
    }
}
