//! An acoustic classifier: band features from a radix-2 FFT, fed to a tiny neural network
//! with a single hidden layer.

#![deny(unsafe_code, rust_2018_idioms, rust_2021_compatibility)]
#![warn(missing_docs)]

pub mod acquire;
pub mod config;
pub mod dataset;
pub mod detect;
pub mod error;
pub mod features;
pub mod fft;
pub mod store;
pub mod tinn;
pub mod train;

pub use error::{Error, Result};
