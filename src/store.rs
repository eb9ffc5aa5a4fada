//! Persistence of recordings and networks as delimited text.

pub mod model;
pub mod recording;
pub mod scan;
pub mod storage;

pub use storage::{FsStorage, MemStorage, Storage};
