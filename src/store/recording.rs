//! Append-only recording of labeled feature vectors.
//!
//! The first line holds the band count. Every following line holds the band values, the
//! amplitude and the integer label, separated by spaces, at the raw integer scale of
//! [`FeatureVector`]. Values are divided by the configured attenuation when loaded.

use std::{
    io::{BufRead, Write},
    path::Path,
};

use crate::{
    config::DatasetConfig,
    error::{Error, Result},
    features::FeatureVector,
    store::{scan::Scanner, storage::Storage},
};

/// One loaded row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Band values followed by the amplitude, attenuated.
    pub input: Vec<f32>,
    /// Class of the sample.
    pub label: u8,
}

/// A loaded recording file.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Band count from the header.
    pub bands: usize,
    /// Rows in file order.
    pub rows: Vec<Row>,
}

impl Recording {
    /// Number of network inputs per row: every band plus the amplitude.
    pub fn inputs(&self) -> usize {
        self.bands + 1
    }
}

/// Erase `path` and start a new recording with the given band count.
pub fn create<S: Storage>(storage: &S, path: &Path, bands: usize) -> Result<()> {
    storage.remove(path)?;
    let mut writer = storage.open_write(path)?;
    write_header(&mut writer, bands)?;
    writer.flush()?;
    Ok(())
}

/// Append one labeled sample to the recording at `path`.
pub fn append<S: Storage>(
    storage: &S,
    path: &Path,
    sample: &FeatureVector,
    label: u8,
) -> Result<()> {
    let mut writer = storage.open_append(path)?;
    write_row(&mut writer, sample, label)?;
    writer.flush()?;
    Ok(())
}

/// Write the header line.
pub fn write_header<W: Write>(mut writer: W, bands: usize) -> Result<()> {
    writeln!(writer, "{}", bands)?;
    Ok(())
}

/// Write one row.
pub fn write_row<W: Write>(mut writer: W, sample: &FeatureVector, label: u8) -> Result<()> {
    for band in &sample.bands {
        write!(writer, "{} ", band)?;
    }
    writeln!(writer, "{} {}", sample.amplitude, label)?;
    Ok(())
}

/// Load the recording stored at `path`.
pub fn load<S: Storage>(storage: &S, path: &Path, config: &DatasetConfig) -> Result<Recording> {
    if !storage.exists(path) {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    read(storage.open_read(path)?, config)
}

/// Parse a recording.
///
/// Rows whose field count does not match the header are skipped, and reading stops after
/// `config.max_rows` rows.
pub fn read<R: BufRead>(reader: R, config: &DatasetConfig) -> Result<Recording> {
    let mut scanner = Scanner::new(reader);
    let bands = read_header(&mut scanner)?;
    if bands > config.max_inputs {
        return Err(Error::TooManyInputs {
            bands,
            max: config.max_inputs,
        });
    }
    let mut rows = Vec::new();
    let mut line = Vec::with_capacity(bands + 2);
    while read_line(&mut scanner, &mut line)? {
        if line.is_empty() {
            continue;
        }
        if rows.len() == config.max_rows {
            tracing::warn!(max_rows = config.max_rows, "recording truncated");
            break;
        }
        if line.len() != bands + 2 {
            tracing::warn!(
                row = rows.len(),
                fields = line.len(),
                expected = bands + 2,
                "skipping malformed row"
            );
            continue;
        }
        let label = line[bands + 1].clamp(0, i64::from(u8::MAX)) as u8;
        let input = line[..=bands]
            .iter()
            .map(|&v| v as f32 / config.attenuation)
            .collect();
        rows.push(Row { input, label });
    }
    Ok(Recording { bands, rows })
}

fn read_header<R: BufRead>(scanner: &mut Scanner<R>) -> Result<usize> {
    let mut header = Vec::new();
    if !read_line(scanner, &mut header)? || header.is_empty() {
        return Err(Error::UnexpectedEof {
            what: "recording header",
        });
    }
    Ok(header[0].max(0) as usize)
}

/// Read the fields of one line into `line`, leaving it empty for a blank line.
///
/// Returns `false` once the stream is exhausted.
fn read_line<R: BufRead>(scanner: &mut Scanner<R>, line: &mut Vec<i64>) -> Result<bool> {
    line.clear();
    loop {
        let Some(field) = scanner.read_int()? else {
            return Ok(!line.is_empty());
        };
        if !field.empty {
            line.push(field.value);
        }
        if field.terminator.ends_line() {
            return Ok(true);
        }
    }
}
