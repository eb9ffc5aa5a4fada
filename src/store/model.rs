//! Text format of a saved network.
//!
//! ```text
//! <inputs> <hidden> <outputs>
//! <bias 0>
//! <bias 1>
//! <weight 0>
//! ...
//! ```
//!
//! Values are written in fixed-point decimal with six fraction digits, input-to-hidden
//! weights first.

use std::io::{BufRead, Write};

use crate::{
    error::{Error, Result},
    store::scan::Scanner,
    tinn::{activation::Activation, Network, Topology},
};

/// Write `network` to `writer` and flush it.
///
/// Non-finite parameters are written as-is and logged, [`read`] turns them into zero.
pub fn write<W: Write>(network: &Network, mut writer: W) -> Result<()> {
    let t = network.topology();
    let non_finite = network
        .biases()
        .iter()
        .chain(network.weights())
        .filter(|v| !v.is_finite())
        .count();
    if non_finite > 0 {
        tracing::warn!(non_finite, "saving non-finite network parameters, they load as zero");
    }
    writeln!(writer, "{} {} {}", t.inputs, t.hidden, t.outputs)?;
    for b in network.biases() {
        writeln!(writer, "{:.6}", b)?;
    }
    for w in network.weights() {
        writeln!(writer, "{:.6}", w)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a network written by [`write`].
pub fn read<R: BufRead>(reader: R, activation: Activation) -> Result<Network> {
    let mut scanner = Scanner::new(reader);
    let mut header = [0usize; 3];
    for h in header.iter_mut() {
        let field = scanner
            .read_int()?
            .ok_or(Error::UnexpectedEof { what: "model header" })?;
        *h = field.value.max(0) as usize;
    }
    let [inputs, hidden, outputs] = header;
    let topology = Topology::new(inputs, hidden, outputs)?;
    let mut network = Network::zeroed(topology, activation);
    for b in network.biases_mut().iter_mut() {
        *b = read_value(&mut scanner, "model biases")?;
    }
    for w in network.weights_mut().iter_mut() {
        *w = read_value(&mut scanner, "model weights")?;
    }
    Ok(network)
}

fn read_value<R: BufRead>(scanner: &mut Scanner<R>, what: &'static str) -> Result<f32> {
    scanner
        .read_float()?
        .map(|f| f.value)
        .ok_or(Error::UnexpectedEof { what })
}
