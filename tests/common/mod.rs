#![allow(dead_code)]

use snore::fft::Sample;

pub fn assert_floats_eq(actual: &[f32], expected: &[f32], eps: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= eps,
            "element {}: expected {}, got {} (eps {})",
            i,
            e,
            a,
            eps
        );
    }
}

pub fn assert_samples_eq(actual: &[Sample], expected: &[Sample], eps: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).norm() <= eps,
            "bin {}: expected {}, got {} (eps {})",
            i,
            e,
            a,
            eps
        );
    }
}

pub fn real(values: &[f32]) -> Vec<Sample> {
    values.iter().map(|&v| Sample::new(v, 0.0)).collect()
}
