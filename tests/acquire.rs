use std::f32::consts::PI;

use snore::{
    acquire::{self, Clock, ManualClock, Sampler},
    config::AcquisitionConfig,
    Error,
};

#[test]
fn manual_clock_steps_on_every_reading() {
    let clock = ManualClock::new(5);
    assert_eq!(clock.now_micros(), 0);
    assert_eq!(clock.now_micros(), 5);
    clock.advance(100);
    assert_eq!(clock.now_micros(), 110);
    clock.wait_until(1000);
    assert_eq!(clock.now_micros(), 1000);
    clock.wait_until(10);
    assert_eq!(clock.now_micros(), 1005);
    assert_eq!(clock.now_millis(), 1);
}

#[test]
fn default_rate_is_twice_the_max_frequency() {
    let config = AcquisitionConfig::default();
    assert_eq!(config.samples(), 256);
    assert_eq!(config.sample_rate_hz(), 40_000);
    assert_eq!(config.sampling_period_us(), 25);
    let odd = AcquisitionConfig {
        max_freq_khz: 3,
        ..AcquisitionConfig::default()
    };
    // 166.67 µs rounds up.
    assert_eq!(odd.sampling_period_us(), 167);
}

#[test]
fn acquire_paces_one_reading_per_period() {
    let mut next = 0u16;
    let source = move || {
        next += 1;
        next - 1
    };
    let config = AcquisitionConfig::default();
    let mut sampler = Sampler::new(source, ManualClock::new(0), config).unwrap();
    let mut buffer = sampler.buffer();
    sampler.acquire(&mut buffer);
    for (i, x) in buffer.iter().enumerate() {
        assert_eq!(x.re, i as f32);
        assert_eq!(x.im, 0.0);
    }
}

/// A source alternating between two readings.
fn swing(lo: u16, hi: u16) -> impl FnMut() -> u16 {
    let mut high = false;
    move || {
        high = !high;
        if high {
            hi
        } else {
            lo
        }
    }
}

#[test]
fn amplitude_is_offset_and_clamped() {
    let config = AcquisitionConfig::default();
    let clock = || ManualClock::new(10);
    let mut sampler = Sampler::new(swing(1000, 1200), clock(), config.clone()).unwrap();
    assert_eq!(sampler.amplitude(), 130);

    let mut sampler = Sampler::new(swing(0, 4095), clock(), config.clone()).unwrap();
    assert_eq!(sampler.amplitude(), 500);

    let mut sampler = Sampler::new(swing(2000, 2050), clock(), config).unwrap();
    assert_eq!(sampler.amplitude(), 0);
}

#[test]
fn block_amplitude_matches_sampler() {
    let config = AcquisitionConfig::default();
    assert_eq!(acquire::block_amplitude(&[1000, 1200, 1100], &config), 130);
    assert_eq!(acquire::block_amplitude(&[0, 4095], &config), 500);
    assert_eq!(acquire::block_amplitude(&[], &config), 0);
}

#[test]
fn record_finds_the_band_of_a_tone() {
    let config = AcquisitionConfig::default();
    let n = config.samples();
    // Bin 40 of 256 is in band 10 with 4 bins per band.
    let mut i = 0usize;
    let source = move || {
        let phase = 2.0 * PI * 40.0 * (i % n) as f32 / n as f32;
        i += 1;
        (2048.0 + 1000.0 * phase.sin()) as u16
    };
    let mut sampler = Sampler::new(source, ManualClock::new(25), config).unwrap();
    assert_eq!(sampler.layout().bins_per_band(), 4);
    let mut buffer = sampler.buffer();
    let features = sampler.record(&mut buffer);
    assert_eq!(features.bands.len(), 32);
    let loudest = features
        .bands
        .iter()
        .enumerate()
        .max_by_key(|(_, v)| **v)
        .map(|(band, _)| band);
    assert_eq!(loudest, Some(10));
    assert_eq!(features.amplitude, 500);
}

#[test]
fn sampler_rejects_bad_transform_lengths() {
    let source = || 0u16;
    for log2_samples in [0, 17] {
        let config = AcquisitionConfig {
            log2_samples,
            ..AcquisitionConfig::default()
        };
        let err = Sampler::new(source, ManualClock::new(1), config).unwrap_err();
        assert!(matches!(err, Error::InvalidLog2(l) if l == log2_samples), "{:?}", err);
    }
    let config = AcquisitionConfig {
        bands: 64,
        ..AcquisitionConfig::default()
    };
    let err = Sampler::new(source, ManualClock::new(1), config).unwrap_err();
    assert!(
        matches!(err, Error::InvalidBands { samples: 256, bands: 64 }),
        "{:?}",
        err
    );
}
