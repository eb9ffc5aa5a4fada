//! Paced sampling of an analog source.

use std::{
    cell::Cell,
    fmt,
    time::{Duration, Instant},
};

use num::Complex;

use crate::{
    config::AcquisitionConfig,
    error::Result,
    features::{self, BandLayout, FeatureVector},
    fft::{self, window, Direction, Sample},
};

/// A monotonic microsecond clock.
pub trait Clock {
    /// Microseconds elapsed since an arbitrary fixed origin.
    fn now_micros(&self) -> u64;

    /// Block until `now_micros()` reaches `deadline`.
    fn wait_until(&self, deadline: u64);

    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn now_millis(&self) -> u64 {
        self.now_micros() / 1000
    }
}

/// The wall clock of the host.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn wait_until(&self, deadline: u64) {
        let now = self.now_micros();
        if deadline > now {
            std::thread::sleep(Duration::from_micros(deadline - now));
        }
    }
}

/// A deterministic clock that moves forward by `step` microseconds on every reading.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    step: u64,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, micros: u64) {
        self.now.set(self.now.get() + micros);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }

    fn wait_until(&self, deadline: u64) {
        if deadline > self.now.get() {
            self.now.set(deadline);
        }
    }
}

/// A source of raw ADC readings.
pub trait AnalogSource {
    /// Take one reading.
    fn read(&mut self) -> u16;
}

impl<F> AnalogSource for F
where
    F: FnMut() -> u16,
{
    fn read(&mut self) -> u16 {
        self()
    }
}

/// Acquires fixed-rate sample windows from an analog source.
pub struct Sampler<S, C> {
    source: S,
    clock: C,
    config: AcquisitionConfig,
    layout: BandLayout,
}

impl<S, C: fmt::Debug> fmt::Debug for Sampler<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl<S, C> Sampler<S, C>
where
    S: AnalogSource,
    C: Clock,
{
    /// Create a sampler for the given acquisition settings.
    pub fn new(source: S, clock: C, config: AcquisitionConfig) -> Result<Self> {
        let layout = config.layout()?;
        Ok(Self {
            source,
            clock,
            config,
            layout,
        })
    }

    /// The band layout used by [`Sampler::record`].
    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    /// Allocate a buffer with the transform length.
    pub fn buffer(&self) -> Vec<Sample> {
        vec![Complex::new(0.0, 0.0); self.config.samples()]
    }

    /// Fill `buffer` with one reading per sampling period.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length is not the configured transform length.
    pub fn acquire(&mut self, buffer: &mut [Sample]) {
        assert_eq!(buffer.len(), self.config.samples(), "unexpected buffer length");
        let period = self.config.sampling_period_us();
        let mut deadline = self.clock.now_micros();
        for x in buffer.iter_mut() {
            *x = Complex::new(f32::from(self.source.read()), 0.0);
            deadline += period;
            self.clock.wait_until(deadline);
        }
    }

    /// Peak-to-peak amplitude over the amplitude window, offset and clamped.
    pub fn amplitude(&mut self) -> u32 {
        let mut max = u16::MIN;
        let mut min = u16::MAX;
        let start = self.clock.now_micros();
        while self.clock.now_micros() - start < self.config.amplitude_window_us {
            let reading = self.source.read();
            max = max.max(reading);
            min = min.min(reading);
        }
        let peak_to_peak = i64::from(max.saturating_sub(min));
        let amplitude = peak_to_peak - i64::from(self.config.amplitude_offset);
        amplitude.clamp(0, i64::from(self.config.amplitude_max)) as u32
    }

    /// Acquire a window, weight it, transform it in place and extract its features.
    ///
    /// `buffer` holds the spectrum afterwards.
    pub fn record(&mut self, buffer: &mut [Sample]) -> FeatureVector {
        self.acquire(buffer);
        spectrum(buffer, self.config.log2_samples, self.config.window);
        let amplitude = self.amplitude();
        features::extract(buffer, &self.layout, amplitude)
    }
}

/// Window and transform a time-domain buffer in place.
pub fn spectrum(buffer: &mut [Sample], log2n: u32, kind: window::WindowKind) {
    window::apply_window(buffer, log2n, kind, Direction::Forward);
    fft::transform(buffer, log2n, Direction::Forward);
}

/// Peak-to-peak amplitude of an already captured block of readings, offset and clamped the
/// same way as [`Sampler::amplitude`].
pub fn block_amplitude(readings: &[u16], config: &AcquisitionConfig) -> u32 {
    let max = readings.iter().copied().max().unwrap_or(0);
    let min = readings.iter().copied().min().unwrap_or(0);
    let amplitude = i64::from(max - min) - i64::from(config.amplitude_offset);
    amplitude.clamp(0, i64::from(config.amplitude_max)) as u32
}
