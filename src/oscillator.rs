/// Sine oscillator with a perceptual display mapping
///
/// Two timescales are at work here. Inside a frame the phase advances by
/// `phase_step = 2π·display_cycles / count`, so a frame always shows a legible
/// number of periods whatever the audio frequency. Between frames the
/// persistent phase advances by a small, log-scaled scroll velocity, and the
/// next frame starts exactly there. That persistent phase is the only state
/// carrying continuity from one frame to the next.

use std::f64::consts::PI;

const TAU: f64 = 2.0 * PI;

/// Reference frequency for the scroll velocity
pub const BASE_FREQUENCY: f64 = 100.0;
/// Cycles on screen used as the zoom reference
pub const BASE_CYCLES: f64 = 2.0;
/// Scroll velocity at very low frequencies (radians per frame)
pub const BASE_VELOCITY: f64 = 0.005;
/// Upper bound on the scroll velocity (radians per frame)
pub const MAX_VELOCITY: f64 = 0.03;
pub const MIN_FREQ: f64 = 1.0;
pub const MAX_FREQ: f64 = 22000.0;
/// Fewest cycles on screen (most zoomed in)
pub const MIN_CYCLES: f64 = 0.5;
/// Most cycles on screen (most zoomed out)
pub const MAX_CYCLES: f64 = 12.0;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;

/// Number of periods to show for a given frequency
///
/// Linear in `log10(freq)` between `MIN_FREQ` and `MAX_FREQ`.
pub fn display_cycles_for(freq: f64) -> f64 {
    let log_min = MIN_FREQ.log10();
    let log_max = MAX_FREQ.log10();
    let ratio = ((freq.log10() - log_min) / (log_max - log_min)).clamp(0.0, 1.0);

    MIN_CYCLES + ratio * (MAX_CYCLES - MIN_CYCLES)
}

/// Zoom relative to `BASE_CYCLES`; >1 zooms in, <1 zooms out
pub fn zoom_for(display_cycles: f64) -> f64 {
    (BASE_CYCLES / display_cycles).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Persistent phase advance applied after each frame
pub fn scroll_velocity_for(freq: f64) -> f64 {
    let velocity = BASE_VELOCITY * (1.0 + (freq / BASE_FREQUENCY + 1.0).log10());
    velocity.min(MAX_VELOCITY)
}

/// A source of sample frames the frame scheduler can drive
pub trait SignalSource {
    /// Produce `count` samples, or nothing while stopped
    fn generate_frame(&mut self, count: usize) -> Vec<f64>;

    /// Set a named parameter; unknown names are ignored
    fn set_parameter(&mut self, name: &str, value: f64);

    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct SineOscillator {
    frequency: f64,
    amplitude: f64,
    running: bool,
    phase: f64,
    display_cycles: f64,
    zoom: f64,
}

impl Default for SineOscillator {
    fn default() -> Self {
        Self::new(BASE_FREQUENCY, 0.8)
    }
}

impl SineOscillator {
    /// New stopped oscillator at phase 0; both parameters are clamped
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        let mut osc = Self {
            frequency: BASE_FREQUENCY,
            amplitude: 0.8,
            running: false,
            phase: 0.0,
            display_cycles: BASE_CYCLES,
            zoom: 1.0,
        };
        osc.set_frequency(frequency);
        osc.set_amplitude(amplitude);
        osc
    }

    fn set_frequency(&mut self, hz: f64) {
        if hz.is_nan() {
            return;
        }
        self.frequency = hz.clamp(MIN_FREQ, MAX_FREQ);
        self.update_display();
    }

    fn set_amplitude(&mut self, amplitude: f64) {
        if amplitude.is_nan() {
            return;
        }
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    fn update_display(&mut self) {
        self.display_cycles = display_cycles_for(self.frequency);
        self.zoom = zoom_for(self.display_cycles);
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Persistent phase in radians, always in `[0, 2π]`
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn display_cycles(&self) -> f64 {
        self.display_cycles
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Per-sample phase increment a frame of `count` samples would use
    pub fn phase_step(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        TAU * self.display_cycles / count as f64
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }
}

impl SignalSource for SineOscillator {
    fn generate_frame(&mut self, count: usize) -> Vec<f64> {
        if !self.running || count == 0 {
            return Vec::new();
        }

        self.update_display();

        let phase_step = self.phase_step(count);
        let samples = (0..count)
            .map(|i| self.amplitude * (self.phase + i as f64 * phase_step).sin())
            .collect();

        self.phase += scroll_velocity_for(self.frequency);
        while self.phase > TAU {
            self.phase -= TAU;
        }

        samples
    }

    fn set_parameter(&mut self, name: &str, value: f64) {
        match name {
            "frequency" => self.set_frequency(value),
            "amplitude" => self.set_amplitude(value),
            _ => {}
        }
    }

    // Neither start nor stop touches the phase, so a restart resumes seamlessly.
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
