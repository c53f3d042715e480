//! Headless viewer: drains the shared ring and reports what it sees
//!
//! Polls with a short sleep between attempts and keeps only the most recent
//! `MAX_DISPLAY_POINTS` samples, which is what a waveform display would draw.
//! It writes nothing but its own read cursor and the new-data flag.

use crate::ring::{RingLayout, RingReader};
use crate::scheduler::CancellationToken;
use std::collections::VecDeque;
use std::ops::Deref;
use std::time::{Duration, Instant};
use tracing::info;

/// Samples a display keeps on screen
pub const MAX_DISPLAY_POINTS: usize = 800;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded history of the newest samples
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<f64>,
    limit: usize,
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::with_limit(MAX_DISPLAY_POINTS)
    }
}

impl SampleHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    pub fn as_slices(&self) -> (&[f64], &[f64]) {
        self.samples.as_slices()
    }

    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }

    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| s * s).sum();
        (sum / self.samples.len() as f64).sqrt()
    }
}

impl Extend<f64> for SampleHistory {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for sample in iter {
            if self.samples.len() == self.limit {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonitorReport {
    pub drained: u64,
    pub peak: f64,
    pub rms: f64,
    pub total_produced: u32,
}

pub struct Monitor<R> {
    ring: R,
    reader: RingReader,
    history: SampleHistory,
    drained: u64,
}

impl<R: Deref<Target = RingLayout>> Monitor<R> {
    pub fn new(ring: R) -> Self {
        Self {
            ring,
            reader: RingReader::new(),
            history: SampleHistory::default(),
            drained: 0,
        }
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// One poll of the ring; returns how many samples were drained
    pub fn poll(&mut self) -> usize {
        let n = self.reader.poll(&self.ring, &mut self.history);
        self.drained += n as u64;
        n
    }

    pub fn report(&self) -> MonitorReport {
        MonitorReport {
            drained: self.drained,
            peak: self.history.peak(),
            rms: self.history.rms(),
            total_produced: self.ring.total_produced(),
        }
    }

    /// Poll until cancelled, logging a report every `report_interval`
    pub fn run(
        &mut self,
        token: &CancellationToken,
        poll_interval: Duration,
        report_interval: Duration,
    ) -> MonitorReport {
        let mut last_report = Instant::now();

        while !token.is_cancelled() {
            self.poll();

            if last_report.elapsed() >= report_interval {
                let r = self.report();
                info!(
                    "📈 drained={} peak={:.3} rms={:.3} produced={}",
                    r.drained, r.peak, r.rms, r.total_produced
                );
                last_report = Instant::now();
            }

            std::thread::sleep(poll_interval);
        }

        self.report()
    }
}
