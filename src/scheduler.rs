//! Frame scheduler: the generator's main loop
//!
//! Each iteration has two phases:
//! - command phase: one non-blocking receive, dispatched to the signal source
//! - production phase: once `frame_interval` has elapsed, one frame is
//!   generated (if the source is running) and published into the ring
//!
//! The loop ends on a `Quit` command or when the [`CancellationToken`] is
//! cancelled. Dropping the scheduler drops the channel and the segment,
//! which unlinks both names.

use crate::channel::CommandReceiver;
use crate::command::{Command, CommandKind};
use crate::config::GeneratorConfig;
use crate::oscillator::SignalSource;
use crate::ring::RingLayout;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sleep between loop iterations; well below any frame interval
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Shared stop flag, checked once per scheduler iteration
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Anything the scheduler can pull commands from without blocking
pub trait CommandSource {
    fn try_receive(&mut self) -> Option<Command>;
}

impl CommandSource for CommandReceiver {
    fn try_receive(&mut self) -> Option<Command> {
        CommandReceiver::try_receive(self)
    }
}

/// In-process queue, handy for driving a scheduler without a FIFO
impl CommandSource for VecDeque<Command> {
    fn try_receive(&mut self) -> Option<Command> {
        self.pop_front()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub frames_published: u64,
    pub samples_published: u64,
    pub commands_handled: u64,
}

pub struct FrameScheduler<S, C, R> {
    source: S,
    commands: C,
    ring: R,
    samples_per_frame: usize,
    frame_interval: Duration,
    last_frame: Instant,
    quit: bool,
    token: CancellationToken,
    stats: SchedulerStats,
}

impl<S, C, R> FrameScheduler<S, C, R>
where
    S: SignalSource,
    C: CommandSource,
    R: Deref<Target = RingLayout>,
{
    pub fn new(
        source: S,
        commands: C,
        ring: R,
        config: &GeneratorConfig,
        token: CancellationToken,
    ) -> Self {
        Self {
            source,
            commands,
            ring,
            samples_per_frame: config.samples_per_frame,
            frame_interval: config.frame_interval(),
            last_frame: Instant::now(),
            quit: false,
            token,
            stats: SchedulerStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn ring(&self) -> &RingLayout {
        &self.ring
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit
    }

    fn should_stop(&self) -> bool {
        self.quit || self.token.is_cancelled()
    }

    /// Apply one command to the signal source
    pub fn handle_command(&mut self, cmd: Command) {
        self.stats.commands_handled += 1;

        match cmd.kind {
            CommandKind::Start => {
                info!("▶️  Start");
                self.source.start();
            }
            CommandKind::Stop => {
                info!("⏸️  Stop");
                self.source.stop();
            }
            CommandKind::SetFrequency => {
                debug!("Frequency -> {} Hz", cmd.value);
                self.source.set_parameter("frequency", cmd.value);
            }
            CommandKind::SetAmplitude => {
                debug!("Amplitude -> {}", cmd.value);
                self.source.set_parameter("amplitude", cmd.value);
            }
            CommandKind::Quit => {
                info!("👋 Quit requested");
                self.quit = true;
            }
            CommandKind::None => {}
        }
    }

    /// Production phase; returns the number of samples published
    ///
    /// The elapsed-time baseline is reset whenever the interval has passed,
    /// whether or not the source produced anything.
    pub fn produce(&mut self, now: Instant) -> usize {
        if now.saturating_duration_since(self.last_frame) < self.frame_interval {
            return 0;
        }
        self.last_frame = now;

        if !self.source.is_running() {
            return 0;
        }

        let frame = self.source.generate_frame(self.samples_per_frame);
        let written = self.ring.publish_frame(&frame);
        if written > 0 {
            self.stats.frames_published += 1;
            self.stats.samples_published += written as u64;
        }
        written
    }

    /// One loop iteration; returns false once the loop should end
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(cmd) = self.commands.try_receive() {
            self.handle_command(cmd);
        }

        if self.should_stop() {
            return false;
        }

        self.produce(now);
        true
    }

    /// Run until quit or cancellation, then release every resource
    pub fn run(mut self) -> SchedulerStats {
        info!(
            "🎵 Producing {} samples every {:?}",
            self.samples_per_frame, self.frame_interval
        );

        while !self.token.is_cancelled() {
            if !self.tick(Instant::now()) {
                break;
            }
            std::thread::sleep(IDLE_SLEEP);
        }

        let stats = self.stats;
        info!(
            "🛑 Scheduler stopped after {} frames ({} samples)",
            stats.frames_published, stats.samples_published
        );
        stats
    }

    pub fn into_parts(self) -> (S, C, R) {
        (self.source, self.commands, self.ring)
    }
}
