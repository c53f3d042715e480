//! # Sinescope - Shared-Memory Sine Streaming
//!
//! A generator process synthesizes a sine wave frame by frame and streams
//! it into a POSIX shared-memory ring buffer, while a controller process
//! sends it commands over a named FIFO. Viewers attach to the ring and draw
//! or analyse what they find.
//!
//! ```text
//! controller ──FIFO──▶ generator (FrameScheduler ▶ SineOscillator) ──shm──▶ viewer
//! ```
//!
//! ## Modules
//!
//! - [`command`]: fixed 12-byte command records
//! - [`channel`]: the named FIFO, non-blocking on the generator side
//! - [`oscillator`]: phase-accumulator sine with a log-scaled display mapping
//! - [`ring`]: lossy single-producer ring buffer over atomics
//! - [`shm`]: the shared-memory segment that hosts the ring
//! - [`scheduler`]: the generator's paced main loop
//! - [`control`]: operator text → commands
//! - [`monitor`]: headless ring consumer
//! - [`config`]: generator configuration
//!
//! ## Example
//!
//! ```rust
//! use sinescope::oscillator::{SignalSource, SineOscillator};
//! use sinescope::ring::{RingLayout, RingReader};
//!
//! let mut osc = SineOscillator::new(440.0, 0.8);
//! osc.start();
//!
//! let ring = RingLayout::new_boxed();
//! ring.publish_frame(&osc.generate_frame(1000));
//!
//! let mut seen = Vec::new();
//! RingReader::new().poll(&ring, &mut seen);
//! assert_eq!(seen.len(), 1000);
//! ```

pub mod channel;
pub mod command;
pub mod config;
pub mod control;
pub mod error;
pub mod monitor;
pub mod oscillator;
pub mod ring;
pub mod scheduler;
pub mod shm;

pub use command::{Command, CommandKind, RECORD_SIZE};
pub use error::{IpcError, IpcResult};
pub use oscillator::{SignalSource, SineOscillator};
pub use ring::{RingLayout, RingReader, CAPACITY};
pub use scheduler::{CancellationToken, FrameScheduler};
