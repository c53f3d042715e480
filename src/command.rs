//! Command records for the controller → generator channel
//!
//! Every command travels as one fixed-size record: a 4-byte kind tag followed
//! by an 8-byte IEEE-754 value, little-endian, no length prefix. The record is
//! serialized with bincode's default (fixed-int) encoding, which lays the two
//! fields out back to back in exactly 12 bytes.
//!
//! The codec never validates the value. Range checks belong to the oscillator.

use crate::error::{IpcError, IpcResult};
use serde::{Deserialize, Serialize};

/// Size of one encoded command on the wire
pub const RECORD_SIZE: usize = 12;

/// What the generator should do with a command
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    None = 0,
    Start = 1,
    Stop = 2,
    SetFrequency = 3,
    SetAmplitude = 4,
    Quit = 5,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::None,
        CommandKind::Start,
        CommandKind::Stop,
        CommandKind::SetFrequency,
        CommandKind::SetAmplitude,
        CommandKind::Quit,
    ];

    /// Wire tag for this kind
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Map a wire tag back to a kind, `None` for tags no sender should produce
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }
}

/// Raw record as it appears on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct WireRecord {
    tag: u32,
    value: f64,
}

/// A single control command
///
/// `value` only means something for `SetFrequency` and `SetAmplitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub value: f64,
}

impl Default for Command {
    fn default() -> Self {
        Self::new(CommandKind::None, 0.0)
    }
}

impl Command {
    pub fn new(kind: CommandKind, value: f64) -> Self {
        Self { kind, value }
    }

    pub fn start() -> Self {
        Self::new(CommandKind::Start, 0.0)
    }

    pub fn stop() -> Self {
        Self::new(CommandKind::Stop, 0.0)
    }

    pub fn quit() -> Self {
        Self::new(CommandKind::Quit, 0.0)
    }

    pub fn set_frequency(hz: f64) -> Self {
        Self::new(CommandKind::SetFrequency, hz)
    }

    pub fn set_amplitude(amplitude: f64) -> Self {
        Self::new(CommandKind::SetAmplitude, amplitude)
    }

    /// Serialize to the fixed wire layout
    pub fn encode(&self) -> IpcResult<[u8; RECORD_SIZE]> {
        let record = WireRecord {
            tag: self.kind.tag(),
            value: self.value,
        };
        let bytes = bincode::serialize(&record)
            .map_err(|e| IpcError::Codec(format!("Failed to serialize command: {}", e)))?;

        bytes
            .as_slice()
            .try_into()
            .map_err(|_| IpcError::Codec(format!("Unexpected record size: {} bytes", bytes.len())))
    }

    /// Decode one record
    ///
    /// Returns `None` unless `bytes` is exactly one record long. An unknown
    /// tag decodes as `CommandKind::None` so the receiver simply ignores it.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != RECORD_SIZE {
            return None;
        }

        let record: WireRecord = bincode::deserialize(bytes).ok()?;
        let kind = CommandKind::from_tag(record.tag).unwrap_or(CommandKind::None);

        Some(Self::new(kind, record.value))
    }
}
