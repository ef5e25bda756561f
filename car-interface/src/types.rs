//! Core types shared by the fingerprinting engine and the vehicle codecs
//!
//! Bus frames flow in from a frame source, get reduced to a [`Signature`] and a
//! shrinking [`CandidateSet`], and outbound traffic leaves as
//! [`OutboundMessage`]s packed into frames again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Timestamp type used for captured frames
pub type Timestamp = DateTime<Utc>;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, CarError>;

/// Accumulated map of observed address -> data length for one session
pub type Signature = BTreeMap<u32, usize>;

/// Vehicle model identifiers still compatible with the observed traffic
pub type CandidateSet = BTreeSet<String>;

/// Named signal values for one outbound message (signal name -> physical value)
pub type SignalValues = HashMap<String, f64>;

/// Highest standard (11-bit) CAN identifier plus one
pub const STANDARD_ID_LIMIT: u32 = 0x800;

/// A single CAN frame observed on, or sent to, the vehicle bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    /// CAN message ID (11-bit or 29-bit)
    pub address: u32,
    /// Bus index the frame was seen on / should be sent to
    pub bus: u8,
    /// Frame data bytes (0-8 bytes)
    pub data: Vec<u8>,
    /// Capture timestamp in nanoseconds since epoch (logged frames only)
    #[serde(default)]
    pub timestamp_ns: Option<u64>,
    /// True if this is an extended (29-bit) CAN ID
    #[serde(default)]
    pub is_extended: bool,
}

impl CanFrame {
    /// Build a standard frame on the given bus
    pub fn new(address: u32, bus: u8, data: Vec<u8>) -> Self {
        Self {
            address,
            bus,
            data,
            timestamp_ns: None,
            is_extended: address >= STANDARD_ID_LIMIT,
        }
    }

    /// Attach a capture timestamp
    pub fn with_timestamp_ns(mut self, timestamp_ns: u64) -> Self {
        self.timestamp_ns = Some(timestamp_ns);
        self
    }

    /// Convert the capture timestamp to DateTime<Utc>
    pub fn timestamp(&self) -> Option<Timestamp> {
        let ns = self.timestamp_ns?;
        let secs = (ns / 1_000_000_000) as i64;
        let nsecs = (ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs)
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}@{}#", self.address, self.bus)?;
        for byte in &self.data {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// An outbound message before bit packing: the message is looked up by name in
/// the vehicle's layout table and its signals are packed from `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Symbolic message name from the layout table (e.g. "LKAS_HUD")
    pub name: String,
    /// Bus to send on
    pub bus: u8,
    /// Physical values keyed by signal name
    pub values: SignalValues,
}

impl OutboundMessage {
    pub fn new(name: impl Into<String>, bus: u8) -> Self {
        Self {
            name: name.into(),
            bus,
            values: SignalValues::new(),
        }
    }

    /// Builder method: set one signal value
    pub fn with(mut self, signal: &str, value: f64) -> Self {
        self.values.insert(signal.to_string(), value);
        self
    }

    /// Value of a signal, if set
    pub fn value(&self, signal: &str) -> Option<f64> {
        self.values.get(signal).copied()
    }
}

/// Encoder output: either a finished frame or signals still to be packed
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Raw(CanFrame),
    Packed(OutboundMessage),
}

/// Errors raised by the library
#[derive(Debug, thiserror::Error)]
pub enum CarError {
    #[error("Car doesn't match any fingerprint ({} addresses observed)", signature.len())]
    Unrecognized { signature: Signature },

    #[error("Car matched {model}, but no interface is available for it")]
    NoInterface { model: String },

    #[error("Checksum input is empty")]
    EmptyChecksumInput,

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Failed to parse fingerprint table: {0}")]
    TableParseError(String),

    #[error("Failed to parse log file: {0}")]
    LogParseError(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Signal not found: {message}.{signal}")]
    SignalNotFound { message: String, signal: String },

    #[error("Invalid signal value for {signal}: {value}")]
    InvalidSignalValue { signal: String, value: f64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
