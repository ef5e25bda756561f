//! Message layout database
//!
//! Holds the message and signal layout of one vehicle family, as parsed from
//! its DBC file, and answers lookups by message name or CAN ID.

use std::collections::{BTreeMap, HashMap};

/// Layout of one message
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    pub id: u32,
    pub name: String,
    /// Frame length in bytes; packed frames always have this length
    pub size: usize,
    /// Transmitting node, when the DBC names one
    pub sender: Option<String>,
    pub signals: Vec<SignalDefinition>,
}

impl MessageDefinition {
    /// Look up one of this message's signals
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }
}

/// Layout and scaling of one signal.
///
/// `physical = offset + factor * raw`
#[derive(Debug, Clone)]
pub struct SignalDefinition {
    pub name: String,
    /// DBC start bit: the LSB for Intel signals, the MSB for Motorola ones
    pub start_bit: u16,
    /// Width in bits
    pub length: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    pub factor: f64,
    pub offset: f64,
    /// Declared physical range; `min == max` means unbounded
    pub min: f64,
    pub max: f64,
    pub unit: Option<String>,
}

impl SignalDefinition {
    /// Mask covering every raw bit of the signal
    pub fn raw_mask(&self) -> u64 {
        if self.length >= 64 {
            u64::MAX
        } else {
            (1u64 << self.length) - 1
        }
    }

    /// True when `value` lies inside the declared physical range
    pub fn in_range(&self, value: f64) -> bool {
        self.min == self.max || (value >= self.min && value <= self.max)
    }
}

/// Bit layout of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Intel: bits ascend from the start bit
    LittleEndian,
    /// Motorola: the start bit is the MSB, bits run towards the next byte
    BigEndian,
}

/// Raw value interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Two's complement
    Signed,
    Unsigned,
}

/// The layout database of one vehicle family
#[derive(Debug, Clone, Default)]
pub struct SignalDatabase {
    messages: BTreeMap<u32, MessageDefinition>,
    ids_by_name: HashMap<String, u32>,
}

impl SignalDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message; a later definition replaces an earlier one with the
    /// same CAN ID.
    pub fn add_message(&mut self, message: MessageDefinition) {
        if let Some(previous) = self.messages.get(&message.id) {
            log::debug!(
                "Message 0x{:X}: {} replaced by {}",
                message.id,
                previous.name,
                message.name
            );
            self.ids_by_name.remove(&previous.name);
        }
        self.ids_by_name.insert(message.name.clone(), message.id);
        self.messages.insert(message.id, message);
    }

    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages.get(&can_id)
    }

    pub fn get_message_by_name(&self, message_name: &str) -> Option<&MessageDefinition> {
        let can_id = self.ids_by_name.get(message_name)?;
        self.messages.get(can_id)
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.values().map(|msg| msg.signals.len()).sum(),
        }
    }

    /// Every CAN ID in ascending order
    pub fn get_all_can_ids(&self) -> Vec<u32> {
        self.messages.keys().copied().collect()
    }
}

/// Message and signal counts of a database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    pub num_messages: usize,
    pub num_signals: usize,
}
