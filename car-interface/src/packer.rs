//! Signal packing engine
//!
//! Packs named physical signal values into CAN frame bytes according to a
//! layout database, and extracts them again. Handles Intel and Motorola bit
//! layouts, two's complement for signed signals and factor/offset scaling.

use crate::signals::database::{ByteOrder, SignalDatabase, SignalDefinition, ValueType};
use crate::signals::dbc;
use crate::types::{CanFrame, CarError, Outbound, OutboundMessage, Result, SignalValues};
use std::path::Path;

/// Bit packer keyed by message and signal name
#[derive(Debug, Clone)]
pub struct CanPacker {
    signal_db: SignalDatabase,
}

impl CanPacker {
    pub fn new(signal_db: SignalDatabase) -> Self {
        Self { signal_db }
    }

    /// Build a packer from DBC text
    pub fn from_dbc_str(content: &str, source: &str) -> Result<Self> {
        Ok(Self::new(dbc::parse_dbc_str(content, source)?))
    }

    /// Build a packer from a DBC file on disk
    pub fn from_dbc_file(path: &Path) -> Result<Self> {
        Ok(Self::new(dbc::parse_dbc_file(path)?))
    }

    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    /// CAN ID of a message, by name
    pub fn address_of(&self, message_name: &str) -> Option<u32> {
        self.signal_db
            .get_message_by_name(message_name)
            .map(|msg| msg.id)
    }

    /// Pack `values` into a frame for `message_name` on `bus`.
    ///
    /// Signals missing from `values` are packed as raw zero; the frame is
    /// always as long as the message definition says.
    pub fn pack(&self, message_name: &str, bus: u8, values: &SignalValues) -> Result<CanFrame> {
        let message_def = self
            .signal_db
            .get_message_by_name(message_name)
            .ok_or_else(|| CarError::MessageNotFound(message_name.to_string()))?;

        let mut data = vec![0u8; message_def.size];
        for (signal_name, &value) in values {
            let signal = message_def.signal(signal_name).ok_or_else(|| {
                CarError::SignalNotFound {
                    message: message_name.to_string(),
                    signal: signal_name.clone(),
                }
            })?;
            let raw = Self::physical_to_raw(signal, value)?;
            Self::insert_signal_value(&mut data, signal, raw);
        }

        log::trace!("Packed {} (ID 0x{:X}): {:02X?}", message_name, message_def.id, data);
        Ok(CanFrame::new(message_def.id, bus, data))
    }

    /// Pack an encoder's outbound message
    pub fn pack_message(&self, message: &OutboundMessage) -> Result<CanFrame> {
        self.pack(&message.name, message.bus, &message.values)
    }

    /// Turn encoder output into a frame
    pub fn render(&self, outbound: Outbound) -> Result<CanFrame> {
        match outbound {
            Outbound::Raw(frame) => Ok(frame),
            Outbound::Packed(message) => self.pack_message(&message),
        }
    }

    /// Extract all physical signal values from a frame
    pub fn unpack(&self, frame: &CanFrame) -> Result<SignalValues> {
        let message_def = self
            .signal_db
            .get_message(frame.address)
            .ok_or_else(|| CarError::MessageNotFound(format!("CAN ID 0x{:X}", frame.address)))?;

        let mut values = SignalValues::new();
        for signal in &message_def.signals {
            if let Some(raw) = Self::extract_signal_value(&frame.data, signal) {
                values.insert(signal.name.clone(), signal.offset + signal.factor * raw as f64);
            }
        }
        Ok(values)
    }

    /// Convert a physical value to the raw bit pattern of a signal
    fn physical_to_raw(signal: &SignalDefinition, value: f64) -> Result<u64> {
        let raw = ((value - signal.offset) / signal.factor).round();
        if !raw.is_finite() {
            return Err(CarError::InvalidSignalValue {
                signal: signal.name.clone(),
                value,
            });
        }

        if !signal.in_range(value) {
            log::debug!(
                "{} = {} is outside [{}, {}]",
                signal.name,
                value,
                signal.min,
                signal.max
            );
        }

        let raw = raw as i64;
        let length = signal.length as u32;
        let mask = signal.raw_mask();
        let fits = match signal.value_type {
            ValueType::Unsigned => raw >= 0 && (raw as u64) <= mask,
            ValueType::Signed => {
                let half = 1i64 << (length.clamp(1, 63) - 1);
                raw >= -half && raw < half
            }
        };
        if !fits {
            log::warn!(
                "Value {} does not fit {} ({} bits), truncating",
                value,
                signal.name,
                length
            );
        }

        Ok(raw as u64 & mask)
    }

    /// Write a raw value into frame data
    fn insert_signal_value(data: &mut [u8], signal: &SignalDefinition, raw: u64) {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;
        match signal.byte_order {
            ByteOrder::LittleEndian => Self::insert_little_endian(data, start_bit, length, raw),
            ByteOrder::BigEndian => Self::insert_big_endian(data, start_bit, length, raw),
        }
    }

    /// Extract raw signal value from CAN frame data
    fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> Option<i64> {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;

        let raw_value = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length)?,
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length)?,
        };

        Some(match signal.value_type {
            ValueType::Unsigned => raw_value as i64,
            ValueType::Signed => Self::sign_extend(raw_value, length),
        })
    }

    /// Sequential (MSB-first) bit position of a Motorola start bit
    ///
    /// DBC numbers bits LSB-first within each byte; a Motorola signal starts at
    /// its MSB and continues towards the next byte's MSB.
    fn motorola_msb_position(start_bit: usize) -> usize {
        (start_bit / 8) * 8 + (7 - start_bit % 8)
    }

    /// Little-endian (Intel): start bit is the LSB, bits ascend.
    fn insert_little_endian(data: &mut [u8], start_bit: usize, length: usize, raw: u64) {
        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            if byte_idx < data.len() && (raw >> i) & 0x01 != 0 {
                data[byte_idx] |= 1 << (bit_pos % 8);
            }
        }
    }

    /// Big-endian (Motorola): start bit is the MSB.
    fn insert_big_endian(data: &mut [u8], start_bit: usize, length: usize, raw: u64) {
        let msb = Self::motorola_msb_position(start_bit);
        for i in 0..length {
            let pos = msb + i;
            let byte_idx = pos / 8;
            if byte_idx < data.len() && (raw >> (length - 1 - i)) & 0x01 != 0 {
                data[byte_idx] |= 1 << (7 - pos % 8);
            }
        }
    }

    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        if (start_bit + length + 7) / 8 > data.len() {
            return None;
        }

        let mut result: u64 = 0;
        for i in 0..length {
            let bit_pos = start_bit + i;
            let bit_value = (data[bit_pos / 8] >> (bit_pos % 8)) & 0x01;
            result |= (bit_value as u64) << i;
        }
        Some(result)
    }

    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let msb = Self::motorola_msb_position(start_bit);
        if (msb + length + 7) / 8 > data.len() {
            return None;
        }

        let mut result: u64 = 0;
        for i in 0..length {
            let pos = msb + i;
            let bit_value = (data[pos / 8] >> (7 - pos % 8)) & 0x01;
            result |= (bit_value as u64) << (length - 1 - i);
        }
        Some(result)
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}
