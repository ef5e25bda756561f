//! DBC file parser
//!
//! Parses Vector DBC files and converts them into our internal layout database.

use crate::signals::database::{
    ByteOrder, MessageDefinition, SignalDatabase, SignalDefinition, ValueType,
};
use crate::types::{CarError, Result};
use std::path::Path;

/// Parse a DBC file into a layout database
pub fn parse_dbc_file(path: &Path) -> Result<SignalDatabase> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        CarError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Fall back to Latin-1 when the file is not UTF-8
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    parse_dbc_str(&content, source)
}

/// Parse DBC text (e.g. a layout table embedded in the binary)
pub fn parse_dbc_str(content: &str, source: &str) -> Result<SignalDatabase> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        CarError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    let mut db = SignalDatabase::new();
    for dbc_msg in dbc.messages() {
        db.add_message(convert_message(dbc_msg, source));
    }

    log::debug!("Parsed {} messages from {}", db.stats().num_messages, source);
    Ok(db)
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(dbc_msg: &can_dbc::Message, source: &str) -> MessageDefinition {
    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| {
            if !matches!(
                dbc_sig.multiplexer_indicator(),
                can_dbc::MultiplexIndicator::Plain
            ) {
                log::warn!(
                    "{}: multiplexed signal {}.{} is packed as a plain signal",
                    source,
                    dbc_msg.message_name(),
                    dbc_sig.name()
                );
            }
            convert_signal(dbc_sig)
        })
        .collect();

    MessageDefinition {
        id: dbc_msg.message_id().0,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
    }
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(dbc_sig: &can_dbc::Signal) -> SignalDefinition {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min: *dbc_sig.min(),
        max: *dbc_sig.max(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
    }
}
