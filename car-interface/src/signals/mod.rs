//! Message layout tables and the DBC parser
//!
//! Each vehicle family describes its outbound messages in a DBC file; this
//! module turns that file into a queryable layout database.

pub mod dbc;
pub mod database;

// Re-export key types for convenience
pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, SignalDatabase, SignalDefinition, ValueType,
};
