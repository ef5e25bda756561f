//! Log file format parsers
//!
//! Each parser is an iterator over [`CanFrame`]s read from a capture file.

use crate::types::{CanFrame, Result};
use std::path::Path;

pub mod candump;

pub use candump::{CandumpFrameIterator, CandumpParser};

/// Common trait for all log file parsers
pub trait LogFileParser: Iterator<Item = Result<CanFrame>> + Sized {
    /// Open a log file and return an iterator over its frames
    fn parse(path: &Path) -> Result<Self>;
}

/// Read every frame of a candump log, stopping at the first malformed line
pub fn read_candump(path: &Path) -> Result<Vec<CanFrame>> {
    CandumpFrameIterator::parse(path)?.collect()
}
