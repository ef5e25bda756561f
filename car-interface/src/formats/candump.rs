//! candump log parser
//!
//! Reads the SocketCAN `candump -l` format:
//!
//! ```text
//! (1436509052.249713) can0 2A6#0000000300000000
//! (1436509052.250014) can1 18DAF110#02010D
//! ```
//!
//! The bus index is taken from the trailing digits of the interface name.
//! Identifiers longer than three hex digits are extended. CAN-FD frames
//! (`ID##<flags><data>`) and remote requests (`ID#R`) are accepted.

use super::LogFileParser;
use crate::types::{CanFrame, CarError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

const MAX_CLASSIC_DATA: usize = 8;
const MAX_FD_DATA: usize = 64;

/// Stateless candump line parser
pub struct CandumpParser;

impl CandumpParser {
    /// Parse one log line. Blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str, line_number: usize) -> Result<Option<CanFrame>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let err = |reason: &str| {
            CarError::LogParseError(format!("line {}: {} ({:?})", line_number, reason, line))
        };

        let mut fields = line.split_whitespace();
        let (timestamp, interface, frame) = match (fields.next(), fields.next(), fields.next()) {
            (Some(t), Some(i), Some(f)) => (t, i, f),
            _ => return Err(err("expected '(timestamp) interface ID#DATA'")),
        };

        let timestamp_ns = Self::parse_timestamp(timestamp).ok_or_else(|| err("bad timestamp"))?;
        let bus = Self::parse_bus(interface).ok_or_else(|| err("bad interface"))?;

        let (id, payload) = frame.split_once('#').ok_or_else(|| err("missing '#'"))?;
        if id.is_empty() || id.len() > 8 {
            return Err(err("bad identifier"));
        }
        let address = u32::from_str_radix(id, 16).map_err(|_| err("bad identifier"))?;

        let data = if let Some(fd) = payload.strip_prefix('#') {
            // CAN-FD: one flags nibble precedes the data
            let data = fd.get(1..).ok_or_else(|| err("missing CAN-FD flags"))?;
            let data = Self::parse_hex(data).ok_or_else(|| err("bad data"))?;
            if data.len() > MAX_FD_DATA {
                return Err(err("more than 64 data bytes"));
            }
            data
        } else if payload.starts_with('R') {
            Vec::new()
        } else {
            let data = Self::parse_hex(payload).ok_or_else(|| err("bad data"))?;
            if data.len() > MAX_CLASSIC_DATA {
                return Err(err("more than 8 data bytes"));
            }
            data
        };

        let mut frame = CanFrame::new(address, bus, data).with_timestamp_ns(timestamp_ns);
        frame.is_extended = id.len() > 3;
        Ok(Some(frame))
    }

    /// Parse every line of `content`
    pub fn parse_str(content: &str) -> Result<Vec<CanFrame>> {
        let mut frames = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if let Some(frame) = Self::parse_line(line, index + 1)? {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    /// `(secs.frac)` to nanoseconds
    fn parse_timestamp(field: &str) -> Option<u64> {
        let inner = field.strip_prefix('(')?.strip_suffix(')')?;
        let (secs, frac) = inner.split_once('.').unwrap_or((inner, ""));
        if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let secs: u64 = secs.parse().ok()?;
        let frac_ns = if frac.is_empty() {
            0
        } else {
            frac.parse::<u64>().ok()? * 10u64.pow(9 - frac.len() as u32)
        };
        secs.checked_mul(1_000_000_000)?.checked_add(frac_ns)
    }

    /// Trailing digits of the interface name; `vcan` and friends map to bus 0
    fn parse_bus(interface: &str) -> Option<u8> {
        let digits = interface
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| &interface[i..]);
        match digits {
            Some(digits) => digits.parse().ok(),
            None => Some(0),
        }
    }

    fn parse_hex(hex: &str) -> Option<Vec<u8>> {
        if hex.len() % 2 != 0 {
            return None;
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

/// Iterator over frames of a candump log on disk
pub struct CandumpFrameIterator {
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl LogFileParser for CandumpFrameIterator {
    fn parse(path: &Path) -> Result<Self> {
        log::info!("Parsing candump log: {:?}", path);
        let file = File::open(path).map_err(|e| {
            CarError::LogParseError(format!("Failed to open log {:?}: {}", path, e))
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }
}

impl Iterator for CandumpFrameIterator {
    type Item = Result<CanFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(CarError::IoError(e))),
            };
            self.line_number += 1;
            match CandumpParser::parse_line(&line, self.line_number) {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_standard_frame() {
        let frame = CandumpParser::parse_line("(1436509052.249713) can0 2A6#0000000300000000", 1)
            .unwrap()
            .unwrap();
        assert_eq!(frame.address, 0x2a6);
        assert_eq!(frame.bus, 0);
        assert_eq!(frame.data, vec![0, 0, 0, 3, 0, 0, 0, 0]);
        assert_eq!(frame.timestamp_ns, Some(1_436_509_052_249_713_000));
        assert!(!frame.is_extended);
    }

    #[test]
    fn test_parse_extended_and_bus() {
        let frame = CandumpParser::parse_line("(0.5) can2 00000123#0102", 1)
            .unwrap()
            .unwrap();
        assert_eq!(frame.address, 0x123);
        assert_eq!(frame.bus, 2);
        assert!(frame.is_extended);
        assert_eq!(frame.timestamp_ns, Some(500_000_000));
    }

    #[test]
    fn test_parse_remote_fd_and_empty() {
        let remote = CandumpParser::parse_line("(1.0) vcan 123#R", 1).unwrap().unwrap();
        assert!(remote.data.is_empty());
        assert_eq!(remote.bus, 0);

        let fd = CandumpParser::parse_line("(1.0) can1 123##1AABB", 1).unwrap().unwrap();
        assert_eq!(fd.data, vec![0xAA, 0xBB]);

        let empty = CandumpParser::parse_line("(1.0) can0 339#", 1).unwrap().unwrap();
        assert_eq!(empty.dlc(), 0);
    }

    #[test]
    fn test_malformed_lines_report_line_number() {
        let err = CandumpParser::parse_str("(1.0) can0 100#00\n\n(1.1) can0 100#0G\n").unwrap_err();
        match err {
            CarError::LogParseError(msg) => assert!(msg.starts_with("line 3:"), "{}", msg),
            other => panic!("unexpected error: {}", other),
        }
        assert!(CandumpParser::parse_line("garbage", 1).is_err());
        assert!(CandumpParser::parse_line("1.0 can0 100#00", 1).is_err());
        assert!(CandumpParser::parse_line("(1.0) can0 100:00", 1).is_err());
    }

    #[test]
    fn test_oversized_payloads_rejected() {
        let err = CandumpParser::parse_line("(1.0) can0 100#00112233445566778899AABB", 7)
            .unwrap_err();
        match err {
            CarError::LogParseError(msg) => {
                assert!(msg.starts_with("line 7: more than 8 data bytes"), "{}", msg)
            }
            other => panic!("unexpected error: {}", other),
        }

        // 12 bytes is a legal CAN-FD length
        let fd = CandumpParser::parse_line("(1.0) can0 100##000112233445566778899AABB", 1)
            .unwrap()
            .unwrap();
        assert_eq!(fd.dlc(), 12);

        let too_long = format!("(1.0) can0 100##0{}", "00".repeat(65));
        assert!(CandumpParser::parse_line(&too_long, 1).is_err());

        let full = CandumpParser::parse_line("(1.0) can0 100#0011223344556677", 1)
            .unwrap()
            .unwrap();
        assert_eq!(full.dlc(), 8);
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "(1.000000) can0 044#0000000000000000").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "(1.010000) can0 101#0000000000").unwrap();
        file.flush().unwrap();

        let frames = super::super::read_candump(file.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].address, 0x101);
        assert_eq!(frames[1].dlc(), 5);
        assert_eq!(frames[1].timestamp_ns, Some(1_010_000_000));
    }

    #[test]
    fn test_missing_file() {
        assert!(CandumpFrameIterator::parse(Path::new("/nonexistent/log.txt")).is_err());
    }
}
