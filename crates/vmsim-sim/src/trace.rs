//! Memory reference traces.
//!
//! A trace is a text file with one reference per line:
//!
//! ```text
//! ==12345== banner lines are ignored
//! I  0400d7d4,8
//!  S 7ff000398,8
//!  L 0x7ff000398
//! ```
//!
//! The access type is one of `L`, `S`, `I`, `M`, followed by the address in
//! hexadecimal and an optional access size in bytes.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use vmsim_core::{AccessType, Va, VmsimError};

/// A single memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// The kind of reference.
    pub access: AccessType,

    /// The referenced address.
    pub va: Va,

    /// The size of the reference in bytes, if recorded.
    pub size: Option<usize>,
}

impl TraceEvent {
    /// Creates an event without a size.
    pub fn new(access: AccessType, va: Va) -> Self {
        Self {
            access,
            va,
            size: None,
        }
    }
}

/// Parses a single trace line.
///
/// Returns `Ok(None)` for blank and banner lines. `line` is the 1-based
/// line number reported in errors.
pub fn parse_line(text: &str, line: usize) -> Result<Option<TraceEvent>, VmsimError> {
    let invalid = |reason| VmsimError::InvalidTrace { line, reason };

    let text = text.trim();
    if text.is_empty() || text.starts_with('=') {
        return Ok(None);
    }

    let (kind, rest) = text
        .split_once(char::is_whitespace)
        .ok_or(invalid("missing address"))?;

    let mut chars = kind.chars();
    let access = match (chars.next(), chars.next()) {
        (Some(kind), None) => {
            AccessType::try_from(kind).map_err(|_| invalid("unknown access type"))?
        }
        _ => return Err(invalid("unknown access type")),
    };

    let (address, size) = match rest.split_once(',') {
        Some((address, size)) => {
            let size = size
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid("invalid access size"))?;
            (address, Some(size))
        }
        None => (rest, None),
    };

    let address = address.trim();
    let address = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);

    let va = u64::from_str_radix(address, 16).map_err(|_| invalid("invalid address"))?;

    Ok(Some(TraceEvent {
        access,
        va: Va(va),
        size,
    }))
}

/// Reads [`TraceEvent`]s from a buffered reader, skipping blank and banner
/// lines.
#[derive(Debug)]
pub struct TraceReader<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R> TraceReader<R>
where
    R: BufRead,
{
    /// Creates a trace reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }

    /// Returns the number of lines read so far.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R> Iterator for TraceReader<R>
where
    R: BufRead,
{
    type Item = Result<TraceEvent, VmsimError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(err) => return Some(Err(err.into())),
            }

            match parse_line(&self.buffer, self.line) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<Option<TraceEvent>, VmsimError>) -> Option<(usize, &'static str)> {
        match result {
            Err(VmsimError::InvalidTrace { line, reason }) => Some((line, reason)),
            _ => None,
        }
    }

    #[test]
    fn parse_valid_lines() -> Result<(), VmsimError> {
        assert_eq!(
            parse_line("I  0400d7d4,8", 1)?,
            Some(TraceEvent {
                access: AccessType::Instruction,
                va: Va(0x0400_d7d4),
                size: Some(8),
            })
        );

        assert_eq!(
            parse_line(" M 0x7ff000398\n", 1)?,
            Some(TraceEvent::new(AccessType::Modify, Va(0x7_ff00_0398)))
        );

        assert_eq!(parse_line("", 1)?, None);
        assert_eq!(parse_line("   \n", 1)?, None);
        assert_eq!(parse_line("==1234== Lackey", 1)?, None);

        Ok(())
    }

    #[test]
    fn parse_invalid_lines() {
        assert_eq!(reason(parse_line("X 1000", 3)), Some((3, "unknown access type")));
        assert_eq!(reason(parse_line("LS 1000", 3)), Some((3, "unknown access type")));
        assert_eq!(reason(parse_line("L", 4)), Some((4, "missing address")));
        assert_eq!(reason(parse_line("L zz", 5)), Some((5, "invalid address")));
        assert_eq!(reason(parse_line("S 1000,x", 6)), Some((6, "invalid access size")));
    }

    #[test]
    fn reader_counts_skipped_lines() {
        let text = "==1== banner\n\n L 1000,4\n S 2000\nQ 3000\n";
        let mut reader = TraceReader::new(text.as_bytes());

        assert!(matches!(reader.next(), Some(Ok(event)) if event.va == Va(0x1000)));
        assert!(matches!(reader.next(), Some(Ok(event)) if event.access == AccessType::Store));
        assert!(matches!(
            reader.next(),
            Some(Err(VmsimError::InvalidTrace { line: 5, .. }))
        ));
        assert!(reader.next().is_none());
        assert_eq!(reader.line(), 5);
    }
}
