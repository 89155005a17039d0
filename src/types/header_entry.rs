//! Index line format of the message log

use std::fmt;

/// One line of the `.header` index file: where a message lives in `.body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEntry {
    pub seq_num: u64,
    pub offset: u64,
    pub length: u64,
}

impl HeaderEntry {
    pub fn new(seq_num: u64, offset: u64, length: u64) -> Self {
        Self {
            seq_num,
            offset,
            length,
        }
    }

    /// Serialized form including the terminating newline
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }

    /// Parse a line without its terminating newline.
    ///
    /// Returns `None` for anything other than exactly three comma-separated
    /// unsigned integers.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let line = std::str::from_utf8(line).ok()?;
        let line = line.strip_suffix('\r').unwrap_or(line);

        let mut fields = line.split(',');
        let seq_num = parse_field(fields.next()?)?;
        let offset = parse_field(fields.next()?)?;
        let length = parse_field(fields.next()?)?;
        if fields.next().is_some() {
            return None;
        }

        Some(Self::new(seq_num, offset, length))
    }

    /// Byte just past the end of this entry's body range
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

impl fmt::Display for HeaderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.seq_num, self.offset, self.length)
    }
}
