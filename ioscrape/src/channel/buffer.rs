//! Pattern buffer with incremental tail search.
//!
//! Incoming bytes are run through a terminal escape parser before they land in
//! the buffer, so colour codes and cursor movement never reach the patterns.
//! Each search only looks at the bytes that arrived since the previous search
//! plus `search_depth` bytes of look-back, which keeps prompt detection cheap
//! on long `show` outputs.

use std::borrow::Cow;
use std::fmt;

use regex::bytes::Regex;

/// Location of the winning pattern in the unconsumed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    /// Index of the pattern in the list passed to [`PatternBuffer::find_first`].
    pub index: usize,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset just past the match.
    pub end: usize,
}

/// Buffer for accumulating terminal output and searching it for patterns.
pub struct PatternBuffer {
    /// Unconsumed output, escape sequences already removed.
    buffer: Vec<u8>,

    /// Bytes of `buffer` already searched without a match.
    scanned: usize,

    /// How far behind `scanned` a new search starts.
    search_depth: usize,

    /// Escape parser; keeps state across chunks.
    parser: vte::Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified look-back depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            scanned: 0,
            search_depth,
            parser: vte::Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = PlainText(&mut self.buffer);
        self.parser.advance(&mut sink, data);
    }

    /// Find the earliest match of any pattern.
    ///
    /// Among all patterns the match starting first wins; on a tie the pattern
    /// listed first wins. A miss marks the current content as scanned so the
    /// next call only revisits the look-back window.
    pub fn find_first(&mut self, patterns: &[Regex]) -> Option<PatternMatch> {
        let region_start = self.region_start();
        let region = &self.buffer[region_start..];

        let mut best: Option<PatternMatch> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            if let Some(m) = pattern.find(region) {
                let candidate = PatternMatch {
                    index,
                    start: region_start + m.start(),
                    end: region_start + m.end(),
                };
                if best.is_none_or(|b| candidate.start < b.start) {
                    best = Some(candidate);
                }
            }
        }

        if best.is_none() {
            self.scanned = self.buffer.len();
        }
        best
    }

    /// Start of the next search: the look-back window, widened to a line start
    /// so `^` anchors never match in the middle of a line.
    fn region_start(&self) -> usize {
        let start = self.scanned.saturating_sub(self.search_depth);
        if start == 0 {
            return 0;
        }
        match memchr::memrchr(b'\n', &self.buffer[..start]) {
            Some(newline) => newline + 1,
            None => 0,
        }
    }

    /// Remove everything up to the end of `m`, returning the text before it.
    pub fn consume(&mut self, m: &PatternMatch) -> String {
        let before = String::from_utf8_lossy(&self.buffer[..m.start]).into_owned();
        self.buffer.drain(..m.end);
        self.scanned = 0;
        before
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.scanned = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("scanned", &self.scanned)
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Keeps printable text and the line-structure control bytes, drops the rest.
struct PlainText<'a>(&'a mut Vec<u8>);

impl vte::Perform for PlainText<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.0.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<Regex> {
        list.iter().map(|p| Regex::new(p).unwrap()).collect()
    }

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\n");
        assert_eq!(buffer.as_slice(), b"Green text\r\n");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"before\x1b[3");
        buffer.extend(b"2mafter");
        assert_eq!(buffer.as_slice(), b"beforeafter");
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        let bytes = "µs".as_bytes();
        buffer.extend(&bytes[..1]);
        buffer.extend(&bytes[1..]);
        assert_eq!(buffer.as_str_lossy(), "µs");
    }

    #[test]
    fn test_earliest_match_wins() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Password: then router#");
        let m = buffer
            .find_first(&patterns(&[r"router#", r"(?i)password:"]))
            .unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.start, 0);
    }

    #[test]
    fn test_tie_goes_to_first_pattern() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"router#");
        let m = buffer.find_first(&patterns(&[r"router", r"router#"])).unwrap();
        assert_eq!(m.index, 0);
    }

    #[test]
    fn test_consume_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"banner\r\nrouter#extra");
        let m = buffer.find_first(&patterns(&[r"router#"])).unwrap();
        assert_eq!(buffer.consume(&m), "banner\r\n");
        assert_eq!(buffer.as_slice(), b"extra");
    }

    #[test]
    fn test_match_spanning_chunks() {
        let mut buffer = PatternBuffer::new(100);
        let prompt = patterns(&[r"(?m)^router#\s*$"]);
        buffer.extend(b"output\r\nrou");
        assert!(buffer.find_first(&prompt).is_none());
        buffer.extend(b"ter#");
        assert!(buffer.find_first(&prompt).is_some());
    }

    #[test]
    fn test_lookback_realigns_to_line_start() {
        let mut buffer = PatternBuffer::new(6);
        let prompt = patterns(&[r"(?m)^router#$"]);
        buffer.extend(b"aaaaarouter");
        assert!(buffer.find_first(&prompt).is_none());
        buffer.extend(b"#");
        // The look-back window starts exactly at "router#", which sits
        // mid-line behind "aaaaa".
        assert!(buffer.find_first(&prompt).is_none());
        buffer.extend(b"\nrouter#");
        assert!(buffer.find_first(&prompt).is_some());
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
