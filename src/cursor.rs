//! Forward-only, bounds-checked view over an immutable byte slice.

use crate::error::{Result, VolError};

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Consume and return the next `n` bytes.
    pub fn next(&mut self, context: &'static str, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(VolError::InsufficientData {
                context,
                expected:  n as u64,
                available: self.remaining() as u64,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    pub fn skip(&mut self, context: &'static str, n: usize) -> Result<()> {
        self.next(context, n).map(|_| ())
    }

    /// Index (relative to the current position) of the first occurrence of
    /// `tag` in the unread bytes.
    pub fn find_magic(&self, tag: &[u8]) -> Option<usize> {
        if tag.is_empty() {
            return Some(0);
        }
        self.rest().windows(tag.len()).position(|w| w == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_advances_and_splits() {
        let mut cur = ByteCursor::new(b"abcdef");
        assert_eq!(cur.next("test", 2).unwrap(), b"ab");
        assert_eq!(cur.position(), 2);
        assert_eq!(cur.next("test", 4).unwrap(), b"cdef");
        assert!(cur.is_empty());
        assert_eq!(cur.next("test", 0).unwrap(), b"");
    }

    #[test]
    fn next_past_end_reports_counts() {
        let mut cur = ByteCursor::new(b"abc");
        cur.skip("test", 1).unwrap();
        match cur.next("frame header", 8) {
            Err(VolError::InsufficientData { context, expected, available }) => {
                assert_eq!(context, "frame header");
                assert_eq!(expected, 8);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // A failed read consumes nothing.
        assert_eq!(cur.position(), 1);
    }

    #[test]
    fn find_magic_is_relative_to_position() {
        let mut cur = ByteCursor::new(b"xxvoliyyvoli");
        assert_eq!(cur.find_magic(b"voli"), Some(2));
        cur.skip("test", 6).unwrap();
        assert_eq!(cur.find_magic(b"voli"), Some(2));
        cur.skip("test", 3).unwrap();
        assert_eq!(cur.find_magic(b"voli"), None);
    }
}
