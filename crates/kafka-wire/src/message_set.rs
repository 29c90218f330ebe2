//! Message-set blobs carried inside Produce requests and Fetch responses.

/// Borrowed view over a message-set blob.
///
/// A message set is a packed sequence of `offset:i64, size:i32, payload`
/// entries with no count prefix. Brokers truncate the final entry at the
/// fetch size boundary, so a partial trailing entry is normal and ends
/// iteration cleanly. Entry payloads are opaque here: compression,
/// checksums and record contents are never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageSet<'a> {
    data: &'a [u8],
}

/// Bytes of the fixed entry header (offset + size).
const ENTRY_HEADER: usize = 12;

impl<'a> MessageSet<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        MessageSet { data }
    }

    /// Total blob size in bytes, including any truncated tail.
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Peek the first complete `(offset, payload)` entry, if any.
    pub fn first(&self) -> Option<(i64, &'a [u8])> {
        self.iter().next()
    }

    pub fn iter(&self) -> MessageSetIter<'a> {
        MessageSetIter { rest: self.data }
    }

    /// Number of complete entries, or `None` when an entry header is
    /// structurally corrupt (negative size). A truncated trailing entry
    /// is excluded from the count without failing.
    pub fn count(&self) -> Option<usize> {
        let mut rest = self.data;
        let mut n = 0;
        while rest.len() >= ENTRY_HEADER {
            let size = i32::from_be_bytes([rest[8], rest[9], rest[10], rest[11]]);
            if size < 0 {
                return None;
            }
            let size = size as usize;
            if rest.len() - ENTRY_HEADER < size {
                break;
            }
            rest = &rest[ENTRY_HEADER + size..];
            n += 1;
        }
        Some(n)
    }
}

/// Iterator over the complete entries of a [`MessageSet`].
///
/// Stops at the first truncated or corrupt entry. Early abort is simply
/// dropping the iterator.
#[derive(Debug)]
pub struct MessageSetIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for MessageSetIter<'a> {
    type Item = (i64, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < ENTRY_HEADER {
            return None;
        }
        let r = self.rest;
        let offset = i64::from_be_bytes([r[0], r[1], r[2], r[3], r[4], r[5], r[6], r[7]]);
        let size = i32::from_be_bytes([r[8], r[9], r[10], r[11]]);
        if size < 0 {
            self.rest = &[];
            return None;
        }
        let size = size as usize;
        if r.len() - ENTRY_HEADER < size {
            self.rest = &[];
            return None;
        }
        let payload = &r[ENTRY_HEADER..ENTRY_HEADER + size];
        self.rest = &r[ENTRY_HEADER + size..];
        Some((offset, payload))
    }
}
