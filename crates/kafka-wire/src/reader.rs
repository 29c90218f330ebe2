//! Byte cursor over a single framed message payload.

use crate::error::{WireError, WireResult};

/// Sequential reader over a fixed byte slice.
///
/// Every read advances the cursor and returns a `Result`; decoders chain
/// reads with `?` so a short or malformed payload aborts the whole decode
/// at the first bad field. Trailing unread bytes are not an error: each
/// decoder reads exactly the fields its message version defines.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Take the next `n` bytes, advancing the cursor.
    fn take(&mut self, n: usize) -> WireResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEof {
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_i8(&mut self) -> WireResult<i8> {
        let b = self.take(1)?;
        Ok(b[0] as i8)
    }

    pub fn read_i16(&mut self) -> WireResult<i16> {
        let b = self.take(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i32(&mut self) -> WireResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i64(&mut self) -> WireResult<i64> {
        let b = self.take(8)?;
        Ok(i64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Protocol string: `i16` length prefix, `-1` marks a null string.
    pub fn read_string(&mut self) -> WireResult<Option<String>> {
        let len = self.read_i16()?;
        if len == -1 {
            return Ok(None);
        }
        if len < 0 {
            return Err(WireError::InvalidLength {
                len: i32::from(len),
                what: "string",
            });
        }
        let raw = self.take(len as usize)?;
        let s = str::from_utf8(raw).map_err(|_| WireError::InvalidUtf8)?;
        Ok(Some(s.to_owned()))
    }

    /// Protocol bytes: `i32` length prefix, `-1` marks null bytes.
    pub fn read_bytes(&mut self) -> WireResult<Option<&'a [u8]>> {
        let len = self.read_i32()?;
        if len == -1 {
            return Ok(None);
        }
        if len < 0 {
            return Err(WireError::InvalidLength { len, what: "bytes" });
        }
        Ok(Some(self.take(len as usize)?))
    }

    /// Protocol array: `i32` element count, then `count` calls of the
    /// per-element callback. A `-1` count is a null array (zero calls).
    /// Maps decode through the same shape, the callback reading one
    /// key/value pair per call. Returns the element count.
    pub fn read_array<F>(&mut self, mut elem: F) -> WireResult<usize>
    where
        F: FnMut(&mut Self) -> WireResult<()>,
    {
        let count = self.read_i32()?;
        if count == -1 {
            return Ok(0);
        }
        if count < 0 {
            return Err(WireError::InvalidLength {
                len: count,
                what: "array",
            });
        }
        for _ in 0..count {
            elem(self)?;
        }
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_reads() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_i8().unwrap(), 1);
        assert_eq!(r.read_i16().unwrap(), 2);
        assert_eq!(r.read_i32().unwrap(), 3);
        assert!(r.is_empty());
    }

    #[test]
    fn test_read_past_end_reports_counts() {
        let mut r = Reader::new(&[0x00, 0x01]);
        let err = r.read_i64().unwrap_err();
        assert_eq!(
            err,
            WireError::UnexpectedEof {
                needed: 8,
                available: 2
            }
        );
    }

    #[test]
    fn test_string_null_and_present() {
        // -1 length, then "ok"
        let data = [0xff, 0xff, 0x00, 0x02, b'o', b'k'];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap(), None);
        assert_eq!(r.read_string().unwrap(), Some("ok".to_owned()));
    }

    #[test]
    fn test_string_rejects_bad_utf8() {
        let data = [0x00, 0x02, 0xc3, 0x28];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap_err(), WireError::InvalidUtf8);
    }

    #[test]
    fn test_negative_length_is_an_error() {
        // -2 is not the null marker
        let mut r = Reader::new(&[0xff, 0xfe]);
        assert!(matches!(
            r.read_string().unwrap_err(),
            WireError::InvalidLength { len: -2, .. }
        ));
    }

    #[test]
    fn test_bytes_null_and_present() {
        let data = [0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01, 0xaa];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_bytes().unwrap(), None);
        assert_eq!(r.read_bytes().unwrap(), Some(&[0xaa][..]));
    }

    #[test]
    fn test_array_runs_callback_per_element() {
        let data = [0x00, 0x00, 0x00, 0x03, 0x0a, 0x0b, 0x0c];
        let mut r = Reader::new(&data);
        let mut seen = Vec::new();
        let n = r
            .read_array(|r| {
                seen.push(r.read_i8()?);
                Ok(())
            })
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(seen, vec![0x0a, 0x0b, 0x0c]);
    }

    #[test]
    fn test_null_array_is_empty() {
        let data = [0xff, 0xff, 0xff, 0xff];
        let mut r = Reader::new(&data);
        let n = r.read_array(|_| panic!("callback must not run")).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_array_element_error_propagates() {
        // claims 2 elements but only 1 byte follows
        let data = [0x00, 0x00, 0x00, 0x02, 0x0a];
        let mut r = Reader::new(&data);
        let err = r
            .read_array(|r| {
                r.read_i8()?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { .. }));
    }
}
