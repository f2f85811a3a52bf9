//! Byte reader with bounded operations.

use crate::error::{ByteError, ByteResult};

/// A little-endian reader over a byte slice.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes remaining to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns `true` if there are no more bytes to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the current byte position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the next byte without consuming it.
    #[must_use]
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> ByteResult<u8> {
        let [value] = self.read_array::<1>()?;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> ByteResult<i8> {
        Ok(i8::from_le_bytes(self.read_array::<1>()?))
    }

    pub fn read_u16(&mut self) -> ByteResult<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> ByteResult<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    pub fn read_f32(&mut self) -> ByteResult<f32> {
        Ok(f32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads `len` bytes as a borrowed slice.
    pub fn read_bytes(&mut self, len: usize) -> ByteResult<&'a [u8]> {
        self.ensure_bytes(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Returns everything not yet read and moves to the end.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos.min(self.data.len())..];
        self.pos = self.data.len();
        rest
    }

    fn ensure_bytes(&self, len: usize) -> ByteResult<()> {
        let available = self.remaining();
        if len > available {
            return Err(ByteError::UnexpectedEof {
                requested: len,
                available,
            });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> ByteResult<[u8; N]> {
        self.ensure_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reader() {
        let reader = ByteReader::new(&[]);
        assert!(reader.is_empty());
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.peek_u8(), None);
    }

    #[test]
    fn read_from_empty_fails() {
        let mut reader = ByteReader::new(&[]);
        let result = reader.read_u8();
        assert!(matches!(
            result,
            Err(ByteError::UnexpectedEof {
                requested: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn read_u32_little_endian() {
        let mut reader = ByteReader::new(&[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert!(reader.is_empty());
    }

    #[test]
    fn short_read_does_not_advance() {
        let mut reader = ByteReader::new(&[0x01, 0x02, 0x03]);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, ByteError::UnexpectedEof { .. }));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn read_bytes_and_rest() {
        let mut reader = ByteReader::new(&[1, 2, 3, 4, 5]);
        assert_eq!(reader.read_bytes(2).unwrap(), &[1, 2]);
        assert_eq!(reader.peek_u8(), Some(3));
        assert_eq!(reader.read_rest(), &[3, 4, 5]);
        assert!(reader.is_empty());
        assert!(reader.read_rest().is_empty());
    }

    #[test]
    fn read_i8_negative() {
        let mut reader = ByteReader::new(&[0x80]);
        assert_eq!(reader.read_i8().unwrap(), i8::MIN);
    }
}
