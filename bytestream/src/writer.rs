//! Bounded writer over a caller-provided byte slice.

use crate::error::{ByteError, ByteResult};

/// A little-endian writer that never writes past the end of its slice.
///
/// Every write is all-or-nothing: on [`ByteError::BufferOverflow`] the
/// position is left untouched, so callers can stop at a record boundary.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Creates a writer positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes still free.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` if `len` more bytes fit.
    #[must_use]
    pub fn fits(&self, len: usize) -> bool {
        len <= self.remaining()
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn write_u8(&mut self, value: u8) -> ByteResult<()> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> ByteResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u16(&mut self, value: u16) -> ByteResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> ByteResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> ByteResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes a raw byte run.
    ///
    /// # Errors
    ///
    /// Returns [`ByteError::BufferOverflow`] if `bytes` does not fit entirely.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> ByteResult<()> {
        if !self.fits(bytes.len()) {
            return Err(ByteError::BufferOverflow {
                attempted: bytes.len(),
                available: self.remaining(),
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Finishes writing and returns the number of bytes written.
    #[must_use]
    pub fn finish(self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let mut buf = [0u8; 4];
        let writer = ByteWriter::new(&mut buf);
        assert_eq!(writer.position(), 0);
        assert_eq!(writer.remaining(), 4);
        assert_eq!(writer.finish(), 0);
    }

    #[test]
    fn write_u16_little_endian() {
        let mut buf = [0u8; 2];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u16(0xABCD).unwrap();
        assert_eq!(writer.finish(), 2);
        assert_eq!(buf, [0xCD, 0xAB]);
    }

    #[test]
    fn write_u32_little_endian() {
        let mut buf = [0u8; 4];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u32(0x1234_5678).unwrap();
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn write_i8_twos_complement() {
        let mut buf = [0u8; 1];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_i8(-1).unwrap();
        assert_eq!(buf, [0xFF]);
    }

    #[test]
    fn overflow_leaves_position_unchanged() {
        let mut buf = [0u8; 3];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u16(1).unwrap();
        let err = writer.write_u16(2).unwrap_err();
        assert_eq!(
            err,
            ByteError::BufferOverflow {
                attempted: 2,
                available: 1
            }
        );
        assert_eq!(writer.position(), 2);
        writer.write_u8(9).unwrap();
        assert_eq!(writer.finish(), 3);
        assert_eq!(buf, [1, 0, 9]);
    }

    #[test]
    fn written_returns_prefix() {
        let mut buf = [0u8; 8];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_bytes(&[4, 5]).unwrap();
        assert_eq!(writer.written(), &[4, 5]);
        assert!(writer.fits(6));
        assert!(!writer.fits(7));
    }

    #[test]
    fn zero_length_write_always_fits() {
        let mut buf = [0u8; 0];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_bytes(&[]).unwrap();
        assert_eq!(writer.finish(), 0);
    }
}
