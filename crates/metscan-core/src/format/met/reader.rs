use std::io::{BufRead, Read};

use num_complex::Complex32;

use super::error::DecodeError;
use super::grammar::{SAMPLE_SIZE, SIGNAL_MARKER};

/// Sequential access to a MET byte stream.
///
/// Text lines and binary blocks are read from the same buffered source, so
/// every read starts exactly where the previous one stopped.
///
/// # Examples
/// This reader is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use std::io::Cursor;
///
/// let mut reader = MetReader::new(Cursor::new(b"DATA\r\n****".to_vec()));
/// reader.expect_line("DATA", "DATA").unwrap();
/// reader.expect_marker("rx1").unwrap();
/// ```
pub struct MetReader<R> {
    inner: R,
}

impl<R: BufRead> MetReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read one line, decode it lossily and strip trailing whitespace.
    ///
    /// # Errors
    /// Returns `UnexpectedEndOfInput` naming `context` when no bytes remain.
    pub fn read_line(&mut self, context: &'static str) -> Result<String, DecodeError> {
        let mut buf = Vec::new();
        let read = self.inner.read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Err(DecodeError::UnexpectedEndOfInput { context });
        }
        Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
    }

    pub fn skip_line(&mut self, context: &'static str) -> Result<(), DecodeError> {
        self.read_line(context).map(|_| ())
    }

    /// Read one line and require it to equal `expected` exactly; `context`
    /// names the line when the stream ends first.
    pub fn expect_line(
        &mut self,
        expected: &'static str,
        context: &'static str,
    ) -> Result<(), DecodeError> {
        let line = self.read_line(context)?;
        if line != expected {
            return Err(DecodeError::UnexpectedSection {
                expected,
                found: line,
            });
        }
        Ok(())
    }

    /// Read up to `len` bytes; fewer are returned only at end of input.
    pub fn read_up_to(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes of a binary block.
    ///
    /// # Errors
    /// Returns `TruncatedBinarySection` when the stream ends first.
    pub fn read_exact_bytes(
        &mut self,
        len: usize,
        section: &'static str,
    ) -> Result<Vec<u8>, DecodeError> {
        let buf = self.read_up_to(len)?;
        if buf.len() != len {
            return Err(DecodeError::TruncatedBinarySection {
                section,
                expected_bytes: len,
                got_bytes: buf.len(),
            });
        }
        Ok(buf)
    }

    pub fn read_u32_le(&mut self, section: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.read_exact_bytes(4, section)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f32_le(&mut self, section: &'static str) -> Result<f32, DecodeError> {
        let bytes = self.read_exact_bytes(4, section)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f32_array(
        &mut self,
        count: usize,
        section: &'static str,
    ) -> Result<Vec<f32>, DecodeError> {
        let bytes = self.read_exact_bytes(count * 4, section)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    /// Read `count` interleaved little-endian i16 (real, imaginary) pairs.
    pub fn read_iq_samples(
        &mut self,
        count: usize,
        section: &'static str,
    ) -> Result<Vec<Complex32>, DecodeError> {
        let bytes = self.read_exact_bytes(count.saturating_mul(SAMPLE_SIZE), section)?;
        Ok(bytes
            .chunks_exact(SAMPLE_SIZE)
            .map(|b| {
                let re = i16::from_le_bytes([b[0], b[1]]);
                let im = i16::from_le_bytes([b[2], b[3]]);
                Complex32::new(f32::from(re), f32::from(im))
            })
            .collect())
    }

    /// Read the 4-byte `****` marker that precedes `position`.
    pub fn expect_marker(&mut self, position: &'static str) -> Result<(), DecodeError> {
        let bytes = self.read_up_to(SIGNAL_MARKER.len())?;
        check_marker(&bytes, position)
    }
}

/// Require `bytes` to start with the `****` marker.
pub fn check_marker(bytes: &[u8], position: &'static str) -> Result<(), DecodeError> {
    if bytes.starts_with(SIGNAL_MARKER) {
        return Ok(());
    }
    Err(DecodeError::InvalidSeparator {
        position,
        expected: SIGNAL_MARKER.escape_ascii().to_string(),
        found: bytes.escape_ascii().to_string(),
    })
}
