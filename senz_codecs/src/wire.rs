//! Byte-level cursors shared by the delta-RLE wire formats.
//!
//! Every write goes through a bounds-tracking cursor so a decoder (or an
//! encoder fed pathological input) fails with `OutputBufferOverflow` before
//! an out-of-bounds write instead of performing it, and every read through a
//! cursor that reports truncated input as `BadParam` instead of reading past
//! the end.

use senz_core::CodecError;

pub(crate) struct ByteWriter<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(dst: &'a mut [u8]) -> Self {
        ByteWriter { dst, pos: 0 }
    }

    pub fn push(&mut self, byte: u8) -> Result<(), CodecError> {
        if self.pos >= self.dst.len() {
            return Err(CodecError::OutputBufferOverflow {
                needed: self.pos + 1,
                capacity: self.dst.len(),
            });
        }
        self.dst[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    pub fn push_pair(&mut self, bytes: [u8; 2]) -> Result<(), CodecError> {
        self.push(bytes[0])?;
        self.push(bytes[1])
    }

    pub fn push_u16_le(&mut self, value: u16) -> Result<(), CodecError> {
        self.push_pair(value.to_le_bytes())
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

pub(crate) struct ByteReader<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        ByteReader { src, pos: 0 }
    }

    pub fn next(&mut self) -> Result<u8, CodecError> {
        let byte = self
            .src
            .get(self.pos)
            .copied()
            .ok_or_else(|| CodecError::BadParam("compressed stream truncated".into()))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn done(&self) -> bool {
        self.pos >= self.src.len()
    }
}

/// Destination cursor emitting 16-bit samples in host order.
pub(crate) struct SampleSink<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl<'a> SampleSink<'a> {
    pub fn new(dst: &'a mut [u8]) -> Self {
        SampleSink { dst, pos: 0 }
    }

    pub fn put(&mut self, value: u16) -> Result<(), CodecError> {
        if self.pos + 2 > self.dst.len() {
            return Err(CodecError::OutputBufferOverflow {
                needed: self.pos + 2,
                capacity: self.dst.len(),
            });
        }
        self.dst[self.pos..self.pos + 2].copy_from_slice(&value.to_ne_bytes());
        self.pos += 2;
        Ok(())
    }

    pub fn bytes_written(&self) -> usize {
        self.pos
    }
}
