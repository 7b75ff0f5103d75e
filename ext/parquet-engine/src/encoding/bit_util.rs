//! Bit-level readers and writers used by the level, dictionary index and
//! delta encodings. Values are packed least-significant bit first.

use crate::{ParquetError, Result};

/// Number of bits needed to represent `max`
pub fn num_required_bits(max: u64) -> u8 {
    (64 - max.leading_zeros()) as u8
}

/// Bytes needed to hold `bit_width` bits
pub fn byte_width(bit_width: u8) -> usize {
    (bit_width as usize).div_ceil(8)
}

pub struct BitReader<'a> {
    buf: &'a [u8],
    byte_offset: usize,
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Byte position, rounded up past a partially consumed byte
    pub fn byte_position(&self) -> usize {
        self.byte_offset + usize::from(self.bit_offset > 0)
    }

    pub fn bits_remaining(&self) -> usize {
        (self.buf.len() - self.byte_offset) * 8 - self.bit_offset
    }

    pub fn get_value(&mut self, num_bits: u8) -> Result<u64> {
        let mut remaining = num_bits as usize;
        if remaining > 64 {
            return Err(ParquetError::format(format!(
                "bit width {} exceeds 64",
                num_bits
            )));
        }
        if remaining > self.bits_remaining() {
            return Err(ParquetError::format("bit-packed data truncated"));
        }
        let mut value = 0u64;
        let mut shift = 0;
        while remaining > 0 {
            let available = 8 - self.bit_offset;
            let take = available.min(remaining);
            let byte = self.buf[self.byte_offset] >> self.bit_offset;
            let bits = (byte as u64) & ((1u64 << take) - 1);
            value |= bits << shift;
            shift += take;
            remaining -= take;
            self.bit_offset += take;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_offset += 1;
            }
        }
        Ok(value)
    }

    /// Moves to the next byte boundary
    pub fn align(&mut self) {
        if self.bit_offset > 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    pub fn get_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.align();
        let end = self
            .byte_offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| ParquetError::format("encoded data truncated"))?;
        let bytes = &self.buf[self.byte_offset..end];
        self.byte_offset = end;
        Ok(bytes)
    }

    /// Unsigned LEB128
    pub fn get_vlq_int(&mut self) -> Result<u64> {
        self.align();
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .buf
                .get(self.byte_offset)
                .ok_or_else(|| ParquetError::format("varint truncated"))?;
            self.byte_offset += 1;
            if shift >= 64 {
                return Err(ParquetError::format("varint overflow"));
            }
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    pub fn get_zigzag_vlq_int(&mut self) -> Result<i64> {
        let raw = self.get_vlq_int()?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }
}

#[derive(Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    bit_offset: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_value(&mut self, value: u64, num_bits: u8) {
        let mut value = value;
        let mut remaining = num_bits as usize;
        while remaining > 0 {
            if self.bit_offset == 0 {
                self.buf.push(0);
            }
            let free = 8 - self.bit_offset;
            let take = free.min(remaining);
            let bits = (value & ((1u64 << take) - 1)) as u8;
            if let Some(last) = self.buf.last_mut() {
                *last |= bits << self.bit_offset;
            }
            self.bit_offset = (self.bit_offset + take) % 8;
            value = value.checked_shr(take as u32).unwrap_or(0);
            remaining -= take;
        }
    }

    pub fn align(&mut self) {
        self.bit_offset = 0;
    }

    pub fn put_aligned_bytes(&mut self, bytes: &[u8]) {
        self.align();
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_vlq_int(&mut self, mut value: u64) {
        self.align();
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn put_zigzag_vlq_int(&mut self, value: i64) {
        self.put_vlq_int(((value << 1) ^ (value >> 63)) as u64);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
