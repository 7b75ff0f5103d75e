//! RLE / bit-packed hybrid encoding
//!
//! Used for definition and repetition levels, dictionary indices and RLE
//! booleans. Each run starts with a ULEB128 header: an even header is a
//! repeated run (`count << 1`) followed by the value in `ceil(width / 8)`
//! little-endian bytes; an odd header is a bit-packed run of
//! `(header >> 1) * 8` values.

use super::bit_util::{byte_width, BitReader, BitWriter};
use crate::{ParquetError, Result};

pub struct RleDecoder<'a> {
    bit_width: u8,
    reader: BitReader<'a>,
    rle_left: usize,
    rle_value: u64,
    packed_left: usize,
}

impl<'a> RleDecoder<'a> {
    pub fn new(buf: &'a [u8], bit_width: u8) -> Self {
        Self {
            bit_width,
            reader: BitReader::new(buf),
            rle_left: 0,
            rle_value: 0,
            packed_left: 0,
        }
    }

    /// Bytes consumed from the input so far
    pub fn consumed(&self) -> usize {
        self.reader.byte_position()
    }

    fn next_run(&mut self) -> Result<bool> {
        if self.reader.bits_remaining() < 8 {
            return Ok(false);
        }
        let header = self.reader.get_vlq_int()?;
        if header & 1 == 1 {
            let groups = (header >> 1) as usize;
            let declared = groups.saturating_mul(8);
            // Writers may drop the padding of the final group
            let available = if self.bit_width == 0 {
                declared
            } else {
                self.reader.bits_remaining() / self.bit_width as usize
            };
            self.packed_left = declared.min(available);
        } else {
            self.rle_left = (header >> 1) as usize;
            let bytes = self.reader.get_aligned_bytes(byte_width(self.bit_width))?;
            let mut value = 0u64;
            for (i, byte) in bytes.iter().enumerate() {
                value |= (*byte as u64) << (8 * i);
            }
            self.rle_value = value;
        }
        Ok(true)
    }

    /// Next decoded value, `None` once the input is exhausted
    pub fn next_value(&mut self) -> Result<Option<u64>> {
        loop {
            if self.rle_left > 0 {
                self.rle_left -= 1;
                return Ok(Some(self.rle_value));
            }
            if self.packed_left > 0 {
                self.packed_left -= 1;
                let value = self.reader.get_value(self.bit_width)?;
                if self.packed_left == 0 {
                    self.reader.align();
                }
                return Ok(Some(value));
            }
            if !self.next_run()? {
                return Ok(None);
            }
        }
    }

    /// Decodes exactly `count` values
    pub fn decode(&mut self, count: usize) -> Result<Vec<u64>> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            match self.next_value()? {
                Some(value) => out.push(value),
                None if self.bit_width == 0 => out.push(0),
                None => {
                    return Err(ParquetError::format(format!(
                        "RLE stream ended after {} of {} values",
                        out.len(),
                        count
                    )))
                }
            }
        }
        Ok(out)
    }
}

/// Decodes `count` levels, rejecting any above `max_level`
pub fn decode_levels(buf: &[u8], bit_width: u8, count: usize, max_level: i16) -> Result<Vec<i16>> {
    let mut decoder = RleDecoder::new(buf, bit_width);
    decoder
        .decode(count)?
        .into_iter()
        .map(|level| checked_level(level, max_level))
        .collect()
}

/// Legacy BIT_PACKED levels: most-significant bit first, no run headers
pub fn decode_bit_packed_levels(
    buf: &[u8],
    bit_width: u8,
    count: usize,
    max_level: i16,
) -> Result<Vec<i16>> {
    let needed = (count * bit_width as usize).div_ceil(8);
    if buf.len() < needed {
        return Err(ParquetError::format("BIT_PACKED levels truncated"));
    }
    let mut out = Vec::with_capacity(count);
    let mut bit = 0usize;
    for _ in 0..count {
        let mut value = 0u64;
        for _ in 0..bit_width {
            let byte = buf[bit / 8];
            let set = (byte >> (7 - bit % 8)) & 1;
            value = (value << 1) | set as u64;
            bit += 1;
        }
        out.push(checked_level(value, max_level)?);
    }
    Ok(out)
}

fn checked_level(level: u64, max_level: i16) -> Result<i16> {
    if level > max_level as u64 {
        return Err(ParquetError::format(format!(
            "level {} exceeds maximum {}",
            level, max_level
        )));
    }
    Ok(level as i16)
}

/// Encoder producing the hybrid format
pub struct RleEncoder {
    bit_width: u8,
    writer: BitWriter,
    literals: Vec<u64>,
}

const MIN_REPEATED_RUN: usize = 8;

impl RleEncoder {
    pub fn new(bit_width: u8) -> Self {
        Self {
            bit_width,
            writer: BitWriter::new(),
            literals: Vec::new(),
        }
    }

    pub fn encode(bit_width: u8, values: &[u64]) -> Vec<u8> {
        let mut encoder = Self::new(bit_width);
        encoder.put_all(values);
        encoder.finish()
    }

    pub fn put_all(&mut self, values: &[u64]) {
        let mut i = 0;
        while i < values.len() {
            let mut run_end = i + 1;
            while run_end < values.len() && values[run_end] == values[i] {
                run_end += 1;
            }
            let run_len = run_end - i;
            // Literal runs must hold whole groups of 8, so top the pending
            // literals up from the repeated run before switching modes.
            let fill = (MIN_REPEATED_RUN - self.literals.len() % MIN_REPEATED_RUN)
                % MIN_REPEATED_RUN;
            if run_len >= MIN_REPEATED_RUN + fill {
                self.literals
                    .extend(std::iter::repeat(values[i]).take(fill));
                self.flush_literals();
                self.write_repeated(values[i], run_len - fill);
                i = run_end;
            } else {
                self.literals.push(values[i]);
                i += 1;
            }
        }
    }

    fn write_repeated(&mut self, value: u64, count: usize) {
        self.writer.put_vlq_int((count as u64) << 1);
        let bytes = value.to_le_bytes();
        self.writer
            .put_aligned_bytes(&bytes[..byte_width(self.bit_width)]);
    }

    fn flush_literals(&mut self) {
        if self.literals.is_empty() {
            return;
        }
        while self.literals.len() % 8 != 0 {
            self.literals.push(0);
        }
        let groups = self.literals.len() / 8;
        self.writer.put_vlq_int(((groups as u64) << 1) | 1);
        for value in std::mem::take(&mut self.literals) {
            self.writer.put_value(value, self.bit_width);
        }
        self.writer.align();
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.flush_literals();
        self.writer.into_bytes()
    }
}

/// Levels as a v1 data page stores them: 4-byte length prefix + hybrid body
pub fn encode_levels_v1(levels: &[i16], bit_width: u8) -> Vec<u8> {
    let body = encode_levels(levels, bit_width);
    let mut out = Vec::with_capacity(body.len() + 4);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

pub fn encode_levels(levels: &[i16], bit_width: u8) -> Vec<u8> {
    let values: Vec<u64> = levels.iter().map(|l| *l as u64).collect();
    RleEncoder::encode(bit_width, &values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_repeated_run() {
        // 6 x value 3 at width 2
        let buf = [0x0c, 0x03];
        let mut decoder = RleDecoder::new(&buf, 2);
        assert_eq!(decoder.decode(6).unwrap(), vec![3; 6]);
    }

    #[test]
    fn test_decode_bit_packed_group() {
        let buf = [0x03, 0x55];
        let mut decoder = RleDecoder::new(&buf, 1);
        assert_eq!(decoder.decode(8).unwrap(), vec![1, 0, 1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_mixed_runs_roundtrip() {
        let values: Vec<u64> = vec![7, 7, 7, 1, 2, 3, 4, 5, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 0, 1];
        let encoded = RleEncoder::encode(3, &values);
        let mut decoder = RleDecoder::new(&encoded, 3);
        assert_eq!(decoder.decode(values.len()).unwrap(), values);
    }

    #[test]
    fn test_long_run_uses_repeated_encoding() {
        let values = vec![1u64; 1000];
        let encoded = RleEncoder::encode(1, &values);
        // header varint (2 bytes) + one value byte
        assert_eq!(encoded.len(), 3);
        let mut decoder = RleDecoder::new(&encoded, 1);
        assert_eq!(decoder.decode(1000).unwrap(), values);
    }

    #[test]
    fn test_truncated_stream_is_error() {
        let buf = [0x04, 0x01];
        let mut decoder = RleDecoder::new(&buf, 1);
        assert!(decoder.decode(3).is_err());
    }

    #[test]
    fn test_level_above_max_is_error() {
        let encoded = encode_levels(&[0, 1, 2], 2);
        assert!(decode_levels(&encoded, 2, 3, 1).is_err());
        assert_eq!(decode_levels(&encoded, 2, 3, 2).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_legacy_bit_packed_levels() {
        // 0..8 at width 3, MSB first
        let buf = [0b0000_0101, 0b0011_1001, 0b0111_0111];
        let levels = decode_bit_packed_levels(&buf, 3, 8, 7).unwrap();
        assert_eq!(levels, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
