//! PLAIN encoding
//!
//! Fixed-width values are stored little-endian back to back, booleans are
//! bit-packed LSB first, BYTE_ARRAY values carry a 4-byte length prefix.

use super::bit_util::BitReader;
use super::ColumnValues;
use crate::basic::PhysicalType;
use crate::{ParquetError, Result};
use bytes::Bytes;

fn truncated(physical_type: PhysicalType, count: usize) -> ParquetError {
    ParquetError::format(format!(
        "PLAIN {} data too short for {} values",
        physical_type, count
    ))
}

fn fixed_chunks(
    data: &Bytes,
    width: usize,
    count: usize,
    physical_type: PhysicalType,
) -> Result<&[u8]> {
    let needed = width
        .checked_mul(count)
        .ok_or_else(|| truncated(physical_type, count))?;
    data.get(..needed)
        .ok_or_else(|| truncated(physical_type, count))
}

/// Decodes `count` values, returning them with the number of bytes consumed
pub fn decode(
    data: &Bytes,
    physical_type: PhysicalType,
    type_length: usize,
    count: usize,
) -> Result<(ColumnValues, usize)> {
    let values = match physical_type {
        PhysicalType::Boolean => {
            let mut reader = BitReader::new(data);
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                let bit = reader
                    .get_value(1)
                    .map_err(|_| truncated(physical_type, count))?;
                out.push(bit != 0);
            }
            return Ok((ColumnValues::Boolean(out), count.div_ceil(8)));
        }
        PhysicalType::Int32 => ColumnValues::Int32(
            fixed_chunks(data, 4, count, physical_type)?
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        PhysicalType::Int64 => ColumnValues::Int64(
            fixed_chunks(data, 8, count, physical_type)?
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
        PhysicalType::Int96 => ColumnValues::Int96(
            fixed_chunks(data, 12, count, physical_type)?
                .chunks_exact(12)
                .map(|c| {
                    [
                        u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                        u32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                        u32::from_le_bytes([c[8], c[9], c[10], c[11]]),
                    ]
                })
                .collect(),
        ),
        PhysicalType::Float => ColumnValues::Float(
            fixed_chunks(data, 4, count, physical_type)?
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        PhysicalType::Double => ColumnValues::Double(
            fixed_chunks(data, 8, count, physical_type)?
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
        PhysicalType::ByteArray => {
            let mut out = Vec::with_capacity(count);
            let mut offset = 0usize;
            for _ in 0..count {
                let prefix = data
                    .get(offset..offset + 4)
                    .ok_or_else(|| truncated(physical_type, count))?;
                let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
                offset += 4;
                let end = offset
                    .checked_add(len)
                    .filter(|end| *end <= data.len())
                    .ok_or_else(|| truncated(physical_type, count))?;
                out.push(data.slice(offset..end));
                offset = end;
            }
            return Ok((ColumnValues::ByteArray(out), offset));
        }
        PhysicalType::FixedLenByteArray => {
            if type_length == 0 && count > 0 {
                return Err(ParquetError::format(
                    "FIXED_LEN_BYTE_ARRAY column without a type length",
                ));
            }
            fixed_chunks(data, type_length, count, physical_type)?;
            let out = (0..count)
                .map(|i| data.slice(i * type_length..(i + 1) * type_length))
                .collect();
            return Ok((ColumnValues::FixedLenByteArray(out), type_length * count));
        }
    };
    let width = match physical_type {
        PhysicalType::Int32 | PhysicalType::Float => 4,
        PhysicalType::Int96 => 12,
        _ => 8,
    };
    Ok((values, width * count))
}

/// Appends the PLAIN encoding of `values` to `out`
pub fn encode(values: &ColumnValues, out: &mut Vec<u8>) {
    match values {
        ColumnValues::Boolean(v) => {
            let mut byte = 0u8;
            for (i, b) in v.iter().enumerate() {
                if *b {
                    byte |= 1 << (i % 8);
                }
                if i % 8 == 7 {
                    out.push(byte);
                    byte = 0;
                }
            }
            if v.len() % 8 != 0 {
                out.push(byte);
            }
        }
        ColumnValues::Int32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ColumnValues::Int64(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ColumnValues::Int96(v) => v.iter().for_each(|words| {
            for w in words {
                out.extend_from_slice(&w.to_le_bytes());
            }
        }),
        ColumnValues::Float(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ColumnValues::Double(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ColumnValues::ByteArray(v) => v.iter().for_each(|b| {
            out.extend_from_slice(&(b.len() as u32).to_le_bytes());
            out.extend_from_slice(b);
        }),
        ColumnValues::FixedLenByteArray(v) => v.iter().for_each(|b| out.extend_from_slice(b)),
    }
}
