//! DELTA_BINARY_PACKED, DELTA_LENGTH_BYTE_ARRAY and DELTA_BYTE_ARRAY

use super::bit_util::{num_required_bits, BitReader, BitWriter};
use super::ColumnValues;
use crate::basic::PhysicalType;
use crate::{ParquetError, Result};
use bytes::{Bytes, BytesMut};

const BLOCK_SIZE: usize = 128;
const MINIBLOCKS_PER_BLOCK: usize = 4;
const VALUES_PER_MINIBLOCK: usize = BLOCK_SIZE / MINIBLOCKS_PER_BLOCK;

/// Decodes a delta-binary-packed stream of exactly `count` values, returning
/// them and the number of bytes the stream occupied
fn decode_deltas(buf: &[u8], count: usize) -> Result<(Vec<i64>, usize)> {
    let mut reader = BitReader::new(buf);
    let block_size = reader.get_vlq_int()? as usize;
    let miniblocks = reader.get_vlq_int()? as usize;
    let total = reader.get_vlq_int()?;
    let first = reader.get_zigzag_vlq_int()?;

    if total != count as u64 {
        return Err(ParquetError::format(format!(
            "delta stream declares {} values, page needs {}",
            total, count
        )));
    }
    let total = count;
    if miniblocks == 0
        || block_size == 0
        || block_size % BLOCK_SIZE != 0
        || block_size % miniblocks != 0
    {
        return Err(ParquetError::format(format!(
            "invalid delta block layout: block size {}, {} miniblocks",
            block_size, miniblocks
        )));
    }
    let per_miniblock = block_size / miniblocks;
    if per_miniblock % 8 != 0 {
        return Err(ParquetError::format(format!(
            "miniblock size {} is not a multiple of 8",
            per_miniblock
        )));
    }

    let mut values = Vec::with_capacity(total.min(buf.len() * 8));
    if total == 0 {
        return Ok((values, reader.byte_position()));
    }
    values.push(first);
    let mut last = first;

    while values.len() < total {
        let min_delta = reader.get_zigzag_vlq_int()?;
        let widths = reader.get_aligned_bytes(miniblocks)?;
        for &width in widths {
            if values.len() >= total {
                // Trailing miniblocks of the last block carry no body
                break;
            }
            if width > 64 {
                return Err(ParquetError::format(format!(
                    "miniblock bit width {} exceeds 64",
                    width
                )));
            }
            let needed = per_miniblock.min(total - values.len());
            for _ in 0..needed {
                let packed = reader.get_value(width)?;
                last = last.wrapping_add(min_delta).wrapping_add(packed as i64);
                values.push(last);
            }
            // Skip the padding of a partially used miniblock if present
            let padding = (per_miniblock - needed) * width as usize;
            let skip = padding.min(reader.bits_remaining());
            for _ in 0..skip / 64 {
                reader.get_value(64)?;
            }
            reader.get_value((skip % 64) as u8)?;
            reader.align();
        }
    }
    Ok((values, reader.byte_position()))
}

pub fn decode_binary_packed(
    data: &Bytes,
    physical_type: PhysicalType,
    count: usize,
) -> Result<ColumnValues> {
    let (values, _) = decode_deltas(data, count)?;
    match physical_type {
        PhysicalType::Int32 => Ok(ColumnValues::Int32(
            values.into_iter().map(|v| v as i32).collect(),
        )),
        PhysicalType::Int64 => Ok(ColumnValues::Int64(values)),
        other => Err(ParquetError::unsupported_encoding(format!(
            "DELTA_BINARY_PACKED is not supported for {} values",
            other
        ))),
    }
}

fn lengths(values: Vec<i64>) -> Result<Vec<usize>> {
    values
        .into_iter()
        .map(|len| {
            usize::try_from(len)
                .map_err(|_| ParquetError::format(format!("negative length {}", len)))
        })
        .collect()
}

fn split_by_lengths(data: &Bytes, offset: usize, lens: &[usize]) -> Result<(Vec<Bytes>, usize)> {
    let mut out = Vec::with_capacity(lens.len());
    let mut pos = offset;
    for len in lens {
        let end = pos
            .checked_add(*len)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| ParquetError::format("DELTA_LENGTH_BYTE_ARRAY data truncated"))?;
        out.push(data.slice(pos..end));
        pos = end;
    }
    Ok((out, pos))
}

fn decode_length_prefixed(data: &Bytes, count: usize) -> Result<(Vec<Bytes>, usize)> {
    let (lens, consumed) = decode_deltas(data, count)?;
    let lens = lengths(lens)?;
    split_by_lengths(data, consumed, &lens)
}

pub fn decode_length_byte_array(
    data: &Bytes,
    physical_type: PhysicalType,
    count: usize,
) -> Result<ColumnValues> {
    if physical_type != PhysicalType::ByteArray {
        return Err(ParquetError::unsupported_encoding(format!(
            "DELTA_LENGTH_BYTE_ARRAY is not supported for {} values",
            physical_type
        )));
    }
    let (values, _) = decode_length_prefixed(data, count)?;
    Ok(ColumnValues::ByteArray(values))
}

/// Incremental encoding: prefix lengths shared with the previous value, then
/// the suffixes as DELTA_LENGTH_BYTE_ARRAY
pub fn decode_byte_array(
    data: &Bytes,
    physical_type: PhysicalType,
    count: usize,
) -> Result<ColumnValues> {
    if !matches!(
        physical_type,
        PhysicalType::ByteArray | PhysicalType::FixedLenByteArray
    ) {
        return Err(ParquetError::unsupported_encoding(format!(
            "DELTA_BYTE_ARRAY is not supported for {} values",
            physical_type
        )));
    }
    let (prefixes, consumed) = decode_deltas(data, count)?;
    let prefixes = lengths(prefixes)?;
    let suffixes_data = data.slice(consumed..);
    let (suffixes, _) = decode_length_prefixed(&suffixes_data, count)?;

    let mut out = Vec::with_capacity(count);
    let mut previous = Bytes::new();
    for (prefix_len, suffix) in prefixes.into_iter().zip(suffixes) {
        if prefix_len > previous.len() {
            return Err(ParquetError::format(format!(
                "prefix length {} exceeds previous value length {}",
                prefix_len,
                previous.len()
            )));
        }
        let mut value = BytesMut::with_capacity(prefix_len + suffix.len());
        value.extend_from_slice(&previous[..prefix_len]);
        value.extend_from_slice(&suffix);
        previous = value.freeze();
        out.push(previous.clone());
    }
    Ok(match physical_type {
        PhysicalType::FixedLenByteArray => ColumnValues::FixedLenByteArray(out),
        _ => ColumnValues::ByteArray(out),
    })
}

/// Encodes with 128-value blocks of four miniblocks
fn encode_deltas(first: i64, deltas: &[i64], out: &mut Vec<u8>) {
    let mut writer = BitWriter::new();
    writer.put_vlq_int(BLOCK_SIZE as u64);
    writer.put_vlq_int(MINIBLOCKS_PER_BLOCK as u64);
    writer.put_vlq_int(deltas.len() as u64 + 1);
    writer.put_zigzag_vlq_int(first);

    for block in deltas.chunks(BLOCK_SIZE) {
        let min_delta = block.iter().copied().min().unwrap_or(0);
        writer.put_zigzag_vlq_int(min_delta);

        let miniblocks: Vec<&[i64]> = block.chunks(VALUES_PER_MINIBLOCK).collect();
        let widths: Vec<u8> = (0..MINIBLOCKS_PER_BLOCK)
            .map(|i| {
                miniblocks.get(i).map_or(0, |mb| {
                    let max = mb
                        .iter()
                        .map(|d| d.wrapping_sub(min_delta) as u64)
                        .max()
                        .unwrap_or(0);
                    num_required_bits(max)
                })
            })
            .collect();
        writer.put_aligned_bytes(&widths);

        for (mb, width) in miniblocks.iter().zip(&widths) {
            for i in 0..VALUES_PER_MINIBLOCK {
                let adjusted = mb
                    .get(i)
                    .map_or(0, |d| d.wrapping_sub(min_delta) as u64);
                writer.put_value(adjusted, *width);
            }
            writer.align();
        }
    }
    out.extend_from_slice(&writer.into_bytes());
}

pub fn encode_i32(values: &[i32], out: &mut Vec<u8>) {
    let deltas: Vec<i64> = values
        .windows(2)
        .map(|w| w[1].wrapping_sub(w[0]) as i64)
        .collect();
    if values.is_empty() {
        encode_empty(out);
    } else {
        encode_deltas(values[0] as i64, &deltas, out);
    }
}

pub fn encode_i64(values: &[i64], out: &mut Vec<u8>) {
    let deltas: Vec<i64> = values.windows(2).map(|w| w[1].wrapping_sub(w[0])).collect();
    if values.is_empty() {
        encode_empty(out);
    } else {
        encode_deltas(values[0], &deltas, out);
    }
}

fn encode_empty(out: &mut Vec<u8>) {
    let mut writer = BitWriter::new();
    writer.put_vlq_int(BLOCK_SIZE as u64);
    writer.put_vlq_int(MINIBLOCKS_PER_BLOCK as u64);
    writer.put_vlq_int(0);
    writer.put_zigzag_vlq_int(0);
    out.extend_from_slice(&writer.into_bytes());
}

/// DELTA_LENGTH_BYTE_ARRAY: lengths as delta-binary-packed, then the bytes
pub fn encode_length_byte_array(values: &[Bytes], out: &mut Vec<u8>) {
    let lens: Vec<i32> = values.iter().map(|v| v.len() as i32).collect();
    encode_i32(&lens, out);
    for value in values {
        out.extend_from_slice(value);
    }
}
