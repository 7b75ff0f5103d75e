//! BYTE_STREAM_SPLIT: byte `k` of every value is stored in stream `k`

use super::{plain, ColumnValues};
use crate::basic::PhysicalType;
use crate::{ParquetError, Result};
use bytes::Bytes;

pub fn decode(
    data: &Bytes,
    physical_type: PhysicalType,
    type_length: usize,
    count: usize,
) -> Result<ColumnValues> {
    let width = match physical_type {
        PhysicalType::Int32 | PhysicalType::Float => 4,
        PhysicalType::Int64 | PhysicalType::Double => 8,
        PhysicalType::FixedLenByteArray if type_length > 0 => type_length,
        other => {
            return Err(ParquetError::unsupported_encoding(format!(
                "BYTE_STREAM_SPLIT is not supported for {} values",
                other
            )))
        }
    };
    let total = width
        .checked_mul(count)
        .filter(|total| *total <= data.len())
        .ok_or_else(|| ParquetError::format("BYTE_STREAM_SPLIT data truncated"))?;

    let mut interleaved = vec![0u8; total];
    for (i, value) in interleaved.chunks_exact_mut(width).enumerate() {
        for (k, byte) in value.iter_mut().enumerate() {
            *byte = data[k * count + i];
        }
    }
    let (values, _) = plain::decode(&Bytes::from(interleaved), physical_type, type_length, count)?;
    Ok(values)
}
