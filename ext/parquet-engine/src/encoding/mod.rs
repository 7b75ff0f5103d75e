//! Value encodings
//!
//! Decoders turn an encoded byte buffer into [`ColumnValues`], a typed buffer
//! of non-null physical values. Encoders do the reverse for the writer.

pub mod bit_util;
pub mod byte_stream_split;
pub mod delta;
pub mod plain;
pub mod rle;

use crate::basic::{Encoding, PhysicalType};
use crate::{ParquetError, Result};
use bytes::Bytes;

/// INT96 is three little-endian u32 words: nanos of day (low, high), julian day
pub type Int96 = [u32; 3];

/// Non-null physical values of one column, decoded from a page
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<Int96>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray(Vec<Bytes>),
    FixedLenByteArray(Vec<Bytes>),
}

impl ColumnValues {
    pub fn empty(physical_type: PhysicalType) -> Self {
        match physical_type {
            PhysicalType::Boolean => ColumnValues::Boolean(Vec::new()),
            PhysicalType::Int32 => ColumnValues::Int32(Vec::new()),
            PhysicalType::Int64 => ColumnValues::Int64(Vec::new()),
            PhysicalType::Int96 => ColumnValues::Int96(Vec::new()),
            PhysicalType::Float => ColumnValues::Float(Vec::new()),
            PhysicalType::Double => ColumnValues::Double(Vec::new()),
            PhysicalType::ByteArray => ColumnValues::ByteArray(Vec::new()),
            PhysicalType::FixedLenByteArray => ColumnValues::FixedLenByteArray(Vec::new()),
        }
    }

    pub fn physical_type(&self) -> PhysicalType {
        match self {
            ColumnValues::Boolean(_) => PhysicalType::Boolean,
            ColumnValues::Int32(_) => PhysicalType::Int32,
            ColumnValues::Int64(_) => PhysicalType::Int64,
            ColumnValues::Int96(_) => PhysicalType::Int96,
            ColumnValues::Float(_) => PhysicalType::Float,
            ColumnValues::Double(_) => PhysicalType::Double,
            ColumnValues::ByteArray(_) => PhysicalType::ByteArray,
            ColumnValues::FixedLenByteArray(_) => PhysicalType::FixedLenByteArray,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Int32(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Int96(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Double(v) => v.len(),
            ColumnValues::ByteArray(v) => v.len(),
            ColumnValues::FixedLenByteArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves dictionary indices against `self`
    pub fn take(&self, indices: &[u64]) -> Result<ColumnValues> {
        fn gather<T: Clone>(dict: &[T], indices: &[u64]) -> Result<Vec<T>> {
            indices
                .iter()
                .map(|i| {
                    dict.get(*i as usize).cloned().ok_or_else(|| {
                        ParquetError::format(format!(
                            "dictionary index {} out of range for {} entries",
                            i,
                            dict.len()
                        ))
                    })
                })
                .collect()
        }

        Ok(match self {
            ColumnValues::Boolean(v) => ColumnValues::Boolean(gather(v, indices)?),
            ColumnValues::Int32(v) => ColumnValues::Int32(gather(v, indices)?),
            ColumnValues::Int64(v) => ColumnValues::Int64(gather(v, indices)?),
            ColumnValues::Int96(v) => ColumnValues::Int96(gather(v, indices)?),
            ColumnValues::Float(v) => ColumnValues::Float(gather(v, indices)?),
            ColumnValues::Double(v) => ColumnValues::Double(gather(v, indices)?),
            ColumnValues::ByteArray(v) => ColumnValues::ByteArray(gather(v, indices)?),
            ColumnValues::FixedLenByteArray(v) => {
                ColumnValues::FixedLenByteArray(gather(v, indices)?)
            }
        })
    }

    pub fn truncate(&mut self, len: usize) {
        match self {
            ColumnValues::Boolean(v) => v.truncate(len),
            ColumnValues::Int32(v) => v.truncate(len),
            ColumnValues::Int64(v) => v.truncate(len),
            ColumnValues::Int96(v) => v.truncate(len),
            ColumnValues::Float(v) => v.truncate(len),
            ColumnValues::Double(v) => v.truncate(len),
            ColumnValues::ByteArray(v) => v.truncate(len),
            ColumnValues::FixedLenByteArray(v) => v.truncate(len),
        }
    }

    /// Moves all of `other` onto the end of `self`; both must share a type
    pub fn append(&mut self, other: ColumnValues) -> Result<()> {
        match (self, other) {
            (ColumnValues::Boolean(a), ColumnValues::Boolean(b)) => a.extend(b),
            (ColumnValues::Int32(a), ColumnValues::Int32(b)) => a.extend(b),
            (ColumnValues::Int64(a), ColumnValues::Int64(b)) => a.extend(b),
            (ColumnValues::Int96(a), ColumnValues::Int96(b)) => a.extend(b),
            (ColumnValues::Float(a), ColumnValues::Float(b)) => a.extend(b),
            (ColumnValues::Double(a), ColumnValues::Double(b)) => a.extend(b),
            (ColumnValues::ByteArray(a), ColumnValues::ByteArray(b)) => a.extend(b),
            (ColumnValues::FixedLenByteArray(a), ColumnValues::FixedLenByteArray(b)) => {
                a.extend(b)
            }
            (a, b) => {
                return Err(ParquetError::internal(format!(
                    "cannot append {} values to {} values",
                    b.physical_type(),
                    a.physical_type()
                )))
            }
        }
        Ok(())
    }
}

/// Decodes `count` non-null values of a data page body
///
/// `dictionary` must be present for the dictionary encodings.
pub fn decode_values(
    encoding: Encoding,
    data: &Bytes,
    physical_type: PhysicalType,
    type_length: usize,
    count: usize,
    dictionary: Option<&ColumnValues>,
) -> Result<ColumnValues> {
    match encoding {
        Encoding::Plain => {
            let (values, _) = plain::decode(data, physical_type, type_length, count)?;
            Ok(values)
        }
        Encoding::PlainDictionary | Encoding::RleDictionary if count == 0 => {
            Ok(ColumnValues::empty(physical_type))
        }
        Encoding::PlainDictionary | Encoding::RleDictionary => {
            let dictionary = dictionary.ok_or_else(|| {
                ParquetError::format("dictionary-encoded page without a dictionary page")
            })?;
            let (&bit_width, indices) = data
                .split_first()
                .ok_or_else(|| ParquetError::format("dictionary page body is empty"))?;
            if bit_width > 32 {
                return Err(ParquetError::format(format!(
                    "dictionary index bit width {} exceeds 32",
                    bit_width
                )));
            }
            let indices = rle::RleDecoder::new(indices, bit_width).decode(count)?;
            dictionary.take(&indices)
        }
        Encoding::Rle if physical_type == PhysicalType::Boolean => {
            // 4-byte length prefix, then the hybrid stream at width 1
            if data.len() < 4 {
                return Err(ParquetError::format("RLE boolean page truncated"));
            }
            let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
            let body = data
                .get(4..4 + len)
                .ok_or_else(|| ParquetError::format("RLE boolean page truncated"))?;
            let values = rle::RleDecoder::new(body, 1).decode(count)?;
            Ok(ColumnValues::Boolean(values.into_iter().map(|v| v != 0).collect()))
        }
        Encoding::DeltaBinaryPacked => delta::decode_binary_packed(data, physical_type, count),
        Encoding::DeltaLengthByteArray => delta::decode_length_byte_array(data, physical_type, count),
        Encoding::DeltaByteArray => delta::decode_byte_array(data, physical_type, count),
        Encoding::ByteStreamSplit => {
            byte_stream_split::decode(data, physical_type, type_length, count)
        }
        Encoding::Rle | Encoding::BitPacked => Err(ParquetError::unsupported_encoding(format!(
            "{:?} is not supported for {} values",
            encoding, physical_type
        ))),
    }
}
