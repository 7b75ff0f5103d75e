//! Enumerations shared by the footer, page headers and schema
//!
//! The wire carries these as thrift `i32` enum values; conversion happens at
//! the point where an unknown value becomes an error, so metadata written by
//! newer producers still parses until something actually needs the value.

use crate::{ParquetError, Repetition, Result};
use std::fmt;

/// Physical storage type of a leaf column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl PhysicalType {
    pub fn from_thrift(value: i32) -> Result<Self> {
        Ok(match value {
            0 => PhysicalType::Boolean,
            1 => PhysicalType::Int32,
            2 => PhysicalType::Int64,
            3 => PhysicalType::Int96,
            4 => PhysicalType::Float,
            5 => PhysicalType::Double,
            6 => PhysicalType::ByteArray,
            7 => PhysicalType::FixedLenByteArray,
            other => {
                return Err(ParquetError::format(format!(
                    "unknown physical type {}",
                    other
                )))
            }
        })
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            PhysicalType::Boolean => 0,
            PhysicalType::Int32 => 1,
            PhysicalType::Int64 => 2,
            PhysicalType::Int96 => 3,
            PhysicalType::Float => 4,
            PhysicalType::Double => 5,
            PhysicalType::ByteArray => 6,
            PhysicalType::FixedLenByteArray => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhysicalType::Boolean => "BOOLEAN",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Int96 => "INT96",
            PhysicalType::Float => "FLOAT",
            PhysicalType::Double => "DOUBLE",
            PhysicalType::ByteArray => "BYTE_ARRAY",
            PhysicalType::FixedLenByteArray => "FIXED_LEN_BYTE_ARRAY",
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value and level encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    PlainDictionary,
    Rle,
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
    ByteStreamSplit,
}

impl Encoding {
    pub fn from_thrift(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Encoding::Plain,
            2 => Encoding::PlainDictionary,
            3 => Encoding::Rle,
            4 => Encoding::BitPacked,
            5 => Encoding::DeltaBinaryPacked,
            6 => Encoding::DeltaLengthByteArray,
            7 => Encoding::DeltaByteArray,
            8 => Encoding::RleDictionary,
            9 => Encoding::ByteStreamSplit,
            other => return Err(ParquetError::format(format!("unknown encoding {}", other))),
        })
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            Encoding::Plain => 0,
            Encoding::PlainDictionary => 2,
            Encoding::Rle => 3,
            Encoding::BitPacked => 4,
            Encoding::DeltaBinaryPacked => 5,
            Encoding::DeltaLengthByteArray => 6,
            Encoding::DeltaByteArray => 7,
            Encoding::RleDictionary => 8,
            Encoding::ByteStreamSplit => 9,
        }
    }

    pub fn is_dictionary(self) -> bool {
        matches!(self, Encoding::PlainDictionary | Encoding::RleDictionary)
    }
}

/// Compression codecs named by the format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    Uncompressed,
    Snappy,
    Gzip,
    Lzo,
    Brotli,
    Lz4,
    Zstd,
    Lz4Raw,
}

impl Compression {
    pub fn from_thrift(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Compression::Uncompressed,
            1 => Compression::Snappy,
            2 => Compression::Gzip,
            3 => Compression::Lzo,
            4 => Compression::Brotli,
            5 => Compression::Lz4,
            6 => Compression::Zstd,
            7 => Compression::Lz4Raw,
            other => {
                return Err(ParquetError::unsupported_codec(format!(
                    "unknown codec id {}",
                    other
                )))
            }
        })
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            Compression::Uncompressed => 0,
            Compression::Snappy => 1,
            Compression::Gzip => 2,
            Compression::Lzo => 3,
            Compression::Brotli => 4,
            Compression::Lz4 => 5,
            Compression::Zstd => 6,
            Compression::Lz4Raw => 7,
        }
    }
}

/// Page kinds inside a column chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    DataPage,
    IndexPage,
    DictionaryPage,
    DataPageV2,
}

impl PageType {
    /// `None` for page types this crate does not know; those pages are skipped
    pub fn from_thrift(value: i32) -> Option<Self> {
        match value {
            0 => Some(PageType::DataPage),
            1 => Some(PageType::IndexPage),
            2 => Some(PageType::DictionaryPage),
            3 => Some(PageType::DataPageV2),
            _ => None,
        }
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            PageType::DataPage => 0,
            PageType::IndexPage => 1,
            PageType::DictionaryPage => 2,
            PageType::DataPageV2 => 3,
        }
    }
}

/// Legacy type annotations, still written alongside logical types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertedType {
    Utf8,
    Map,
    MapKeyValue,
    List,
    Enum,
    Decimal,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

impl ConvertedType {
    pub fn from_thrift(value: i32) -> Option<Self> {
        use ConvertedType::*;
        Some(match value {
            0 => Utf8,
            1 => Map,
            2 => MapKeyValue,
            3 => List,
            4 => Enum,
            5 => Decimal,
            6 => Date,
            7 => TimeMillis,
            8 => TimeMicros,
            9 => TimestampMillis,
            10 => TimestampMicros,
            11 => Uint8,
            12 => Uint16,
            13 => Uint32,
            14 => Uint64,
            15 => Int8,
            16 => Int16,
            17 => Int32,
            18 => Int64,
            19 => Json,
            20 => Bson,
            21 => Interval,
            _ => return None,
        })
    }

    pub fn to_thrift(self) -> i32 {
        use ConvertedType::*;
        match self {
            Utf8 => 0,
            Map => 1,
            MapKeyValue => 2,
            List => 3,
            Enum => 4,
            Decimal => 5,
            Date => 6,
            TimeMillis => 7,
            TimeMicros => 8,
            TimestampMillis => 9,
            TimestampMicros => 10,
            Uint8 => 11,
            Uint16 => 12,
            Uint32 => 13,
            Uint64 => 14,
            Int8 => 15,
            Int16 => 16,
            Int32 => 17,
            Int64 => 18,
            Json => 19,
            Bson => 20,
            Interval => 21,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

/// Logical type annotation (the `LogicalType` union of the format)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { adjusted_to_utc: bool, unit: TimeUnit },
    Timestamp { adjusted_to_utc: bool, unit: TimeUnit },
    Integer { bit_width: i8, signed: bool },
    Unknown,
    Json,
    Bson,
    Uuid,
    Float16,
}

impl Repetition {
    pub fn from_thrift(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Repetition::Required,
            1 => Repetition::Optional,
            2 => Repetition::Repeated,
            other => {
                return Err(ParquetError::format(format!(
                    "unknown repetition type {}",
                    other
                )))
            }
        })
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            Repetition::Required => 0,
            Repetition::Optional => 1,
            Repetition::Repeated => 2,
        }
    }
}
