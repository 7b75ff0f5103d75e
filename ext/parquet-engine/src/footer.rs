//! Footer parsing
//!
//! A Parquet file ends with the thrift-compact `FileMetaData`, its length as
//! a little-endian u32, and the magic `PAR1`. The file also starts with
//! `PAR1`.

use tracing::debug;

use crate::format::{self, FileMetaData};
use crate::metadata::ParquetMetaData;
use crate::source::ChunkReader;
use crate::{ErrorContext, ParquetError, Result};

pub const MAGIC: &[u8; 4] = b"PAR1";
pub const FOOTER_SIZE: usize = 8;

/// Highest `FileMetaData.version` this crate reads
pub const MAX_SUPPORTED_VERSION: i32 = 2;

/// Metadata length from the trailing 8 bytes
pub fn decode_footer(tail: &[u8]) -> Result<usize> {
    if tail.len() != FOOTER_SIZE {
        return Err(ParquetError::internal(format!(
            "footer must be {} bytes, got {}",
            FOOTER_SIZE,
            tail.len()
        )));
    }
    if &tail[4..] != MAGIC {
        return Err(ParquetError::format(
            "invalid Parquet file: trailing magic is not PAR1",
        ));
    }
    Ok(u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]) as usize)
}

/// Decodes and validates footer metadata bytes
pub fn decode_metadata(buf: &[u8]) -> Result<ParquetMetaData> {
    let (file, _) = format::decode::<FileMetaData>(buf).context("decoding file metadata")?;
    if file.version > MAX_SUPPORTED_VERSION {
        return Err(ParquetError::unsupported_version(format!(
            "file format version {} is newer than {}",
            file.version, MAX_SUPPORTED_VERSION
        )));
    }
    ParquetMetaData::try_from_thrift(file)
}

/// Reads, decodes and validates the footer of `source`
pub fn parse_metadata<R: ChunkReader + ?Sized>(source: &R) -> Result<ParquetMetaData> {
    let file_len = source.len();
    let min_len = (MAGIC.len() + FOOTER_SIZE) as u64;
    if file_len < min_len {
        return Err(ParquetError::format(format!(
            "file is {} bytes, smaller than the minimum {}",
            file_len, min_len
        )));
    }

    let head = source.get_bytes(0, MAGIC.len())?;
    if head.as_ref() != MAGIC {
        return Err(ParquetError::format(
            "invalid Parquet file: leading magic is not PAR1",
        ));
    }

    let tail = source.get_bytes(file_len - FOOTER_SIZE as u64, FOOTER_SIZE)?;
    let metadata_len = decode_footer(&tail)?;
    let available = file_len - min_len;
    if metadata_len as u64 > available {
        return Err(ParquetError::format(format!(
            "footer length {} exceeds the {} bytes available",
            metadata_len, available
        )));
    }
    let metadata_start = file_len - FOOTER_SIZE as u64 - metadata_len as u64;
    let buf = source.get_bytes(metadata_start, metadata_len)?;
    let metadata = decode_metadata(&buf)?;

    // Every column chunk must sit between the leading magic and the footer
    for (rg_index, row_group) in metadata.row_groups().iter().enumerate() {
        for chunk in row_group.columns() {
            let (start, len) = chunk.byte_range();
            let within = start >= MAGIC.len() as u64
                && start
                    .checked_add(len)
                    .is_some_and(|end| end <= metadata_start);
            if !within {
                return Err(ParquetError::format(format!(
                    "column '{}' of row group {} spans {}..{}, outside the data region",
                    chunk.descriptor().path_string(),
                    rg_index,
                    start,
                    start.saturating_add(len)
                )));
            }
        }
    }

    debug!(
        version = metadata.version(),
        num_rows = metadata.num_rows(),
        row_groups = metadata.num_row_groups(),
        columns = metadata.schema_descr().num_columns(),
        metadata_len,
        "parsed parquet footer"
    );
    Ok(metadata)
}
