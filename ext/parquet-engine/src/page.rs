//! Page decoding
//!
//! Turns one page payload into either a dictionary or a decoded value stream:
//! repetition levels, definition levels, and the non-null physical values.

use bytes::Bytes;
use tracing::trace;

use crate::basic::{Compression, Encoding, PageType};
use crate::compression;
use crate::descriptor::ColumnDescriptor;
use crate::encoding::bit_util::num_required_bits;
use crate::encoding::{decode_values, plain, rle, ColumnValues};
use crate::format::{DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageHeader};
use crate::{ParquetError, Result};

/// Levels and values of one data page
#[derive(Debug, Clone, PartialEq)]
pub struct DataPage {
    pub def_levels: Vec<i16>,
    pub rep_levels: Vec<i16>,
    pub values: ColumnValues,
    /// Level count as declared by the header, nulls included
    pub num_values: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Dictionary(ColumnValues),
    Data(DataPage),
    /// Index pages and page types this crate does not know
    Skipped,
}

fn non_negative(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ParquetError::format(format!("page header has negative {} ({})", what, value)))
}

/// Decodes a page from its still-compressed payload
pub fn decode_page(
    header: &PageHeader,
    payload: Bytes,
    codec: Compression,
    column: &ColumnDescriptor,
    dictionary: Option<&ColumnValues>,
) -> Result<Page> {
    let uncompressed_size = non_negative(header.uncompressed_page_size, "uncompressed size")?;
    let Some(page_type) = PageType::from_thrift(header.type_) else {
        trace!(page_type = header.type_, "skipping unknown page type");
        return Ok(Page::Skipped);
    };

    match page_type {
        PageType::IndexPage => Ok(Page::Skipped),
        PageType::DictionaryPage => {
            let dict_header = header.dictionary_page_header.as_ref().ok_or_else(|| {
                ParquetError::format("dictionary page without a dictionary page header")
            })?;
            let buf = decompress(codec, payload, uncompressed_size)?;
            decode_dictionary_page(dict_header, buf, column).map(Page::Dictionary)
        }
        PageType::DataPage => {
            let data_header = header
                .data_page_header
                .as_ref()
                .ok_or_else(|| ParquetError::format("data page without a data page header"))?;
            let buf = decompress(codec, payload, uncompressed_size)?;
            decode_data_page_v1(data_header, buf, column, dictionary).map(Page::Data)
        }
        PageType::DataPageV2 => {
            let data_header = header
                .data_page_header_v2
                .as_ref()
                .ok_or_else(|| ParquetError::format("v2 data page without a v2 header"))?;
            decode_data_page_v2(data_header, payload, uncompressed_size, codec, column, dictionary)
                .map(Page::Data)
        }
    }
}

fn decompress(codec: Compression, payload: Bytes, uncompressed_size: usize) -> Result<Bytes> {
    if codec == Compression::Uncompressed {
        if payload.len() != uncompressed_size {
            return Err(ParquetError::format(format!(
                "uncompressed page is {} bytes, header declares {}",
                payload.len(),
                uncompressed_size
            )));
        }
        return Ok(payload);
    }
    compression::decompress(codec, &payload, uncompressed_size).map(Bytes::from)
}

pub fn decode_dictionary_page(
    header: &DictionaryPageHeader,
    buf: Bytes,
    column: &ColumnDescriptor,
) -> Result<ColumnValues> {
    let encoding = Encoding::from_thrift(header.encoding)?;
    if !matches!(encoding, Encoding::Plain | Encoding::PlainDictionary) {
        return Err(ParquetError::unsupported_encoding(format!(
            "dictionary page encoded as {:?}",
            encoding
        )));
    }
    let count = non_negative(header.num_values, "dictionary size")?;
    let (values, _) = plain::decode(&buf, column.physical_type, column.type_length, count)?;
    trace!(column = %column.path_string(), entries = count, "decoded dictionary page");
    Ok(values)
}

/// v1 levels: RLE with a 4-byte length prefix, or legacy MSB-first bit packing
fn decode_v1_levels(
    buf: &Bytes,
    offset: &mut usize,
    encoding: i32,
    count: usize,
    max_level: i16,
) -> Result<Vec<i16>> {
    let bit_width = num_required_bits(max_level as u64);
    let rest = buf
        .get(*offset..)
        .ok_or_else(|| ParquetError::format("page levels truncated"))?;
    match Encoding::from_thrift(encoding)? {
        Encoding::Rle => {
            let prefix: [u8; 4] = rest
                .get(..4)
                .and_then(|p| p.try_into().ok())
                .ok_or_else(|| ParquetError::format("level length prefix truncated"))?;
            let len = u32::from_le_bytes(prefix) as usize;
            let body = rest
                .get(4..4 + len)
                .ok_or_else(|| ParquetError::format("page levels truncated"))?;
            let levels = rle::decode_levels(body, bit_width, count, max_level)?;
            *offset += 4 + len;
            Ok(levels)
        }
        Encoding::BitPacked => {
            let levels = rle::decode_bit_packed_levels(rest, bit_width, count, max_level)?;
            *offset += (count * bit_width as usize).div_ceil(8);
            Ok(levels)
        }
        other => Err(ParquetError::unsupported_encoding(format!(
            "{:?} is not a level encoding",
            other
        ))),
    }
}

fn count_non_null(def_levels: &[i16], max_def_level: i16, num_values: usize) -> usize {
    if max_def_level == 0 {
        num_values
    } else {
        def_levels.iter().filter(|d| **d == max_def_level).count()
    }
}

pub fn decode_data_page_v1(
    header: &DataPageHeader,
    buf: Bytes,
    column: &ColumnDescriptor,
    dictionary: Option<&ColumnValues>,
) -> Result<DataPage> {
    let num_values = non_negative(header.num_values, "value count")?;
    let mut offset = 0;

    let rep_levels = if column.max_rep_level > 0 {
        decode_v1_levels(
            &buf,
            &mut offset,
            header.repetition_level_encoding,
            num_values,
            column.max_rep_level,
        )?
    } else {
        vec![0; num_values]
    };
    let def_levels = if column.max_def_level > 0 {
        decode_v1_levels(
            &buf,
            &mut offset,
            header.definition_level_encoding,
            num_values,
            column.max_def_level,
        )?
    } else {
        vec![0; num_values]
    };

    let non_null = count_non_null(&def_levels, column.max_def_level, num_values);
    let data = buf.slice(offset.min(buf.len())..);
    let values = decode_values(
        Encoding::from_thrift(header.encoding)?,
        &data,
        column.physical_type,
        column.type_length,
        non_null,
        dictionary,
    )?;

    trace!(
        column = %column.path_string(),
        num_values,
        non_null,
        "decoded v1 data page"
    );
    Ok(DataPage {
        def_levels,
        rep_levels,
        values,
        num_values,
    })
}

pub fn decode_data_page_v2(
    header: &DataPageHeaderV2,
    payload: Bytes,
    uncompressed_size: usize,
    codec: Compression,
    column: &ColumnDescriptor,
    dictionary: Option<&ColumnValues>,
) -> Result<DataPage> {
    let num_values = non_negative(header.num_values, "value count")?;
    let num_nulls = non_negative(header.num_nulls, "null count")?;
    let rep_len = non_negative(header.repetition_levels_byte_length, "repetition length")?;
    let def_len = non_negative(header.definition_levels_byte_length, "definition length")?;
    let levels_len = rep_len + def_len;
    if levels_len > payload.len() || levels_len > uncompressed_size {
        return Err(ParquetError::format(format!(
            "v2 level sections ({} bytes) exceed the page",
            levels_len
        )));
    }

    let rep_levels = if column.max_rep_level > 0 {
        let bit_width = num_required_bits(column.max_rep_level as u64);
        rle::decode_levels(&payload[..rep_len], bit_width, num_values, column.max_rep_level)?
    } else {
        vec![0; num_values]
    };
    let def_levels = if column.max_def_level > 0 {
        let bit_width = num_required_bits(column.max_def_level as u64);
        rle::decode_levels(
            &payload[rep_len..levels_len],
            bit_width,
            num_values,
            column.max_def_level,
        )?
    } else {
        vec![0; num_values]
    };

    let non_null = count_non_null(&def_levels, column.max_def_level, num_values);
    if num_values - non_null != num_nulls && column.max_def_level > 0 {
        return Err(ParquetError::format(format!(
            "v2 page declares {} nulls, levels hold {}",
            num_nulls,
            num_values - non_null
        )));
    }

    let values_payload = payload.slice(levels_len..);
    let values_size = uncompressed_size - levels_len;
    let data = if header.is_compressed.unwrap_or(true) {
        decompress(codec, values_payload, values_size)?
    } else {
        decompress(Compression::Uncompressed, values_payload, values_size)?
    };
    let values = decode_values(
        Encoding::from_thrift(header.encoding)?,
        &data,
        column.physical_type,
        column.type_length,
        non_null,
        dictionary,
    )?;

    trace!(
        column = %column.path_string(),
        num_values,
        num_nulls,
        "decoded v2 data page"
    );
    Ok(DataPage {
        def_levels,
        rep_levels,
        values,
        num_values,
    })
}
