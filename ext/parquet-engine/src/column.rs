//! Column chunk reading
//!
//! [`PageReader`] walks the pages of one column chunk lazily, and
//! [`TripletCursor`] flattens the decoded pages into a stream of
//! (repetition level, definition level, value) triplets for record assembly.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::basic::Compression;
use crate::compression;
use crate::convert::physical_to_value;
use crate::descriptor::ColumnDescriptor;
use crate::encoding::ColumnValues;
use crate::format::{self, PageHeader};
use crate::metadata::ColumnChunkMetaData;
use crate::page::{decode_page, DataPage, Page};
use crate::source::ChunkReader;
use crate::{ErrorContext, ParquetError, ParquetValue, Result};

/// Pages of one column chunk, decoded in file order
pub struct PageReader {
    descriptor: ColumnDescriptor,
    codec: Compression,
    data: Bytes,
    offset: usize,
    dictionary: Option<ColumnValues>,
    verify_checksums: bool,
    expected_values: u64,
    seen_values: u64,
    finished: bool,
}

impl PageReader {
    /// Fetches the chunk's byte range and prepares to decode its pages
    pub fn new<R: ChunkReader + ?Sized>(
        source: &R,
        chunk: &ColumnChunkMetaData,
        verify_checksums: bool,
    ) -> Result<Self> {
        let codec = chunk.compression()?;
        if !compression::is_supported(codec) {
            return Err(ParquetError::unsupported_codec(format!(
                "column '{}' uses {:?}",
                chunk.descriptor().path_string(),
                codec
            )));
        }
        let (start, len) = chunk.byte_range();
        let len = usize::try_from(len).map_err(|_| {
            ParquetError::format(format!("column chunk of {} bytes is too large", len))
        })?;
        let data = source
            .get_bytes(start, len)
            .with_context(|| format!("reading column '{}'", chunk.descriptor().path_string()))?;
        let expected_values = u64::try_from(chunk.num_values())
            .map_err(|_| ParquetError::format("column chunk has a negative value count"))?;

        debug!(
            column = %chunk.descriptor().path_string(),
            ?codec,
            offset = start,
            len,
            num_values = expected_values,
            "opened column chunk"
        );
        Ok(Self {
            descriptor: chunk.descriptor().clone(),
            codec,
            data,
            offset: 0,
            dictionary: None,
            verify_checksums,
            expected_values,
            seen_values: 0,
            finished: false,
        })
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    /// Next data page, or `None` once the chunk is exhausted
    pub fn next_page(&mut self) -> Result<Option<DataPage>> {
        while !self.finished {
            if self.offset >= self.data.len() {
                self.finished = true;
                if self.seen_values != self.expected_values {
                    return Err(ParquetError::format(format!(
                        "column '{}' pages hold {} values, chunk declares {}",
                        self.descriptor.path_string(),
                        self.seen_values,
                        self.expected_values
                    )));
                }
                break;
            }

            let (header, header_len) = format::decode::<PageHeader>(&self.data[self.offset..])
                .with_context(|| {
                    format!(
                        "decoding page header of column '{}' at chunk offset {}",
                        self.descriptor.path_string(),
                        self.offset
                    )
                })?;
            let payload_len = usize::try_from(header.compressed_page_size).map_err(|_| {
                ParquetError::format(format!(
                    "negative compressed page size {}",
                    header.compressed_page_size
                ))
            })?;
            let start = self.offset + header_len;
            let end = start
                .checked_add(payload_len)
                .filter(|end| *end <= self.data.len())
                .ok_or_else(|| {
                    ParquetError::format(format!(
                        "page of column '{}' runs past the end of its chunk",
                        self.descriptor.path_string()
                    ))
                })?;
            let payload = self.data.slice(start..end);
            self.offset = end;

            if self.verify_checksums {
                if let Some(expected) = header.crc {
                    let actual = crc32fast::hash(&payload) as i32;
                    if actual != expected {
                        return Err(ParquetError::format(format!(
                            "page checksum mismatch in column '{}': stored {:#010x}, computed {:#010x}",
                            self.descriptor.path_string(),
                            expected as u32,
                            actual as u32
                        )));
                    }
                }
            }

            let declared = header
                .data_page_header
                .as_ref()
                .map(|h| h.num_values)
                .or_else(|| header.data_page_header_v2.as_ref().map(|h| h.num_values));
            if let Some(declared) = declared {
                let within = u64::try_from(declared)
                    .ok()
                    .and_then(|n| self.seen_values.checked_add(n))
                    .filter(|total| *total <= self.expected_values);
                if within.is_none() {
                    return Err(ParquetError::format(format!(
                        "column '{}' page declares {} values, chunk has {} of {} left",
                        self.descriptor.path_string(),
                        declared,
                        self.expected_values - self.seen_values,
                        self.expected_values
                    )));
                }
            }

            match decode_page(
                &header,
                payload,
                self.codec,
                &self.descriptor,
                self.dictionary.as_ref(),
            )? {
                Page::Dictionary(values) => {
                    if self.dictionary.is_some() {
                        return Err(ParquetError::format(format!(
                            "column '{}' has more than one dictionary page",
                            self.descriptor.path_string()
                        )));
                    }
                    self.dictionary = Some(values);
                }
                Page::Data(page) => {
                    self.seen_values += page.num_values as u64;
                    return Ok(Some(page));
                }
                Page::Skipped => {
                    trace!(column = %self.descriptor.path_string(), "skipped page");
                }
            }
        }
        Ok(None)
    }
}

/// One position of a leaf column stream
#[derive(Debug, Clone, PartialEq)]
pub struct Triplet {
    pub rep: i16,
    pub def: i16,
    /// Present only when `def` equals the column's max definition level
    pub value: Option<ParquetValue>,
}

/// Flattens a [`PageReader`] into triplets, one page in memory at a time
pub struct TripletCursor {
    pages: PageReader,
    page: Option<DataPage>,
    level_index: usize,
    value_index: usize,
}

impl TripletCursor {
    pub fn new(pages: PageReader) -> Self {
        Self {
            pages,
            page: None,
            level_index: 0,
            value_index: 0,
        }
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        self.pages.descriptor()
    }

    /// Loads pages until one has an unread level; false at end of chunk
    fn fill(&mut self) -> Result<bool> {
        loop {
            if let Some(page) = &self.page {
                if self.level_index < page.num_values {
                    return Ok(true);
                }
                if self.value_index != page.values.len() {
                    return Err(ParquetError::format(format!(
                        "column '{}' page decoded {} values but its levels consumed {}",
                        self.pages.descriptor().path_string(),
                        page.values.len(),
                        self.value_index
                    )));
                }
            }
            match self.pages.next_page()? {
                Some(page) => {
                    self.page = Some(page);
                    self.level_index = 0;
                    self.value_index = 0;
                }
                None => {
                    self.page = None;
                    return Ok(false);
                }
            }
        }
    }

    /// Levels of the next triplet without consuming it
    pub fn peek(&mut self) -> Result<Option<(i16, i16)>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.page.as_ref().map(|page| {
            (
                page.rep_levels[self.level_index],
                page.def_levels[self.level_index],
            )
        }))
    }

    /// Consumes the next triplet, converting its value when non-null
    pub fn next_triplet(&mut self) -> Result<Option<Triplet>> {
        if !self.fill()? {
            return Ok(None);
        }
        let Some(page) = self.page.as_ref() else {
            return Ok(None);
        };
        let descriptor = self.pages.descriptor();
        let rep = page.rep_levels[self.level_index];
        let def = page.def_levels[self.level_index];
        self.level_index += 1;

        let value = if def == descriptor.max_def_level {
            let value = physical_to_value(
                &page.values,
                self.value_index,
                &descriptor.primitive_type,
            )?;
            self.value_index += 1;
            Some(value)
        } else {
            None
        };
        Ok(Some(Triplet { rep, def, value }))
    }

    /// True once every page has been consumed
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(!self.fill()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Encoding, PageType};
    use crate::encoding::{plain, rle};
    use crate::error::ErrorKind;
    use crate::footer;
    use crate::format::{
        ColumnChunk, ColumnMetaData, DataPageHeader, DictionaryPageHeader, FileMetaData,
        RowGroup, SchemaElement,
    };
    use crate::metadata::ParquetMetaData;

    /// One optional INT32 column `x`; pages are laid out back to back from offset 4
    fn chunk_file(pages: &[(PageHeader, Vec<u8>)], num_values: i64, codec: Compression) -> Bytes {
        let mut file = footer::MAGIC.to_vec();
        let start = file.len() as i64;
        let mut dictionary_offset = None;
        let mut data_offset = None;
        for (header, payload) in pages {
            let at = file.len() as i64;
            if header.type_ == PageType::DictionaryPage.to_thrift() {
                dictionary_offset.get_or_insert(at);
            } else {
                data_offset.get_or_insert(at);
            }
            file.extend_from_slice(&format::encode(header));
            file.extend_from_slice(payload);
        }
        let total = file.len() as i64 - start;

        let metadata = FileMetaData {
            version: 1,
            schema: vec![
                SchemaElement {
                    name: "schema".to_string(),
                    num_children: Some(1),
                    ..Default::default()
                },
                SchemaElement {
                    name: "x".to_string(),
                    type_: Some(1),
                    repetition_type: Some(1),
                    ..Default::default()
                },
            ],
            num_rows: num_values,
            row_groups: vec![RowGroup {
                columns: vec![ColumnChunk {
                    file_offset: start,
                    meta_data: Some(ColumnMetaData {
                        type_: 1,
                        encodings: vec![Encoding::Plain.to_thrift(), Encoding::Rle.to_thrift()],
                        path_in_schema: vec!["x".to_string()],
                        codec: codec.to_thrift(),
                        num_values,
                        total_uncompressed_size: total,
                        total_compressed_size: total,
                        data_page_offset: data_offset.unwrap_or(start),
                        dictionary_page_offset: dictionary_offset,
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                total_byte_size: total,
                num_rows: num_values,
                ..Default::default()
            }],
            ..Default::default()
        };
        let encoded = format::encode(&metadata);
        file.extend_from_slice(&encoded);
        file.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        file.extend_from_slice(footer::MAGIC);
        Bytes::from(file)
    }

    fn data_page(defs: &[i16], values: Vec<i32>, encoding: Encoding) -> (PageHeader, Vec<u8>) {
        let mut body = rle::encode_levels_v1(defs, 1);
        match encoding {
            Encoding::Plain => plain::encode(&ColumnValues::Int32(values), &mut body),
            _ => {
                // dictionary indices at bit width 1
                body.push(1);
                let indices: Vec<u64> = values.iter().map(|v| *v as u64).collect();
                body.extend_from_slice(&rle::RleEncoder::encode(1, &indices));
            }
        }
        let header = PageHeader {
            type_: PageType::DataPage.to_thrift(),
            uncompressed_page_size: body.len() as i32,
            compressed_page_size: body.len() as i32,
            crc: Some(crc32fast::hash(&body) as i32),
            data_page_header: Some(DataPageHeader {
                num_values: defs.len() as i32,
                encoding: encoding.to_thrift(),
                definition_level_encoding: Encoding::Rle.to_thrift(),
                repetition_level_encoding: Encoding::Rle.to_thrift(),
                statistics: None,
            }),
            ..Default::default()
        };
        (header, body)
    }

    fn cursor_for(file: &Bytes, verify: bool) -> Result<TripletCursor> {
        let metadata: ParquetMetaData = footer::parse_metadata(file)?;
        let pages = PageReader::new(file, metadata.row_group(0).column(0), verify)?;
        Ok(TripletCursor::new(pages))
    }

    fn drain(cursor: &mut TripletCursor) -> Result<Vec<Triplet>> {
        let mut out = Vec::new();
        while let Some(triplet) = cursor.next_triplet()? {
            out.push(triplet);
        }
        Ok(out)
    }

    #[test]
    fn test_triplets_span_pages() {
        let file = chunk_file(
            &[
                data_page(&[1, 0], vec![5], Encoding::Plain),
                data_page(&[1], vec![6], Encoding::Plain),
            ],
            3,
            Compression::Uncompressed,
        );
        let mut cursor = cursor_for(&file, true).unwrap();
        assert_eq!(cursor.peek().unwrap(), Some((0, 1)));
        let triplets = drain(&mut cursor).unwrap();
        let values: Vec<_> = triplets.iter().map(|t| t.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Some(ParquetValue::Int32(5)),
                None,
                Some(ParquetValue::Int32(6))
            ]
        );
        assert!(cursor.is_exhausted().unwrap());
    }

    #[test]
    fn test_dictionary_then_data() {
        let mut dict_body = Vec::new();
        plain::encode(&ColumnValues::Int32(vec![100, 200]), &mut dict_body);
        let dict_header = PageHeader {
            type_: PageType::DictionaryPage.to_thrift(),
            uncompressed_page_size: dict_body.len() as i32,
            compressed_page_size: dict_body.len() as i32,
            dictionary_page_header: Some(DictionaryPageHeader {
                num_values: 2,
                encoding: Encoding::PlainDictionary.to_thrift(),
                is_sorted: None,
            }),
            ..Default::default()
        };
        let file = chunk_file(
            &[
                (dict_header, dict_body),
                data_page(&[1, 1, 1], vec![1, 0, 1], Encoding::RleDictionary),
            ],
            3,
            Compression::Uncompressed,
        );
        let mut cursor = cursor_for(&file, false).unwrap();
        let values: Vec<_> = drain(&mut cursor)
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect();
        assert_eq!(
            values,
            vec![
                Some(ParquetValue::Int32(200)),
                Some(ParquetValue::Int32(100)),
                Some(ParquetValue::Int32(200))
            ]
        );
    }

    #[test]
    fn test_value_count_mismatch_is_format_error() {
        let file = chunk_file(
            &[data_page(&[1, 1], vec![5, 6], Encoding::Plain)],
            3,
            Compression::Uncompressed,
        );
        let mut cursor = cursor_for(&file, false).unwrap();
        let err = drain(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_page_value_count_bounded_by_chunk() {
        let (mut header, body) = data_page(&[1], vec![5], Encoding::Plain);
        if let Some(data) = &mut header.data_page_header {
            data.num_values = i32::MAX;
        }
        let file = chunk_file(&[(header, body)], 1, Compression::Uncompressed);
        let mut cursor = cursor_for(&file, false).unwrap();
        let err = drain(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("page declares"), "{}", err);
    }

    #[test]
    fn test_checksum_mismatch() {
        let (mut header, body) = data_page(&[1], vec![5], Encoding::Plain);
        header.crc = Some(header.crc.unwrap_or_default().wrapping_add(1));
        let file = chunk_file(&[(header, body)], 1, Compression::Uncompressed);

        let mut cursor = cursor_for(&file, true).unwrap();
        assert_eq!(drain(&mut cursor).unwrap_err().kind(), ErrorKind::Format);

        let mut cursor = cursor_for(&file, false).unwrap();
        assert_eq!(drain(&mut cursor).unwrap().len(), 1);
    }

    #[test]
    fn test_unsupported_codec() {
        let file = chunk_file(
            &[data_page(&[1], vec![5], Encoding::Plain)],
            1,
            Compression::Brotli,
        );
        let err = cursor_for(&file, false).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedCodec);
    }
}
