//! Per-leaf column chunk writing
//!
//! A [`ColumnWriter`] buffers the shredded levels and values of one leaf,
//! cuts data pages at record boundaries and emits the finished chunk
//! (dictionary page first) when its row group is flushed.

use bytes::Bytes;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;
use tracing::trace;

use crate::basic::{Compression, Encoding, PageType, PhysicalType};
use crate::compression;
use crate::convert::push_value;
use crate::descriptor::ColumnDescriptor;
use crate::encoding::bit_util::num_required_bits;
use crate::encoding::{delta, plain, rle, ColumnValues};
use crate::format::{
    self, ColumnChunk, ColumnMetaData, DataPageHeader, DataPageHeaderV2, DictionaryPageHeader,
    PageHeader, Statistics,
};
use crate::schema::PrimitiveType;
use crate::writer::{DataPageVersion, WriterEncoding};
use crate::{ParquetValue, Result};

/// Dictionary pages above this size stop growing; later pages are PLAIN
pub const DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT: usize = 1024 * 1024;

/// Settings shared by every column of a writer
#[derive(Debug, Clone)]
pub struct ColumnProperties {
    pub compression: Compression,
    pub encoding: WriterEncoding,
    pub page_version: DataPageVersion,
    pub max_page_rows: usize,
    pub dictionary_page_size_limit: usize,
    pub write_checksums: bool,
}

/// Value order used for min/max statistics
#[derive(Debug, Clone, Copy, PartialEq)]
enum SortOrder {
    Signed,
    Unsigned,
    Undefined,
}

fn sort_order(ptype: &PrimitiveType, physical: PhysicalType) -> SortOrder {
    match ptype {
        PrimitiveType::UInt8 | PrimitiveType::UInt16 | PrimitiveType::UInt32 | PrimitiveType::UInt64 => {
            SortOrder::Unsigned
        }
        PrimitiveType::String
        | PrimitiveType::Binary
        | PrimitiveType::Uuid
        | PrimitiveType::FixedLenByteArray(_) => SortOrder::Unsigned,
        PrimitiveType::Float16 => SortOrder::Undefined,
        PrimitiveType::Decimal128(..) | PrimitiveType::Decimal256(..) => match physical {
            PhysicalType::Int32 | PhysicalType::Int64 => SortOrder::Signed,
            _ => SortOrder::Undefined,
        },
        _ => SortOrder::Signed,
    }
}

/// A statistics bound in the column's sort order
#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum Bound {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Bytes(Bytes),
}

impl Bound {
    fn at(values: &ColumnValues, index: usize, order: SortOrder) -> Option<Bound> {
        if order == SortOrder::Undefined {
            return None;
        }
        let unsigned = order == SortOrder::Unsigned;
        Some(match values {
            ColumnValues::Boolean(v) => Bound::Boolean(v[index]),
            ColumnValues::Int32(v) if unsigned => Bound::UInt32(v[index] as u32),
            ColumnValues::Int32(v) => Bound::Int32(v[index]),
            ColumnValues::Int64(v) if unsigned => Bound::UInt64(v[index] as u64),
            ColumnValues::Int64(v) => Bound::Int64(v[index]),
            ColumnValues::Float(v) if !v[index].is_nan() => Bound::Float(v[index]),
            ColumnValues::Double(v) if !v[index].is_nan() => Bound::Double(v[index]),
            ColumnValues::ByteArray(v) | ColumnValues::FixedLenByteArray(v) => {
                Bound::Bytes(v[index].clone())
            }
            ColumnValues::Float(_) | ColumnValues::Double(_) | ColumnValues::Int96(_) => {
                return None
            }
        })
    }

    /// PLAIN bytes, without a length prefix for byte arrays
    fn to_plain(&self) -> Vec<u8> {
        match self {
            Bound::Boolean(b) => vec![*b as u8],
            Bound::Int32(v) => v.to_le_bytes().to_vec(),
            Bound::Int64(v) => v.to_le_bytes().to_vec(),
            Bound::UInt32(v) => v.to_le_bytes().to_vec(),
            Bound::UInt64(v) => v.to_le_bytes().to_vec(),
            Bound::Float(v) => v.to_le_bytes().to_vec(),
            Bound::Double(v) => v.to_le_bytes().to_vec(),
            Bound::Bytes(b) => b.to_vec(),
        }
    }
}

#[derive(Debug, Default)]
struct ChunkStatistics {
    min: Option<Bound>,
    max: Option<Bound>,
    null_count: i64,
}

impl ChunkStatistics {
    fn update(&mut self, bound: Bound) {
        if self
            .min
            .as_ref()
            .map_or(true, |min| bound.partial_cmp(min) == Some(Ordering::Less))
        {
            self.min = Some(bound.clone());
        }
        if self
            .max
            .as_ref()
            .map_or(true, |max| bound.partial_cmp(max) == Some(Ordering::Greater))
        {
            self.max = Some(bound);
        }
    }
}

/// Hashable identity of a physical value
fn value_key(values: &ColumnValues, index: usize) -> Vec<u8> {
    match values {
        ColumnValues::Boolean(v) => vec![v[index] as u8],
        ColumnValues::Int32(v) => v[index].to_le_bytes().to_vec(),
        ColumnValues::Int64(v) => v[index].to_le_bytes().to_vec(),
        ColumnValues::Int96(v) => v[index].iter().flat_map(|w| w.to_le_bytes()).collect(),
        ColumnValues::Float(v) => v[index].to_bits().to_le_bytes().to_vec(),
        ColumnValues::Double(v) => v[index].to_bits().to_le_bytes().to_vec(),
        ColumnValues::ByteArray(v) | ColumnValues::FixedLenByteArray(v) => v[index].to_vec(),
    }
}

fn plain_size(values: &ColumnValues, index: usize) -> usize {
    match values {
        ColumnValues::Boolean(_) => 1,
        ColumnValues::Int32(_) | ColumnValues::Float(_) => 4,
        ColumnValues::Int64(_) | ColumnValues::Double(_) => 8,
        ColumnValues::Int96(_) => 12,
        ColumnValues::ByteArray(v) => 4 + v[index].len(),
        ColumnValues::FixedLenByteArray(v) => v[index].len(),
    }
}

struct Dictionary {
    values: ColumnValues,
    index: HashMap<Vec<u8>, u64>,
    encoded_size: usize,
    /// Set once the dictionary outgrew its limit
    full: bool,
}

impl Dictionary {
    fn new(physical_type: PhysicalType) -> Self {
        Self {
            values: ColumnValues::empty(physical_type),
            index: HashMap::new(),
            encoded_size: 0,
            full: false,
        }
    }

    /// Indices of `values`, adding entries for values not seen before
    fn indices(&mut self, values: &ColumnValues) -> Result<Vec<u64>> {
        let mut indices = Vec::with_capacity(values.len());
        let mut new_entries = Vec::new();
        for i in 0..values.len() {
            let next = self.index.len() as u64;
            let index = *self.index.entry(value_key(values, i)).or_insert_with(|| {
                new_entries.push(i as u64);
                next
            });
            indices.push(index);
        }
        for i in &new_entries {
            self.encoded_size += plain_size(values, *i as usize);
        }
        self.values.append(values.take(&new_entries)?)?;
        Ok(indices)
    }
}

/// An encoded page waiting for its chunk to be written
struct EncodedPage {
    header: PageHeader,
    payload: Vec<u8>,
}

impl EncodedPage {
    fn header_bytes(&self) -> Vec<u8> {
        format::encode(&self.header)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    values: usize,
    levels: usize,
    null_count: i64,
}

pub struct ColumnWriter {
    descriptor: ColumnDescriptor,
    props: ColumnProperties,
    order: SortOrder,
    values: ColumnValues,
    def_levels: Vec<i16>,
    rep_levels: Vec<i16>,
    page_rows: usize,
    pages: Vec<EncodedPage>,
    dictionary: Option<Dictionary>,
    statistics: ChunkStatistics,
    encodings: Vec<Encoding>,
    num_values: i64,
}

impl ColumnWriter {
    pub fn new(descriptor: ColumnDescriptor, props: ColumnProperties) -> Self {
        let order = sort_order(&descriptor.primitive_type, descriptor.physical_type);
        let physical_type = descriptor.physical_type;
        let mut writer = Self {
            descriptor,
            props,
            order,
            values: ColumnValues::empty(physical_type),
            def_levels: Vec::new(),
            rep_levels: Vec::new(),
            page_rows: 0,
            pages: Vec::new(),
            dictionary: None,
            statistics: ChunkStatistics::default(),
            encodings: Vec::new(),
            num_values: 0,
        };
        writer.reset_chunk();
        writer
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    fn uses_dictionary(&self) -> bool {
        self.props.encoding == WriterEncoding::Dictionary
            && self.descriptor.physical_type != PhysicalType::Boolean
    }

    fn reset_chunk(&mut self) {
        self.pages.clear();
        self.statistics = ChunkStatistics::default();
        self.encodings.clear();
        self.num_values = 0;
        self.dictionary = self
            .uses_dictionary()
            .then(|| Dictionary::new(self.descriptor.physical_type));
    }

    /// Buffers a non-null value at the leaf's max definition level
    pub fn write_value(&mut self, value: &ParquetValue, rep: i16) -> Result<()> {
        push_value(
            &mut self.values,
            value,
            &self.descriptor.primitive_type,
            self.descriptor.type_length,
        )?;
        let index = self.values.len() - 1;
        if let Some(bound) = Bound::at(&self.values, index, self.order) {
            self.statistics.update(bound);
        }
        self.def_levels.push(self.descriptor.max_def_level);
        self.rep_levels.push(rep);
        Ok(())
    }

    /// Buffers a null or empty position below `def`
    pub fn write_null(&mut self, def: i16, rep: i16) {
        self.statistics.null_count += 1;
        self.def_levels.push(def);
        self.rep_levels.push(rep);
    }

    /// Buffer position to return to if the current record fails to shred
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            values: self.values.len(),
            levels: self.def_levels.len(),
            null_count: self.statistics.null_count,
        }
    }

    /// Drops everything buffered since `checkpoint`
    ///
    /// Min/max bounds are not narrowed back; they stay valid bounds.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.values.truncate(checkpoint.values);
        self.def_levels.truncate(checkpoint.levels);
        self.rep_levels.truncate(checkpoint.levels);
        self.statistics.null_count = checkpoint.null_count;
    }

    /// Marks the end of a record; pages are only cut here
    pub fn end_record(&mut self) -> Result<()> {
        self.page_rows += 1;
        if self.page_rows >= self.props.max_page_rows {
            self.flush_page()?;
        }
        Ok(())
    }

    fn add_encoding(&mut self, encoding: Encoding) {
        if !self.encodings.contains(&encoding) {
            self.encodings.push(encoding);
        }
    }

    fn encode_values(&mut self, values: &ColumnValues) -> Result<(Encoding, Vec<u8>)> {
        let mut out = Vec::new();
        let v2 = self.props.page_version == DataPageVersion::V2;
        // a page of nulls before any dictionary entry goes out plain
        let dictionary = self
            .dictionary
            .as_mut()
            .filter(|d| !d.full && !(values.is_empty() && d.values.is_empty()));
        if let Some(dictionary) = dictionary {
            let indices = dictionary.indices(values)?;
            if dictionary.encoded_size > self.props.dictionary_page_size_limit {
                dictionary.full = true;
            }
            let bit_width = num_required_bits(dictionary.values.len().saturating_sub(1) as u64).max(1);
            out.push(bit_width);
            out.extend_from_slice(&rle::RleEncoder::encode(bit_width, &indices));
            let encoding = if v2 {
                Encoding::RleDictionary
            } else {
                Encoding::PlainDictionary
            };
            return Ok((encoding, out));
        }

        match (self.props.encoding, values) {
            (WriterEncoding::DeltaBinaryPacked, ColumnValues::Int32(v)) => {
                delta::encode_i32(v, &mut out);
                Ok((Encoding::DeltaBinaryPacked, out))
            }
            (WriterEncoding::DeltaBinaryPacked, ColumnValues::Int64(v)) => {
                delta::encode_i64(v, &mut out);
                Ok((Encoding::DeltaBinaryPacked, out))
            }
            _ => {
                plain::encode(values, &mut out);
                Ok((Encoding::Plain, out))
            }
        }
    }

    fn checksum(&self, payload: &[u8]) -> Option<i32> {
        self.props
            .write_checksums
            .then(|| crc32fast::hash(payload) as i32)
    }

    /// Encodes the buffered levels and values as one data page
    pub fn flush_page(&mut self) -> Result<()> {
        if self.def_levels.is_empty() {
            return Ok(());
        }
        let values = std::mem::replace(
            &mut self.values,
            ColumnValues::empty(self.descriptor.physical_type),
        );
        let def_levels = std::mem::take(&mut self.def_levels);
        let rep_levels = std::mem::take(&mut self.rep_levels);
        let num_rows = std::mem::take(&mut self.page_rows);
        let num_levels = def_levels.len();
        let num_nulls = num_levels - values.len();

        let (encoding, encoded_values) = self.encode_values(&values)?;
        self.add_encoding(encoding);
        let max_def = self.descriptor.max_def_level;
        let max_rep = self.descriptor.max_rep_level;
        let codec = self.props.compression;

        let page = match self.props.page_version {
            DataPageVersion::V1 => {
                let mut body = Vec::new();
                if max_rep > 0 {
                    body.extend(rle::encode_levels_v1(&rep_levels, num_required_bits(max_rep as u64)));
                }
                if max_def > 0 {
                    body.extend(rle::encode_levels_v1(&def_levels, num_required_bits(max_def as u64)));
                }
                if max_rep > 0 || max_def > 0 {
                    self.add_encoding(Encoding::Rle);
                }
                body.extend_from_slice(&encoded_values);
                let payload = compression::compress(codec, &body)?;
                EncodedPage {
                    header: PageHeader {
                        type_: PageType::DataPage.to_thrift(),
                        uncompressed_page_size: body.len() as i32,
                        compressed_page_size: payload.len() as i32,
                        crc: self.checksum(&payload),
                        data_page_header: Some(DataPageHeader {
                            num_values: num_levels as i32,
                            encoding: encoding.to_thrift(),
                            definition_level_encoding: Encoding::Rle.to_thrift(),
                            repetition_level_encoding: Encoding::Rle.to_thrift(),
                            statistics: None,
                        }),
                        ..Default::default()
                    },
                    payload,
                }
            }
            DataPageVersion::V2 => {
                let rep_bytes = if max_rep > 0 {
                    rle::encode_levels(&rep_levels, num_required_bits(max_rep as u64))
                } else {
                    Vec::new()
                };
                let def_bytes = if max_def > 0 {
                    rle::encode_levels(&def_levels, num_required_bits(max_def as u64))
                } else {
                    Vec::new()
                };
                if max_rep > 0 || max_def > 0 {
                    self.add_encoding(Encoding::Rle);
                }
                let compressed_values = compression::compress(codec, &encoded_values)?;
                let mut payload = rep_bytes.clone();
                payload.extend_from_slice(&def_bytes);
                payload.extend_from_slice(&compressed_values);
                EncodedPage {
                    header: PageHeader {
                        type_: PageType::DataPageV2.to_thrift(),
                        uncompressed_page_size: (rep_bytes.len() + def_bytes.len() + encoded_values.len())
                            as i32,
                        compressed_page_size: payload.len() as i32,
                        crc: self.checksum(&payload),
                        data_page_header_v2: Some(DataPageHeaderV2 {
                            num_values: num_levels as i32,
                            num_nulls: num_nulls as i32,
                            num_rows: num_rows as i32,
                            encoding: encoding.to_thrift(),
                            definition_levels_byte_length: def_bytes.len() as i32,
                            repetition_levels_byte_length: rep_bytes.len() as i32,
                            is_compressed: Some(codec != Compression::Uncompressed),
                            statistics: None,
                        }),
                        ..Default::default()
                    },
                    payload,
                }
            }
        };

        trace!(
            column = %self.descriptor.path_string(),
            num_levels,
            num_rows,
            ?encoding,
            compressed = page.payload.len(),
            "encoded data page"
        );
        self.num_values += num_levels as i64;
        self.pages.push(page);
        Ok(())
    }

    fn dictionary_page(&mut self) -> Result<Option<EncodedPage>> {
        let Some(dictionary) = self.dictionary.as_ref().filter(|d| !d.values.is_empty()) else {
            return Ok(None);
        };
        let mut body = Vec::new();
        plain::encode(&dictionary.values, &mut body);
        let num_values = dictionary.values.len();
        let payload = compression::compress(self.props.compression, &body)?;
        let encoding = match self.props.page_version {
            DataPageVersion::V1 => Encoding::PlainDictionary,
            DataPageVersion::V2 => Encoding::Plain,
        };
        self.add_encoding(encoding);
        Ok(Some(EncodedPage {
            header: PageHeader {
                type_: PageType::DictionaryPage.to_thrift(),
                uncompressed_page_size: body.len() as i32,
                compressed_page_size: payload.len() as i32,
                crc: self.checksum(&payload),
                dictionary_page_header: Some(DictionaryPageHeader {
                    num_values: num_values as i32,
                    encoding: encoding.to_thrift(),
                    is_sorted: Some(false),
                }),
                ..Default::default()
            },
            payload,
        }))
    }

    /// Writes the finished chunk at `offset` and resets for the next row group
    pub fn close_chunk<W: Write>(&mut self, sink: &mut W, offset: u64) -> Result<ColumnChunk> {
        self.flush_page()?;
        let dictionary_page = self.dictionary_page()?;

        let mut written = 0u64;
        let mut uncompressed = 0i64;
        let mut dictionary_page_offset = None;
        if let Some(page) = &dictionary_page {
            let header = page.header_bytes();
            sink.write_all(&header)?;
            sink.write_all(&page.payload)?;
            dictionary_page_offset = Some(offset as i64);
            written += (header.len() + page.payload.len()) as u64;
            uncompressed += header.len() as i64 + page.header.uncompressed_page_size as i64;
        }
        let data_page_offset = (offset + written) as i64;
        for page in &self.pages {
            let header = page.header_bytes();
            sink.write_all(&header)?;
            sink.write_all(&page.payload)?;
            written += (header.len() + page.payload.len()) as u64;
            uncompressed += header.len() as i64 + page.header.uncompressed_page_size as i64;
        }

        let min = self.statistics.min.as_ref().map(Bound::to_plain);
        let max = self.statistics.max.as_ref().map(Bound::to_plain);
        let signed = self.order == SortOrder::Signed;
        let statistics = Statistics {
            max: max.clone().filter(|_| signed),
            min: min.clone().filter(|_| signed),
            null_count: Some(self.statistics.null_count),
            distinct_count: None,
            max_value: max,
            min_value: min,
        };

        let chunk = ColumnChunk {
            file_path: None,
            file_offset: offset as i64,
            meta_data: Some(ColumnMetaData {
                type_: self.descriptor.physical_type.to_thrift(),
                encodings: self.encodings.iter().map(|e| e.to_thrift()).collect(),
                path_in_schema: self.descriptor.path.clone(),
                codec: self.props.compression.to_thrift(),
                num_values: self.num_values,
                total_uncompressed_size: uncompressed,
                total_compressed_size: written as i64,
                key_value_metadata: None,
                data_page_offset,
                index_page_offset: None,
                dictionary_page_offset,
                statistics: Some(statistics),
            }),
        };
        self.reset_chunk();
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Compression;
    use crate::schema::Repetition;

    fn props(encoding: WriterEncoding) -> ColumnProperties {
        ColumnProperties {
            compression: Compression::Uncompressed,
            encoding,
            page_version: DataPageVersion::V1,
            max_page_rows: 2,
            dictionary_page_size_limit: DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT,
            write_checksums: true,
        }
    }

    fn descriptor(primitive_type: PrimitiveType, physical_type: PhysicalType) -> ColumnDescriptor {
        ColumnDescriptor {
            path: vec!["v".to_string()],
            physical_type,
            type_length: 0,
            primitive_type,
            repetition: Repetition::Optional,
            max_def_level: 1,
            max_rep_level: 0,
        }
    }

    #[test]
    fn test_pages_cut_at_record_boundaries() {
        let mut writer = ColumnWriter::new(
            descriptor(PrimitiveType::Int32, PhysicalType::Int32),
            props(WriterEncoding::Plain),
        );
        for i in 0..5 {
            writer.write_value(&ParquetValue::Int32(i), 0).unwrap();
            writer.end_record().unwrap();
        }
        let mut sink = Vec::new();
        let chunk = writer.close_chunk(&mut sink, 4).unwrap();
        let meta = chunk.meta_data.unwrap();
        assert_eq!(meta.num_values, 5);
        assert_eq!(meta.total_compressed_size as usize, sink.len());
        assert_eq!(meta.data_page_offset, 4);
        assert_eq!(meta.dictionary_page_offset, None);

        // three pages: 2 + 2 + 1 records
        let mut offset = 0;
        let mut pages = 0;
        while offset < sink.len() {
            let (header, len) = format::decode::<PageHeader>(&sink[offset..]).unwrap();
            offset += len + header.compressed_page_size as usize;
            pages += 1;
        }
        assert_eq!(pages, 3);
    }

    #[test]
    fn test_statistics_skip_nulls_and_use_unsigned_order() {
        let mut writer = ColumnWriter::new(
            descriptor(PrimitiveType::UInt32, PhysicalType::Int32),
            props(WriterEncoding::Plain),
        );
        writer.write_value(&ParquetValue::UInt32(1), 0).unwrap();
        writer.write_null(0, 0);
        writer.write_value(&ParquetValue::UInt32(u32::MAX), 0).unwrap();
        let chunk = writer.close_chunk(&mut Vec::new(), 4).unwrap();
        let stats = chunk.meta_data.unwrap().statistics.unwrap();
        assert_eq!(stats.null_count, Some(1));
        assert_eq!(stats.min_value, Some(1u32.to_le_bytes().to_vec()));
        assert_eq!(stats.max_value, Some(u32::MAX.to_le_bytes().to_vec()));
        assert_eq!(stats.min, None);
    }

    #[test]
    fn test_dictionary_page_written_first() {
        let mut writer = ColumnWriter::new(
            descriptor(PrimitiveType::String, PhysicalType::ByteArray),
            props(WriterEncoding::Dictionary),
        );
        for s in ["a", "b", "a", "a"] {
            writer
                .write_value(&ParquetValue::String(s.into()), 0)
                .unwrap();
            writer.end_record().unwrap();
        }
        let mut sink = Vec::new();
        let chunk = writer.close_chunk(&mut sink, 100).unwrap();
        let meta = chunk.meta_data.unwrap();
        assert_eq!(meta.dictionary_page_offset, Some(100));
        assert!(meta.data_page_offset > 100);
        let (header, _) = format::decode::<PageHeader>(&sink).unwrap();
        assert_eq!(header.type_, PageType::DictionaryPage.to_thrift());
        assert_eq!(header.dictionary_page_header.unwrap().num_values, 2);
    }

    #[test]
    fn test_dictionary_falls_back_to_plain() {
        let mut column_props = props(WriterEncoding::Dictionary);
        column_props.dictionary_page_size_limit = 8;
        let mut writer = ColumnWriter::new(
            descriptor(PrimitiveType::Int64, PhysicalType::Int64),
            column_props,
        );
        for i in 0..6 {
            writer.write_value(&ParquetValue::Int64(i), 0).unwrap();
            writer.end_record().unwrap();
        }
        let chunk = writer.close_chunk(&mut Vec::new(), 4).unwrap();
        let encodings = chunk.meta_data.unwrap().encodings;
        assert!(encodings.contains(&Encoding::PlainDictionary.to_thrift()));
        assert!(encodings.contains(&Encoding::Plain.to_thrift()));
    }

    #[test]
    fn test_all_null_dictionary_chunk_is_plain() {
        let mut writer = ColumnWriter::new(
            descriptor(PrimitiveType::Int32, PhysicalType::Int32),
            props(WriterEncoding::Dictionary),
        );
        for _ in 0..3 {
            writer.write_null(0, 0);
            writer.end_record().unwrap();
        }
        let mut sink = Vec::new();
        let chunk = writer.close_chunk(&mut sink, 4).unwrap();
        let meta = chunk.meta_data.unwrap();
        assert_eq!(meta.dictionary_page_offset, None);
        assert!(!meta.encodings.contains(&Encoding::PlainDictionary.to_thrift()));
        let (header, _) = format::decode::<PageHeader>(&sink).unwrap();
        let data_header = header.data_page_header.unwrap();
        assert_eq!(data_header.encoding, Encoding::Plain.to_thrift());
    }
}
