//! File, row group and column chunk metadata
//!
//! Built from the decoded footer and validated against the schema, so the
//! layers below can index columns without re-checking the footer.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

use crate::basic::{Compression, Encoding, PhysicalType};
use crate::convert::physical_to_value;
use crate::descriptor::{ColumnDescriptor, SchemaDescriptor};
use crate::encoding::{plain, ColumnValues};
use crate::format;
use crate::schema::{PrimitiveType, Repetition, Schema};
use crate::{ParquetError, ParquetValue, Result};
use bytes::Bytes;

/// Everything the footer describes about a file
#[derive(Debug, Clone)]
pub struct ParquetMetaData {
    version: i32,
    num_rows: i64,
    /// Sum of the row group counts
    total_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Vec<(String, Option<String>)>,
    schema: Arc<SchemaDescriptor>,
    row_groups: Vec<RowGroupMetaData>,
}

impl ParquetMetaData {
    /// Validates decoded footer structures against the schema they carry
    pub fn try_from_thrift(file: format::FileMetaData) -> Result<Self> {
        let schema = Arc::new(SchemaDescriptor::from_elements(&file.schema)?);
        if file.num_rows < 0 {
            return Err(ParquetError::format(format!(
                "negative row count {}",
                file.num_rows
            )));
        }
        let row_groups = file
            .row_groups
            .into_iter()
            .enumerate()
            .map(|(index, rg)| RowGroupMetaData::try_from_thrift(rg, &schema, index))
            .collect::<Result<Vec<_>>>()?;
        let total_rows = row_groups.iter().try_fold(0i64, |total, rg| {
            total.checked_add(rg.num_rows).ok_or_else(|| {
                ParquetError::format("row group row counts overflow the file total")
            })
        })?;

        let key_value_metadata = file
            .key_value_metadata
            .unwrap_or_default()
            .into_iter()
            .map(|kv| (kv.key, kv.value))
            .collect();

        Ok(Self {
            version: file.version,
            num_rows: file.num_rows,
            total_rows,
            created_by: file.created_by,
            key_value_metadata,
            schema,
            row_groups,
        })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Row count as recorded in the footer
    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn key_value_metadata(&self) -> &[(String, Option<String>)] {
        &self.key_value_metadata
    }

    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn schema_descr_ptr(&self) -> Arc<SchemaDescriptor> {
        Arc::clone(&self.schema)
    }

    pub fn schema(&self) -> &Schema {
        self.schema.schema()
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }

    /// Sum of the row counts of all row groups
    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }

    /// # Panics
    ///
    /// Panics if `index` is not below `num_row_groups()`; use
    /// `row_groups().get(index)` to probe.
    pub fn row_group(&self, index: usize) -> &RowGroupMetaData {
        &self.row_groups[index]
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    /// Summary returned by `Reader::info`
    pub fn file_info(&self) -> FileInfo {
        let columns = self
            .schema
            .columns()
            .iter()
            .map(|column| ColumnInfo {
                path: column.path_string(),
                logical_type: column.primitive_type.type_name().to_string(),
                physical_type: column.physical_type.name().to_string(),
                repetition: column.repetition,
            })
            .collect();
        FileInfo {
            version: self.version,
            num_rows: self.total_rows,
            num_row_groups: self.row_groups.len(),
            created_by: self.created_by.clone(),
            key_value_metadata: self.key_value_metadata.iter().cloned().collect(),
            columns,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    num_rows: i64,
    total_byte_size: i64,
    file_offset: Option<i64>,
    columns: Vec<ColumnChunkMetaData>,
}

impl RowGroupMetaData {
    fn try_from_thrift(
        rg: format::RowGroup,
        schema: &Arc<SchemaDescriptor>,
        index: usize,
    ) -> Result<Self> {
        if rg.num_rows < 0 || rg.total_byte_size < 0 {
            return Err(ParquetError::format(format!(
                "row group {} has negative sizes",
                index
            )));
        }
        if rg.columns.len() != schema.num_columns() {
            return Err(ParquetError::format(format!(
                "row group {} has {} column chunks, schema has {} leaf columns",
                index,
                rg.columns.len(),
                schema.num_columns()
            )));
        }
        let columns = rg
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| ColumnChunkMetaData::try_from_thrift(chunk, schema, i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            num_rows: rg.num_rows,
            total_byte_size: rg.total_byte_size,
            file_offset: rg.file_offset,
            columns,
        })
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    pub fn file_offset(&self) -> Option<i64> {
        self.file_offset
    }

    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    /// # Panics
    ///
    /// Panics if `index` is not below the number of leaf columns.
    pub fn column(&self, index: usize) -> &ColumnChunkMetaData {
        &self.columns[index]
    }
}

#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    descriptor: ColumnDescriptor,
    codec: i32,
    encodings: Vec<i32>,
    num_values: i64,
    total_compressed_size: i64,
    total_uncompressed_size: i64,
    data_page_offset: i64,
    dictionary_page_offset: Option<i64>,
    statistics: Option<format::Statistics>,
}

impl ColumnChunkMetaData {
    fn try_from_thrift(
        chunk: format::ColumnChunk,
        schema: &SchemaDescriptor,
        index: usize,
    ) -> Result<Self> {
        let descriptor = schema.column(index).clone();
        if chunk.file_path.is_some() {
            return Err(ParquetError::format(format!(
                "column '{}' is stored in an external file",
                descriptor.path_string()
            )));
        }
        let meta = chunk.meta_data.ok_or_else(|| {
            ParquetError::format(format!(
                "column chunk '{}' has no metadata",
                descriptor.path_string()
            ))
        })?;
        if meta.path_in_schema != descriptor.path[..] {
            return Err(ParquetError::format(format!(
                "column chunk {} is for '{}', schema expects '{}'",
                index,
                meta.path_in_schema.join("."),
                descriptor.path_string()
            )));
        }
        let physical_type = PhysicalType::from_thrift(meta.type_)?;
        if physical_type != descriptor.physical_type {
            return Err(ParquetError::format(format!(
                "column '{}' chunk is {}, schema declares {}",
                descriptor.path_string(),
                physical_type,
                descriptor.physical_type
            )));
        }
        if meta.num_values < 0
            || meta.total_compressed_size < 0
            || meta.data_page_offset < 0
            || meta.dictionary_page_offset.is_some_and(|offset| offset < 0)
        {
            return Err(ParquetError::format(format!(
                "column '{}' has negative counts or offsets",
                descriptor.path_string()
            )));
        }
        Ok(Self {
            descriptor,
            codec: meta.codec,
            encodings: meta.encodings,
            num_values: meta.num_values,
            total_compressed_size: meta.total_compressed_size,
            total_uncompressed_size: meta.total_uncompressed_size,
            data_page_offset: meta.data_page_offset,
            dictionary_page_offset: meta.dictionary_page_offset,
            statistics: meta.statistics,
        })
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    pub fn path(&self) -> &[String] {
        &self.descriptor.path
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.descriptor.physical_type
    }

    /// Codec of the chunk; unknown ids are an unsupported-codec error
    pub fn compression(&self) -> Result<Compression> {
        Compression::from_thrift(self.codec)
    }

    /// Encodings listed for the chunk, skipping ids this crate does not know
    pub fn encodings(&self) -> Vec<Encoding> {
        self.encodings
            .iter()
            .filter_map(|e| Encoding::from_thrift(*e).ok())
            .collect()
    }

    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    pub fn uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    /// Start and length of the chunk's pages
    ///
    /// Some writers record a dictionary offset of 0 when there is none, so
    /// the dictionary offset is only used when it precedes the data pages.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = match self.dictionary_page_offset {
            Some(offset) if offset > 0 && offset < self.data_page_offset => offset,
            _ => self.data_page_offset,
        };
        (start as u64, self.total_compressed_size as u64)
    }

    /// Decoded statistics, if the writer recorded any
    pub fn statistics(&self) -> Result<Option<ColumnStatistics>> {
        let Some(stats) = &self.statistics else {
            return Ok(None);
        };
        let legacy_order = legacy_sort_order_applies(&self.descriptor);
        let pick = |new: &Option<Vec<u8>>, old: &Option<Vec<u8>>| match (new, old) {
            (Some(bytes), _) => Some(bytes.clone()),
            (None, Some(bytes)) if legacy_order => Some(bytes.clone()),
            _ => None,
        };
        let decode = |raw: Option<Vec<u8>>| {
            raw.map(|bytes| decode_statistic(&self.descriptor, Bytes::from(bytes)))
                .transpose()
        };
        Ok(Some(ColumnStatistics {
            min: decode(pick(&stats.min_value, &stats.min))?,
            max: decode(pick(&stats.max_value, &stats.max))?,
            null_count: stats.null_count,
            distinct_count: stats.distinct_count,
        }))
    }
}

/// Deprecated `min`/`max` fields used signed ordering, which is only right
/// for signed numeric and boolean columns
fn legacy_sort_order_applies(column: &ColumnDescriptor) -> bool {
    matches!(
        column.physical_type,
        PhysicalType::Boolean
            | PhysicalType::Int32
            | PhysicalType::Int64
            | PhysicalType::Float
            | PhysicalType::Double
    ) && !matches!(
        column.primitive_type,
        PrimitiveType::UInt8 | PrimitiveType::UInt16 | PrimitiveType::UInt32 | PrimitiveType::UInt64
    )
}

/// Statistics values are PLAIN-encoded without the BYTE_ARRAY length prefix
fn decode_statistic(column: &ColumnDescriptor, bytes: Bytes) -> Result<ParquetValue> {
    let values = match column.physical_type {
        PhysicalType::ByteArray => ColumnValues::ByteArray(vec![bytes]),
        PhysicalType::FixedLenByteArray => ColumnValues::FixedLenByteArray(vec![bytes]),
        physical => plain::decode(&bytes, physical, column.type_length, 1)?.0,
    };
    physical_to_value(&values, 0, &column.primitive_type)
}

/// Min/max and counts of one column chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub min: Option<ParquetValue>,
    pub max: Option<ParquetValue>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
}

/// Serializable file summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub version: i32,
    pub num_rows: i64,
    pub num_row_groups: usize,
    pub created_by: Option<String>,
    pub key_value_metadata: IndexMap<String, Option<String>>,
    pub columns: Vec<ColumnInfo>,
}

/// One leaf column as listed by [`FileInfo`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub path: String,
    pub logical_type: String,
    pub physical_type: String,
    pub repetition: Repetition,
}
