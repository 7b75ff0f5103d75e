//! Core Parquet writing functionality

use rand::Rng;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

use crate::basic::Compression;
use crate::column_writer::{ColumnProperties, ColumnWriter, DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT};
use crate::convert::accepts;
use crate::descriptor::SchemaDescriptor;
use crate::footer::MAGIC;
use crate::format::{self, FileMetaData, KeyValue, RowGroup};
use crate::{ParquetError, ParquetValue, PrimitiveType, Result, Schema, SchemaNode};

// Default configuration constants
const DEFAULT_ROW_GROUP_SIZE: usize = 1024 * 1024;
const DEFAULT_MEMORY_THRESHOLD: usize = 100 * 1024 * 1024; // 100MB
const DEFAULT_SAMPLE_SIZE: usize = 100;
const DEFAULT_MAX_PAGE_ROWS: usize = 20_000;
const MIN_ROW_GROUP_SIZE: usize = 10;
const MIN_SAMPLES_FOR_ESTIMATE: usize = 10;

/// Value encoding applied to every column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterEncoding {
    #[default]
    Plain,
    /// Dictionary page plus index pages; PLAIN once the dictionary is full
    Dictionary,
    /// For INT32/INT64 columns; other columns stay PLAIN
    DeltaBinaryPacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataPageVersion {
    #[default]
    V1,
    V2,
}

/// Builder for creating a configured Writer
pub struct WriterBuilder {
    compression: Compression,
    encoding: WriterEncoding,
    page_version: DataPageVersion,
    max_page_rows: usize,
    row_group_size: Option<usize>,
    memory_threshold: usize,
    sample_size: usize,
    dictionary_page_size_limit: usize,
    write_checksums: bool,
    key_value_metadata: Vec<(String, Option<String>)>,
    created_by: String,
}

impl Default for WriterBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::Snappy,
            encoding: WriterEncoding::Plain,
            page_version: DataPageVersion::V1,
            max_page_rows: DEFAULT_MAX_PAGE_ROWS,
            row_group_size: None,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            sample_size: DEFAULT_SAMPLE_SIZE,
            dictionary_page_size_limit: DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT,
            write_checksums: false,
            key_value_metadata: Vec::new(),
            created_by: format!("parquet-engine version {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WriterBuilder {
    /// Create a new WriterBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_encoding(mut self, encoding: WriterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_data_page_version(mut self, version: DataPageVersion) -> Self {
        self.page_version = version;
        self
    }

    /// Records per data page
    pub fn with_max_page_rows(mut self, rows: usize) -> Self {
        self.max_page_rows = rows.max(1);
        self
    }

    /// Set a fixed row group size in rows (disables dynamic sizing)
    pub fn with_row_group_size(mut self, rows: usize) -> Self {
        self.row_group_size = Some(rows.max(1));
        self
    }

    /// Set the memory threshold for flushing
    pub fn with_memory_threshold(mut self, threshold: usize) -> Self {
        self.memory_threshold = threshold;
        self
    }

    /// Set the sample size for row size estimation
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    pub fn with_dictionary_page_size_limit(mut self, bytes: usize) -> Self {
        self.dictionary_page_size_limit = bytes;
        self
    }

    /// Store a CRC32 of every page payload
    pub fn with_checksums(mut self, enabled: bool) -> Self {
        self.write_checksums = enabled;
        self
    }

    /// Add a footer key/value entry
    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.key_value_metadata.push((key.into(), Some(value.into())));
        self
    }

    pub fn with_created_by<S: Into<String>>(mut self, created_by: S) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Build a Writer with the configured settings
    ///
    /// Writes the leading magic immediately.
    pub fn build<W: Write + Send>(self, mut writer: W, schema: Schema) -> Result<Writer<W>> {
        let descr = Arc::new(SchemaDescriptor::from_schema(&schema)?);
        if !crate::compression::is_supported(self.compression) {
            return Err(ParquetError::unsupported_codec(format!(
                "{:?} compression is not supported",
                self.compression
            )));
        }
        let props = ColumnProperties {
            compression: self.compression,
            encoding: self.encoding,
            page_version: self.page_version,
            max_page_rows: self.max_page_rows,
            dictionary_page_size_limit: self.dictionary_page_size_limit,
            write_checksums: self.write_checksums,
        };
        let columns = descr
            .columns()
            .iter()
            .map(|column| ColumnWriter::new(column.clone(), props.clone()))
            .collect();

        writer.write_all(MAGIC)?;

        Ok(Writer {
            sink: Some(writer),
            offset: MAGIC.len() as u64,
            schema,
            descr,
            columns,
            row_groups: Vec::new(),
            rows_in_group: 0,
            total_rows_written: 0,
            current_row_group_size: self.row_group_size.unwrap_or(DEFAULT_ROW_GROUP_SIZE),
            fixed_row_group_size: self.row_group_size,
            memory_threshold: self.memory_threshold,
            sample_size: self.sample_size,
            size_samples: Vec::with_capacity(self.sample_size),
            page_version: self.page_version,
            key_value_metadata: self.key_value_metadata,
            created_by: self.created_by,
        })
    }
}

/// Core Parquet writer that works with any type implementing Write
pub struct Writer<W: Write> {
    sink: Option<W>,
    offset: u64,
    schema: Schema,
    descr: Arc<SchemaDescriptor>,
    columns: Vec<ColumnWriter>,
    row_groups: Vec<RowGroup>,
    rows_in_group: usize,
    total_rows_written: usize,
    current_row_group_size: usize,
    fixed_row_group_size: Option<usize>,
    memory_threshold: usize,
    sample_size: usize,
    size_samples: Vec<usize>,
    page_version: DataPageVersion,
    key_value_metadata: Vec<(String, Option<String>)>,
    created_by: String,
}

impl<W: Write> std::fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("offset", &self.offset)
            .field("row_groups", &self.row_groups.len())
            .field("rows_in_group", &self.rows_in_group)
            .field("total_rows_written", &self.total_rows_written)
            .field("closed", &self.sink.is_none())
            .finish()
    }
}

impl<W> Writer<W>
where
    W: Write + Send,
{
    /// Create a new writer with default settings
    pub fn new(writer: W, schema: Schema) -> Result<Self> {
        WriterBuilder::new().build(writer, schema)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Write a batch of rows to the Parquet file
    ///
    /// Each row is a vector of values corresponding to the schema fields
    pub fn write_rows(&mut self, rows: Vec<Vec<ParquetValue>>) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Write a single row to the Parquet file
    ///
    /// Rows are shredded into column buffers immediately; a row group is
    /// written once it reaches its row count or the memory threshold.
    pub fn write_row(&mut self, row: Vec<ParquetValue>) -> Result<()> {
        if self.sink.is_none() {
            return Err(closed());
        }
        let fields = self.schema.fields();
        if row.len() != fields.len() {
            return Err(ParquetError::schema(format!(
                "Row has {} values but schema has {} fields",
                row.len(),
                fields.len()
            )));
        }

        // Validate each value matches its schema
        for (value, field) in row.iter().zip(fields) {
            validate_value_against_field(value, field, field.name())?;
        }

        // Sample row size for dynamic row group sizing
        if self.fixed_row_group_size.is_none() {
            self.sample_row_size(&row);
        }

        let checkpoints: Vec<_> = self.columns.iter().map(ColumnWriter::checkpoint).collect();
        let mut leaf = 0;
        for (value, field) in row.iter().zip(self.schema.fields()) {
            if let Err(err) = shred(field, value, 0, 0, 0, leaf, &mut self.columns) {
                for (column, checkpoint) in self.columns.iter_mut().zip(checkpoints) {
                    column.rollback(checkpoint);
                }
                return Err(err);
            }
            leaf += leaf_count(field);
        }
        for column in &mut self.columns {
            column.end_record()?;
        }
        self.rows_in_group += 1;
        self.total_rows_written += 1;

        if self.rows_in_group >= self.current_row_group_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Sample row size for dynamic row group sizing using reservoir sampling
    fn sample_row_size(&mut self, row: &[ParquetValue]) {
        let row_size = estimate_row_size(row, self.schema.fields());

        if self.size_samples.len() < self.sample_size {
            self.size_samples.push(row_size);
        } else {
            // Reservoir sampling
            let mut rng = rand::rng();
            let idx = rng.random_range(0..=self.total_rows_written);
            if idx < self.sample_size {
                self.size_samples[idx] = row_size;
            }
        }

        // Update row group size if we have enough samples
        if self.size_samples.len() >= MIN_SAMPLES_FOR_ESTIMATE {
            self.update_row_group_size();
        }
    }

    /// Update dynamic row group size based on current samples
    fn update_row_group_size(&mut self) {
        if self.size_samples.is_empty() {
            return;
        }

        let total_size: usize = self.size_samples.iter().sum();
        let avg_row_size = (total_size as f64 / self.size_samples.len() as f64).max(1.0);
        let suggested = (self.memory_threshold as f64 / avg_row_size).floor() as usize;
        self.current_row_group_size = suggested.max(MIN_ROW_GROUP_SIZE);
    }

    /// Write columns to the Parquet file
    ///
    /// Each element is a tuple of (column_name, values); every top-level
    /// field must be present and all columns must have the same length.
    pub fn write_columns(&mut self, columns: Vec<(String, Vec<ParquetValue>)>) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }

        // Verify column names match schema
        let schema_fields = self.schema.fields();
        if columns.len() != schema_fields.len() {
            return Err(ParquetError::schema(format!(
                "Provided {} columns but schema has {} fields",
                columns.len(),
                schema_fields.len()
            )));
        }

        let num_rows = columns[0].1.len();
        if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != num_rows) {
            return Err(ParquetError::schema(format!(
                "Column '{}' has {} values, expected {}",
                name,
                values.len(),
                num_rows
            )));
        }

        // Reorder columns to match the schema, then transpose to rows
        let mut ordered = Vec::with_capacity(columns.len());
        let mut columns = columns;
        for field in schema_fields {
            let position = columns
                .iter()
                .position(|(name, _)| name == field.name())
                .ok_or_else(|| ParquetError::schema(format!("Missing column: {}", field.name())))?;
            ordered.push(columns.swap_remove(position).1.into_iter());
        }

        for _ in 0..num_rows {
            let row = ordered
                .iter_mut()
                .map(|values| values.next().unwrap_or(ParquetValue::Null))
                .collect();
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Write the buffered rows as a row group
    pub fn flush(&mut self) -> Result<()> {
        if self.rows_in_group == 0 {
            return Ok(());
        }
        let sink = self.sink.as_mut().ok_or_else(closed)?;

        let start = self.offset;
        let mut chunks = Vec::with_capacity(self.columns.len());
        let mut total_byte_size = 0;
        for column in &mut self.columns {
            let chunk = column.close_chunk(sink, self.offset)?;
            if let Some(meta) = &chunk.meta_data {
                self.offset += meta.total_compressed_size as u64;
                total_byte_size += meta.total_uncompressed_size;
            }
            chunks.push(chunk);
        }

        debug!(
            row_group = self.row_groups.len(),
            num_rows = self.rows_in_group,
            bytes = self.offset - start,
            "wrote row group"
        );
        self.row_groups.push(RowGroup {
            columns: chunks,
            total_byte_size,
            num_rows: self.rows_in_group as i64,
            file_offset: Some(start as i64),
            total_compressed_size: Some((self.offset - start) as i64),
            ordinal: i16::try_from(self.row_groups.len()).ok(),
        });
        self.rows_in_group = 0;
        Ok(())
    }

    /// Close the writer and write the file footer
    ///
    /// This must be called to finalize the Parquet file
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        let mut sink = self.sink.take().ok_or_else(closed)?;

        let num_rows = self.row_groups.iter().map(|rg| rg.num_rows).sum();
        let metadata = FileMetaData {
            version: match self.page_version {
                DataPageVersion::V1 => 1,
                DataPageVersion::V2 => 2,
            },
            schema: self.descr.to_elements(),
            num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata: (!self.key_value_metadata.is_empty()).then(|| {
                self.key_value_metadata
                    .iter()
                    .map(|(key, value)| KeyValue {
                        key: key.clone(),
                        value: value.clone(),
                    })
                    .collect()
            }),
            created_by: Some(self.created_by.clone()),
            column_orders: Some(vec![true; self.descr.num_columns()]),
        };
        let encoded = format::encode(&metadata);
        sink.write_all(&encoded)?;
        sink.write_all(&(encoded.len() as u32).to_le_bytes())?;
        sink.write_all(MAGIC)?;
        sink.flush()?;

        debug!(
            num_rows,
            row_groups = metadata.row_groups.len(),
            footer_len = encoded.len(),
            "closed parquet file"
        );
        Ok(())
    }
}

fn closed() -> ParquetError {
    ParquetError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Writer has been closed",
    ))
}

/// Leaf columns the writer lays out below a logical node
fn leaf_count(node: &SchemaNode) -> usize {
    match node {
        SchemaNode::Primitive { .. } => 1,
        SchemaNode::List { item, .. } => leaf_count(item),
        SchemaNode::Map { key, value, .. } => leaf_count(key) + leaf_count(value),
        SchemaNode::Struct { fields, .. } => fields.iter().map(leaf_count).sum(),
    }
}

fn write_nulls(columns: &mut [ColumnWriter], first_leaf: usize, count: usize, def: i16, rep: i16) {
    for column in &mut columns[first_leaf..first_leaf + count] {
        column.write_null(def, rep);
    }
}

/// Splits one validated value into its leaves' levels and values
///
/// `def` counts the defined optional and repeated ancestors, `rep_depth` the
/// repeated ones, and `rep` is the level to emit for the first leaf entry.
fn shred(
    node: &SchemaNode,
    value: &ParquetValue,
    def: i16,
    rep_depth: i16,
    rep: i16,
    first_leaf: usize,
    columns: &mut [ColumnWriter],
) -> Result<()> {
    if value.is_null() {
        write_nulls(columns, first_leaf, leaf_count(node), def, rep);
        return Ok(());
    }
    let def = def + node.is_nullable() as i16;

    match (node, value) {
        (SchemaNode::Primitive { .. }, value) => columns[first_leaf].write_value(value, rep),
        (SchemaNode::Struct { fields, .. }, ParquetValue::Record(record)) => {
            let mut leaf = first_leaf;
            for field in fields {
                let child = record.get(field.name()).unwrap_or(&ParquetValue::Null);
                shred(field, child, def, rep_depth, rep, leaf, columns)?;
                leaf += leaf_count(field);
            }
            Ok(())
        }
        (SchemaNode::List { item, .. }, ParquetValue::List(items)) => {
            if items.is_empty() {
                write_nulls(columns, first_leaf, leaf_count(item), def, rep);
                return Ok(());
            }
            for (i, element) in items.iter().enumerate() {
                let element_rep = if i == 0 { rep } else { rep_depth + 1 };
                shred(item, element, def + 1, rep_depth + 1, element_rep, first_leaf, columns)?;
            }
            Ok(())
        }
        (SchemaNode::Map { key, value: value_node, .. }, ParquetValue::Map(entries)) => {
            let key_leaves = leaf_count(key);
            if entries.is_empty() {
                write_nulls(columns, first_leaf, key_leaves + leaf_count(value_node), def, rep);
                return Ok(());
            }
            for (i, (k, v)) in entries.iter().enumerate() {
                let entry_rep = if i == 0 { rep } else { rep_depth + 1 };
                shred(key, k, def + 1, rep_depth + 1, entry_rep, first_leaf, columns)?;
                shred(
                    value_node,
                    v,
                    def + 1,
                    rep_depth + 1,
                    entry_rep,
                    first_leaf + key_leaves,
                    columns,
                )?;
            }
            Ok(())
        }
        (node, value) => Err(ParquetError::schema(format!(
            "cannot write {} into field '{}' of type {}",
            value.type_name(),
            node.name(),
            node.type_name()
        ))),
    }
}

/// Estimate the memory size of a row
fn estimate_row_size(row: &[ParquetValue], fields: &[SchemaNode]) -> usize {
    row.iter()
        .zip(fields)
        .map(|(value, field)| estimate_value_size(value, field))
        .sum()
}

/// Estimate the memory footprint of a single value
fn estimate_value_size(value: &ParquetValue, node: &SchemaNode) -> usize {
    use ParquetValue::*;

    match (value, node) {
        (Null, _) => 0,

        // Fixed size types
        (Boolean(_) | Int8(_) | UInt8(_), _) => 1,
        (Int16(_) | UInt16(_) | Float16(_), _) => 2,
        (Int32(_) | UInt32(_) | Float32(_) | Date32(_) | TimeMillis(_), _) => 4,
        (Int64(_) | UInt64(_) | Float64(_) | TimeMicros(_) | TimeNanos(_), _) => 8,
        (TimestampMillis(..) | TimestampMicros(..) | TimestampNanos(..), _) => 8,
        (Decimal128(..) | Uuid(_), _) => 16,

        // Variable size types
        (String(s), _) => s.len() + std::mem::size_of::<usize>() * 3,
        (
            Bytes(_),
            SchemaNode::Primitive {
                primitive_type: PrimitiveType::FixedLenByteArray(len),
                ..
            },
        ) => *len as usize,
        (Bytes(b), _) => b.len() + std::mem::size_of::<usize>() * 3,
        (Decimal256(v, _), _) => 32 + v.to_signed_bytes_le().len(),

        // Complex types
        (List(items), SchemaNode::List { item, .. }) => {
            let base_size = std::mem::size_of::<usize>() * 3;
            if items.is_empty() {
                base_size
            } else {
                // Sample up to 5 elements
                let sample_count = items.len().min(5);
                let sample_size: usize = items
                    .iter()
                    .take(sample_count)
                    .map(|element| estimate_value_size(element, item))
                    .sum();
                base_size + (sample_size / sample_count) * items.len()
            }
        }

        (Map(entries), SchemaNode::Map { key, value, .. }) => {
            let base_size = std::mem::size_of::<usize>() * 4;
            if entries.is_empty() {
                base_size
            } else {
                // Sample up to 5 entries
                let sample_count = entries.len().min(5);
                let sample_size: usize = entries
                    .iter()
                    .take(sample_count)
                    .map(|(k, v)| estimate_value_size(k, key) + estimate_value_size(v, value))
                    .sum();
                base_size + (sample_size / sample_count) * entries.len()
            }
        }

        (Record(record), SchemaNode::Struct { fields, .. }) => {
            let base_size = std::mem::size_of::<usize>() * 3;
            let field_sizes: usize = fields
                .iter()
                .filter_map(|field| {
                    record
                        .get(field.name())
                        .map(|value| estimate_value_size(value, field))
                })
                .sum();
            base_size + field_sizes
        }

        _ => 100, // Default estimate for mismatched types
    }
}

/// Validate a value against its field schema
fn validate_value_against_field(value: &ParquetValue, field: &SchemaNode, path: &str) -> Result<()> {
    use ParquetValue::*;

    // Null handling
    if matches!(value, Null) {
        if !field.is_nullable() {
            return Err(ParquetError::schema(format!(
                "Found null value for non-nullable field at {}",
                path
            )));
        }
        return Ok(());
    }

    match (value, field) {
        (value, SchemaNode::Primitive { primitive_type, .. }) => {
            if accepts(primitive_type, value) {
                Ok(())
            } else {
                Err(ParquetError::schema(format!(
                    "Type mismatch at {}: expected {}, got {}",
                    path,
                    primitive_type.type_name(),
                    value.type_name()
                )))
            }
        }

        // List type
        (List(items), SchemaNode::List { item, .. }) => {
            for (idx, element) in items.iter().enumerate() {
                validate_value_against_field(element, item, &format!("{}[{}]", path, idx))?;
            }
            Ok(())
        }

        // Map type
        (Map(entries), SchemaNode::Map { key, value, .. }) => {
            for (idx, (k, v)) in entries.iter().enumerate() {
                validate_value_against_field(k, key, &format!("{}.key[{}]", path, idx))?;
                validate_value_against_field(v, value, &format!("{}.value[{}]", path, idx))?;
            }
            Ok(())
        }

        // Struct type
        (Record(record_fields), SchemaNode::Struct { fields, .. }) => {
            for field in fields {
                let field_name = field.name();
                if let Some(value) = record_fields.get(field_name) {
                    validate_value_against_field(value, field, &format!("{}.{}", path, field_name))?;
                } else if !field.is_nullable() {
                    return Err(ParquetError::schema(format!(
                        "Required field '{}' is missing in struct at {}",
                        field_name, path
                    )));
                }
            }
            if let Some(unknown) = record_fields.keys().find(|name| {
                let name: &str = name;
                !fields.iter().any(|field| field.name() == name)
            }) {
                return Err(ParquetError::schema(format!(
                    "Unknown field '{}' in struct at {}",
                    unknown, path
                )));
            }
            Ok(())
        }

        // Type mismatch
        (value, expected) => Err(ParquetError::schema(format!(
            "Type mismatch at {}: expected {}, got {}",
            path,
            expected.type_name(),
            value.type_name()
        ))),
    }
}
