//! Wire structures of `parquet.thrift`
//!
//! These mirror the thrift definitions field for field. Enum-typed fields
//! stay raw `i32` here and are interpreted by the layers above.

pub mod compact;

use crate::basic::{LogicalType, TimeUnit};
use crate::{ParquetError, Result};
use compact::{CompactReader, CompactWriter, FieldType};

/// Decode/encode a thrift struct in the compact protocol
pub trait ThriftStruct: Sized {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self>;
    fn write_to(&self, writer: &mut CompactWriter);
}

/// Decodes one struct from the front of `buf`, returning it and the bytes used
pub fn decode<T: ThriftStruct>(buf: &[u8]) -> Result<(T, usize)> {
    let mut reader = CompactReader::new(buf);
    let value = T::read_from(&mut reader)?;
    Ok((value, reader.position()))
}

pub fn encode<T: ThriftStruct>(value: &T) -> Vec<u8> {
    let mut writer = CompactWriter::new();
    value.write_to(&mut writer);
    writer.into_inner()
}

fn required<T>(value: Option<T>, structure: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        ParquetError::format(format!(
            "{} is missing required field '{}'",
            structure, field
        ))
    })
}

fn read_list<T>(
    reader: &mut CompactReader<'_>,
    mut read_element: impl FnMut(&mut CompactReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let (_, size) = reader.read_list_begin()?;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        out.push(read_element(reader)?);
    }
    Ok(out)
}

fn write_struct_list<T: ThriftStruct>(writer: &mut CompactWriter, id: i16, items: &[T]) {
    writer.write_field_begin(FieldType::List, id);
    writer.write_list_begin(FieldType::Struct, items.len());
    for item in items {
        item.write_to(writer);
    }
}

/// Reads an empty marker struct such as `StringType` or `MilliSeconds`
fn read_empty_struct(reader: &mut CompactReader<'_>) -> Result<()> {
    reader.read_struct_begin()?;
    while let Some((field_type, _)) = reader.read_field_begin()? {
        reader.skip(field_type)?;
    }
    reader.read_struct_end()
}

fn write_empty_struct_field(writer: &mut CompactWriter, id: i16) {
    writer.write_field_begin(FieldType::Struct, id);
    writer.write_struct_begin();
    writer.write_struct_end();
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileMetaData {
    pub version: i32,
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub created_by: Option<String>,
    /// One entry per leaf; `true` for TYPE_DEFINED_ORDER
    pub column_orders: Option<Vec<bool>>,
}

impl ThriftStruct for FileMetaData {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut version = None;
        let mut schema = None;
        let mut num_rows = None;
        let mut row_groups = None;
        let mut key_value_metadata = None;
        let mut created_by = None;
        let mut column_orders = None;

        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => version = Some(reader.read_i32()?),
                (2, FieldType::List) => schema = Some(read_list(reader, SchemaElement::read_from)?),
                (3, FieldType::I64) => num_rows = Some(reader.read_i64()?),
                (4, FieldType::List) => row_groups = Some(read_list(reader, RowGroup::read_from)?),
                (5, FieldType::List) => {
                    key_value_metadata = Some(read_list(reader, KeyValue::read_from)?)
                }
                (6, FieldType::Binary) => created_by = Some(reader.read_string()?),
                (7, FieldType::List) => column_orders = Some(read_list(reader, read_column_order)?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;

        Ok(Self {
            version: required(version, "FileMetaData", "version")?,
            schema: required(schema, "FileMetaData", "schema")?,
            num_rows: required(num_rows, "FileMetaData", "num_rows")?,
            row_groups: required(row_groups, "FileMetaData", "row_groups")?,
            key_value_metadata,
            created_by,
            column_orders,
        })
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_i32_field(1, self.version);
        write_struct_list(writer, 2, &self.schema);
        writer.write_i64_field(3, self.num_rows);
        write_struct_list(writer, 4, &self.row_groups);
        if let Some(kv) = &self.key_value_metadata {
            write_struct_list(writer, 5, kv);
        }
        if let Some(created_by) = &self.created_by {
            writer.write_binary_field(6, created_by.as_bytes());
        }
        if let Some(orders) = &self.column_orders {
            writer.write_field_begin(FieldType::List, 7);
            writer.write_list_begin(FieldType::Struct, orders.len());
            for type_defined in orders {
                writer.write_struct_begin();
                if *type_defined {
                    write_empty_struct_field(writer, 1);
                }
                writer.write_struct_end();
            }
        }
        writer.write_struct_end();
    }
}

fn read_column_order(reader: &mut CompactReader<'_>) -> Result<bool> {
    let mut type_defined = false;
    reader.read_struct_begin()?;
    while let Some((field_type, id)) = reader.read_field_begin()? {
        if id == 1 && field_type == FieldType::Struct {
            read_empty_struct(reader)?;
            type_defined = true;
        } else {
            reader.skip(field_type)?;
        }
    }
    reader.read_struct_end()?;
    Ok(type_defined)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl ThriftStruct for KeyValue {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut key = None;
        let mut value = None;
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::Binary) => key = Some(reader.read_string()?),
                (2, FieldType::Binary) => value = Some(reader.read_string()?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        Ok(Self {
            key: required(key, "KeyValue", "key")?,
            value,
        })
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_binary_field(1, self.key.as_bytes());
        if let Some(value) = &self.value {
            writer.write_binary_field(2, value.as_bytes());
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaElement {
    pub type_: Option<i32>,
    pub type_length: Option<i32>,
    pub repetition_type: Option<i32>,
    pub name: String,
    pub num_children: Option<i32>,
    pub converted_type: Option<i32>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub field_id: Option<i32>,
    pub logical_type: Option<LogicalType>,
}

impl ThriftStruct for SchemaElement {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut element = SchemaElement::default();
        let mut name = None;
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => element.type_ = Some(reader.read_i32()?),
                (2, FieldType::I32) => element.type_length = Some(reader.read_i32()?),
                (3, FieldType::I32) => element.repetition_type = Some(reader.read_i32()?),
                (4, FieldType::Binary) => name = Some(reader.read_string()?),
                (5, FieldType::I32) => element.num_children = Some(reader.read_i32()?),
                (6, FieldType::I32) => element.converted_type = Some(reader.read_i32()?),
                (7, FieldType::I32) => element.scale = Some(reader.read_i32()?),
                (8, FieldType::I32) => element.precision = Some(reader.read_i32()?),
                (9, FieldType::I32) => element.field_id = Some(reader.read_i32()?),
                (10, FieldType::Struct) => element.logical_type = read_logical_type(reader)?,
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        element.name = required(name, "SchemaElement", "name")?;
        Ok(element)
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        if let Some(type_) = self.type_ {
            writer.write_i32_field(1, type_);
        }
        if let Some(type_length) = self.type_length {
            writer.write_i32_field(2, type_length);
        }
        if let Some(repetition) = self.repetition_type {
            writer.write_i32_field(3, repetition);
        }
        writer.write_binary_field(4, self.name.as_bytes());
        if let Some(num_children) = self.num_children {
            writer.write_i32_field(5, num_children);
        }
        if let Some(converted) = self.converted_type {
            writer.write_i32_field(6, converted);
        }
        if let Some(scale) = self.scale {
            writer.write_i32_field(7, scale);
        }
        if let Some(precision) = self.precision {
            writer.write_i32_field(8, precision);
        }
        if let Some(field_id) = self.field_id {
            writer.write_i32_field(9, field_id);
        }
        if let Some(logical) = &self.logical_type {
            writer.write_field_begin(FieldType::Struct, 10);
            write_logical_type(writer, logical);
        }
        writer.write_struct_end();
    }
}

/// Decodes the `LogicalType` union; `None` for members this crate ignores
fn read_logical_type(reader: &mut CompactReader<'_>) -> Result<Option<LogicalType>> {
    let mut logical = None;
    reader.read_struct_begin()?;
    while let Some((field_type, id)) = reader.read_field_begin()? {
        if field_type != FieldType::Struct {
            reader.skip(field_type)?;
            continue;
        }
        logical = match id {
            1 => read_empty_struct(reader).map(|_| Some(LogicalType::String))?,
            2 => read_empty_struct(reader).map(|_| Some(LogicalType::Map))?,
            3 => read_empty_struct(reader).map(|_| Some(LogicalType::List))?,
            4 => read_empty_struct(reader).map(|_| Some(LogicalType::Enum))?,
            5 => Some(read_decimal_type(reader)?),
            6 => read_empty_struct(reader).map(|_| Some(LogicalType::Date))?,
            7 => {
                let (adjusted_to_utc, unit) = read_temporal_type(reader)?;
                Some(LogicalType::Time {
                    adjusted_to_utc,
                    unit,
                })
            }
            8 => {
                let (adjusted_to_utc, unit) = read_temporal_type(reader)?;
                Some(LogicalType::Timestamp {
                    adjusted_to_utc,
                    unit,
                })
            }
            10 => Some(read_int_type(reader)?),
            11 => read_empty_struct(reader).map(|_| Some(LogicalType::Unknown))?,
            12 => read_empty_struct(reader).map(|_| Some(LogicalType::Json))?,
            13 => read_empty_struct(reader).map(|_| Some(LogicalType::Bson))?,
            14 => read_empty_struct(reader).map(|_| Some(LogicalType::Uuid))?,
            15 => read_empty_struct(reader).map(|_| Some(LogicalType::Float16))?,
            _ => {
                reader.skip(field_type)?;
                None
            }
        };
    }
    reader.read_struct_end()?;
    Ok(logical)
}

fn read_decimal_type(reader: &mut CompactReader<'_>) -> Result<LogicalType> {
    let mut scale = None;
    let mut precision = None;
    reader.read_struct_begin()?;
    while let Some((field_type, id)) = reader.read_field_begin()? {
        match (id, field_type) {
            (1, FieldType::I32) => scale = Some(reader.read_i32()?),
            (2, FieldType::I32) => precision = Some(reader.read_i32()?),
            _ => reader.skip(field_type)?,
        }
    }
    reader.read_struct_end()?;
    Ok(LogicalType::Decimal {
        scale: required(scale, "DecimalType", "scale")?,
        precision: required(precision, "DecimalType", "precision")?,
    })
}

fn read_temporal_type(reader: &mut CompactReader<'_>) -> Result<(bool, TimeUnit)> {
    let mut adjusted = None;
    let mut unit = None;
    reader.read_struct_begin()?;
    while let Some((field_type, id)) = reader.read_field_begin()? {
        match (id, field_type) {
            (1, FieldType::BoolTrue | FieldType::BoolFalse) => adjusted = Some(reader.read_bool()?),
            (2, FieldType::Struct) => unit = Some(read_time_unit(reader)?),
            _ => reader.skip(field_type)?,
        }
    }
    reader.read_struct_end()?;
    Ok((
        required(adjusted, "TimeType", "isAdjustedToUTC")?,
        required(unit, "TimeType", "unit")?,
    ))
}

fn read_time_unit(reader: &mut CompactReader<'_>) -> Result<TimeUnit> {
    let mut unit = None;
    reader.read_struct_begin()?;
    while let Some((field_type, id)) = reader.read_field_begin()? {
        match (id, field_type) {
            (1, FieldType::Struct) => {
                read_empty_struct(reader)?;
                unit = Some(TimeUnit::Millis);
            }
            (2, FieldType::Struct) => {
                read_empty_struct(reader)?;
                unit = Some(TimeUnit::Micros);
            }
            (3, FieldType::Struct) => {
                read_empty_struct(reader)?;
                unit = Some(TimeUnit::Nanos);
            }
            _ => reader.skip(field_type)?,
        }
    }
    reader.read_struct_end()?;
    required(unit, "TimeUnit", "unit")
}

fn read_int_type(reader: &mut CompactReader<'_>) -> Result<LogicalType> {
    let mut bit_width = None;
    let mut signed = None;
    reader.read_struct_begin()?;
    while let Some((field_type, id)) = reader.read_field_begin()? {
        match (id, field_type) {
            (1, FieldType::Byte) => bit_width = Some(reader.read_i8()?),
            (2, FieldType::BoolTrue | FieldType::BoolFalse) => signed = Some(reader.read_bool()?),
            _ => reader.skip(field_type)?,
        }
    }
    reader.read_struct_end()?;
    Ok(LogicalType::Integer {
        bit_width: required(bit_width, "IntType", "bitWidth")?,
        signed: required(signed, "IntType", "isSigned")?,
    })
}

fn write_logical_type(writer: &mut CompactWriter, logical: &LogicalType) {
    writer.write_struct_begin();
    match logical {
        LogicalType::String => write_empty_struct_field(writer, 1),
        LogicalType::Map => write_empty_struct_field(writer, 2),
        LogicalType::List => write_empty_struct_field(writer, 3),
        LogicalType::Enum => write_empty_struct_field(writer, 4),
        LogicalType::Decimal { scale, precision } => {
            writer.write_field_begin(FieldType::Struct, 5);
            writer.write_struct_begin();
            writer.write_i32_field(1, *scale);
            writer.write_i32_field(2, *precision);
            writer.write_struct_end();
        }
        LogicalType::Date => write_empty_struct_field(writer, 6),
        LogicalType::Time {
            adjusted_to_utc,
            unit,
        } => write_temporal_type(writer, 7, *adjusted_to_utc, *unit),
        LogicalType::Timestamp {
            adjusted_to_utc,
            unit,
        } => write_temporal_type(writer, 8, *adjusted_to_utc, *unit),
        LogicalType::Integer { bit_width, signed } => {
            writer.write_field_begin(FieldType::Struct, 10);
            writer.write_struct_begin();
            writer.write_i8_field(1, *bit_width);
            writer.write_bool_field(2, *signed);
            writer.write_struct_end();
        }
        LogicalType::Unknown => write_empty_struct_field(writer, 11),
        LogicalType::Json => write_empty_struct_field(writer, 12),
        LogicalType::Bson => write_empty_struct_field(writer, 13),
        LogicalType::Uuid => write_empty_struct_field(writer, 14),
        LogicalType::Float16 => write_empty_struct_field(writer, 15),
    }
    writer.write_struct_end();
}

fn write_temporal_type(writer: &mut CompactWriter, id: i16, adjusted: bool, unit: TimeUnit) {
    writer.write_field_begin(FieldType::Struct, id);
    writer.write_struct_begin();
    writer.write_bool_field(1, adjusted);
    writer.write_field_begin(FieldType::Struct, 2);
    writer.write_struct_begin();
    let unit_id = match unit {
        TimeUnit::Millis => 1,
        TimeUnit::Micros => 2,
        TimeUnit::Nanos => 3,
    };
    write_empty_struct_field(writer, unit_id);
    writer.write_struct_end();
    writer.write_struct_end();
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
    pub file_offset: Option<i64>,
    pub total_compressed_size: Option<i64>,
    pub ordinal: Option<i16>,
}

impl ThriftStruct for RowGroup {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut columns = None;
        let mut total_byte_size = None;
        let mut num_rows = None;
        let mut group = RowGroup::default();
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::List) => columns = Some(read_list(reader, ColumnChunk::read_from)?),
                (2, FieldType::I64) => total_byte_size = Some(reader.read_i64()?),
                (3, FieldType::I64) => num_rows = Some(reader.read_i64()?),
                (5, FieldType::I64) => group.file_offset = Some(reader.read_i64()?),
                (6, FieldType::I64) => group.total_compressed_size = Some(reader.read_i64()?),
                (7, FieldType::I16) => group.ordinal = Some(reader.read_i16()?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        group.columns = required(columns, "RowGroup", "columns")?;
        group.total_byte_size = required(total_byte_size, "RowGroup", "total_byte_size")?;
        group.num_rows = required(num_rows, "RowGroup", "num_rows")?;
        Ok(group)
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        write_struct_list(writer, 1, &self.columns);
        writer.write_i64_field(2, self.total_byte_size);
        writer.write_i64_field(3, self.num_rows);
        if let Some(offset) = self.file_offset {
            writer.write_i64_field(5, offset);
        }
        if let Some(size) = self.total_compressed_size {
            writer.write_i64_field(6, size);
        }
        if let Some(ordinal) = self.ordinal {
            writer.write_i16_field(7, ordinal);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnChunk {
    pub file_path: Option<String>,
    pub file_offset: i64,
    pub meta_data: Option<ColumnMetaData>,
}

impl ThriftStruct for ColumnChunk {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut chunk = ColumnChunk::default();
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::Binary) => chunk.file_path = Some(reader.read_string()?),
                (2, FieldType::I64) => chunk.file_offset = reader.read_i64()?,
                (3, FieldType::Struct) => chunk.meta_data = Some(ColumnMetaData::read_from(reader)?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        Ok(chunk)
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        if let Some(path) = &self.file_path {
            writer.write_binary_field(1, path.as_bytes());
        }
        writer.write_i64_field(2, self.file_offset);
        if let Some(meta) = &self.meta_data {
            writer.write_field_begin(FieldType::Struct, 3);
            meta.write_to(writer);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnMetaData {
    pub type_: i32,
    pub encodings: Vec<i32>,
    pub path_in_schema: Vec<String>,
    pub codec: i32,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub data_page_offset: i64,
    pub index_page_offset: Option<i64>,
    pub dictionary_page_offset: Option<i64>,
    pub statistics: Option<Statistics>,
}

impl ThriftStruct for ColumnMetaData {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut type_ = None;
        let mut encodings = None;
        let mut path = None;
        let mut codec = None;
        let mut num_values = None;
        let mut uncompressed = None;
        let mut compressed = None;
        let mut data_page_offset = None;
        let mut meta = ColumnMetaData::default();

        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => type_ = Some(reader.read_i32()?),
                (2, FieldType::List) => encodings = Some(read_list(reader, |r| r.read_i32())?),
                (3, FieldType::List) => path = Some(read_list(reader, |r| r.read_string())?),
                (4, FieldType::I32) => codec = Some(reader.read_i32()?),
                (5, FieldType::I64) => num_values = Some(reader.read_i64()?),
                (6, FieldType::I64) => uncompressed = Some(reader.read_i64()?),
                (7, FieldType::I64) => compressed = Some(reader.read_i64()?),
                (8, FieldType::List) => {
                    meta.key_value_metadata = Some(read_list(reader, KeyValue::read_from)?)
                }
                (9, FieldType::I64) => data_page_offset = Some(reader.read_i64()?),
                (10, FieldType::I64) => meta.index_page_offset = Some(reader.read_i64()?),
                (11, FieldType::I64) => meta.dictionary_page_offset = Some(reader.read_i64()?),
                (12, FieldType::Struct) => meta.statistics = Some(Statistics::read_from(reader)?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;

        meta.type_ = required(type_, "ColumnMetaData", "type")?;
        meta.encodings = required(encodings, "ColumnMetaData", "encodings")?;
        meta.path_in_schema = required(path, "ColumnMetaData", "path_in_schema")?;
        meta.codec = required(codec, "ColumnMetaData", "codec")?;
        meta.num_values = required(num_values, "ColumnMetaData", "num_values")?;
        meta.total_uncompressed_size =
            required(uncompressed, "ColumnMetaData", "total_uncompressed_size")?;
        meta.total_compressed_size =
            required(compressed, "ColumnMetaData", "total_compressed_size")?;
        meta.data_page_offset = required(data_page_offset, "ColumnMetaData", "data_page_offset")?;
        Ok(meta)
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_i32_field(1, self.type_);
        writer.write_field_begin(FieldType::List, 2);
        writer.write_list_begin(FieldType::I32, self.encodings.len());
        for encoding in &self.encodings {
            writer.write_i32(*encoding);
        }
        writer.write_field_begin(FieldType::List, 3);
        writer.write_list_begin(FieldType::Binary, self.path_in_schema.len());
        for part in &self.path_in_schema {
            writer.write_binary(part.as_bytes());
        }
        writer.write_i32_field(4, self.codec);
        writer.write_i64_field(5, self.num_values);
        writer.write_i64_field(6, self.total_uncompressed_size);
        writer.write_i64_field(7, self.total_compressed_size);
        if let Some(kv) = &self.key_value_metadata {
            write_struct_list(writer, 8, kv);
        }
        writer.write_i64_field(9, self.data_page_offset);
        if let Some(offset) = self.index_page_offset {
            writer.write_i64_field(10, offset);
        }
        if let Some(offset) = self.dictionary_page_offset {
            writer.write_i64_field(11, offset);
        }
        if let Some(stats) = &self.statistics {
            writer.write_field_begin(FieldType::Struct, 12);
            stats.write_to(writer);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Deprecated signed-order max, still written by old producers
    pub max: Option<Vec<u8>>,
    pub min: Option<Vec<u8>>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub max_value: Option<Vec<u8>>,
    pub min_value: Option<Vec<u8>>,
}

impl ThriftStruct for Statistics {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut stats = Statistics::default();
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::Binary) => stats.max = Some(reader.read_binary()?.to_vec()),
                (2, FieldType::Binary) => stats.min = Some(reader.read_binary()?.to_vec()),
                (3, FieldType::I64) => stats.null_count = Some(reader.read_i64()?),
                (4, FieldType::I64) => stats.distinct_count = Some(reader.read_i64()?),
                (5, FieldType::Binary) => stats.max_value = Some(reader.read_binary()?.to_vec()),
                (6, FieldType::Binary) => stats.min_value = Some(reader.read_binary()?.to_vec()),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        Ok(stats)
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        if let Some(max) = &self.max {
            writer.write_binary_field(1, max);
        }
        if let Some(min) = &self.min {
            writer.write_binary_field(2, min);
        }
        if let Some(null_count) = self.null_count {
            writer.write_i64_field(3, null_count);
        }
        if let Some(distinct) = self.distinct_count {
            writer.write_i64_field(4, distinct);
        }
        if let Some(max) = &self.max_value {
            writer.write_binary_field(5, max);
        }
        if let Some(min) = &self.min_value {
            writer.write_binary_field(6, min);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageHeader {
    pub type_: i32,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub crc: Option<i32>,
    pub data_page_header: Option<DataPageHeader>,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
    pub data_page_header_v2: Option<DataPageHeaderV2>,
}

impl ThriftStruct for PageHeader {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut type_ = None;
        let mut uncompressed = None;
        let mut compressed = None;
        let mut header = PageHeader::default();
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => type_ = Some(reader.read_i32()?),
                (2, FieldType::I32) => uncompressed = Some(reader.read_i32()?),
                (3, FieldType::I32) => compressed = Some(reader.read_i32()?),
                (4, FieldType::I32) => header.crc = Some(reader.read_i32()?),
                (5, FieldType::Struct) => {
                    header.data_page_header = Some(DataPageHeader::read_from(reader)?)
                }
                (7, FieldType::Struct) => {
                    header.dictionary_page_header = Some(DictionaryPageHeader::read_from(reader)?)
                }
                (8, FieldType::Struct) => {
                    header.data_page_header_v2 = Some(DataPageHeaderV2::read_from(reader)?)
                }
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        header.type_ = required(type_, "PageHeader", "type")?;
        header.uncompressed_page_size =
            required(uncompressed, "PageHeader", "uncompressed_page_size")?;
        header.compressed_page_size = required(compressed, "PageHeader", "compressed_page_size")?;
        Ok(header)
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_i32_field(1, self.type_);
        writer.write_i32_field(2, self.uncompressed_page_size);
        writer.write_i32_field(3, self.compressed_page_size);
        if let Some(crc) = self.crc {
            writer.write_i32_field(4, crc);
        }
        if let Some(data) = &self.data_page_header {
            writer.write_field_begin(FieldType::Struct, 5);
            data.write_to(writer);
        }
        if let Some(dict) = &self.dictionary_page_header {
            writer.write_field_begin(FieldType::Struct, 7);
            dict.write_to(writer);
        }
        if let Some(data) = &self.data_page_header_v2 {
            writer.write_field_begin(FieldType::Struct, 8);
            data.write_to(writer);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub definition_level_encoding: i32,
    pub repetition_level_encoding: i32,
    pub statistics: Option<Statistics>,
}

impl ThriftStruct for DataPageHeader {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut num_values = None;
        let mut encoding = None;
        let mut def_encoding = None;
        let mut rep_encoding = None;
        let mut statistics = None;
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => num_values = Some(reader.read_i32()?),
                (2, FieldType::I32) => encoding = Some(reader.read_i32()?),
                (3, FieldType::I32) => def_encoding = Some(reader.read_i32()?),
                (4, FieldType::I32) => rep_encoding = Some(reader.read_i32()?),
                (5, FieldType::Struct) => statistics = Some(Statistics::read_from(reader)?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        Ok(Self {
            num_values: required(num_values, "DataPageHeader", "num_values")?,
            encoding: required(encoding, "DataPageHeader", "encoding")?,
            definition_level_encoding: required(
                def_encoding,
                "DataPageHeader",
                "definition_level_encoding",
            )?,
            repetition_level_encoding: required(
                rep_encoding,
                "DataPageHeader",
                "repetition_level_encoding",
            )?,
            statistics,
        })
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_i32_field(1, self.num_values);
        writer.write_i32_field(2, self.encoding);
        writer.write_i32_field(3, self.definition_level_encoding);
        writer.write_i32_field(4, self.repetition_level_encoding);
        if let Some(stats) = &self.statistics {
            writer.write_field_begin(FieldType::Struct, 5);
            stats.write_to(writer);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub is_sorted: Option<bool>,
}

impl ThriftStruct for DictionaryPageHeader {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut num_values = None;
        let mut encoding = None;
        let mut is_sorted = None;
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => num_values = Some(reader.read_i32()?),
                (2, FieldType::I32) => encoding = Some(reader.read_i32()?),
                (3, FieldType::BoolTrue | FieldType::BoolFalse) => {
                    is_sorted = Some(reader.read_bool()?)
                }
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        Ok(Self {
            num_values: required(num_values, "DictionaryPageHeader", "num_values")?,
            encoding: required(encoding, "DictionaryPageHeader", "encoding")?,
            is_sorted,
        })
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_i32_field(1, self.num_values);
        writer.write_i32_field(2, self.encoding);
        if let Some(sorted) = self.is_sorted {
            writer.write_bool_field(3, sorted);
        }
        writer.write_struct_end();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: i32,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    /// Defaults to true when absent
    pub is_compressed: Option<bool>,
    pub statistics: Option<Statistics>,
}

impl ThriftStruct for DataPageHeaderV2 {
    fn read_from(reader: &mut CompactReader<'_>) -> Result<Self> {
        let mut num_values = None;
        let mut num_nulls = None;
        let mut num_rows = None;
        let mut encoding = None;
        let mut def_len = None;
        let mut rep_len = None;
        let mut is_compressed = None;
        let mut statistics = None;
        reader.read_struct_begin()?;
        while let Some((field_type, id)) = reader.read_field_begin()? {
            match (id, field_type) {
                (1, FieldType::I32) => num_values = Some(reader.read_i32()?),
                (2, FieldType::I32) => num_nulls = Some(reader.read_i32()?),
                (3, FieldType::I32) => num_rows = Some(reader.read_i32()?),
                (4, FieldType::I32) => encoding = Some(reader.read_i32()?),
                (5, FieldType::I32) => def_len = Some(reader.read_i32()?),
                (6, FieldType::I32) => rep_len = Some(reader.read_i32()?),
                (7, FieldType::BoolTrue | FieldType::BoolFalse) => {
                    is_compressed = Some(reader.read_bool()?)
                }
                (8, FieldType::Struct) => statistics = Some(Statistics::read_from(reader)?),
                _ => reader.skip(field_type)?,
            }
        }
        reader.read_struct_end()?;
        Ok(Self {
            num_values: required(num_values, "DataPageHeaderV2", "num_values")?,
            num_nulls: required(num_nulls, "DataPageHeaderV2", "num_nulls")?,
            num_rows: required(num_rows, "DataPageHeaderV2", "num_rows")?,
            encoding: required(encoding, "DataPageHeaderV2", "encoding")?,
            definition_levels_byte_length: required(
                def_len,
                "DataPageHeaderV2",
                "definition_levels_byte_length",
            )?,
            repetition_levels_byte_length: required(
                rep_len,
                "DataPageHeaderV2",
                "repetition_levels_byte_length",
            )?,
            is_compressed,
            statistics,
        })
    }

    fn write_to(&self, writer: &mut CompactWriter) {
        writer.write_struct_begin();
        writer.write_i32_field(1, self.num_values);
        writer.write_i32_field(2, self.num_nulls);
        writer.write_i32_field(3, self.num_rows);
        writer.write_i32_field(4, self.encoding);
        writer.write_i32_field(5, self.definition_levels_byte_length);
        writer.write_i32_field(6, self.repetition_levels_byte_length);
        if let Some(compressed) = self.is_compressed {
            writer.write_bool_field(7, compressed);
        }
        if let Some(stats) = &self.statistics {
            writer.write_field_begin(FieldType::Struct, 8);
            stats.write_to(writer);
        }
        writer.write_struct_end();
    }
}
