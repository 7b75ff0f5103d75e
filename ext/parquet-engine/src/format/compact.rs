//! Thrift compact protocol
//!
//! Only the subset Parquet metadata needs: structs, lists, maps, binary,
//! bools, doubles and zigzag varint integers. Unknown fields are skipped so
//! files written against newer `parquet.thrift` revisions still decode.

use crate::{ParquetError, Result};

/// Maximum struct/collection nesting tolerated while decoding
const MAX_DEPTH: usize = 64;

/// Wire type tags of the compact protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    BoolTrue,
    BoolFalse,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Binary,
    List,
    Set,
    Map,
    Struct,
}

impl FieldType {
    fn from_nibble(nibble: u8) -> Result<Self> {
        Ok(match nibble {
            1 => FieldType::BoolTrue,
            2 => FieldType::BoolFalse,
            3 => FieldType::Byte,
            4 => FieldType::I16,
            5 => FieldType::I32,
            6 => FieldType::I64,
            7 => FieldType::Double,
            8 => FieldType::Binary,
            9 => FieldType::List,
            10 => FieldType::Set,
            11 => FieldType::Map,
            12 => FieldType::Struct,
            other => {
                return Err(ParquetError::format(format!(
                    "thrift: invalid compact type {}",
                    other
                )))
            }
        })
    }

    fn nibble(self) -> u8 {
        match self {
            FieldType::BoolTrue => 1,
            FieldType::BoolFalse => 2,
            FieldType::Byte => 3,
            FieldType::I16 => 4,
            FieldType::I32 => 5,
            FieldType::I64 => 6,
            FieldType::Double => 7,
            FieldType::Binary => 8,
            FieldType::List => 9,
            FieldType::Set => 10,
            FieldType::Map => 11,
            FieldType::Struct => 12,
        }
    }

    fn is_bool(self) -> bool {
        matches!(self, FieldType::BoolTrue | FieldType::BoolFalse)
    }
}

/// Decoder over an in-memory thrift compact buffer
pub struct CompactReader<'a> {
    buf: &'a [u8],
    pos: usize,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
    pending_bool: Option<bool>,
}

impl<'a> CompactReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_field_id: 0,
            field_id_stack: Vec::new(),
            pending_bool: None,
        }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| ParquetError::format("thrift: unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                ParquetError::format(format!(
                    "thrift: {} byte field runs past end of input",
                    len
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            if shift >= 64 {
                return Err(ParquetError::format("thrift: varint overflow"));
            }
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    fn read_zigzag(&mut self) -> Result<i64> {
        let raw = self.read_varint()?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }

    pub fn read_struct_begin(&mut self) -> Result<()> {
        if self.field_id_stack.len() >= MAX_DEPTH {
            return Err(ParquetError::format("thrift: structs nested too deeply"));
        }
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
        Ok(())
    }

    pub fn read_struct_end(&mut self) -> Result<()> {
        self.last_field_id = self
            .field_id_stack
            .pop()
            .ok_or_else(|| ParquetError::format("thrift: unbalanced struct end"))?;
        Ok(())
    }

    /// Reads the next field header, `None` at the struct's stop marker
    pub fn read_field_begin(&mut self) -> Result<Option<(FieldType, i16)>> {
        let header = self.read_byte()?;
        if header == 0 {
            return Ok(None);
        }
        let field_type = FieldType::from_nibble(header & 0x0f)?;
        let delta = (header >> 4) as i16;
        let id = if delta == 0 {
            let id = self.read_zigzag()?;
            i16::try_from(id)
                .map_err(|_| ParquetError::format(format!("thrift: field id {} out of range", id)))?
        } else {
            self.last_field_id
                .checked_add(delta)
                .ok_or_else(|| ParquetError::format("thrift: field id overflow"))?
        };
        self.last_field_id = id;
        if field_type.is_bool() {
            self.pending_bool = Some(field_type == FieldType::BoolTrue);
        }
        Ok(Some((field_type, id)))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        if let Some(value) = self.pending_bool.take() {
            return Ok(value);
        }
        // Collection elements carry the value in a full byte
        match self.read_byte()? {
            1 => Ok(true),
            0 | 2 => Ok(false),
            other => Err(ParquetError::format(format!(
                "thrift: invalid bool byte {}",
                other
            ))),
        }
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let value = self.read_zigzag()?;
        i16::try_from(value)
            .map_err(|_| ParquetError::format(format!("thrift: {} does not fit i16", value)))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let value = self.read_zigzag()?;
        i32::try_from(value)
            .map_err(|_| ParquetError::format(format!("thrift: {} does not fit i32", value)))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_zigzag()
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let bytes = self.read_slice(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }

    pub fn read_binary(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| ParquetError::format("thrift: binary length overflow"))?;
        self.read_slice(len)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_binary()?;
        Ok(std::str::from_utf8(bytes)?.to_string())
    }

    /// Reads a list or set header, returning element type and size
    pub fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let header = self.read_byte()?;
        let element_type = FieldType::from_nibble(header & 0x0f)?;
        let short_size = (header >> 4) as usize;
        let size = if short_size == 15 {
            let size = self.read_varint()?;
            usize::try_from(size)
                .map_err(|_| ParquetError::format("thrift: list size overflow"))?
        } else {
            short_size
        };
        // Every element takes at least one byte, except bools carried in
        // a type nibble which never occur in collections.
        if size > self.buf.len() - self.pos {
            return Err(ParquetError::format(format!(
                "thrift: list of {} elements exceeds remaining input",
                size
            )));
        }
        Ok((element_type, size))
    }

    /// Reads a map header, returning key type, value type and size
    pub fn read_map_begin(&mut self) -> Result<(Option<(FieldType, FieldType)>, usize)> {
        let size = self.read_varint()?;
        let size =
            usize::try_from(size).map_err(|_| ParquetError::format("thrift: map size overflow"))?;
        if size == 0 {
            return Ok((None, 0));
        }
        let types = self.read_byte()?;
        let key = FieldType::from_nibble(types >> 4)?;
        let value = FieldType::from_nibble(types & 0x0f)?;
        Ok((Some((key, value)), size))
    }

    /// Skips a value of the given type, including nested containers
    pub fn skip(&mut self, field_type: FieldType) -> Result<()> {
        self.skip_depth(field_type, 0)
    }

    fn skip_depth(&mut self, field_type: FieldType, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(ParquetError::format("thrift: values nested too deeply"));
        }
        match field_type {
            FieldType::BoolTrue | FieldType::BoolFalse => {
                self.read_bool()?;
            }
            FieldType::Byte => {
                self.read_byte()?;
            }
            FieldType::I16 | FieldType::I32 | FieldType::I64 => {
                self.read_varint()?;
            }
            FieldType::Double => {
                self.read_slice(8)?;
            }
            FieldType::Binary => {
                self.read_binary()?;
            }
            FieldType::List | FieldType::Set => {
                let (element_type, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip_depth(element_type, depth + 1)?;
                }
            }
            FieldType::Map => {
                let (types, size) = self.read_map_begin()?;
                if let Some((key, value)) = types {
                    for _ in 0..size {
                        self.skip_depth(key, depth + 1)?;
                        self.skip_depth(value, depth + 1)?;
                    }
                }
            }
            FieldType::Struct => {
                self.read_struct_begin()?;
                while let Some((nested, _)) = self.read_field_begin()? {
                    self.skip_depth(nested, depth + 1)?;
                }
                self.read_struct_end()?;
            }
        }
        Ok(())
    }
}

/// Encoder producing thrift compact bytes
#[derive(Default)]
pub struct CompactWriter {
    buf: Vec<u8>,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
}

impl CompactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    fn write_zigzag(&mut self, value: i64) {
        self.write_varint(((value << 1) ^ (value >> 63)) as u64);
    }

    pub fn write_struct_begin(&mut self) {
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn write_struct_end(&mut self) {
        self.buf.push(0);
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    }

    pub fn write_field_begin(&mut self, field_type: FieldType, id: i16) {
        let delta = id - self.last_field_id;
        if delta > 0 && delta <= 15 {
            self.buf.push(((delta as u8) << 4) | field_type.nibble());
        } else {
            self.buf.push(field_type.nibble());
            self.write_zigzag(id as i64);
        }
        self.last_field_id = id;
    }

    pub fn write_bool_field(&mut self, id: i16, value: bool) {
        let field_type = if value {
            FieldType::BoolTrue
        } else {
            FieldType::BoolFalse
        };
        self.write_field_begin(field_type, id);
    }

    pub fn write_i8_field(&mut self, id: i16, value: i8) {
        self.write_field_begin(FieldType::Byte, id);
        self.buf.push(value as u8);
    }

    pub fn write_i16_field(&mut self, id: i16, value: i16) {
        self.write_field_begin(FieldType::I16, id);
        self.write_zigzag(value as i64);
    }

    pub fn write_i32_field(&mut self, id: i16, value: i32) {
        self.write_field_begin(FieldType::I32, id);
        self.write_i32(value);
    }

    pub fn write_i64_field(&mut self, id: i16, value: i64) {
        self.write_field_begin(FieldType::I64, id);
        self.write_zigzag(value);
    }

    pub fn write_binary_field(&mut self, id: i16, value: &[u8]) {
        self.write_field_begin(FieldType::Binary, id);
        self.write_binary(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_zigzag(value as i64);
    }

    pub fn write_binary(&mut self, value: &[u8]) {
        self.write_varint(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    pub fn write_list_begin(&mut self, element_type: FieldType, size: usize) {
        if size < 15 {
            self.buf.push(((size as u8) << 4) | element_type.nibble());
        } else {
            self.buf.push(0xf0 | element_type.nibble());
            self.write_varint(size as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_header_short_and_long_form() {
        let mut writer = CompactWriter::new();
        writer.write_struct_begin();
        writer.write_i32_field(1, -3);
        writer.write_i64_field(20, 1 << 40);
        writer.write_bool_field(21, true);
        writer.write_struct_end();
        let bytes = writer.into_inner();

        let mut reader = CompactReader::new(&bytes);
        reader.read_struct_begin().unwrap();
        assert_eq!(reader.read_field_begin().unwrap(), Some((FieldType::I32, 1)));
        assert_eq!(reader.read_i32().unwrap(), -3);
        assert_eq!(reader.read_field_begin().unwrap(), Some((FieldType::I64, 20)));
        assert_eq!(reader.read_i64().unwrap(), 1 << 40);
        assert_eq!(
            reader.read_field_begin().unwrap(),
            Some((FieldType::BoolTrue, 21))
        );
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_field_begin().unwrap(), None);
        reader.read_struct_end().unwrap();
        assert_eq!(reader.position(), bytes.len());
    }

    #[test]
    fn test_zigzag_wire_bytes() {
        // field 1, i32 = 1 -> header 0x15, zigzag(1) = 2
        let mut writer = CompactWriter::new();
        writer.write_struct_begin();
        writer.write_i32_field(1, 1);
        writer.write_struct_end();
        assert_eq!(writer.into_inner(), vec![0x15, 0x02, 0x00]);
    }

    #[test]
    fn test_skip_nested_struct_and_list() {
        let mut writer = CompactWriter::new();
        writer.write_struct_begin();
        writer.write_field_begin(FieldType::Struct, 3);
        writer.write_struct_begin();
        writer.write_binary_field(1, b"skip me");
        writer.write_field_begin(FieldType::List, 2);
        writer.write_list_begin(FieldType::I32, 20);
        for i in 0..20 {
            writer.write_i32(i);
        }
        writer.write_struct_end();
        writer.write_i32_field(4, 99);
        writer.write_struct_end();
        let bytes = writer.into_inner();

        let mut reader = CompactReader::new(&bytes);
        reader.read_struct_begin().unwrap();
        let (field_type, id) = reader.read_field_begin().unwrap().unwrap();
        assert_eq!(id, 3);
        reader.skip(field_type).unwrap();
        assert_eq!(reader.read_field_begin().unwrap(), Some((FieldType::I32, 4)));
        assert_eq!(reader.read_i32().unwrap(), 99);
    }

    #[test]
    fn test_truncated_input_is_format_error() {
        let bytes = [0x18, 0x10, b'a'];
        let mut reader = CompactReader::new(&bytes);
        reader.read_struct_begin().unwrap();
        reader.read_field_begin().unwrap();
        let err = reader.read_binary().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }
}
