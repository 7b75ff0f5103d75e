use bytes::Bytes;
use indexmap::IndexMap;
use num::BigInt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParquetValue {
    // Numeric types
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float16(ordered_float::OrderedFloat<f32>), // f16 widened to f32
    Float32(ordered_float::OrderedFloat<f32>),
    Float64(ordered_float::OrderedFloat<f64>),

    // Basic types
    Boolean(bool),
    String(Arc<str>),
    Bytes(Bytes),
    Uuid(uuid::Uuid),

    // Date/Time types
    Date32(i32), // Days since epoch

    // Decimal types
    Decimal128(i128, i8),   // unscaled value, scale
    Decimal256(BigInt, i8), // precision above 38 digits

    // Timestamp types, since the epoch, with `Some("UTC")` when UTC-adjusted
    TimestampMillis(i64, Option<Arc<str>>),
    TimestampMicros(i64, Option<Arc<str>>),
    TimestampNanos(i64, Option<Arc<str>>),

    // Time types
    TimeMillis(i32), // Time of day in milliseconds since midnight
    TimeMicros(i64), // Time of day in microseconds since midnight
    TimeNanos(i64),

    // Complex types
    List(Vec<ParquetValue>),
    Map(Vec<(ParquetValue, ParquetValue)>), // Using Vec of tuples for deterministic ordering
    Record(IndexMap<Arc<str>, ParquetValue>), // For struct/record types, preserves field order

    // Null value
    Null,
}

impl std::hash::Hash for ParquetValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ParquetValue::Int8(i) => i.hash(state),
            ParquetValue::Int16(i) => i.hash(state),
            ParquetValue::Int32(i) => i.hash(state),
            ParquetValue::Int64(i) => i.hash(state),
            ParquetValue::UInt8(i) => i.hash(state),
            ParquetValue::UInt16(i) => i.hash(state),
            ParquetValue::UInt32(i) => i.hash(state),
            ParquetValue::UInt64(i) => i.hash(state),
            ParquetValue::Float16(f) => f.hash(state),
            ParquetValue::Float32(f) => f.hash(state),
            ParquetValue::Float64(f) => f.hash(state),
            ParquetValue::Boolean(b) => b.hash(state),
            ParquetValue::String(s) => s.hash(state),
            ParquetValue::Bytes(b) => b.hash(state),
            ParquetValue::Uuid(u) => u.hash(state),
            ParquetValue::Date32(d) => d.hash(state),
            ParquetValue::Decimal128(d, scale) => {
                d.hash(state);
                scale.hash(state);
            }
            ParquetValue::Decimal256(d, scale) => {
                d.hash(state);
                scale.hash(state);
            }
            ParquetValue::TimestampMillis(ts, tz)
            | ParquetValue::TimestampMicros(ts, tz)
            | ParquetValue::TimestampNanos(ts, tz) => {
                ts.hash(state);
                tz.hash(state);
            }
            ParquetValue::TimeMillis(t) => t.hash(state),
            ParquetValue::TimeMicros(t) | ParquetValue::TimeNanos(t) => t.hash(state),
            ParquetValue::List(l) => l.hash(state),
            ParquetValue::Map(m) => m.hash(state),
            ParquetValue::Record(r) => {
                // IndexMap preserves insertion order, so hash is deterministic
                for (k, v) in r {
                    k.hash(state);
                    v.hash(state);
                }
            }
            ParquetValue::Null => 0_i32.hash(state),
        }
    }
}

impl ParquetValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ParquetValue::Null)
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            ParquetValue::Int8(_) => "Int8",
            ParquetValue::Int16(_) => "Int16",
            ParquetValue::Int32(_) => "Int32",
            ParquetValue::Int64(_) => "Int64",
            ParquetValue::UInt8(_) => "UInt8",
            ParquetValue::UInt16(_) => "UInt16",
            ParquetValue::UInt32(_) => "UInt32",
            ParquetValue::UInt64(_) => "UInt64",
            ParquetValue::Float16(_) => "Float16",
            ParquetValue::Float32(_) => "Float32",
            ParquetValue::Float64(_) => "Float64",
            ParquetValue::Boolean(_) => "Boolean",
            ParquetValue::String(_) => "String",
            ParquetValue::Bytes(_) => "Bytes",
            ParquetValue::Uuid(_) => "Uuid",
            ParquetValue::Date32(_) => "Date32",
            ParquetValue::Decimal128(_, _) => "Decimal128",
            ParquetValue::Decimal256(_, _) => "Decimal256",
            ParquetValue::TimestampMillis(_, _) => "TimestampMillis",
            ParquetValue::TimestampMicros(_, _) => "TimestampMicros",
            ParquetValue::TimestampNanos(_, _) => "TimestampNanos",
            ParquetValue::TimeMillis(_) => "TimeMillis",
            ParquetValue::TimeMicros(_) => "TimeMicros",
            ParquetValue::TimeNanos(_) => "TimeNanos",
            ParquetValue::List(_) => "List",
            ParquetValue::Map(_) => "Map",
            ParquetValue::Record(_) => "Record",
            ParquetValue::Null => "Null",
        }
    }
}

/// Formats an unscaled decimal as a plain digit string, e.g. `12345, 2` -> `123.45`
fn decimal_string(unscaled: String, scale: i8) -> String {
    let (sign, digits) = match unscaled.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", unscaled.as_str()),
    };
    if scale <= 0 {
        let zeros = "0".repeat(scale.unsigned_abs() as usize);
        return format!("{}{}{}", sign, digits, zeros);
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

impl Serialize for ParquetValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ParquetValue::Int8(v) => serializer.serialize_i8(*v),
            ParquetValue::Int16(v) => serializer.serialize_i16(*v),
            ParquetValue::Int32(v) => serializer.serialize_i32(*v),
            ParquetValue::Int64(v) => serializer.serialize_i64(*v),
            ParquetValue::UInt8(v) => serializer.serialize_u8(*v),
            ParquetValue::UInt16(v) => serializer.serialize_u16(*v),
            ParquetValue::UInt32(v) => serializer.serialize_u32(*v),
            ParquetValue::UInt64(v) => serializer.serialize_u64(*v),
            ParquetValue::Float16(v) | ParquetValue::Float32(v) => serializer.serialize_f32(v.0),
            ParquetValue::Float64(v) => serializer.serialize_f64(v.0),
            ParquetValue::Boolean(v) => serializer.serialize_bool(*v),
            ParquetValue::String(v) => serializer.serialize_str(v),
            ParquetValue::Bytes(v) => serializer.serialize_bytes(v),
            ParquetValue::Uuid(v) => serializer.collect_str(&v.hyphenated()),
            ParquetValue::Date32(v) => serializer.serialize_i32(*v),
            ParquetValue::Decimal128(v, scale) => {
                serializer.serialize_str(&decimal_string(v.to_string(), *scale))
            }
            ParquetValue::Decimal256(v, scale) => {
                serializer.serialize_str(&decimal_string(v.to_string(), *scale))
            }
            ParquetValue::TimestampMillis(v, _)
            | ParquetValue::TimestampMicros(v, _)
            | ParquetValue::TimestampNanos(v, _)
            | ParquetValue::TimeMicros(v)
            | ParquetValue::TimeNanos(v) => serializer.serialize_i64(*v),
            ParquetValue::TimeMillis(v) => serializer.serialize_i32(*v),
            ParquetValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ParquetValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ParquetValue::Record(fields) => fields.serialize(serializer),
            ParquetValue::Null => serializer.serialize_none(),
        }
    }
}

/// One record: top-level field name to value, in schema order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
    fields: IndexMap<Arc<str>, ParquetValue>,
}

impl Row {
    pub fn new(fields: IndexMap<Arc<str>, ParquetValue>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&ParquetValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &ParquetValue)> {
        self.fields.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &ParquetValue> {
        self.fields.values()
    }

    pub fn into_inner(self) -> IndexMap<Arc<str>, ParquetValue> {
        self.fields
    }

    /// Field values in schema order, as the writer takes them
    pub fn into_values(self) -> Vec<ParquetValue> {
        self.fields.into_values().collect()
    }
}

impl From<IndexMap<Arc<str>, ParquetValue>> for Row {
    fn from(fields: IndexMap<Arc<str>, ParquetValue>) -> Self {
        Self::new(fields)
    }
}

impl From<Row> for ParquetValue {
    fn from(row: Row) -> Self {
        ParquetValue::Record(row.fields)
    }
}
