use std::sync::Arc;

use crate::{ParquetError, Result};

/// Logical schema of a Parquet file
///
/// The root is always a [`SchemaNode::Struct`] whose fields are the
/// top-level columns of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub root: SchemaNode,
}

/// Represents a node in the logical schema tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A struct with named fields
    Struct {
        name: String,
        nullable: bool,
        fields: Vec<SchemaNode>,
    },
    /// A list containing items of a single type
    List {
        name: String,
        nullable: bool,
        item: Box<SchemaNode>,
    },
    /// A map with key-value pairs
    Map {
        name: String,
        nullable: bool,
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
    /// A primitive/leaf type
    Primitive {
        name: String,
        primitive_type: PrimitiveType,
        nullable: bool,
    },
}

/// Leaf types, after applying logical and converted type annotations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    // Integer types
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,

    // Floating point types
    Float16,
    Float32,
    Float64,

    // Decimal types (precision, scale)
    Decimal128(u8, i8),
    Decimal256(u8, i8),

    // Other basic types
    Boolean,
    String,
    Binary,
    Uuid,

    // Date/Time types. Timestamps carry `Some("UTC")` when adjusted to UTC.
    Date32,
    TimestampMillis(Option<Arc<str>>),
    TimestampMicros(Option<Arc<str>>),
    TimestampNanos(Option<Arc<str>>),
    TimeMillis,
    TimeMicros,
    TimeNanos,

    // Fixed-length byte array
    FixedLenByteArray(i32),
}

/// Represents how values are repeated in Parquet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Repetition {
    /// Field must have exactly one value
    Required,
    /// Field can have 0 or 1 value
    Optional,
    /// Field can have 0 or more values
    Repeated,
}

impl SchemaNode {
    /// Get the name of this schema node
    pub fn name(&self) -> &str {
        match self {
            SchemaNode::Struct { name, .. } => name,
            SchemaNode::List { name, .. } => name,
            SchemaNode::Map { name, .. } => name,
            SchemaNode::Primitive { name, .. } => name,
        }
    }

    /// Check if this node is nullable
    pub fn is_nullable(&self) -> bool {
        match self {
            SchemaNode::Struct { nullable, .. } => *nullable,
            SchemaNode::List { nullable, .. } => *nullable,
            SchemaNode::Map { nullable, .. } => *nullable,
            SchemaNode::Primitive { nullable, .. } => *nullable,
        }
    }

    /// Get the repetition level based on nullability
    pub fn repetition(&self) -> Repetition {
        if self.is_nullable() {
            Repetition::Optional
        } else {
            Repetition::Required
        }
    }

    /// Logical type name shown by `info()`
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::Struct { .. } => "Struct",
            SchemaNode::List { .. } => "List",
            SchemaNode::Map { .. } => "Map",
            SchemaNode::Primitive { primitive_type, .. } => primitive_type.type_name(),
        }
    }
}

impl PrimitiveType {
    /// Get the logical type name for display
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Int8 => "Int8",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt8 => "UInt8",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Float16 => "Float16",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::Decimal128(_, _) => "Decimal128",
            PrimitiveType::Decimal256(_, _) => "Decimal256",
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::String => "String",
            PrimitiveType::Binary => "Binary",
            PrimitiveType::Uuid => "Uuid",
            PrimitiveType::Date32 => "Date32",
            PrimitiveType::TimestampMillis(_) => "TimestampMillis",
            PrimitiveType::TimestampMicros(_) => "TimestampMicros",
            PrimitiveType::TimestampNanos(_) => "TimestampNanos",
            PrimitiveType::TimeMillis => "TimeMillis",
            PrimitiveType::TimeMicros => "TimeMicros",
            PrimitiveType::TimeNanos => "TimeNanos",
            PrimitiveType::FixedLenByteArray(_) => "FixedLenByteArray",
        }
    }

    /// Decimal types whose unscaled value fits an `i128`
    pub fn decimal(precision: u8, scale: i8) -> Self {
        if precision <= 38 {
            PrimitiveType::Decimal128(precision, scale)
        } else {
            PrimitiveType::Decimal256(precision, scale)
        }
    }
}

/// Builder for creating schemas
pub struct SchemaBuilder {
    root: Option<SchemaNode>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(mut self, root: SchemaNode) -> Self {
        self.root = Some(root);
        self
    }

    pub fn build(self) -> Result<Schema> {
        match self.root {
            Some(root @ SchemaNode::Struct { .. }) => Ok(Schema { root }),
            Some(other) => Err(ParquetError::schema(format!(
                "Schema root must be a struct, got {} '{}'",
                other.type_name(),
                other.name()
            ))),
            None => Err(ParquetError::schema("Schema must have a root node")),
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Top-level fields of a record
    pub fn fields(&self) -> &[SchemaNode] {
        match &self.root {
            SchemaNode::Struct { fields, .. } => fields,
            _ => &[],
        }
    }
}
