//! Physical schema tree and leaf column descriptors
//!
//! The footer stores the schema as a depth-first list of [`SchemaElement`]s.
//! [`SchemaDescriptor`] rebuilds the tree, computes the maximum definition
//! and repetition level of every leaf, and derives the logical [`Schema`]
//! by applying the LIST and MAP annotations together with the
//! backward-compatibility rules for files written by older producers.

use std::sync::Arc;

use crate::basic::{ConvertedType, LogicalType, PhysicalType, TimeUnit};
use crate::format::SchemaElement;
use crate::schema::{PrimitiveType, Repetition, Schema, SchemaNode};
use crate::{ParquetError, Result};

const MAX_SCHEMA_DEPTH: usize = 64;

/// A node of the physical schema, as written in the footer
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub name: String,
    pub repetition: Repetition,
    pub converted_type: Option<ConvertedType>,
    pub logical_type: Option<LogicalType>,
    pub field_id: Option<i32>,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Group(Vec<TypeNode>),
    Primitive {
        physical_type: PhysicalType,
        type_length: i32,
        scale: i32,
        precision: i32,
    },
}

impl TypeNode {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, TypeKind::Group(_))
    }

    pub fn children(&self) -> &[TypeNode] {
        match &self.kind {
            TypeKind::Group(children) => children,
            TypeKind::Primitive { .. } => &[],
        }
    }

    /// Number of leaf columns at or below this node
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            TypeKind::Group(children) => children.iter().map(TypeNode::leaf_count).sum(),
            TypeKind::Primitive { .. } => 1,
        }
    }

    fn is_list_annotated(&self) -> bool {
        matches!(self.logical_type, Some(LogicalType::List))
            || matches!(self.converted_type, Some(ConvertedType::List))
    }

    fn is_map_annotated(&self) -> bool {
        matches!(self.logical_type, Some(LogicalType::Map))
            || matches!(
                self.converted_type,
                Some(ConvertedType::Map | ConvertedType::MapKeyValue)
            )
    }
}

/// How a node's content (ignoring its own repetition) reads as a value
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'a> {
    Leaf,
    Struct(&'a [TypeNode]),
    List {
        repeated: &'a TypeNode,
        element: ListElement<'a>,
    },
    Map {
        key_value: &'a TypeNode,
        key: &'a TypeNode,
        value: &'a TypeNode,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ListElement<'a> {
    /// Two-level and legacy lists: the repeated node is the element
    Repeated(&'a TypeNode),
    /// Three-level list: the single child of the repeated group
    Nested(&'a TypeNode),
}

/// Classifies a node. Annotated groups whose layout does not match the
/// annotation read as plain structs.
pub(crate) fn shape(node: &TypeNode) -> Shape<'_> {
    let children = match &node.kind {
        TypeKind::Primitive { .. } => return Shape::Leaf,
        TypeKind::Group(children) => children,
    };

    if node.is_list_annotated() {
        if let [repeated] = children.as_slice() {
            if repeated.repetition == Repetition::Repeated {
                let element = match repeated.children() {
                    [child]
                        if repeated.name != "array"
                            && repeated.name != format!("{}_tuple", node.name) =>
                    {
                        ListElement::Nested(child)
                    }
                    _ => ListElement::Repeated(repeated),
                };
                return Shape::List { repeated, element };
            }
        }
    }

    if node.is_map_annotated() {
        if let [key_value] = children.as_slice() {
            if key_value.repetition == Repetition::Repeated {
                if let [key, value] = key_value.children() {
                    return Shape::Map {
                        key_value,
                        key,
                        value,
                    };
                }
            }
        }
    }

    Shape::Struct(children)
}

/// A leaf column with its levels and resolved logical type
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub path: Vec<String>,
    pub physical_type: PhysicalType,
    pub type_length: usize,
    pub primitive_type: PrimitiveType,
    pub repetition: Repetition,
    pub max_def_level: i16,
    pub max_rep_level: i16,
}

impl ColumnDescriptor {
    /// Dotted path, e.g. `tags.list.element`
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}

/// Physical schema, its leaf columns and the derived logical schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    root: TypeNode,
    columns: Vec<ColumnDescriptor>,
    column_roots: Vec<usize>,
    schema: Schema,
}

impl SchemaDescriptor {
    /// Rebuilds the schema tree from the footer's flattened element list
    pub fn from_elements(elements: &[SchemaElement]) -> Result<Self> {
        if elements.is_empty() {
            return Err(ParquetError::format("schema has no elements"));
        }
        let mut index = 0;
        let root = build_node(elements, &mut index, 0)?;
        if index != elements.len() {
            return Err(ParquetError::format(format!(
                "schema tree covers {} of {} elements",
                index,
                elements.len()
            )));
        }
        if !root.is_group() {
            return Err(ParquetError::format("schema root is not a group"));
        }
        Self::new(root)
    }

    /// Maps a logical schema to the physical layout the writer produces
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let root = match &schema.root {
            SchemaNode::Struct { name, fields, .. } => TypeNode {
                name: name.clone(),
                repetition: Repetition::Required,
                converted_type: None,
                logical_type: None,
                field_id: None,
                kind: TypeKind::Group(
                    fields
                        .iter()
                        .map(physical_node)
                        .collect::<Result<Vec<_>>>()?,
                ),
            },
            _ => return Err(ParquetError::schema("Schema root must be a struct")),
        };
        Self::new(root)
    }

    fn new(root: TypeNode) -> Result<Self> {
        let mut columns = Vec::new();
        let mut column_roots = Vec::new();
        for (field_index, field) in root.children().iter().enumerate() {
            let mut path = Vec::new();
            collect_leaves(field, 0, 0, &mut path, &mut columns)?;
            column_roots.resize(columns.len(), field_index);
        }
        let schema = Schema {
            root: SchemaNode::Struct {
                name: root.name.clone(),
                nullable: false,
                fields: root.children().iter().map(logical_field).collect(),
            },
        };
        Ok(Self {
            root,
            columns,
            column_roots,
            schema,
        })
    }

    pub fn root(&self) -> &TypeNode {
        &self.root
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &ColumnDescriptor {
        &self.columns[index]
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Index of the top-level field a leaf column belongs to
    pub fn column_root(&self, column: usize) -> usize {
        self.column_roots[column]
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Flattens the tree back into footer schema elements
    pub fn to_elements(&self) -> Vec<SchemaElement> {
        let mut elements = Vec::new();
        flatten(&self.root, true, &mut elements);
        elements
    }
}

fn build_node(elements: &[SchemaElement], index: &mut usize, depth: usize) -> Result<TypeNode> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err(ParquetError::format("schema nesting too deep"));
    }
    let element = elements
        .get(*index)
        .ok_or_else(|| ParquetError::format("schema element list ended early"))?;
    *index += 1;

    let repetition = match element.repetition_type {
        Some(value) => Repetition::from_thrift(value)?,
        None if depth == 0 => Repetition::Required,
        None => {
            return Err(ParquetError::format(format!(
                "schema element '{}' has no repetition",
                element.name
            )))
        }
    };
    let converted_type = element.converted_type.and_then(ConvertedType::from_thrift);

    let kind = match (element.type_, element.num_children) {
        (Some(physical), None | Some(0)) => {
            let physical_type = PhysicalType::from_thrift(physical)?;
            let type_length = element.type_length.unwrap_or(0);
            if physical_type == PhysicalType::FixedLenByteArray && type_length <= 0 {
                return Err(ParquetError::format(format!(
                    "FIXED_LEN_BYTE_ARRAY column '{}' has invalid length {}",
                    element.name, type_length
                )));
            }
            TypeKind::Primitive {
                physical_type,
                type_length,
                scale: element.scale.unwrap_or(0),
                precision: element.precision.unwrap_or(0),
            }
        }
        (_, Some(count)) if count > 0 => {
            let children = (0..count)
                .map(|_| build_node(elements, index, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            TypeKind::Group(children)
        }
        (None, Some(0)) => TypeKind::Group(Vec::new()),
        _ => {
            return Err(ParquetError::format(format!(
                "schema element '{}' has neither a type nor children",
                element.name
            )))
        }
    };

    Ok(TypeNode {
        name: element.name.clone(),
        repetition,
        converted_type,
        logical_type: element.logical_type.clone(),
        field_id: element.field_id,
        kind,
    })
}

fn collect_leaves(
    node: &TypeNode,
    mut def: i16,
    mut rep: i16,
    path: &mut Vec<String>,
    out: &mut Vec<ColumnDescriptor>,
) -> Result<()> {
    match node.repetition {
        Repetition::Required => {}
        Repetition::Optional => def += 1,
        Repetition::Repeated => {
            def += 1;
            rep += 1;
        }
    }
    path.push(node.name.clone());
    match &node.kind {
        TypeKind::Group(children) => {
            for child in children {
                collect_leaves(child, def, rep, path, out)?;
            }
        }
        TypeKind::Primitive {
            physical_type,
            type_length,
            ..
        } => out.push(ColumnDescriptor {
            path: path.clone(),
            physical_type: *physical_type,
            type_length: (*type_length).max(0) as usize,
            primitive_type: resolve_primitive(node),
            repetition: node.repetition,
            max_def_level: def,
            max_rep_level: rep,
        }),
    }
    path.pop();
    Ok(())
}

fn utc(adjusted: bool) -> Option<Arc<str>> {
    adjusted.then(|| Arc::from("UTC"))
}

fn timestamp(unit: TimeUnit, adjusted_to_utc: bool) -> PrimitiveType {
    match unit {
        TimeUnit::Millis => PrimitiveType::TimestampMillis(utc(adjusted_to_utc)),
        TimeUnit::Micros => PrimitiveType::TimestampMicros(utc(adjusted_to_utc)),
        TimeUnit::Nanos => PrimitiveType::TimestampNanos(utc(adjusted_to_utc)),
    }
}

/// Resolves a leaf's logical type from its annotations, falling back to the
/// physical type when an annotation does not apply
pub fn resolve_primitive(node: &TypeNode) -> PrimitiveType {
    let TypeKind::Primitive {
        physical_type,
        type_length,
        scale,
        precision,
    } = node.kind
    else {
        return PrimitiveType::Binary;
    };
    let decimal = |precision: i32, scale: i32| {
        PrimitiveType::decimal(precision.clamp(0, u8::MAX as i32) as u8, scale as i8)
    };

    let from_logical = node.logical_type.as_ref().and_then(|logical| {
        use PhysicalType::*;
        Some(match (logical, physical_type) {
            (LogicalType::String | LogicalType::Enum | LogicalType::Json, ByteArray) => {
                PrimitiveType::String
            }
            (LogicalType::Bson, ByteArray) => PrimitiveType::Binary,
            (LogicalType::Decimal { scale, precision }, Int32 | Int64 | ByteArray | FixedLenByteArray) => {
                decimal(*precision, *scale)
            }
            (LogicalType::Date, Int32) => PrimitiveType::Date32,
            (LogicalType::Time { unit: TimeUnit::Millis, .. }, Int32) => PrimitiveType::TimeMillis,
            (LogicalType::Time { unit: TimeUnit::Micros, .. }, Int64) => PrimitiveType::TimeMicros,
            (LogicalType::Time { unit: TimeUnit::Nanos, .. }, Int64) => PrimitiveType::TimeNanos,
            (LogicalType::Timestamp { adjusted_to_utc, unit }, Int64) => timestamp(*unit, *adjusted_to_utc),
            (LogicalType::Integer { bit_width, signed }, Int32) => match (bit_width, signed) {
                (8, true) => PrimitiveType::Int8,
                (16, true) => PrimitiveType::Int16,
                (32, true) => PrimitiveType::Int32,
                (8, false) => PrimitiveType::UInt8,
                (16, false) => PrimitiveType::UInt16,
                (32, false) => PrimitiveType::UInt32,
                _ => return None,
            },
            (LogicalType::Integer { bit_width: 64, signed }, Int64) => {
                if *signed {
                    PrimitiveType::Int64
                } else {
                    PrimitiveType::UInt64
                }
            }
            (LogicalType::Uuid, FixedLenByteArray) if type_length == 16 => PrimitiveType::Uuid,
            (LogicalType::Float16, FixedLenByteArray) if type_length == 2 => PrimitiveType::Float16,
            _ => return None,
        })
    });
    if let Some(resolved) = from_logical {
        return resolved;
    }

    let from_converted = node.converted_type.and_then(|converted| {
        use PhysicalType::*;
        Some(match (converted, physical_type) {
            (ConvertedType::Utf8 | ConvertedType::Enum | ConvertedType::Json, ByteArray) => {
                PrimitiveType::String
            }
            (ConvertedType::Decimal, Int32 | Int64 | ByteArray | FixedLenByteArray) => {
                decimal(precision, scale)
            }
            (ConvertedType::Date, Int32) => PrimitiveType::Date32,
            (ConvertedType::TimeMillis, Int32) => PrimitiveType::TimeMillis,
            (ConvertedType::TimeMicros, Int64) => PrimitiveType::TimeMicros,
            (ConvertedType::TimestampMillis, Int64) => timestamp(TimeUnit::Millis, true),
            (ConvertedType::TimestampMicros, Int64) => timestamp(TimeUnit::Micros, true),
            (ConvertedType::Int8, Int32) => PrimitiveType::Int8,
            (ConvertedType::Int16, Int32) => PrimitiveType::Int16,
            (ConvertedType::Int32, Int32) => PrimitiveType::Int32,
            (ConvertedType::Uint8, Int32) => PrimitiveType::UInt8,
            (ConvertedType::Uint16, Int32) => PrimitiveType::UInt16,
            (ConvertedType::Uint32, Int32) => PrimitiveType::UInt32,
            (ConvertedType::Int64, Int64) => PrimitiveType::Int64,
            (ConvertedType::Uint64, Int64) => PrimitiveType::UInt64,
            _ => return None,
        })
    });
    if let Some(resolved) = from_converted {
        return resolved;
    }

    match physical_type {
        PhysicalType::Boolean => PrimitiveType::Boolean,
        PhysicalType::Int32 => PrimitiveType::Int32,
        PhysicalType::Int64 => PrimitiveType::Int64,
        PhysicalType::Int96 => PrimitiveType::TimestampNanos(None),
        PhysicalType::Float => PrimitiveType::Float32,
        PhysicalType::Double => PrimitiveType::Float64,
        PhysicalType::ByteArray => PrimitiveType::Binary,
        PhysicalType::FixedLenByteArray => PrimitiveType::FixedLenByteArray(type_length),
    }
}

/// Logical view of a field, taking its repetition into account
fn logical_field(node: &TypeNode) -> SchemaNode {
    match node.repetition {
        Repetition::Repeated => SchemaNode::List {
            name: node.name.clone(),
            nullable: false,
            item: Box::new(logical_content(node, false)),
        },
        Repetition::Optional => logical_content(node, true),
        Repetition::Required => logical_content(node, false),
    }
}

/// Logical view of a node's content, with the given nullability
fn logical_content(node: &TypeNode, nullable: bool) -> SchemaNode {
    let name = node.name.clone();
    match shape(node) {
        Shape::Leaf => SchemaNode::Primitive {
            name,
            primitive_type: resolve_primitive(node),
            nullable,
        },
        Shape::Struct(children) => SchemaNode::Struct {
            name,
            nullable,
            fields: children.iter().map(logical_field).collect(),
        },
        Shape::List { element, .. } => SchemaNode::List {
            name,
            nullable,
            item: Box::new(match element {
                ListElement::Repeated(repeated) => logical_content(repeated, false),
                ListElement::Nested(child) => logical_field(child),
            }),
        },
        Shape::Map { key, value, .. } => SchemaNode::Map {
            name,
            nullable,
            key: Box::new(logical_field(key)),
            value: Box::new(logical_field(value)),
        },
    }
}

fn group(name: &str, repetition: Repetition, children: Vec<TypeNode>) -> TypeNode {
    TypeNode {
        name: name.to_string(),
        repetition,
        converted_type: None,
        logical_type: None,
        field_id: None,
        kind: TypeKind::Group(children),
    }
}

fn nullable_repetition(nullable: bool) -> Repetition {
    if nullable {
        Repetition::Optional
    } else {
        Repetition::Required
    }
}

/// Bytes needed for a two's complement decimal of `precision` digits
pub fn decimal_length(precision: u8) -> i32 {
    let bits = precision as f64 * std::f64::consts::LOG2_10 + 1.0;
    (bits / 8.0).ceil() as i32
}

fn physical_node(node: &SchemaNode) -> Result<TypeNode> {
    let repetition = nullable_repetition(node.is_nullable());
    match node {
        SchemaNode::Struct { name, fields, .. } => {
            if fields.is_empty() {
                return Err(ParquetError::schema(format!(
                    "struct '{}' must have at least one field",
                    name
                )));
            }
            let children = fields.iter().map(physical_node).collect::<Result<Vec<_>>>()?;
            Ok(group(name, repetition, children))
        }
        SchemaNode::List { name, item, .. } => {
            let repeated = group("list", Repetition::Repeated, vec![physical_node(item)?]);
            let mut list = group(name, repetition, vec![repeated]);
            list.logical_type = Some(LogicalType::List);
            list.converted_type = Some(ConvertedType::List);
            Ok(list)
        }
        SchemaNode::Map {
            name, key, value, ..
        } => {
            if key.is_nullable() {
                return Err(ParquetError::schema(format!(
                    "map '{}' must have a non-nullable key",
                    name
                )));
            }
            let key_value = group(
                "key_value",
                Repetition::Repeated,
                vec![physical_node(key)?, physical_node(value)?],
            );
            let mut map = group(name, repetition, vec![key_value]);
            map.logical_type = Some(LogicalType::Map);
            map.converted_type = Some(ConvertedType::Map);
            Ok(map)
        }
        SchemaNode::Primitive {
            name,
            primitive_type,
            ..
        } => primitive_node(name, repetition, primitive_type),
    }
}

fn primitive_node(name: &str, repetition: Repetition, ptype: &PrimitiveType) -> Result<TypeNode> {
    use PhysicalType as P;
    let integer = |bit_width: i8, signed: bool| Some(LogicalType::Integer { bit_width, signed });

    let (physical_type, logical_type, converted_type, type_length) = match ptype {
        PrimitiveType::Boolean => (P::Boolean, None, None, 0),
        PrimitiveType::Int8 => (P::Int32, integer(8, true), Some(ConvertedType::Int8), 0),
        PrimitiveType::Int16 => (P::Int32, integer(16, true), Some(ConvertedType::Int16), 0),
        PrimitiveType::Int32 => (P::Int32, None, None, 0),
        PrimitiveType::Int64 => (P::Int64, None, None, 0),
        PrimitiveType::UInt8 => (P::Int32, integer(8, false), Some(ConvertedType::Uint8), 0),
        PrimitiveType::UInt16 => (P::Int32, integer(16, false), Some(ConvertedType::Uint16), 0),
        PrimitiveType::UInt32 => (P::Int32, integer(32, false), Some(ConvertedType::Uint32), 0),
        PrimitiveType::UInt64 => (P::Int64, integer(64, false), Some(ConvertedType::Uint64), 0),
        PrimitiveType::Float16 => (P::FixedLenByteArray, Some(LogicalType::Float16), None, 2),
        PrimitiveType::Float32 => (P::Float, None, None, 0),
        PrimitiveType::Float64 => (P::Double, None, None, 0),
        PrimitiveType::Decimal128(precision, scale) | PrimitiveType::Decimal256(precision, scale) => {
            if *precision == 0 || (*scale as i32) > *precision as i32 || *scale < 0 {
                return Err(ParquetError::schema(format!(
                    "invalid decimal({}, {}) for '{}'",
                    precision, scale, name
                )));
            }
            let physical = match precision {
                1..=9 => (P::Int32, 0),
                10..=18 => (P::Int64, 0),
                _ => (P::FixedLenByteArray, decimal_length(*precision)),
            };
            let mut node = leaf(name, repetition, physical.0, physical.1);
            node.logical_type = Some(LogicalType::Decimal {
                scale: *scale as i32,
                precision: *precision as i32,
            });
            node.converted_type = Some(ConvertedType::Decimal);
            if let TypeKind::Primitive {
                scale: s,
                precision: p,
                ..
            } = &mut node.kind
            {
                *s = *scale as i32;
                *p = *precision as i32;
            }
            return Ok(node);
        }
        PrimitiveType::String => (P::ByteArray, Some(LogicalType::String), Some(ConvertedType::Utf8), 0),
        PrimitiveType::Binary => (P::ByteArray, None, None, 0),
        PrimitiveType::Uuid => (P::FixedLenByteArray, Some(LogicalType::Uuid), None, 16),
        PrimitiveType::Date32 => (P::Int32, Some(LogicalType::Date), Some(ConvertedType::Date), 0),
        PrimitiveType::TimestampMillis(tz) => timestamp_leaf(TimeUnit::Millis, tz, Some(ConvertedType::TimestampMillis)),
        PrimitiveType::TimestampMicros(tz) => timestamp_leaf(TimeUnit::Micros, tz, Some(ConvertedType::TimestampMicros)),
        PrimitiveType::TimestampNanos(tz) => timestamp_leaf(TimeUnit::Nanos, tz, None),
        PrimitiveType::TimeMillis => (
            P::Int32,
            Some(LogicalType::Time {
                adjusted_to_utc: true,
                unit: TimeUnit::Millis,
            }),
            Some(ConvertedType::TimeMillis),
            0,
        ),
        PrimitiveType::TimeMicros => (
            P::Int64,
            Some(LogicalType::Time {
                adjusted_to_utc: true,
                unit: TimeUnit::Micros,
            }),
            Some(ConvertedType::TimeMicros),
            0,
        ),
        PrimitiveType::TimeNanos => (
            P::Int64,
            Some(LogicalType::Time {
                adjusted_to_utc: true,
                unit: TimeUnit::Nanos,
            }),
            None,
            0,
        ),
        PrimitiveType::FixedLenByteArray(length) => {
            if *length <= 0 {
                return Err(ParquetError::schema(format!(
                    "fixed length {} for '{}' must be positive",
                    length, name
                )));
            }
            (P::FixedLenByteArray, None, None, *length)
        }
    };

    let mut node = leaf(name, repetition, physical_type, type_length);
    node.logical_type = logical_type;
    node.converted_type = converted_type;
    Ok(node)
}

fn timestamp_leaf(
    unit: TimeUnit,
    tz: &Option<Arc<str>>,
    converted: Option<ConvertedType>,
) -> (PhysicalType, Option<LogicalType>, Option<ConvertedType>, i32) {
    let adjusted_to_utc = tz.is_some();
    (
        PhysicalType::Int64,
        Some(LogicalType::Timestamp {
            adjusted_to_utc,
            unit,
        }),
        // Legacy annotations only describe UTC-adjusted instants
        converted.filter(|_| adjusted_to_utc),
        0,
    )
}

fn leaf(name: &str, repetition: Repetition, physical_type: PhysicalType, type_length: i32) -> TypeNode {
    TypeNode {
        name: name.to_string(),
        repetition,
        converted_type: None,
        logical_type: None,
        field_id: None,
        kind: TypeKind::Primitive {
            physical_type,
            type_length,
            scale: 0,
            precision: 0,
        },
    }
}

fn flatten(node: &TypeNode, is_root: bool, out: &mut Vec<SchemaElement>) {
    let mut element = SchemaElement {
        name: node.name.clone(),
        repetition_type: (!is_root).then(|| node.repetition.to_thrift()),
        converted_type: node.converted_type.map(ConvertedType::to_thrift),
        logical_type: node.logical_type.clone(),
        field_id: node.field_id,
        ..Default::default()
    };
    match &node.kind {
        TypeKind::Group(children) => {
            element.num_children = Some(children.len() as i32);
            out.push(element);
            for child in children {
                flatten(child, false, out);
            }
        }
        TypeKind::Primitive {
            physical_type,
            type_length,
            scale,
            precision,
        } => {
            element.type_ = Some(physical_type.to_thrift());
            if *physical_type == PhysicalType::FixedLenByteArray {
                element.type_length = Some(*type_length);
            }
            if matches!(node.logical_type, Some(LogicalType::Decimal { .. })) {
                element.scale = Some(*scale);
                element.precision = Some(*precision);
            }
            out.push(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, repetition: Option<Repetition>, children: Option<i32>) -> SchemaElement {
        SchemaElement {
            name: name.to_string(),
            repetition_type: repetition.map(Repetition::to_thrift),
            num_children: children,
            ..Default::default()
        }
    }

    fn leaf_element(name: &str, repetition: Repetition, physical: PhysicalType) -> SchemaElement {
        SchemaElement {
            type_: Some(physical.to_thrift()),
            ..element(name, Some(repetition), None)
        }
    }

    #[test]
    fn test_levels_for_three_level_list() {
        // message m { optional group tags (LIST) { repeated group list { optional binary element (STRING); } } }
        let mut tags = element("tags", Some(Repetition::Optional), Some(1));
        tags.converted_type = Some(ConvertedType::List.to_thrift());
        let mut item = leaf_element("element", Repetition::Optional, PhysicalType::ByteArray);
        item.logical_type = Some(LogicalType::String);
        let elements = vec![
            element("m", None, Some(2)),
            leaf_element("id", Repetition::Required, PhysicalType::Int32),
            tags,
            element("list", Some(Repetition::Repeated), Some(1)),
            item,
        ];

        let descriptor = SchemaDescriptor::from_elements(&elements).unwrap();
        assert_eq!(descriptor.num_columns(), 2);
        let id = descriptor.column(0);
        assert_eq!((id.max_def_level, id.max_rep_level), (0, 0));
        let element = descriptor.column(1);
        assert_eq!(element.path_string(), "tags.list.element");
        assert_eq!((element.max_def_level, element.max_rep_level), (3, 1));
        assert_eq!(element.primitive_type, PrimitiveType::String);
        assert_eq!(descriptor.column_root(1), 1);

        let fields = descriptor.schema().fields();
        match &fields[1] {
            SchemaNode::List { nullable, item, .. } => {
                assert!(*nullable);
                assert_eq!(item.name(), "element");
                assert!(item.is_nullable());
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_two_level_and_legacy_lists() {
        // optional group a (LIST) { repeated int32 array; }
        let mut a = element("a", Some(Repetition::Optional), Some(1));
        a.converted_type = Some(ConvertedType::List.to_thrift());
        // optional group b (LIST) { repeated group b_tuple { required int32 x; } }
        let mut b = element("b", Some(Repetition::Optional), Some(1));
        b.converted_type = Some(ConvertedType::List.to_thrift());
        let elements = vec![
            element("m", None, Some(3)),
            a,
            leaf_element("array", Repetition::Repeated, PhysicalType::Int32),
            b,
            element("b_tuple", Some(Repetition::Repeated), Some(1)),
            leaf_element("x", Repetition::Required, PhysicalType::Int32),
            leaf_element("plain", Repetition::Repeated, PhysicalType::Int64),
        ];
        let descriptor = SchemaDescriptor::from_elements(&elements).unwrap();
        let fields = descriptor.schema().fields();

        match &fields[0] {
            SchemaNode::List { item, .. } => assert!(matches!(
                item.as_ref(),
                SchemaNode::Primitive { primitive_type: PrimitiveType::Int32, nullable: false, .. }
            )),
            other => panic!("expected list, got {:?}", other),
        }
        match &fields[1] {
            SchemaNode::List { item, .. } => {
                assert!(matches!(item.as_ref(), SchemaNode::Struct { fields, .. } if fields.len() == 1))
            }
            other => panic!("expected list, got {:?}", other),
        }
        match &fields[2] {
            SchemaNode::List { nullable, item, .. } => {
                assert!(!nullable);
                assert_eq!(item.name(), "plain");
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_map_classification() {
        let mut map = element("attrs", Some(Repetition::Optional), Some(1));
        map.converted_type = Some(ConvertedType::MapKeyValue.to_thrift());
        let mut key = leaf_element("key", Repetition::Required, PhysicalType::ByteArray);
        key.converted_type = Some(ConvertedType::Utf8.to_thrift());
        let elements = vec![
            element("m", None, Some(1)),
            map,
            element("map", Some(Repetition::Repeated), Some(2)),
            key,
            leaf_element("value", Repetition::Optional, PhysicalType::Int64),
        ];
        let descriptor = SchemaDescriptor::from_elements(&elements).unwrap();
        match &descriptor.schema().fields()[0] {
            SchemaNode::Map { key, value, .. } => {
                assert!(matches!(
                    key.as_ref(),
                    SchemaNode::Primitive { primitive_type: PrimitiveType::String, .. }
                ));
                assert!(value.is_nullable());
            }
            other => panic!("expected map, got {:?}", other),
        }
        assert_eq!(descriptor.column(1).max_def_level, 3);
    }

    #[test]
    fn test_malformed_element_lists() {
        // Root claims two children but only one follows
        let elements = vec![
            element("m", None, Some(2)),
            leaf_element("id", Repetition::Required, PhysicalType::Int32),
        ];
        assert!(SchemaDescriptor::from_elements(&elements).is_err());

        // Leaf root
        let elements = vec![leaf_element("id", Repetition::Required, PhysicalType::Int32)];
        assert!(SchemaDescriptor::from_elements(&elements).is_err());

        assert!(SchemaDescriptor::from_elements(&[]).is_err());
    }

    #[test]
    fn test_logical_schema_roundtrips_through_elements() {
        let schema = crate::SchemaBuilder::new()
            .with_root(SchemaNode::Struct {
                name: "root".to_string(),
                nullable: false,
                fields: vec![
                    SchemaNode::Primitive {
                        name: "amount".to_string(),
                        primitive_type: PrimitiveType::Decimal128(20, 4),
                        nullable: true,
                    },
                    SchemaNode::List {
                        name: "scores".to_string(),
                        nullable: false,
                        item: Box::new(SchemaNode::Primitive {
                            name: "element".to_string(),
                            primitive_type: PrimitiveType::Int16,
                            nullable: true,
                        }),
                    },
                    SchemaNode::Map {
                        name: "props".to_string(),
                        nullable: true,
                        key: Box::new(SchemaNode::Primitive {
                            name: "key".to_string(),
                            primitive_type: PrimitiveType::String,
                            nullable: false,
                        }),
                        value: Box::new(SchemaNode::Primitive {
                            name: "value".to_string(),
                            primitive_type: PrimitiveType::TimestampMicros(Some(Arc::from("UTC"))),
                            nullable: true,
                        }),
                    },
                ],
            })
            .build()
            .unwrap();

        let written = SchemaDescriptor::from_schema(&schema).unwrap();
        let elements = written.to_elements();
        let read = SchemaDescriptor::from_elements(&elements).unwrap();
        assert_eq!(read.schema(), &schema);
        assert_eq!(read.column(0).physical_type, PhysicalType::FixedLenByteArray);
        assert_eq!(read.column(0).type_length, 9);
    }

    #[test]
    fn test_decimal_length() {
        assert_eq!(decimal_length(9), 4);
        assert_eq!(decimal_length(18), 8);
        assert_eq!(decimal_length(38), 16);
        assert_eq!(decimal_length(76), 32);
    }
}
