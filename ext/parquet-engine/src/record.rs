//! Record assembly
//!
//! Rebuilds nested rows from the leaf triplet streams of one row group. The
//! reader tree mirrors the logical schema: optional nodes check a definition
//! level threshold, repeated nodes also loop while the next repetition level
//! continues them.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use crate::column::{PageReader, TripletCursor};
use crate::descriptor::{shape, ListElement, Shape, TypeNode};
use crate::metadata::ParquetMetaData;
use crate::schema::Repetition;
use crate::source::ChunkReader;
use crate::value::Row;
use crate::{ParquetError, ParquetValue, Result};

#[derive(Debug)]
enum FieldReader {
    Leaf {
        column: usize,
    },
    Optional {
        def: i16,
        leaves: LeafRange,
        inner: Box<FieldReader>,
    },
    Struct {
        fields: Vec<(Arc<str>, FieldReader)>,
    },
    List {
        def: i16,
        rep: i16,
        leaves: LeafRange,
        element: Box<FieldReader>,
    },
    Map {
        def: i16,
        rep: i16,
        leaves: LeafRange,
        key: Box<FieldReader>,
        value: Box<FieldReader>,
    },
}

/// Contiguous leaf columns below a node, in schema order
#[derive(Debug, Clone, Copy)]
struct LeafRange {
    first: usize,
    count: usize,
}

impl LeafRange {
    fn of(node: &TypeNode, first: usize) -> Self {
        Self {
            first,
            count: node.leaf_count(),
        }
    }
}

/// Builds the reader for `node` as a field, given the levels of its parent
fn build_field(node: &TypeNode, def: i16, rep: i16, next_leaf: &mut usize) -> FieldReader {
    let leaves = LeafRange::of(node, *next_leaf);
    match node.repetition {
        Repetition::Required => build_content(node, def, rep, next_leaf),
        Repetition::Optional => FieldReader::Optional {
            def: def + 1,
            leaves,
            inner: Box::new(build_content(node, def + 1, rep, next_leaf)),
        },
        // a repeated field outside a LIST reads as a non-null list of its content
        Repetition::Repeated => FieldReader::List {
            def: def + 1,
            rep: rep + 1,
            leaves,
            element: Box::new(build_content(node, def + 1, rep + 1, next_leaf)),
        },
    }
}

/// Builds the reader for a node's content, its own repetition already applied
fn build_content(node: &TypeNode, def: i16, rep: i16, next_leaf: &mut usize) -> FieldReader {
    let leaves = LeafRange::of(node, *next_leaf);
    match shape(node) {
        Shape::Leaf => {
            let column = *next_leaf;
            *next_leaf += 1;
            FieldReader::Leaf { column }
        }
        Shape::Struct(children) => FieldReader::Struct {
            fields: children
                .iter()
                .map(|child| {
                    (
                        Arc::from(child.name.as_str()),
                        build_field(child, def, rep, next_leaf),
                    )
                })
                .collect(),
        },
        Shape::List { element, .. } => {
            let (def, rep) = (def + 1, rep + 1);
            let element = match element {
                ListElement::Repeated(repeated) => build_content(repeated, def, rep, next_leaf),
                ListElement::Nested(child) => build_field(child, def, rep, next_leaf),
            };
            FieldReader::List {
                def,
                rep,
                leaves,
                element: Box::new(element),
            }
        }
        Shape::Map { key, value, .. } => {
            let (def, rep) = (def + 1, rep + 1);
            let key = build_field(key, def, rep, next_leaf);
            let value = build_field(value, def, rep, next_leaf);
            FieldReader::Map {
                def,
                rep,
                leaves,
                key: Box::new(key),
                value: Box::new(value),
            }
        }
    }
}

/// Open leaf cursors of one row group, indexed by leaf column
struct Cursors {
    slots: Vec<Option<TripletCursor>>,
}

impl Cursors {
    fn get(&mut self, column: usize) -> Result<&mut TripletCursor> {
        self.slots
            .get_mut(column)
            .and_then(Option::as_mut)
            .ok_or_else(|| ParquetError::internal(format!("leaf column {} is not open", column)))
    }

    /// Levels at the head of the first leaf below a node
    fn peek(&mut self, leaves: LeafRange) -> Result<Option<(i16, i16)>> {
        if leaves.count == 0 {
            return Ok(None);
        }
        let cursor = self.get(leaves.first)?;
        match cursor.peek()? {
            Some(levels) => Ok(Some(levels)),
            None => Err(ParquetError::format(format!(
                "column '{}' ended in the middle of a record",
                cursor.descriptor().path_string()
            ))),
        }
    }

    /// Consumes the single triplet each leaf holds for a null or empty node
    fn skip(&mut self, leaves: LeafRange) -> Result<()> {
        for column in leaves.first..leaves.first + leaves.count {
            let cursor = self.get(column)?;
            if cursor.next_triplet()?.is_none() {
                return Err(ParquetError::format(format!(
                    "column '{}' ended in the middle of a record",
                    cursor.descriptor().path_string()
                )));
            }
        }
        Ok(())
    }
}

impl FieldReader {
    fn read(&self, cursors: &mut Cursors) -> Result<ParquetValue> {
        match self {
            FieldReader::Leaf { column } => {
                let cursor = cursors.get(*column)?;
                let triplet = cursor.next_triplet()?.ok_or_else(|| {
                    ParquetError::format(format!(
                        "column '{}' ended in the middle of a record",
                        cursor.descriptor().path_string()
                    ))
                })?;
                triplet.value.ok_or_else(|| {
                    ParquetError::format(format!(
                        "column '{}' has definition level {} for a value that cannot be null",
                        cursor.descriptor().path_string(),
                        triplet.def
                    ))
                })
            }
            FieldReader::Optional { def, leaves, inner } => match cursors.peek(*leaves)? {
                Some((_, level)) if level < *def => {
                    cursors.skip(*leaves)?;
                    Ok(ParquetValue::Null)
                }
                _ => inner.read(cursors),
            },
            FieldReader::Struct { fields } => {
                let mut record = IndexMap::with_capacity(fields.len());
                for (name, field) in fields {
                    record.insert(name.clone(), field.read(cursors)?);
                }
                Ok(ParquetValue::Record(record))
            }
            FieldReader::List {
                def,
                rep,
                leaves,
                element,
            } => {
                let mut items = Vec::new();
                if read_repeated(cursors, *def, *rep, *leaves, |cursors| {
                    items.push(element.read(cursors)?);
                    Ok(())
                })? {
                    Ok(ParquetValue::List(items))
                } else {
                    Ok(ParquetValue::List(Vec::new()))
                }
            }
            FieldReader::Map {
                def,
                rep,
                leaves,
                key,
                value,
            } => {
                let mut entries = Vec::new();
                read_repeated(cursors, *def, *rep, *leaves, |cursors| {
                    let k = key.read(cursors)?;
                    let v = value.read(cursors)?;
                    entries.push((k, v));
                    Ok(())
                })?;
                Ok(ParquetValue::Map(entries))
            }
        }
    }
}

/// Reads the elements of a repeated node; false when it is empty
fn read_repeated(
    cursors: &mut Cursors,
    def: i16,
    rep: i16,
    leaves: LeafRange,
    mut read_element: impl FnMut(&mut Cursors) -> Result<()>,
) -> Result<bool> {
    match cursors.peek(leaves)? {
        None => return Ok(false),
        Some((_, level)) if level < def => {
            cursors.skip(leaves)?;
            return Ok(false);
        }
        Some(_) => {}
    }
    loop {
        read_element(cursors)?;
        if leaves.count == 0 {
            return Ok(true);
        }
        match cursors.get(leaves.first)?.peek()? {
            Some((level, _)) if level == rep => continue,
            _ => return Ok(true),
        }
    }
}

/// Assembles the rows of one row group
pub struct RecordReader {
    fields: Vec<(Arc<str>, FieldReader)>,
    cursors: Cursors,
    open_leaves: Vec<usize>,
    remaining: u64,
    row_group: usize,
}

impl RecordReader {
    /// Opens the leaf columns of the projected top-level fields
    ///
    /// `projection` holds indices into the root's fields, in output order.
    pub fn new<R: ChunkReader + ?Sized>(
        source: &R,
        metadata: &ParquetMetaData,
        row_group: usize,
        projection: &[usize],
        verify_checksums: bool,
    ) -> Result<Self> {
        let schema = metadata.schema_descr();
        let row_group_meta = metadata.row_groups().get(row_group).ok_or_else(|| {
            ParquetError::invalid_argument(format!(
                "row group {} out of range, file has {}",
                row_group,
                metadata.num_row_groups()
            ))
        })?;
        let top_level = schema.root().children();

        let mut first_leaf = Vec::with_capacity(top_level.len());
        let mut offset = 0;
        for field in top_level {
            first_leaf.push(offset);
            offset += field.leaf_count();
        }

        let mut fields = Vec::with_capacity(projection.len());
        let mut slots: Vec<Option<TripletCursor>> =
            (0..schema.num_columns()).map(|_| None).collect();
        let mut open_leaves = Vec::new();
        for &index in projection {
            let node = top_level.get(index).ok_or_else(|| {
                ParquetError::invalid_argument(format!("field index {} out of range", index))
            })?;
            let mut next_leaf = first_leaf[index];
            let reader = build_field(node, 0, 0, &mut next_leaf);
            for column in first_leaf[index]..next_leaf {
                let pages = PageReader::new(source, row_group_meta.column(column), verify_checksums)?;
                slots[column] = Some(TripletCursor::new(pages));
                open_leaves.push(column);
            }
            fields.push((Arc::from(node.name.as_str()), reader));
        }

        let remaining = u64::try_from(row_group_meta.num_rows())
            .map_err(|_| ParquetError::format("row group has a negative row count"))?;
        debug!(
            row_group,
            num_rows = remaining,
            columns = open_leaves.len(),
            "opened row group"
        );
        Ok(Self {
            fields,
            cursors: Cursors { slots },
            open_leaves,
            remaining,
            row_group,
        })
    }

    /// Rows not yet assembled
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Appends up to `n` rows to `out`, returning how many were read
    pub fn read_records(&mut self, n: usize, out: &mut Vec<Row>) -> Result<usize> {
        let mut read = 0;
        while read < n && self.remaining > 0 {
            self.check_record_start()?;
            let mut row = IndexMap::with_capacity(self.fields.len());
            for (name, field) in &self.fields {
                row.insert(name.clone(), field.read(&mut self.cursors)?);
            }
            out.push(Row::new(row));
            self.remaining -= 1;
            read += 1;
        }
        if self.remaining == 0 {
            self.check_exhausted()?;
        }
        Ok(read)
    }

    fn check_record_start(&mut self) -> Result<()> {
        for &column in &self.open_leaves {
            let cursor = self.cursors.get(column)?;
            match cursor.peek()? {
                Some((0, _)) => {}
                Some((rep, _)) => {
                    return Err(ParquetError::format(format!(
                        "column '{}' starts a record with repetition level {}",
                        cursor.descriptor().path_string(),
                        rep
                    )))
                }
                None => {
                    return Err(ParquetError::format(format!(
                        "column '{}' holds fewer records than row group {} declares",
                        cursor.descriptor().path_string(),
                        self.row_group
                    )))
                }
            }
        }
        Ok(())
    }

    fn check_exhausted(&mut self) -> Result<()> {
        for &column in &self.open_leaves {
            let cursor = self.cursors.get(column)?;
            if !cursor.is_exhausted()? {
                return Err(ParquetError::format(format!(
                    "column '{}' holds more records than row group {} declares",
                    cursor.descriptor().path_string(),
                    self.row_group
                )));
            }
        }
        Ok(())
    }
}
