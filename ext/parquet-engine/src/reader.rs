//! Core Parquet reading functionality

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::column::{PageReader, TripletCursor};
use crate::footer::parse_metadata;
use crate::metadata::{FileInfo, ParquetMetaData};
use crate::record::RecordReader;
use crate::source::{ChunkReader, FileSource};
use crate::value::Row;
use crate::{ParquetError, ParquetValue, Result, Schema};

/// Rows fetched per step by [`RowIterator`]
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Options applied when opening a [`Reader`]
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Top-level fields to read; `None` reads all of them
    pub columns: Option<Vec<String>>,
    /// Verify page CRC32 checksums where the writer stored one
    pub verify_checksums: bool,
    pub batch_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            columns: None,
            verify_checksums: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Builder for creating a configured Reader
#[derive(Debug, Clone, Default)]
pub struct ReaderBuilder {
    options: ReaderOptions,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only read the named top-level fields
    ///
    /// Rows keep the file's field order regardless of the order given here.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.options.verify_checksums = verify;
        self
    }

    /// Set how many rows the iterator adapter fetches at once
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.options.batch_size = size.max(1);
        self
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<Reader<FileSource>> {
        self.build(FileSource::open(path)?)
    }

    /// Parse the footer of `source` and prepare to stream its rows
    pub fn build<R: ChunkReader>(self, source: R) -> Result<Reader<R>> {
        let metadata = Arc::new(parse_metadata(&source)?);
        let projection = resolve_projection(&metadata, self.options.columns.as_deref())?;
        Ok(Reader {
            source,
            metadata,
            projection,
            options: self.options,
            state: State::Opened,
            next_row_group: 0,
        })
    }
}

fn resolve_projection(metadata: &ParquetMetaData, columns: Option<&[String]>) -> Result<Vec<usize>> {
    let fields = metadata.schema_descr().root().children();
    let Some(columns) = columns else {
        return Ok((0..fields.len()).collect());
    };
    for name in columns {
        if !fields.iter().any(|field| &field.name == name) {
            return Err(ParquetError::invalid_argument(format!(
                "column '{}' is not a top-level field of this file",
                name
            )));
        }
    }
    Ok(fields
        .iter()
        .enumerate()
        .filter(|(_, field)| columns.contains(&field.name))
        .map(|(index, _)| index)
        .collect())
}

enum State {
    Opened,
    Streaming(RecordReader),
    Exhausted,
    /// The first error, reported again on every later call
    Failed(String),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Opened => "opened",
            State::Streaming(_) => "streaming",
            State::Exhausted => "exhausted",
            State::Failed(_) => "failed",
        }
    }
}

/// Streaming row reader over a Parquet file
///
/// Rows come out in file order, crossing row groups; a row group's column
/// chunks are decoded page by page as rows are requested.
pub struct Reader<R> {
    source: R,
    metadata: Arc<ParquetMetaData>,
    projection: Vec<usize>,
    options: ReaderOptions,
    state: State,
    next_row_group: usize,
}

impl Reader<FileSource> {
    /// Open the file at `path` and parse its footer
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        ReaderBuilder::new().open(path)
    }
}

impl<R: ChunkReader> Reader<R> {
    /// Create a reader over any byte source, e.g. in-memory `Bytes`
    pub fn new(source: R) -> Result<Self> {
        ReaderBuilder::new().build(source)
    }

    /// File-level summary; available in every state
    pub fn info(&self) -> FileInfo {
        self.metadata.file_info()
    }

    /// Logical schema of the whole file
    pub fn schema(&self) -> &Schema {
        self.metadata.schema()
    }

    pub fn metadata(&self) -> &ParquetMetaData {
        &self.metadata
    }

    /// Names of the top-level fields each row carries
    pub fn projected_fields(&self) -> Vec<&str> {
        let fields = self.metadata.schema_descr().root().children();
        self.projection
            .iter()
            .map(|index| fields[*index].name.as_str())
            .collect()
    }

    /// Read up to `n` rows
    ///
    /// Returns fewer only at the end of the file and nothing once exhausted.
    /// After a failure every later call fails too.
    pub fn rows(&mut self, n: usize) -> Result<Vec<Row>> {
        if let State::Failed(reason) = &self.state {
            return Err(ParquetError::format(format!(
                "reader failed earlier: {}",
                reason
            )));
        }
        if n == 0 || matches!(self.state, State::Exhausted) {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(n.min(self.options.batch_size.max(1) * 4));
        match self.fill(n, &mut out) {
            Ok(()) => Ok(out),
            Err(err) => {
                debug!(error = %err, "reader failed");
                self.state = State::Failed(err.to_string());
                Err(err)
            }
        }
    }

    fn fill(&mut self, n: usize, out: &mut Vec<Row>) -> Result<()> {
        while out.len() < n {
            let next_row_group = match &self.state {
                State::Opened => true,
                State::Streaming(records) => records.remaining() == 0,
                State::Exhausted | State::Failed(_) => return Ok(()),
            };
            if next_row_group {
                if self.next_row_group >= self.metadata.num_row_groups() {
                    debug!(rows = self.metadata.num_rows(), "reader exhausted");
                    self.state = State::Exhausted;
                    return Ok(());
                }
                let row_group = self.next_row_group;
                self.next_row_group += 1;
                let mut records = RecordReader::new(
                    &self.source,
                    &self.metadata,
                    row_group,
                    &self.projection,
                    self.options.verify_checksums,
                )?;
                if records.remaining() == 0 {
                    // still validates that its columns are empty
                    records.read_records(0, out)?;
                }
                self.state = State::Streaming(records);
                continue;
            }
            if let State::Streaming(records) = &mut self.state {
                records.read_records(n - out.len(), out)?;
            }
        }
        Ok(())
    }

    /// Every decoded triplet of one leaf column in one row group
    ///
    /// Independent of the row stream; does not change the reader's state.
    pub fn read_column_values(&self, row_group: usize, column: usize) -> Result<ColumnData> {
        let row_group_meta = self.metadata.row_groups().get(row_group).ok_or_else(|| {
            ParquetError::invalid_argument(format!(
                "row group {} out of range, file has {}",
                row_group,
                self.metadata.num_row_groups()
            ))
        })?;
        let chunk = row_group_meta.columns().get(column).ok_or_else(|| {
            ParquetError::invalid_argument(format!(
                "column {} out of range, file has {}",
                column,
                self.metadata.schema_descr().num_columns()
            ))
        })?;

        let pages = PageReader::new(&self.source, chunk, self.options.verify_checksums)?;
        let mut cursor = TripletCursor::new(pages);
        let mut data = ColumnData {
            path: chunk.descriptor().path_string(),
            values: Vec::new(),
            def_levels: Vec::new(),
            rep_levels: Vec::new(),
        };
        while let Some(triplet) = cursor.next_triplet()? {
            data.def_levels.push(triplet.def);
            data.rep_levels.push(triplet.rep);
            data.values.extend(triplet.value);
        }
        Ok(data)
    }

    /// Iterate over the remaining rows
    pub fn into_rows(self) -> RowIterator<R> {
        RowIterator {
            reader: self,
            buffer: VecDeque::new(),
            done: false,
        }
    }
}

impl<R> std::fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("num_rows", &self.metadata.num_rows())
            .field("row_groups", &self.metadata.num_row_groups())
            .field("projection", &self.projection)
            .field("state", &self.state.name())
            .finish()
    }
}

/// One leaf column's levels and non-null values
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    pub path: String,
    pub values: Vec<ParquetValue>,
    pub def_levels: Vec<i16>,
    pub rep_levels: Vec<i16>,
}

/// Iterator over rows in a Parquet file
pub struct RowIterator<R> {
    reader: Reader<R>,
    buffer: VecDeque<Row>,
    done: bool,
}

impl<R: ChunkReader> Iterator for RowIterator<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(row) = self.buffer.pop_front() {
            return Some(Ok(row));
        }
        if self.done {
            return None;
        }
        match self.reader.rows(self.reader.options.batch_size) {
            Ok(rows) if rows.is_empty() => {
                self.done = true;
                None
            }
            Ok(rows) => {
                self.buffer.extend(rows);
                self.buffer.pop_front().map(Ok)
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: ChunkReader> std::iter::FusedIterator for RowIterator<R> {}
