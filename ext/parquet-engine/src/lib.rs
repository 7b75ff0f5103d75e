//! A self-contained Parquet reader and writer
//!
//! `parquet-engine` reads Parquet files from any random-access byte source
//! and turns them into rows of [`ParquetValue`]s. It parses the footer,
//! decodes pages, and reassembles nested records from repetition and
//! definition levels without depending on another Parquet implementation.
//!
//! # Key Components
//!
//! - **Byte source**: [`source::ChunkReader`] gives positional reads over
//!   files ([`FileSource`]) and in-memory buffers (`bytes::Bytes`)
//!
//! - **Footer**: [`footer::parse_metadata`] validates the `PAR1` magic and
//!   decodes the Thrift compact footer into [`ParquetMetaData`]
//!
//! - **Pages**: [`page::decode_page`] decompresses a page and decodes its
//!   levels and values
//!   - PLAIN, dictionary, RLE, DELTA_* and BYTE_STREAM_SPLIT encodings
//!   - Snappy, gzip, LZ4, LZ4_RAW and zstd codecs
//!
//! - **Column chunks**: [`column::PageReader`] walks the pages of one chunk
//!   and [`column::TripletCursor`] yields `(rep, def, value)` triplets
//!
//! - **Records**: [`record::RecordReader`] stitches the leaf columns of a
//!   row group back into [`Row`]s, including lists, maps and structs
//!
//! - **Reader**: [`Reader`] exposes `info()` and `rows(n)` over a whole file
//!
//! - **Writer**: [`Writer`] shreds rows into column chunks and writes a
//!   file other Parquet readers can consume
//!
//! # Example Usage
//!
//! ```no_run
//! use parquet_engine::Reader;
//!
//! let mut reader = Reader::open("data.parquet")?;
//! println!("{} rows", reader.info().num_rows);
//! loop {
//!     let batch = reader.rows(1024)?;
//!     if batch.is_empty() {
//!         break;
//!     }
//!     for row in batch {
//!         println!("{:?}", row.get("id"));
//!     }
//! }
//! # Ok::<(), parquet_engine::ParquetError>(())
//! ```

pub mod basic;
pub mod column;
pub mod column_writer;
pub mod compression;
pub mod convert;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod footer;
pub mod format;
pub mod metadata;
pub mod page;
pub mod reader;
pub mod record;
pub mod schema;
pub mod source;
pub mod traits;
pub mod value;
pub mod writer;

#[cfg(test)]
pub mod test_utils;

pub use basic::Compression;
pub use error::{ErrorContext, ErrorKind, ParquetError, Result};
pub use metadata::{ColumnInfo, FileInfo, ParquetMetaData};
pub use reader::{ColumnData, Reader, ReaderBuilder, ReaderOptions, RowIterator};
pub use schema::{PrimitiveType, Repetition, Schema, SchemaBuilder, SchemaNode};
pub use source::{ChunkReader, FileSource};
pub use traits::SchemaInspector;
pub use value::{ParquetValue, Row};
pub use writer::{DataPageVersion, Writer, WriterBuilder, WriterEncoding};
