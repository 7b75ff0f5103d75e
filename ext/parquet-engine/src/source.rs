//! Random-access byte sources
//!
//! A [`ChunkReader`] hands out exact byte ranges of a Parquet file. Asking for
//! a range that extends past the end is an I/O error, never a short read.

use bytes::Bytes;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::{ErrorContext, ParquetError, Result};

pub trait ChunkReader {
    /// Total length in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads exactly `length` bytes starting at `offset`
    fn get_bytes(&self, offset: u64, length: usize) -> Result<Bytes>;
}

fn out_of_range(offset: u64, length: usize, len: u64) -> ParquetError {
    ParquetError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!(
            "range {}..{} is past the end of a {} byte source",
            offset,
            offset.saturating_add(length as u64),
            len
        ),
    ))
}

/// Reads at `offset` without touching the shared cursor of `file`
#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// File-backed source. The handle is closed when the source is dropped.
///
/// Reads are positional, so one source can serve several threads at once.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    path: PathBuf,
    len: u64,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        Self::from_file(file, path)
    }

    pub fn from_file(file: File, path: PathBuf) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(FileSource { file, path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkReader for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn get_bytes(&self, offset: u64, length: usize) -> Result<Bytes> {
        if offset.checked_add(length as u64).map_or(true, |end| end > self.len) {
            return Err(out_of_range(offset, length, self.len));
        }
        let mut buf = vec![0; length];
        read_exact_at(&self.file, &mut buf, offset)?;
        Ok(Bytes::from(buf))
    }
}

impl ChunkReader for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    fn get_bytes(&self, offset: u64, length: usize) -> Result<Bytes> {
        let end = offset.checked_add(length as u64);
        match end {
            Some(end) if end <= Bytes::len(self) as u64 => {
                Ok(self.slice(offset as usize..end as usize))
            }
            _ => Err(out_of_range(offset, length, Bytes::len(self) as u64)),
        }
    }
}

impl<T: ChunkReader + ?Sized> ChunkReader for &T {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn get_bytes(&self, offset: u64, length: usize) -> Result<Bytes> {
        (**self).get_bytes(offset, length)
    }
}
