//! Page compression codecs
//!
//! Pages are compressed independently. LZO and BROTLI are named by the format
//! but not implemented here.

use crate::basic::Compression;
use crate::{ParquetError, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

const ZSTD_LEVEL: i32 = 3;

pub fn is_supported(codec: Compression) -> bool {
    !matches!(codec, Compression::Lzo | Compression::Brotli)
}

fn unsupported(codec: Compression) -> ParquetError {
    ParquetError::unsupported_codec(format!("{:?} compression is not supported", codec))
}

fn codec_error(codec: Compression, err: impl std::fmt::Display) -> ParquetError {
    ParquetError::format(format!("{:?} decompression failed: {}", codec, err))
}

/// Decompresses a page payload, which must expand to exactly `uncompressed_size`
pub fn decompress(codec: Compression, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let output = match codec {
        Compression::Uncompressed => input.to_vec(),
        Compression::Snappy => snap::raw::Decoder::new()
            .decompress_vec(input)
            .map_err(|e| codec_error(codec, e))?,
        Compression::Gzip => {
            let mut out = Vec::with_capacity(uncompressed_size);
            MultiGzDecoder::new(input)
                .read_to_end(&mut out)
                .map_err(|e| codec_error(codec, e))?;
            out
        }
        Compression::Zstd => {
            let mut out = Vec::with_capacity(uncompressed_size);
            zstd::stream::copy_decode(input, &mut out).map_err(|e| codec_error(codec, e))?;
            out
        }
        Compression::Lz4 => match decompress_lz4_hadoop(input, uncompressed_size) {
            Some(out) => out,
            None => lz4_flex::block::decompress(input, uncompressed_size)
                .map_err(|e| codec_error(codec, e))?,
        },
        Compression::Lz4Raw => lz4_flex::block::decompress(input, uncompressed_size)
            .map_err(|e| codec_error(codec, e))?,
        Compression::Lzo | Compression::Brotli => return Err(unsupported(codec)),
    };
    if output.len() != uncompressed_size {
        return Err(ParquetError::format(format!(
            "{:?} page expanded to {} bytes, header declares {}",
            codec,
            output.len(),
            uncompressed_size
        )));
    }
    Ok(output)
}

/// Hadoop framing: repeated (u32 BE raw size, u32 BE compressed size, block)
fn decompress_lz4_hadoop(input: &[u8], uncompressed_size: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(uncompressed_size);
    let mut rest = input;
    while !rest.is_empty() {
        if rest.len() < 8 {
            return None;
        }
        let raw_len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let block_len = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        rest = &rest[8..];
        if block_len > rest.len() || out.len() + raw_len > uncompressed_size {
            return None;
        }
        let block = lz4_flex::block::decompress(&rest[..block_len], raw_len).ok()?;
        if block.len() != raw_len {
            return None;
        }
        out.extend_from_slice(&block);
        rest = &rest[block_len..];
    }
    Some(out)
}

pub fn compress(codec: Compression, input: &[u8]) -> Result<Vec<u8>> {
    match codec {
        Compression::Uncompressed => Ok(input.to_vec()),
        Compression::Snappy => snap::raw::Encoder::new()
            .compress_vec(input)
            .map_err(|e| ParquetError::internal(format!("snappy: {}", e))),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(input)?;
            Ok(encoder.finish()?)
        }
        Compression::Zstd => Ok(zstd::stream::encode_all(input, ZSTD_LEVEL)?),
        Compression::Lz4 => {
            let block = lz4_flex::block::compress(input);
            let mut out = Vec::with_capacity(block.len() + 8);
            out.extend_from_slice(&(input.len() as u32).to_be_bytes());
            out.extend_from_slice(&(block.len() as u32).to_be_bytes());
            out.extend_from_slice(&block);
            Ok(out)
        }
        Compression::Lz4Raw => Ok(lz4_flex::block::compress(input)),
        Compression::Lzo | Compression::Brotli => Err(unsupported(codec)),
    }
}
