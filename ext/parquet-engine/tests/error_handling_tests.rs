use bytes::Bytes;
use parquet_engine::format::{self, FileMetaData};
use parquet_engine::*;

use test_helpers::*;

fn sample_file() -> Bytes {
    write_with(
        WriterBuilder::new().with_compression(Compression::Uncompressed),
        create_test_schema(),
        generate_test_rows(20),
    )
    .unwrap()
}

/// Decoded footer of `data` and the offset where it starts
fn footer_of(data: &Bytes) -> (FileMetaData, usize) {
    let len = data.len();
    let footer_len = u32::from_le_bytes(data[len - 8..len - 4].try_into().unwrap()) as usize;
    let footer_start = len - 8 - footer_len;
    let (metadata, _) = format::decode::<FileMetaData>(&data[footer_start..len - 8]).unwrap();
    (metadata, footer_start)
}

fn with_footer(body: Vec<u8>, metadata: &FileMetaData) -> Bytes {
    let encoded = format::encode(metadata);
    let mut out = body;
    out.extend_from_slice(&encoded);
    out.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
    out.extend_from_slice(b"PAR1");
    Bytes::from(out)
}

/// Re-encodes the footer of `data` after applying `edit`
fn rewrite_footer(data: &Bytes, edit: impl FnOnce(&mut FileMetaData)) -> Bytes {
    let (mut metadata, footer_start) = footer_of(data);
    edit(&mut metadata);
    with_footer(data[..footer_start].to_vec(), &metadata)
}

/// Replaces leaf `column` of the first row group of `target` with the chunk
/// `donor` wrote for the same leaf, keeping the target's row count
fn splice_column(target: &Bytes, donor: &Bytes, column: usize) -> Bytes {
    let (mut metadata, footer_start) = footer_of(target);
    let (donor_metadata, _) = footer_of(donor);
    let (start, len) = Reader::new(donor.clone())
        .unwrap()
        .metadata()
        .row_group(0)
        .column(column)
        .byte_range();

    let mut body = target[..footer_start].to_vec();
    let shift = footer_start as i64 - start as i64;
    body.extend_from_slice(&donor[start as usize..(start + len) as usize]);

    let mut chunk = donor_metadata.row_groups[0].columns[column].clone();
    chunk.file_offset += shift;
    if let Some(meta) = &mut chunk.meta_data {
        meta.data_page_offset += shift;
        meta.dictionary_page_offset = meta.dictionary_page_offset.map(|o| o + shift);
    }
    metadata.row_groups[0].columns[column] = chunk;
    with_footer(body, &metadata)
}

fn open_err(data: Bytes) -> ParquetError {
    Reader::new(data).unwrap_err()
}

#[test]
fn test_not_a_parquet_file() {
    let err = open_err(Bytes::from_static(b"this is certainly not a parquet file"));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_file_too_small() {
    assert_eq!(open_err(Bytes::new()).kind(), ErrorKind::Format);
    assert_eq!(open_err(Bytes::from_static(b"PAR1PAR1")).kind(), ErrorKind::Format);
}

#[test]
fn test_bad_magic() {
    let data = sample_file();

    let mut leading = data.to_vec();
    leading[..4].copy_from_slice(b"PARX");
    assert_eq!(open_err(Bytes::from(leading)).kind(), ErrorKind::Format);

    let mut trailing = data.to_vec();
    let len = trailing.len();
    trailing[len - 1] = b'X';
    assert_eq!(open_err(Bytes::from(trailing)).kind(), ErrorKind::Format);
}

#[test]
fn test_truncated_file() {
    let data = sample_file();
    for keep in [data.len() / 2, data.len() - 1, 20] {
        let err = open_err(data.slice(..keep));
        assert_eq!(err.kind(), ErrorKind::Format, "truncated to {} bytes", keep);
    }
}

#[test]
fn test_footer_length_past_start_of_file() {
    let mut data = sample_file().to_vec();
    let len = data.len();
    data[len - 8..len - 4].copy_from_slice(&(len as u32).to_le_bytes());
    assert_eq!(open_err(Bytes::from(data)).kind(), ErrorKind::Format);
}

#[test]
fn test_garbage_footer() {
    let mut data = sample_file().to_vec();
    let len = data.len();
    let footer_len = u32::from_le_bytes(data[len - 8..len - 4].try_into().unwrap()) as usize;
    for byte in &mut data[len - 8 - footer_len..len - 8] {
        *byte = 0xff;
    }
    assert_eq!(open_err(Bytes::from(data)).kind(), ErrorKind::Format);
}

#[test]
fn test_unsupported_version() {
    let data = rewrite_footer(&sample_file(), |metadata| metadata.version = 3);
    let err = open_err(data);
    assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    assert!(err.is_unsupported());
}

#[test]
fn test_unsupported_codec_fails_on_first_read() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        for chunk in &mut metadata.row_groups[0].columns {
            if let Some(meta) = &mut chunk.meta_data {
                meta.codec = Compression::Brotli.to_thrift();
            }
        }
    });

    // The footer itself is fine
    let mut reader = Reader::new(data).unwrap();
    assert_eq!(reader.info().num_rows, 20);

    let err = reader.rows(5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCodec);

    // The reader stays failed
    let again = reader.rows(5).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Format);
    assert!(again.to_string().contains("failed earlier"));
}

#[test]
fn test_unknown_codec_id() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        if let Some(meta) = &mut metadata.row_groups[0].columns[0].meta_data {
            meta.codec = 42;
        }
    });
    let mut reader = Reader::new(data).unwrap();
    assert_eq!(reader.rows(1).unwrap_err().kind(), ErrorKind::UnsupportedCodec);
}

#[test]
fn test_value_count_mismatch() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        if let Some(meta) = &mut metadata.row_groups[0].columns[0].meta_data {
            meta.num_values += 1;
        }
    });
    let mut reader = Reader::new(data).unwrap();
    let err = reader.rows(100).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_row_count_larger_than_data() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        metadata.row_groups[0].num_rows += 5;
        metadata.num_rows += 5;
    });
    let mut reader = Reader::new(data).unwrap();
    assert_eq!(reader.rows(100).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_row_count_smaller_than_data() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        metadata.row_groups[0].num_rows -= 5;
        metadata.num_rows -= 5;
    });
    let mut reader = Reader::new(data).unwrap();
    assert_eq!(reader.rows(100).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_chunk_outside_data_region() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        if let Some(meta) = &mut metadata.row_groups[0].columns[0].meta_data {
            meta.data_page_offset = 1 << 40;
        }
    });
    assert_eq!(open_err(data).kind(), ErrorKind::Format);
}

#[test]
fn test_corrupt_page_header() {
    let mut data = sample_file().to_vec();
    for byte in &mut data[4..12] {
        *byte = 0xff;
    }
    let mut reader = Reader::new(Bytes::from(data)).unwrap();
    assert_eq!(reader.rows(1).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_checksum_mismatch_detected_when_verifying() {
    let schema = schema_of(vec![primitive("n", PrimitiveType::Int32, false)]);
    let rows: Vec<_> = (0..10).map(|i| vec![ParquetValue::Int32(i)]).collect();
    let builder = WriterBuilder::new()
        .with_compression(Compression::Uncompressed)
        .with_checksums(true);
    let data = write_with(builder, schema, rows).unwrap();

    // The last byte of the chunk is the high byte of the last value
    let (start, len) = Reader::new(data.clone())
        .unwrap()
        .metadata()
        .row_group(0)
        .column(0)
        .byte_range();
    let mut corrupted = data.to_vec();
    corrupted[(start + len - 1) as usize] ^= 0x40;
    let corrupted = Bytes::from(corrupted);

    let mut verifying = ReaderBuilder::new()
        .with_checksum_verification(true)
        .build(corrupted.clone())
        .unwrap();
    assert_eq!(verifying.rows(10).unwrap_err().kind(), ErrorKind::Format);

    let mut trusting = Reader::new(corrupted).unwrap();
    let rows = trusting.rows(10).unwrap();
    assert_eq!(rows.len(), 10);
    assert_ne!(rows[9].get("n"), Some(&ParquetValue::Int32(9)));
}

#[test]
fn test_missing_file() {
    let err = Reader::open("/definitely/not/here.parquet").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_unknown_projected_column() {
    let err = ReaderBuilder::new()
        .with_columns(["id", "nope"])
        .build(sample_file())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_write_row_arity_mismatch() {
    let mut buffer = Vec::new();
    let mut writer = WriterBuilder::new()
        .build(&mut buffer, create_test_schema())
        .unwrap();
    let err = writer.write_row(vec![ParquetValue::Int32(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn test_leaf_with_fewer_records_than_siblings() {
    let schema = schema_of(vec![
        primitive("a", PrimitiveType::Int32, false),
        primitive("b", PrimitiveType::Int32, false),
    ]);
    let rows = |n: i32| -> Vec<_> {
        (0..n)
            .map(|i| vec![ParquetValue::Int32(i), ParquetValue::Int32(i)])
            .collect()
    };
    let builder = || WriterBuilder::new().with_compression(Compression::Uncompressed);
    let full = write_with(builder(), schema.clone(), rows(3)).unwrap();
    let short = write_with(builder(), schema, rows(2)).unwrap();

    let data = splice_column(&full, &short, 1);
    let mut reader = Reader::new(data).unwrap();
    assert_eq!(reader.info().num_rows, 3);
    assert_eq!(reader.rows(2).unwrap().len(), 2);
    assert_eq!(reader.rows(1).unwrap_err().kind(), ErrorKind::Format);
    assert_eq!(reader.rows(1).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_leaf_ending_mid_record() {
    let point = SchemaNode::Struct {
        name: "element".to_string(),
        nullable: false,
        fields: vec![
            primitive("x", PrimitiveType::Int32, false),
            primitive("y", PrimitiveType::Int32, false),
        ],
    };
    let schema = schema_of(vec![SchemaNode::List {
        name: "points".to_string(),
        nullable: false,
        item: Box::new(point),
    }]);
    let points = |n: i32| {
        vec![vec![ParquetValue::List(
            (0..n)
                .map(|i| record(vec![("x", ParquetValue::Int32(i)), ("y", ParquetValue::Int32(i))]))
                .collect(),
        )]]
    };
    let builder = || WriterBuilder::new().with_compression(Compression::Uncompressed);
    let full = write_with(builder(), schema.clone(), points(2)).unwrap();
    let short = write_with(builder(), schema, points(1)).unwrap();

    // "y" starts the record like "x" but runs out at its second element
    let data = splice_column(&full, &short, 1);
    let mut reader = Reader::new(data).unwrap();
    let err = reader.rows(10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("middle of a record"), "{}", err);
    assert_eq!(reader.rows(10).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_row_group_counts_overflowing_total() {
    let data = rewrite_footer(&sample_file(), |metadata| {
        metadata.row_groups[0].num_rows = i64::MAX;
        metadata.row_groups.push(metadata.row_groups[0].clone());
    });
    assert_eq!(open_err(data).kind(), ErrorKind::Format);
}
