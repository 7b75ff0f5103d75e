use parquet_engine::*;
use std::sync::Arc;

use test_helpers::*;

const SUPPORTED: [Compression; 6] = [
    Compression::Uncompressed,
    Compression::Snappy,
    Compression::Gzip,
    Compression::Lz4,
    Compression::Lz4Raw,
    Compression::Zstd,
];

fn repetitive_rows(count: usize) -> Vec<Vec<ParquetValue>> {
    (0..count)
        .map(|i| {
            vec![
                ParquetValue::Int32((i % 10) as i32),
                ParquetValue::String(Arc::from(format!("category_{}", i % 5))),
                ParquetValue::Float64(ordered_float::OrderedFloat((i % 3) as f64)),
                ParquetValue::Boolean(i % 2 == 0),
            ]
        })
        .collect()
}

#[test]
fn test_every_supported_codec_roundtrips() {
    let rows = repetitive_rows(2000);
    for codec in SUPPORTED {
        for version in [DataPageVersion::V1, DataPageVersion::V2] {
            let builder = WriterBuilder::new()
                .with_compression(codec)
                .with_data_page_version(version)
                .with_max_page_rows(300);
            let data = write_with(builder, create_test_schema(), rows.clone()).unwrap();
            assert_eq!(
                read_values(data).unwrap(),
                rows,
                "{:?} with {:?} pages",
                codec,
                version
            );
        }
    }
}

#[test]
fn test_compression_effectiveness() {
    let rows = repetitive_rows(5000);
    let size_of = |codec| {
        write_with(
            WriterBuilder::new().with_compression(codec),
            create_test_schema(),
            rows.clone(),
        )
        .unwrap()
        .len()
    };

    let uncompressed = size_of(Compression::Uncompressed);
    for codec in [Compression::Snappy, Compression::Gzip, Compression::Zstd] {
        let compressed = size_of(codec);
        assert!(
            compressed < uncompressed,
            "{:?} produced {} bytes, uncompressed {}",
            codec,
            compressed,
            uncompressed
        );
    }
}

#[test]
fn test_codec_is_recorded_per_column_chunk() {
    let data = write_with(
        WriterBuilder::new().with_compression(Compression::Zstd),
        create_test_schema(),
        repetitive_rows(10),
    )
    .unwrap();
    let reader = Reader::new(data).unwrap();
    for chunk in reader.metadata().row_group(0).columns() {
        assert_eq!(chunk.compression().unwrap(), Compression::Zstd);
        assert!(chunk.compressed_size() > 0);
    }
}

#[test]
fn test_compression_with_nulls() {
    let schema = schema_of(vec![
        primitive("a", PrimitiveType::Int64, true),
        primitive("b", PrimitiveType::String, true),
    ]);
    let rows: Vec<_> = (0..1000)
        .map(|i| {
            vec![
                if i % 7 == 0 { ParquetValue::Null } else { ParquetValue::Int64(i) },
                if i % 3 == 0 { ParquetValue::Null } else { string("text") },
            ]
        })
        .collect();
    for codec in SUPPORTED {
        let builder = WriterBuilder::new().with_compression(codec);
        test_roundtrip_with_options(rows.clone(), schema.clone(), builder).unwrap();
    }
}

#[test]
fn test_unsupported_codecs_are_rejected_by_the_writer() {
    for codec in [Compression::Brotli, Compression::Lzo] {
        let mut buffer = Vec::new();
        let err = WriterBuilder::new()
            .with_compression(codec)
            .build(&mut buffer, create_test_schema())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedCodec);
        assert!(err.is_unsupported());
    }
}
