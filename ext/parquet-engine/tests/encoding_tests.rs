use parquet_engine::basic::Encoding;
use parquet_engine::*;
use std::sync::Arc;

use test_helpers::*;

fn mixed_schema() -> Schema {
    schema_of(vec![
        primitive("small", PrimitiveType::Int32, false),
        primitive("big", PrimitiveType::Int64, true),
        primitive("label", PrimitiveType::String, true),
        primitive("ratio", PrimitiveType::Float32, false),
        primitive("flag", PrimitiveType::Boolean, true),
    ])
}

fn mixed_rows(count: usize) -> Vec<Vec<ParquetValue>> {
    (0..count)
        .map(|i| {
            vec![
                ParquetValue::Int32(i as i32 * 3 - 500),
                if i % 11 == 0 {
                    ParquetValue::Null
                } else {
                    ParquetValue::Int64(i64::MAX - (i as i64) * 1_000_003)
                },
                if i % 4 == 0 {
                    ParquetValue::Null
                } else {
                    ParquetValue::String(Arc::from(format!("label_{}", i % 17)))
                },
                ParquetValue::Float32(ordered_float::OrderedFloat(i as f32 / 8.0)),
                if i % 5 == 0 {
                    ParquetValue::Null
                } else {
                    ParquetValue::Boolean(i % 3 == 0)
                },
            ]
        })
        .collect()
}

fn chunk_encodings(data: bytes::Bytes, column: usize) -> Vec<Encoding> {
    Reader::new(data)
        .unwrap()
        .metadata()
        .row_group(0)
        .column(column)
        .encodings()
}

#[test]
fn test_encodings_and_page_versions_roundtrip() {
    let rows = mixed_rows(777);
    for encoding in [
        WriterEncoding::Plain,
        WriterEncoding::Dictionary,
        WriterEncoding::DeltaBinaryPacked,
    ] {
        for version in [DataPageVersion::V1, DataPageVersion::V2] {
            let builder = WriterBuilder::new()
                .with_encoding(encoding)
                .with_data_page_version(version)
                .with_max_page_rows(100);
            let data = write_with(builder, mixed_schema(), rows.clone()).unwrap();
            assert_eq!(
                read_values(data).unwrap(),
                rows,
                "{:?} encoding with {:?} pages",
                encoding,
                version
            );
        }
    }
}

#[test]
fn test_dictionary_encoding_is_recorded() {
    let builder = WriterBuilder::new().with_encoding(WriterEncoding::Dictionary);
    let data = write_with(builder, mixed_schema(), mixed_rows(100)).unwrap();

    let label = chunk_encodings(data.clone(), 2);
    assert!(label.contains(&Encoding::PlainDictionary), "{:?}", label);

    let reader = Reader::new(data.clone()).unwrap();
    assert!(reader
        .metadata()
        .row_group(0)
        .column(2)
        .dictionary_page_offset()
        .is_some());
    // booleans stay plain
    assert!(!chunk_encodings(data, 4).contains(&Encoding::PlainDictionary));
}

#[test]
fn test_v2_dictionary_uses_rle_dictionary() {
    let builder = WriterBuilder::new()
        .with_encoding(WriterEncoding::Dictionary)
        .with_data_page_version(DataPageVersion::V2);
    let data = write_with(builder, mixed_schema(), mixed_rows(100)).unwrap();
    assert!(chunk_encodings(data.clone(), 2).contains(&Encoding::RleDictionary));
    assert_eq!(Reader::new(data).unwrap().info().version, 2);
}

#[test]
fn test_dictionary_falls_back_to_plain_when_full() {
    let schema = schema_of(vec![primitive("s", PrimitiveType::String, false)]);
    let rows: Vec<_> = (0..2000)
        .map(|i| vec![ParquetValue::String(Arc::from(format!("unique value {:05}", i)))])
        .collect();
    let builder = WriterBuilder::new()
        .with_encoding(WriterEncoding::Dictionary)
        .with_dictionary_page_size_limit(1024)
        .with_max_page_rows(100);
    let data = write_with(builder, schema, rows.clone()).unwrap();

    let encodings = chunk_encodings(data.clone(), 0);
    assert!(encodings.contains(&Encoding::PlainDictionary), "{:?}", encodings);
    assert!(encodings.contains(&Encoding::Plain), "{:?}", encodings);
    assert_eq!(read_values(data).unwrap(), rows);
}

#[test]
fn test_delta_binary_packed_is_recorded_for_integers_only() {
    let builder = WriterBuilder::new().with_encoding(WriterEncoding::DeltaBinaryPacked);
    let data = write_with(builder, mixed_schema(), mixed_rows(300)).unwrap();
    assert!(chunk_encodings(data.clone(), 0).contains(&Encoding::DeltaBinaryPacked));
    assert!(chunk_encodings(data.clone(), 1).contains(&Encoding::DeltaBinaryPacked));
    assert!(!chunk_encodings(data, 2).contains(&Encoding::DeltaBinaryPacked));
}

#[test]
fn test_delta_handles_extreme_values() {
    let schema = schema_of(vec![
        primitive("a", PrimitiveType::Int64, false),
        primitive("b", PrimitiveType::Int32, false),
    ]);
    let values = [i64::MIN, i64::MAX, 0, -1, 1, i64::MIN + 1, i64::MAX - 1];
    let rows: Vec<_> = values
        .iter()
        .cycle()
        .take(300)
        .enumerate()
        .map(|(i, v)| {
            vec![
                ParquetValue::Int64(*v),
                ParquetValue::Int32(if i % 2 == 0 { i32::MIN } else { i32::MAX }),
            ]
        })
        .collect();
    let builder = WriterBuilder::new().with_encoding(WriterEncoding::DeltaBinaryPacked);
    test_roundtrip_with_options(rows, schema, builder).unwrap();
}

#[test]
fn test_column_statistics() {
    let data = write_with(WriterBuilder::new(), mixed_schema(), mixed_rows(100)).unwrap();
    let reader = Reader::new(data).unwrap();
    let row_group = reader.metadata().row_group(0);

    let small = row_group.column(0).statistics().unwrap().unwrap();
    assert_eq!(small.min, Some(ParquetValue::Int32(-500)));
    assert_eq!(small.max, Some(ParquetValue::Int32(99 * 3 - 500)));
    assert_eq!(small.null_count, Some(0));

    let label = row_group.column(2).statistics().unwrap().unwrap();
    assert_eq!(label.null_count, Some(25));
    assert_eq!(label.min, Some(string("label_0")));
    assert_eq!(label.max, Some(string("label_9")));
}
