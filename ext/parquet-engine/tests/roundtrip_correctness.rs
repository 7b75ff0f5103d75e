use bytes::Bytes;
use num::BigInt;
use ordered_float::OrderedFloat;
use parquet_engine::*;
use std::sync::Arc;

use test_helpers::*;

fn all_types_schema() -> Schema {
    schema_of(vec![
        primitive("bool_val", PrimitiveType::Boolean, false),
        primitive("int8_val", PrimitiveType::Int8, false),
        primitive("int16_val", PrimitiveType::Int16, false),
        primitive("int32_val", PrimitiveType::Int32, false),
        primitive("int64_val", PrimitiveType::Int64, false),
        primitive("uint8_val", PrimitiveType::UInt8, false),
        primitive("uint16_val", PrimitiveType::UInt16, false),
        primitive("uint32_val", PrimitiveType::UInt32, false),
        primitive("uint64_val", PrimitiveType::UInt64, false),
        primitive("float16_val", PrimitiveType::Float16, false),
        primitive("float32_val", PrimitiveType::Float32, false),
        primitive("float64_val", PrimitiveType::Float64, false),
        primitive("decimal9_val", PrimitiveType::Decimal128(9, 2), false),
        primitive("decimal18_val", PrimitiveType::Decimal128(18, 4), false),
        primitive("decimal38_val", PrimitiveType::Decimal128(38, 10), false),
        primitive("decimal256_val", PrimitiveType::Decimal256(50, 5), false),
        primitive("string_val", PrimitiveType::String, false),
        primitive("binary_val", PrimitiveType::Binary, false),
        primitive("uuid_val", PrimitiveType::Uuid, false),
        primitive("fixed_val", PrimitiveType::FixedLenByteArray(4), false),
        primitive("date_val", PrimitiveType::Date32, false),
        primitive("time_ms_val", PrimitiveType::TimeMillis, false),
        primitive("time_us_val", PrimitiveType::TimeMicros, false),
        primitive("time_ns_val", PrimitiveType::TimeNanos, false),
        primitive("ts_ms_val", PrimitiveType::TimestampMillis(None), false),
        primitive(
            "ts_us_val",
            PrimitiveType::TimestampMicros(Some(Arc::from("UTC"))),
            false,
        ),
        primitive("ts_ns_val", PrimitiveType::TimestampNanos(None), false),
    ])
}

fn all_types_row(i: i64) -> Vec<ParquetValue> {
    let sign = if i % 2 == 0 { 1 } else { -1 };
    vec![
        ParquetValue::Boolean(i % 3 == 0),
        ParquetValue::Int8((i % 100) as i8 * sign as i8),
        ParquetValue::Int16(i as i16 * 300 * sign as i16),
        ParquetValue::Int32(i as i32 * 100_000 * sign),
        ParquetValue::Int64(i * 10_000_000_000 * sign as i64),
        ParquetValue::UInt8(200 + (i % 50) as u8),
        ParquetValue::UInt16(60_000 + i as u16),
        ParquetValue::UInt32(4_000_000_000 + i as u32),
        ParquetValue::UInt64(u64::MAX - i as u64),
        ParquetValue::Float16(OrderedFloat(1.5 * i as f32)),
        ParquetValue::Float32(OrderedFloat(i as f32 * 0.25)),
        ParquetValue::Float64(OrderedFloat(i as f64 * -1.125)),
        ParquetValue::Decimal128(1234567 * sign as i128, 2),
        ParquetValue::Decimal128(123_456_789_012_345 * i as i128, 4),
        ParquetValue::Decimal128(-12_345_678_901_234_567_890_123_456_789 + i as i128, 10),
        ParquetValue::Decimal256(
            BigInt::parse_bytes(b"123456789012345678901234567890123456789012345", 10).unwrap()
                * BigInt::from(sign),
            5,
        ),
        ParquetValue::String(Arc::from(format!("row {} ✓", i))),
        ParquetValue::Bytes(Bytes::from(vec![i as u8, 0, 255, 7])),
        ParquetValue::Uuid(uuid::Uuid::from_u128(0x1234_5678_9abc_def0 + i as u128)),
        ParquetValue::Bytes(Bytes::from(vec![1, 2, 3, i as u8])),
        ParquetValue::Date32(18628 + i as i32),
        ParquetValue::TimeMillis(43_200_000 + i as i32),
        ParquetValue::TimeMicros(43_200_000_000 + i),
        ParquetValue::TimeNanos(43_200_000_000_000 + i),
        ParquetValue::TimestampMillis(1_609_459_200_000 + i, None),
        ParquetValue::TimestampMicros(1_609_459_200_000_000 + i, Some(Arc::from("UTC"))),
        ParquetValue::TimestampNanos(1_609_459_200_000_000_000 + i, None),
    ]
}

#[test]
fn test_all_primitive_types_roundtrip() {
    let rows: Vec<_> = (0..25).map(all_types_row).collect();
    test_roundtrip(rows, all_types_schema()).unwrap();
}

#[test]
fn test_all_primitive_types_roundtrip_dictionary_v2() {
    let rows: Vec<_> = (0..25).map(all_types_row).collect();
    let builder = WriterBuilder::new()
        .with_encoding(WriterEncoding::Dictionary)
        .with_data_page_version(DataPageVersion::V2)
        .with_max_page_rows(6);
    test_roundtrip_with_options(rows, all_types_schema(), builder).unwrap();
}

#[test]
fn test_logical_types_reported_by_info() {
    let data = write_with(
        WriterBuilder::new(),
        all_types_schema(),
        vec![all_types_row(1)],
    )
    .unwrap();
    let info = Reader::new(data).unwrap().info();
    let column = |path: &str| {
        info.columns
            .iter()
            .find(|c| c.path == path)
            .unwrap_or_else(|| panic!("no column {}", path))
    };

    assert_eq!(column("uint64_val").physical_type, "INT64");
    assert_eq!(column("decimal256_val").physical_type, "FIXED_LEN_BYTE_ARRAY");
    assert_eq!(column("decimal9_val").physical_type, "INT32");
    assert_eq!(column("uuid_val").logical_type, "Uuid");
    assert_eq!(column("string_val").logical_type, "String");
    assert_eq!(column("ts_us_val").physical_type, "INT64");
}

#[test]
fn test_empty_collections_roundtrip() {
    let schema = schema_of(vec![
        SchemaNode::List {
            name: "list".to_string(),
            nullable: false,
            item: Box::new(primitive("element", PrimitiveType::Int32, false)),
        },
        SchemaNode::Map {
            name: "map".to_string(),
            nullable: false,
            key: Box::new(primitive("key", PrimitiveType::String, false)),
            value: Box::new(primitive("value", PrimitiveType::Int32, false)),
        },
        primitive("s", PrimitiveType::String, false),
        primitive("b", PrimitiveType::Binary, false),
    ]);

    let rows = vec![
        vec![
            ParquetValue::List(vec![]),
            ParquetValue::Map(vec![]),
            string(""),
            ParquetValue::Bytes(Bytes::new()),
        ],
        vec![
            ParquetValue::List(vec![ParquetValue::Int32(1)]),
            ParquetValue::Map(vec![(string(""), ParquetValue::Int32(0))]),
            string("x"),
            ParquetValue::Bytes(Bytes::from_static(b"\0")),
        ],
    ];
    test_roundtrip(rows, schema).unwrap();
}

#[test]
fn test_many_row_groups_and_pages() {
    let rows = generate_test_rows(1000);
    let builder = WriterBuilder::new()
        .with_row_group_size(128)
        .with_max_page_rows(50);
    let data = write_with(builder, create_test_schema(), rows.clone()).unwrap();

    let reader = Reader::new(data.clone()).unwrap();
    let info = reader.info();
    assert_eq!(info.num_rows, 1000);
    assert_eq!(info.num_row_groups, 8);

    assert_eq!(read_values(data).unwrap(), rows);
}

#[test]
fn test_empty_file_roundtrip() {
    let data = write_with(WriterBuilder::new(), create_test_schema(), vec![]).unwrap();
    let mut reader = Reader::new(data).unwrap();
    let info = reader.info();
    assert_eq!(info.num_rows, 0);
    assert_eq!(info.num_row_groups, 0);
    assert_eq!(info.columns.len(), 4);
    assert!(reader.rows(10).unwrap().is_empty());
}

#[test]
fn test_key_value_metadata_and_created_by() {
    let builder = WriterBuilder::new()
        .with_metadata("origin", "unit-test")
        .with_created_by("engine tests");
    let data = write_with(builder, create_test_schema(), generate_test_rows(3)).unwrap();
    let info = Reader::new(data).unwrap().info();
    assert_eq!(info.created_by.as_deref(), Some("engine tests"));
    assert_eq!(
        info.key_value_metadata.get("origin"),
        Some(&Some("unit-test".to_string()))
    );
    assert_eq!(info.version, 1);
}

#[test]
fn test_info_serializes_to_json() {
    let data = write_with(WriterBuilder::new(), create_test_schema(), generate_test_rows(2)).unwrap();
    let info = Reader::new(data).unwrap().info();
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["num_rows"], 2);
    assert_eq!(json["columns"][0]["path"], "id");
    assert_eq!(json["columns"][1]["repetition"], "Optional");
}
