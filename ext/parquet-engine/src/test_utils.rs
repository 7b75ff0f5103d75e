//! Test utilities for parquet-engine

#[cfg(test)]
pub mod test {
    use crate::{
        ParquetValue, PrimitiveType, Reader, Row, Schema, SchemaBuilder, SchemaNode, WriterBuilder,
    };
    use bytes::Bytes;
    use indexmap::IndexMap;
    use ordered_float::OrderedFloat;
    use std::sync::Arc;

    pub fn primitive(name: &str, primitive_type: PrimitiveType, nullable: bool) -> SchemaNode {
        SchemaNode::Primitive {
            name: name.to_string(),
            primitive_type,
            nullable,
        }
    }

    pub fn schema_of(fields: Vec<SchemaNode>) -> Schema {
        SchemaBuilder::new()
            .with_root(SchemaNode::Struct {
                name: "schema".to_string(),
                nullable: false,
                fields,
            })
            .build()
            .unwrap()
    }

    /// id, name, age, salary
    pub fn sample_schema() -> Schema {
        schema_of(vec![
            primitive("id", PrimitiveType::Int64, false),
            primitive("name", PrimitiveType::String, true),
            primitive("age", PrimitiveType::Int32, true),
            primitive("salary", PrimitiveType::Float64, true),
        ])
    }

    /// A struct, a list and a map next to a required id
    pub fn complex_schema() -> Schema {
        schema_of(vec![
            primitive("id", PrimitiveType::Int64, false),
            SchemaNode::Struct {
                name: "address".to_string(),
                nullable: true,
                fields: vec![
                    primitive("street", PrimitiveType::String, false),
                    primitive("city", PrimitiveType::String, true),
                ],
            },
            SchemaNode::List {
                name: "tags".to_string(),
                nullable: true,
                item: Box::new(primitive("element", PrimitiveType::String, true)),
            },
            SchemaNode::Map {
                name: "attributes".to_string(),
                nullable: false,
                key: Box::new(primitive("key", PrimitiveType::String, false)),
                value: Box::new(primitive("value", PrimitiveType::Int32, true)),
            },
        ])
    }

    pub fn string(s: &str) -> ParquetValue {
        ParquetValue::String(Arc::from(s))
    }

    pub fn record(fields: Vec<(&str, ParquetValue)>) -> ParquetValue {
        ParquetValue::Record(
            fields
                .into_iter()
                .map(|(name, value)| (Arc::from(name), value))
                .collect(),
        )
    }

    /// Rows matching [`sample_schema`], every third with nulls
    pub fn sample_rows(count: usize) -> Vec<Vec<ParquetValue>> {
        (0..count)
            .map(|i| {
                if i % 3 == 2 {
                    vec![
                        ParquetValue::Int64(i as i64),
                        ParquetValue::Null,
                        ParquetValue::Int32((20 + i % 50) as i32),
                        ParquetValue::Null,
                    ]
                } else {
                    vec![
                        ParquetValue::Int64(i as i64),
                        ParquetValue::String(Arc::from(format!("Person{}", i))),
                        ParquetValue::Int32((20 + i % 50) as i32),
                        ParquetValue::Float64(OrderedFloat(50000.0 + (i as f64 * 1000.0))),
                    ]
                }
            })
            .collect()
    }

    /// Rows matching [`complex_schema`], covering null and empty containers
    pub fn complex_rows() -> Vec<Vec<ParquetValue>> {
        vec![
            vec![
                ParquetValue::Int64(1),
                record(vec![("street", string("Main St")), ("city", string("Springfield"))]),
                ParquetValue::List(vec![string("a"), ParquetValue::Null, string("b")]),
                ParquetValue::Map(vec![
                    (string("x"), ParquetValue::Int32(1)),
                    (string("y"), ParquetValue::Null),
                ]),
            ],
            vec![
                ParquetValue::Int64(2),
                ParquetValue::Null,
                ParquetValue::List(vec![]),
                ParquetValue::Map(vec![]),
            ],
            vec![
                ParquetValue::Int64(3),
                record(vec![("street", string("Elm St")), ("city", ParquetValue::Null)]),
                ParquetValue::Null,
                ParquetValue::Map(vec![(string("z"), ParquetValue::Int32(-5))]),
            ],
        ]
    }

    /// Writes `rows` with default settings and returns the file bytes
    pub fn write_to_bytes(schema: Schema, rows: Vec<Vec<ParquetValue>>) -> Bytes {
        let mut buf = Vec::new();
        let mut writer = WriterBuilder::new().build(&mut buf, schema).unwrap();
        writer.write_rows(rows).unwrap();
        writer.close().unwrap();
        Bytes::from(buf)
    }

    /// Reads every row of an in-memory file
    pub fn read_all(data: Bytes) -> Vec<Row> {
        Reader::new(data)
            .unwrap()
            .into_rows()
            .collect::<crate::Result<Vec<_>>>()
            .unwrap()
    }

    /// Field values of `row` as the writer took them
    pub fn row_values(row: &Row) -> Vec<ParquetValue> {
        row.values().cloned().collect()
    }

    /// Compare two ParquetValues for equality, handling floating point comparison
    pub fn values_equal(a: &ParquetValue, b: &ParquetValue) -> bool {
        match (a, b) {
            (ParquetValue::Float32(OrderedFloat(a)), ParquetValue::Float32(OrderedFloat(b))) => {
                (a - b).abs() < f32::EPSILON
            }
            (ParquetValue::Float64(OrderedFloat(a)), ParquetValue::Float64(OrderedFloat(b))) => {
                (a - b).abs() < f64::EPSILON
            }
            (ParquetValue::List(a), ParquetValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| values_equal(a, b))
            }
            (ParquetValue::Map(a), ParquetValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((k1, v1), (k2, v2))| values_equal(k1, k2) && values_equal(v1, v2))
            }
            (ParquetValue::Record(a), ParquetValue::Record(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
            }
            _ => a == b,
        }
    }

    /// Assert that two vectors of ParquetValues are equal
    pub fn assert_values_equal(expected: &[ParquetValue], actual: &[ParquetValue]) {
        assert_eq!(
            expected.len(),
            actual.len(),
            "Value vectors have different lengths: expected {}, got {}",
            expected.len(),
            actual.len()
        );

        for (i, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
            assert!(
                values_equal(e, a),
                "Values at index {} are not equal:\nExpected: {:?}\nActual: {:?}",
                i,
                e,
                a
            );
        }
    }

    pub fn row_from(fields: Vec<(&str, ParquetValue)>) -> Row {
        let fields: IndexMap<Arc<str>, ParquetValue> = fields
            .into_iter()
            .map(|(name, value)| (Arc::from(name), value))
            .collect();
        Row::new(fields)
    }
}

#[cfg(test)]
mod test_utils_tests {
    use super::test::*;
    use crate::ParquetValue;
    use ordered_float::OrderedFloat;

    #[test]
    fn test_sample_schema() {
        let schema = sample_schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "name", "age", "salary"]);
    }

    #[test]
    fn test_complex_rows_roundtrip() {
        let rows = complex_rows();
        let data = write_to_bytes(complex_schema(), rows.clone());
        let read = read_all(data);
        assert_eq!(read.len(), rows.len());
        for (expected, actual) in rows.iter().zip(&read) {
            assert_values_equal(expected, &row_values(actual));
        }
    }

    #[test]
    fn test_values_equal() {
        assert!(values_equal(&ParquetValue::Int32(42), &ParquetValue::Int32(42)));
        assert!(values_equal(
            &ParquetValue::Float32(OrderedFloat(1.0)),
            &ParquetValue::Float32(OrderedFloat(1.0 + f32::EPSILON / 2.0))
        ));
        assert!(values_equal(
            &record(vec![("a", ParquetValue::Int32(1))]),
            &record(vec![("a", ParquetValue::Int32(1))])
        ));
        assert!(!values_equal(&ParquetValue::Int32(42), &ParquetValue::Int32(43)));
        assert_eq!(
            row_from(vec![("id", ParquetValue::Int64(1))]).get("id"),
            Some(&ParquetValue::Int64(1))
        );
    }
}
