//! Read-only views over the crate's core types

pub mod schema;

pub use schema::SchemaInspector;
