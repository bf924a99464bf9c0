// file: src/database/mod.rs
// description: relational persistence module exports
// reference: internal module structure

pub mod client;
pub mod insert;
pub mod schema;

pub use client::DatabaseClient;
pub use insert::{RecordCounts, RecordStore};
pub use schema::{SchemaManager, TABLES};
