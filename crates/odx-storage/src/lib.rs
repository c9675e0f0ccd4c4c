//! Storage layer for odx
//!
//! This crate provides:
//! - The record sink contract used by the extraction engine
//! - A sink writing one pretty-printed JSON file per record

pub mod error;
pub mod sink;

pub use error::{Result, StorageError};
pub use sink::{JsonFileSink, RecordSink, to_pretty_json};
