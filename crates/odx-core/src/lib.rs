//! Core record model and tree editing for odx
//!
//! This crate contains:
//! - Page and record types shared by every stage of an extraction
//! - The path-addressed tree editor (metadata stripping, field paths)
//! - Core error type

pub mod error;
pub mod page;
pub mod tree;

pub use error::{Error, Result};
pub use page::{Page, Record, record_id};
pub use tree::{FieldPath, METADATA_KEY, RESULTS_KEY, apply_at_path, is_expansion, strip_metadata};
