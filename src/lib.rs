//! Declarative HTML record extraction
//!
//! Builds records out of HTML documents from a mapping description:
//! - CSS selector bound fields (text, own text, attributes) coerced to strings or integers
//! - Repeated child records in document order
//! - Lazily computed, memoized derived fields (ids, usernames, avatar URLs, time phrases)
//! - A validity verdict telling empty results apart from markup mismatches
//! - FFI entry points taking the mapping as JSON

pub mod avatar;
pub mod derived;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod mapping;
pub mod topics;
pub mod validity;

pub use error::ExtractError;
pub use extractors::{build, extract, Record, Value};
pub use ffi::*;
pub use mapping::{Accessor, FieldType, Mapping, MappingSpec, SchemaSpec};
pub use topics::{MyTopicsInfo, TopicItem};
pub use validity::is_valid;
