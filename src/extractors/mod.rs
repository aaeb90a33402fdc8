//! HTML extraction
//!
//! - `select`: CSS selector evaluation on top of scraper
//! - `field`: single field extraction and coercion
//! - `record`: record building from a mapping

mod field;
mod record;
pub mod select;

pub use field::{coerce, extract_field, Value};
pub use record::{build, extract, Record};
