//! Field extraction and type coercion

use scraper::ElementRef;
use serde::Serialize;
use tracing::debug;

use super::select;
use crate::mapping::{Field, FieldType};

/// A raw scalar value, exactly as extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
}

impl Value {
    /// The value a field takes when nothing usable was found
    pub fn zero(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => Value::Str(String::new()),
            FieldType::Int => Value::Int(0),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(_) => None,
        }
    }
}

/// Resolve one declared field against `scope`.
///
/// Never fails: no match gives the zero value, and an integer field with
/// non-numeric text gives 0.
pub fn extract_field(scope: ElementRef<'_>, field: &Field) -> Value {
    match select::select_first(scope, &field.selector, &field.accessor) {
        Some(raw) => coerce(&field.name, &raw, field.field_type),
        None => Value::zero(field.field_type),
    }
}

/// Convert a raw string into the declared type
pub fn coerce(name: &str, raw: &str, field_type: FieldType) -> Value {
    match field_type {
        FieldType::String => Value::Str(raw.to_string()),
        FieldType::Int => match raw.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(e) => {
                debug!(field = name, raw, error = %e, "non-numeric value, using 0");
                Value::Int(0)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Accessor;
    use scraper::{Html, Selector};

    fn field(name: &str, selector: &str, accessor: Accessor, field_type: FieldType) -> Field {
        Field {
            name: name.to_string(),
            selector: Selector::parse(selector).unwrap(),
            selector_text: selector.to_string(),
            accessor,
            field_type,
        }
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("n", "42", FieldType::Int), Value::Int(42));
        assert_eq!(coerce("n", " 7 ", FieldType::Int), Value::Int(7));
        assert_eq!(coerce("n", "abc", FieldType::Int), Value::Int(0));
        assert_eq!(coerce("n", "", FieldType::Int), Value::Int(0));
        assert_eq!(coerce("s", "abc", FieldType::String), Value::Str("abc".to_string()));
    }

    #[test]
    fn test_extract_field() {
        let html = r#"
        <div class="cell item">
            <a class="count_livid" href="/t/1#reply12">12</a>
            <a class="node" href="/go/qna">问与答</a>
            <span class="votes">many</span>
        </div>
        "#;
        let document = Html::parse_document(html);
        let scope = document
            .select(&Selector::parse("div.cell.item").unwrap())
            .next()
            .unwrap();

        let comments = field("comments", "a[class^=count_]", Accessor::Text, FieldType::Int);
        assert_eq!(extract_field(scope, &comments), Value::Int(12));

        let votes = field("votes", "span.votes", Accessor::Text, FieldType::Int);
        assert_eq!(extract_field(scope, &votes), Value::Int(0));

        let tag = field("tag", "a.node", Accessor::Attr("href".to_string()), FieldType::String);
        assert_eq!(extract_field(scope, &tag), Value::Str("/go/qna".to_string()));

        let missing = field("missing", "img.avatar", Accessor::Attr("src".to_string()), FieldType::String);
        assert_eq!(extract_field(scope, &missing), Value::Str(String::new()));

        let missing_int = field("missing", "input.page_input", Accessor::Attr("max".to_string()), FieldType::Int);
        assert_eq!(extract_field(scope, &missing_int), Value::Int(0));
    }
}
