//! Record building
//!
//! Walks a compiled mapping over a parsed document and produces a
//! [`Record`]: scalar values in declaration order, child records in
//! document order, and lazily computed derived fields.

use std::sync::Arc;

use scraper::{ElementRef, Html};
use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use super::field::{extract_field, Value};
use super::select;
use crate::derived::DerivedCache;
use crate::error::ExtractError;
use crate::mapping::{DerivedField, Mapping, Schema};

/// A populated record. Raw values are fixed once built; derived values
/// are computed on first read and cached.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<(String, Value)>,
    children: Vec<(String, Vec<Record>)>,
    derived: Arc<[DerivedField]>,
    cache: DerivedCache,
}

impl PartialEq for Record {
    /// Compares raw values and children; cache state is ignored
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.children == other.children
    }
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// String field value, `""` when the field is missing or not a string
    pub fn string(&self, name: &str) -> &str {
        self.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// Integer field value, `0` when the field is missing or not an integer
    pub fn int(&self, name: &str) -> i64 {
        self.get(name).and_then(Value::as_int).unwrap_or(0)
    }

    /// Scalar fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Child records of a repeated declaration, in document order
    pub fn children(&self, name: &str) -> &[Record] {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }

    /// Move a child list out of the record
    pub fn take_children(&mut self, name: &str) -> Vec<Record> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| std::mem::take(c))
            .unwrap_or_default()
    }

    /// Derived value by name, computed on first access.
    ///
    /// `None` when no such derived field is declared, or when the
    /// derivation itself has no value (an empty username link).
    pub fn derived(&self, name: &str) -> Option<&str> {
        let index = self.derived.iter().position(|d| d.name == name)?;
        let decl = &self.derived[index];
        self.cache.get_or_compute(index, || {
            trace!(field = %decl.name, source = %decl.source, "computing derived field");
            decl.derivation.apply(self.string(&decl.source))
        })
    }

    /// Number of derived computations run on this record
    pub fn derived_computations(&self) -> usize {
        self.cache.computations()
    }

    /// JSON view with every derived field materialized
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        for (name, value) in &self.fields {
            map.insert(
                name.clone(),
                serde_json::to_value(value).unwrap_or(Json::Null),
            );
        }
        for decl in self.derived.iter() {
            let json = match self.derived(&decl.name) {
                Some(s) => Json::String(s.to_string()),
                None => Json::Null,
            };
            map.insert(decl.name.clone(), json);
        }
        for (name, children) in &self.children {
            map.insert(
                name.clone(),
                Json::Array(children.iter().map(Record::to_json).collect()),
            );
        }
        Json::Object(map)
    }
}

/// Parse `html` and build a record with `mapping`
#[tracing::instrument(skip(html, mapping), fields(html_len = html.len(), root = mapping.root_text()))]
pub fn extract(html: &str, mapping: &Mapping) -> Result<Record, ExtractError> {
    let document = Html::parse_document(html);
    build(&document, mapping)
}

/// Build a record from an already parsed document
pub fn build(document: &Html, mapping: &Mapping) -> Result<Record, ExtractError> {
    let Some(root) = select::root_scope(document, mapping.root()) else {
        debug!(selector = mapping.root_text(), "root selector matched nothing");
        return Err(ExtractError::RootNotFound {
            selector: mapping.root_text().to_string(),
        });
    };
    Ok(build_scope(root, mapping.schema()))
}

fn build_scope(scope: ElementRef<'_>, schema: &Schema) -> Record {
    let fields = schema
        .fields()
        .iter()
        .map(|field| (field.name.clone(), extract_field(scope, field)))
        .collect();

    let children = schema
        .children()
        .iter()
        .map(|child| {
            let records: Vec<Record> = select::select_scopes(scope, &child.selector)
                .into_iter()
                .map(|el| build_scope(el, &child.schema))
                .collect();
            trace!(child = %child.name, selector = %child.selector_text, count = records.len(), "built child records");
            (child.name.clone(), records)
        })
        .collect();

    Record {
        fields,
        children,
        derived: Arc::clone(schema.derived()),
        cache: DerivedCache::new(schema.derived().len()),
    }
}
