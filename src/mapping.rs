//! Mapping descriptions
//!
//! A mapping binds CSS selectors to record fields. It is declared once,
//! either through the builder methods on [`SchemaSpec`] or as JSON, and
//! compiled into a [`Mapping`] whose selectors are parsed up front.
//!
//! JSON form:
//!
//! ```json
//! {
//!   "root": "div#Wrapper",
//!   "fields": [{"name": "total", "selector": "input.page_input", "accessor": "attr:max", "type": "int"}],
//!   "children": [{
//!     "name": "items",
//!     "selector": "div.cell.item",
//!     "fields": [{"name": "title", "selector": "span.item_title"}],
//!     "derived": [{"name": "id", "source": "link", "kind": "path_segment", "prefix": "/t/", "terminator": "#"}]
//!   }],
//!   "validity": {"children": "items", "title_field": "title"}
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::derived::Derivation;
use crate::error::ExtractError;
use crate::extractors::Record;
use crate::validity;

/// How the raw string of a field is read from the matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Text content including descendants
    Text,
    /// Text nodes directly owned by the element
    OwnText,
    /// Value of the named attribute
    Attr(String),
}

impl Accessor {
    /// Parse an accessor string: `text`, `own_text` or `attr:<name>`
    pub fn parse(accessor: &str) -> Result<Self, ExtractError> {
        match accessor.trim() {
            "" | "text" => Ok(Accessor::Text),
            "own_text" => Ok(Accessor::OwnText),
            other => match other.strip_prefix("attr:") {
                Some(name) if !name.trim().is_empty() => Ok(Accessor::Attr(name.trim().to_string())),
                _ => Err(ExtractError::InvalidMapping(format!(
                    "unknown accessor '{}'",
                    accessor
                ))),
            },
        }
    }
}

/// Primitive type a field is coerced into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Int,
}

/// Declared field of a derived attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedField {
    /// Name the derived value is read back by
    pub name: String,
    /// Raw field the value is computed from
    pub source: String,
    #[serde(flatten)]
    pub derivation: Derivation,
}

/// Which child list and which of its fields decide validity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityRule {
    pub children: String,
    pub title_field: String,
}

/// Uncompiled field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    /// `text` (default), `own_text` or `attr:<name>`
    #[serde(default)]
    pub accessor: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
}

/// Uncompiled repeated-child declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildSpec {
    pub name: String,
    pub selector: String,
    #[serde(flatten)]
    pub schema: SchemaSpec,
}

/// Uncompiled schema: fields, child lists, derived fields and validity rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSpec {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub children: Vec<ChildSpec>,
    #[serde(default)]
    pub derived: Vec<DerivedField>,
    #[serde(default)]
    pub validity: Option<ValidityRule>,
}

impl SchemaSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with an explicit accessor and type
    pub fn field(mut self, name: &str, selector: &str, accessor: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            selector: selector.to_string(),
            accessor: Some(accessor.to_string()),
            field_type,
        });
        self
    }

    pub fn text(self, name: &str, selector: &str) -> Self {
        self.field(name, selector, "text", FieldType::String)
    }

    pub fn own_text(self, name: &str, selector: &str) -> Self {
        self.field(name, selector, "own_text", FieldType::String)
    }

    pub fn attr(self, name: &str, selector: &str, attr: &str) -> Self {
        self.field(name, selector, &format!("attr:{}", attr), FieldType::String)
    }

    pub fn int(self, name: &str, selector: &str) -> Self {
        self.field(name, selector, "text", FieldType::Int)
    }

    /// Declare a repeated child record, one per match of `selector`
    pub fn children(mut self, name: &str, selector: &str, schema: SchemaSpec) -> Self {
        self.children.push(ChildSpec {
            name: name.to_string(),
            selector: selector.to_string(),
            schema,
        });
        self
    }

    /// Declare a lazily computed field derived from `source`
    pub fn derive(mut self, name: &str, source: &str, derivation: Derivation) -> Self {
        self.derived.push(DerivedField {
            name: name.to_string(),
            source: source.to_string(),
            derivation,
        });
        self
    }

    pub fn validity(mut self, children: &str, title_field: &str) -> Self {
        self.validity = Some(ValidityRule {
            children: children.to_string(),
            title_field: title_field.to_string(),
        });
        self
    }

    fn compile(self) -> Result<Schema, ExtractError> {
        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in self.fields {
            if !names.insert(spec.name.clone()) {
                return Err(ExtractError::InvalidMapping(format!(
                    "duplicate field '{}'",
                    spec.name
                )));
            }
            let accessor = Accessor::parse(spec.accessor.as_deref().unwrap_or("text"))?;
            fields.push(Field {
                selector: compile_selector(&spec.selector)?,
                selector_text: spec.selector,
                name: spec.name,
                accessor,
                field_type: spec.field_type,
            });
        }

        let mut children = Vec::with_capacity(self.children.len());
        for spec in self.children {
            if !names.insert(spec.name.clone()) {
                return Err(ExtractError::InvalidMapping(format!(
                    "duplicate field '{}'",
                    spec.name
                )));
            }
            children.push(Child {
                selector: compile_selector(&spec.selector)?,
                selector_text: spec.selector,
                name: spec.name,
                schema: spec.schema.compile()?,
            });
        }

        for derived in &self.derived {
            match fields.iter().find(|f| f.name == derived.source) {
                None => {
                    return Err(ExtractError::InvalidMapping(format!(
                        "derived field '{}' reads unknown field '{}'",
                        derived.name, derived.source
                    )));
                }
                Some(f) if f.field_type != FieldType::String => {
                    return Err(ExtractError::InvalidMapping(format!(
                        "derived field '{}' reads non-string field '{}'",
                        derived.name, derived.source
                    )));
                }
                Some(_) => {}
            }
            if !names.insert(derived.name.clone()) {
                return Err(ExtractError::InvalidMapping(format!(
                    "duplicate field '{}'",
                    derived.name
                )));
            }
        }

        let validity = match self.validity {
            Some(rule) => {
                let child = children
                    .iter()
                    .find(|c| c.name == rule.children)
                    .ok_or_else(|| {
                        ExtractError::InvalidMapping(format!(
                            "validity rule names unknown child list '{}'",
                            rule.children
                        ))
                    })?;
                if !child.schema.fields.iter().any(|f| f.name == rule.title_field) {
                    return Err(ExtractError::InvalidMapping(format!(
                        "validity rule names unknown field '{}' of '{}'",
                        rule.title_field, rule.children
                    )));
                }
                Some(rule)
            }
            // First child list, keyed on its first string field
            None => children.first().and_then(|child| {
                child
                    .schema
                    .fields
                    .iter()
                    .find(|f| f.field_type == FieldType::String)
                    .map(|f| ValidityRule {
                        children: child.name.clone(),
                        title_field: f.name.clone(),
                    })
            }),
        };

        Ok(Schema {
            fields,
            children,
            derived: self.derived.into(),
            validity,
        })
    }
}

/// Uncompiled mapping: root scope selector plus the schema read inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSpec {
    pub root: String,
    #[serde(flatten)]
    pub schema: SchemaSpec,
}

impl MappingSpec {
    pub fn new(root: &str, schema: SchemaSpec) -> Self {
        Self {
            root: root.to_string(),
            schema,
        }
    }

    /// Parse every selector and check cross references
    pub fn compile(self) -> Result<Mapping, ExtractError> {
        Ok(Mapping {
            root: compile_selector(&self.root)?,
            root_text: self.root,
            schema: self.schema.compile()?,
        })
    }
}

/// Compiled scalar field declaration
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub selector: Selector,
    pub selector_text: String,
    pub accessor: Accessor,
    pub field_type: FieldType,
}

/// Compiled repeated-child declaration
#[derive(Debug, Clone)]
pub struct Child {
    pub name: String,
    pub selector: Selector,
    pub selector_text: String,
    pub schema: Schema,
}

/// Compiled schema for one record type
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    children: Vec<Child>,
    derived: Arc<[DerivedField]>,
    validity: Option<ValidityRule>,
}

impl Schema {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Derived declarations, shared with every record built from this schema
    pub fn derived(&self) -> &Arc<[DerivedField]> {
        &self.derived
    }

    pub fn validity(&self) -> Option<&ValidityRule> {
        self.validity.as_ref()
    }
}

/// Immutable, compiled mapping description
#[derive(Debug, Clone)]
pub struct Mapping {
    root: Selector,
    root_text: String,
    schema: Schema,
}

impl Mapping {
    /// Load and compile a mapping from its JSON form
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        serde_json::from_str::<MappingSpec>(json)?.compile()
    }

    pub fn root(&self) -> &Selector {
        &self.root
    }

    pub fn root_text(&self) -> &str {
        &self.root_text
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validity verdict for a record built from this mapping
    pub fn is_valid(&self, record: &Record) -> bool {
        validity::is_valid(record, self.schema.validity())
    }
}

fn compile_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}
