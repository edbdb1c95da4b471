//! Schema-driven extraction from a captured document
//!
//! Extraction runs on a [`PageSnapshot`] (URL plus serialized HTML), not on a live
//! tab, so it can be tested against saved pages without a browser.

pub mod record;

pub use record::Record;

use crate::error::{Result, ScrapeError};
use crate::schema::{Arity, FieldRule, Schema, Source};
use indexmap::IndexSet;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::path::Path;
use url::Url;

/// Rendered page handed from the navigation stage to extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// URL of the document, used to resolve relative links
    pub url: String,

    /// Serialized HTML of the document
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self { url: url.into(), html: html.into() }
    }

    /// Load a saved HTML file; `url` is the address it was captured from, if known
    pub fn from_file(path: impl AsRef<Path>, url: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        let url = match url {
            Some(url) => url.to_string(),
            None => Url::from_file_path(std::path::absolute(path).map_err(|e| ScrapeError::io(path, e))?)
                .map(String::from)
                .unwrap_or_default(),
        };
        Ok(Self { url, html })
    }
}

struct CompiledField {
    rule: FieldRule,
    selector: Selector,
}

/// Applies a [`Schema`] to page snapshots
pub struct Extractor {
    schema: Schema,
    fields: Vec<CompiledField>,
}

impl Extractor {
    /// Validate the schema and compile its selectors
    pub fn new(schema: Schema) -> Result<Self> {
        schema.validate()?;

        let fields = schema
            .fields
            .iter()
            .map(|rule| Ok(CompiledField { selector: rule.compile()?, rule: rule.clone() }))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { schema, fields })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Extract every field and check the schema's required field
    pub fn extract(&self, page: &PageSnapshot) -> Result<Record> {
        let record = self.extract_all(page);

        if let Some(required) = &self.schema.required {
            if !record.is_present(required) {
                return Err(ScrapeError::MissingRequiredField { field: required.clone(), url: page.url.clone() });
            }
        }

        log::info!(
            "Extracted {}/{} fields from {}",
            record.count_present(),
            record.len(),
            page.url
        );
        Ok(record)
    }

    /// Extract every field; missing matches become `null` or empty lists
    pub fn extract_all(&self, page: &PageSnapshot) -> Record {
        let document = Html::parse_document(&page.html);
        let base = Url::parse(&page.url).ok();

        let mut record = Record::new();
        for field in &self.fields {
            let value = field.extract(&document, base.as_ref());
            if value.is_null() {
                log::debug!("Field '{}' not found ({})", field.rule.name, field.rule.selector);
            }
            record.insert(field.rule.name.clone(), value);
        }
        record
    }
}

impl CompiledField {
    fn extract(&self, document: &Html, base: Option<&Url>) -> Value {
        let mut values = document
            .select(&self.selector)
            .flat_map(|element| self.read(element, base))
            .filter_map(|value| self.post_process(value));

        match self.rule.arity {
            Arity::Single => values.next().unwrap_or(Value::Null),
            Arity::Multiple => self.collect(values),
        }
    }

    /// Values read from one matched element; JSON arrays expand in multiple mode
    fn read(&self, element: ElementRef<'_>, base: Option<&Url>) -> Vec<Value> {
        let rule = &self.rule;
        let value = match rule.source {
            Source::Text => Some(Value::String(normalize_text(element.text()))),
            Source::Href => element.value().attr("href").map(|href| Value::String(resolve_href(base, href))),
            Source::Attribute => rule
                .attribute
                .as_deref()
                .and_then(|name| element.value().attr(name))
                .map(|raw| Value::String(raw.trim().to_string())),
            Source::Json => self.read_json(element),
        };

        match (value, rule.arity) {
            (Some(Value::Array(items)), Arity::Multiple) => items,
            (Some(Value::Null), _) | (None, _) => Vec::new(),
            (Some(value), _) => vec![value],
        }
    }

    fn read_json(&self, element: ElementRef<'_>) -> Option<Value> {
        let raw = element.value().attr(self.rule.attribute.as_deref()?)?;
        let document: Value = match serde_json::from_str(raw) {
            Ok(document) => document,
            Err(e) => {
                log::debug!("Field '{}': embedded JSON did not parse: {}", self.rule.name, e);
                return None;
            }
        };

        match self.rule.pointer.as_deref() {
            Some(pointer) => document.pointer(pointer).cloned(),
            None => Some(document),
        }
    }

    /// Apply `strip_prefix` and `exclude` to a single value
    fn post_process(&self, value: Value) -> Option<Value> {
        let Value::String(mut text) = value else {
            return Some(value);
        };

        if let Some(prefix) = &self.rule.strip_prefix {
            if let Some(rest) = text.strip_prefix(prefix.as_str()) {
                text = rest.to_string();
            }
        }

        if self.rule.exclude.iter().any(|fragment| text.contains(fragment.as_str())) {
            return None;
        }

        Some(Value::String(text))
    }

    fn collect(&self, values: impl Iterator<Item = Value>) -> Value {
        let values: Vec<Value> = if self.rule.unique {
            // Value is not Hash, so dedupe on the serialized form
            let mut seen = IndexSet::new();
            values.filter(|value| seen.insert(value.to_string())).collect()
        } else {
            values.collect()
        };

        let values: Vec<Value> = match self.rule.limit {
            Some(limit) => values.into_iter().take(limit).collect(),
            None => values,
        };

        match &self.rule.join {
            Some(_) if values.is_empty() => Value::Null,
            Some(separator) => Value::String(values.iter().map(value_text).collect::<Vec<_>>().join(separator)),
            None => Value::Array(values),
        }
    }
}

/// Collapse runs of whitespace the way rendered text reads
fn normalize_text<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments.flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Resolve a possibly relative link against the page URL
fn resolve_href(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    base.and_then(|base| base.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| href.to_string())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
