//! Extraction schemas
//!
//! A schema maps logical field names to lookup rules, so the same extraction
//! code serves any target page. Schemas are plain TOML:
//!
//! ```toml
//! name = "example"
//! landmark = "h1.title"
//! required = "title"
//!
//! [[fields]]
//! name = "title"
//! selector = "h1.title"
//!
//! [[fields]]
//! name = "tags"
//! selector = "a.tag"
//! arity = "multiple"
//! ```
//!
//! Built-in schemas for the supported sites live in [`presets`].

pub mod presets;

use crate::error::{Result, ScrapeError};
use crate::reveal::RevealConfig;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::{Path, PathBuf}, time::Duration};

/// Default time to wait for the landmark element
pub const DEFAULT_LANDMARK_TIMEOUT_SECS: u64 = 15;

/// How many matches a field collects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    /// First match only; absent becomes `null`
    #[default]
    Single,
    /// All matches, as a list (or a joined string when `join` is set)
    Multiple,
}

/// Where a field's value is read from on each matched element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Whitespace-normalized text content
    #[default]
    Text,
    /// `href` attribute resolved against the page URL
    Href,
    /// Raw value of the attribute named by `attribute`
    Attribute,
    /// JSON embedded in the attribute named by `attribute`, narrowed by `pointer`
    Json,
}

/// Lookup rule for one output field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Key in the output record
    pub name: String,

    /// CSS selector matching the element(s) to read
    pub selector: String,

    #[serde(default)]
    pub arity: Arity,

    #[serde(default)]
    pub source: Source,

    /// Attribute name for `attribute` and `json` sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// JSON pointer (RFC 6901) into the embedded document, e.g. `/props/company/name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,

    /// Prefix removed from each value, e.g. `mailto:`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,

    /// Keep at most this many values (multiple only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Join multiple values into one string with this separator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,

    /// Drop repeated values, keeping first occurrences (multiple only)
    #[serde(default)]
    pub unique: bool,

    /// Drop values containing any of these substrings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl FieldRule {
    /// Single-match text field
    pub fn text(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            arity: Arity::Single,
            source: Source::Text,
            attribute: None,
            pointer: None,
            strip_prefix: None,
            limit: None,
            join: None,
            unique: false,
            exclude: Vec::new(),
        }
    }

    /// Builder method: collect every match
    pub fn multiple(mut self) -> Self {
        self.arity = Arity::Multiple;
        self
    }

    /// Builder method: read the resolved `href`
    pub fn href(mut self) -> Self {
        self.source = Source::Href;
        self
    }

    /// Builder method: read a raw attribute
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.source = Source::Attribute;
        self.attribute = Some(attribute.into());
        self
    }

    /// Builder method: read embedded JSON from an attribute
    pub fn json(mut self, attribute: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.source = Source::Json;
        self.attribute = Some(attribute.into());
        self.pointer = Some(pointer.into());
        self
    }

    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn join(mut self, separator: impl Into<String>) -> Self {
        self.join = Some(separator.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn exclude(mut self, fragment: impl Into<String>) -> Self {
        self.exclude.push(fragment.into());
        self
    }

    /// Parse the selector, mapping failures to `InvalidSchema`
    pub fn compile(&self) -> Result<Selector> {
        parse_selector(&self.selector)
            .map_err(|e| ScrapeError::InvalidSchema(format!("field '{}': {}", self.name, e)))
    }

    fn validate(&self) -> Result<()> {
        self.compile()?;

        let needs_attribute = matches!(self.source, Source::Attribute | Source::Json);
        if needs_attribute && self.attribute.as_deref().is_none_or(str::is_empty) {
            return Err(ScrapeError::InvalidSchema(format!(
                "field '{}': source '{:?}' requires an attribute name",
                self.name, self.source
            )));
        }

        if let Some(pointer) = &self.pointer {
            if !pointer.is_empty() && !pointer.starts_with('/') {
                return Err(ScrapeError::InvalidSchema(format!(
                    "field '{}': JSON pointer must be empty or start with '/': {}",
                    self.name, pointer
                )));
            }
        }

        if self.arity == Arity::Single && (self.limit.is_some() || self.join.is_some() || self.unique) {
            return Err(ScrapeError::InvalidSchema(format!(
                "field '{}': limit, join and unique only apply to arity = \"multiple\"",
                self.name
            )));
        }

        Ok(())
    }
}

/// A named set of field rules plus how to prepare the page before extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema identifier, used in logs
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default target URL; `{id}` is replaced per target in batch mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Default output file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Element that must appear before extraction starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,

    #[serde(default = "default_landmark_timeout")]
    pub landmark_timeout_secs: u64,

    /// Field whose absence fails the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,

    /// Field used to skip duplicates when merging into an existing output file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,

    /// Scroll the page to the bottom before capturing it
    #[serde(default)]
    pub reveal: bool,

    /// Reveal policy overrides for this site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_config: Option<RevealConfig>,

    pub fields: Vec<FieldRule>,
}

fn default_landmark_timeout() -> u64 {
    DEFAULT_LANDMARK_TIMEOUT_SECS
}

impl Schema {
    /// Parse and validate a schema from TOML text
    pub fn from_toml(source: &str) -> Result<Self> {
        let schema: Schema = toml::from_str(source)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        Self::from_toml(&source).map_err(|e| match e {
            ScrapeError::Toml(e) => ScrapeError::InvalidSchema(format!("{}: {}", path.display(), e)),
            other => other,
        })
    }

    /// Landmark wait budget
    pub fn landmark_timeout(&self) -> Duration {
        Duration::from_secs(self.landmark_timeout_secs)
    }

    /// Look up a field rule by name
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check selectors, field names and cross references
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(ScrapeError::InvalidSchema(format!("schema '{}' has no fields", self.name)));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ScrapeError::InvalidSchema(format!("duplicate field '{}'", field.name)));
            }
            field.validate()?;
        }

        if let Some(landmark) = &self.landmark {
            parse_selector(landmark).map_err(|e| ScrapeError::InvalidSchema(format!("landmark: {}", e)))?;
        }

        for (role, name) in [("required", &self.required), ("dedupe_key", &self.dedupe_key)] {
            if let Some(name) = name {
                if self.field(name).is_none() {
                    return Err(ScrapeError::InvalidSchema(format!("{} field '{}' is not defined", role, name)));
                }
            }
        }

        if let Some(config) = &self.reveal_config {
            config.validate()?;
        }

        Ok(())
    }
}

/// Parse a CSS selector without panicking on invalid input
fn parse_selector(selector: &str) -> std::result::Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector {:?}: {}", selector, e))
}
