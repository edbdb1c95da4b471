//! JSON persistence stage

use crate::error::{Result, ScrapeError};
use crate::extract::Record;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Writes extracted records to a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
    merge: bool,
    dedupe_key: Option<String>,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), merge: false, dedupe_key: None }
    }

    /// Builder method: append to an existing array file instead of replacing it
    pub fn merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Builder method: when merging, skip new records whose value for `key` already exists
    pub fn dedupe_key(mut self, key: Option<String>) -> Self {
        self.dedupe_key = key;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a single record as a JSON object
    pub fn write_record(&self, record: &Record) -> Result<()> {
        if self.merge {
            return self.write_records(std::slice::from_ref(record)).map(|_| ());
        }
        self.write_json(record)
    }

    /// Write records as a JSON array, returning how many new records were written
    pub fn write_records(&self, records: &[Record]) -> Result<usize> {
        if !self.merge {
            self.write_json(&records)?;
            return Ok(records.len());
        }

        let mut combined = self.read_existing()?;
        let mut seen: HashSet<String> = match &self.dedupe_key {
            Some(key) => combined.iter().filter_map(|item| key_value(item, key)).collect(),
            None => HashSet::new(),
        };

        let mut added = 0;
        for record in records {
            let key = self.dedupe_key.as_deref().and_then(|key| record.get(key).and_then(key_text));

            // A key seen in the file or earlier in this call marks a duplicate
            if let Some(key) = key {
                if !seen.insert(key) {
                    log::debug!("Skipping record already present in {}", self.path.display());
                    continue;
                }
            }
            combined.push(record.clone().into_value());
            added += 1;
        }

        self.write_json(&combined)?;
        Ok(added)
    }

    /// Existing records, or an empty list if the file is missing or unreadable as JSON
    fn read_existing(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let text = std::fs::read_to_string(&self.path).map_err(|e| ScrapeError::io(&self.path, e))?;
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(Value::Null) => Ok(Vec::new()),
            Ok(other) => Ok(vec![other]),
            Err(e) => {
                log::warn!("Ignoring unreadable existing output {}: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScrapeError::io(parent, e))?;
        }

        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        std::fs::write(&self.path, json).map_err(|e| ScrapeError::io(&self.path, e))?;

        log::info!("Data saved to {}", self.path.display());
        Ok(())
    }
}

fn key_value(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(key_text)
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
