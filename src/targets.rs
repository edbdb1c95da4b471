//! Target URL handling: normalization, `{id}` templates and URL list files

use crate::error::{Result, ScrapeError};
use std::path::Path;

/// Placeholder replaced by each id in a URL template
pub const ID_PLACEHOLDER: &str = "{id}";

/// Normalize an incomplete URL by adding a missing protocol
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();

    // Already has a scheme the browser understands
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("file://")
        || trimmed.starts_with("data:")
        || trimmed.starts_with("about:")
    {
        return trimmed.to_string();
    }

    // localhost special case - use http by default
    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    format!("https://{}", trimmed)
}

/// Substitute `id` into a URL template; a template without placeholder gets the id appended as a path segment
pub fn expand_template(template: &str, id: &str) -> String {
    let id = id.trim();
    if template.contains(ID_PLACEHOLDER) {
        template.replace(ID_PLACEHOLDER, id)
    } else {
        format!("{}/{}", template.trim_end_matches('/'), id)
    }
}

/// Build the target list for a batch run
pub fn from_ids(template: &str, ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter(|id| !id.trim().is_empty())
        .map(|id| normalize_url(&expand_template(template, id)))
        .collect()
}

/// Read targets from a file: either a JSON array of strings or one entry per line.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn load_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
    parse_list(&text)
}

fn parse_list(text: &str) -> Result<Vec<String>> {
    if text.trim_start().starts_with('[') {
        let entries: Vec<String> = serde_json::from_str(text)?;
        return Ok(entries.into_iter().filter(|e| !e.trim().is_empty()).collect());
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Drop repeated targets, keeping first occurrences, and apply an optional cap
pub fn dedupe_and_limit(targets: Vec<String>, max: Option<usize>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    targets
        .into_iter()
        .filter(|target| seen.insert(target.clone()))
        .take(max.unwrap_or(usize::MAX))
        .collect()
}
