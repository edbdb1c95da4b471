//! Built-in schemas for the supported sites

use super::Schema;
use crate::error::{Result, ScrapeError};

const CRUNCHBASE: &str = include_str!("presets/crunchbase.toml");
const YC_DIRECTORY: &str = include_str!("presets/yc_directory.toml");
const YC_COMPANY: &str = include_str!("presets/yc_company.toml");

/// Names accepted by [`by_name`]
pub const NAMES: &[&str] = &["crunchbase", "yc-directory", "yc-company"];

/// Load a built-in schema by name
pub fn by_name(name: &str) -> Result<Schema> {
    let source = match name {
        "crunchbase" => CRUNCHBASE,
        "yc-directory" => YC_DIRECTORY,
        "yc-company" => YC_COMPANY,
        other => {
            return Err(ScrapeError::InvalidSchema(format!(
                "unknown preset '{}' (available: {})",
                other,
                NAMES.join(", ")
            )));
        }
    };

    Schema::from_toml(source)
}
