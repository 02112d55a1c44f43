//! Loading batch definitions and sampling ranges from disk
//!
//! JSON batch files may hold a single record, a list of records, or an
//! object mapping names to records. RON batch files hold a list of records.
//! Unknown fields are ignored in both. A record with a badly typed field is
//! kept as a rejected item so the rest of the file still runs.

use std::path::Path;

use ron::extensions::Extensions;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::batch::BatchItem;
use crate::params::{FlangeSpec, ValidationError};
use crate::variations::SamplingRanges;

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error in {file}: {reason}")]
    Parse { file: String, reason: String },
    #[error("Unsupported config format: {0} (expected .json or .ron)")]
    UnsupportedFormat(String),
    #[error("Invalid sampling ranges: {0}")]
    InvalidRanges(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Ron,
}

fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("json") => Ok(ConfigFormat::Json),
        Some("ron") => Ok(ConfigFormat::Ron),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

fn parse_error(path: &Path, reason: impl ToString) -> ConfigError {
    ConfigError::Parse {
        file: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn ron_options() -> ron::Options {
    ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}

/// Field names a batch record may carry
const RECORD_FIELDS: &[&str] = &[
    "flange_diameter",
    "flange_thickness",
    "hole_count",
    "hole_diameter",
    "center_hole_diameter",
    "bolt_circle_diameter",
    "bolt_circle_ratio",
    "bolt_circle_percentage",
    "output_format",
];

/// Read one record, naming the first field whose value has the wrong type
fn read_record(record: Value) -> Result<FlangeSpec, ValidationError> {
    let fields = match record {
        Value::Object(fields) => fields,
        other => {
            return Err(ValidationError::new(
                "record",
                format!("must be an object (got {other})"),
            ));
        }
    };
    serde_json::from_value::<FlangeSpec>(Value::Object(fields.clone())).map_err(|err| {
        let bad = fields.iter().find(|(key, value)| {
            let single = Map::from_iter([((*key).clone(), (*value).clone())]);
            serde_json::from_value::<FlangeSpec>(Value::Object(single)).is_err()
        });
        let field = bad.and_then(|(key, _)| {
            RECORD_FIELDS
                .iter()
                .copied()
                .find(|field| *field == key.as_str())
        });
        match field {
            Some(field) => ValidationError::new(field, format!("has an invalid value: {err}")),
            None => ValidationError::new("record", format!("cannot be read: {err}")),
        }
    })
}

fn item_from_record(name: Option<String>, record: Value) -> BatchItem {
    let spec = read_record(record);
    if let Err(err) = &spec {
        tracing::warn!(name = name.as_deref().unwrap_or("-"), "unreadable record: {err}");
    }
    BatchItem { name, spec }
}

/// An object holding nested objects and no record field maps names to records
fn is_named_map(map: &Map<String, Value>) -> bool {
    map.values().any(Value::is_object)
        && !map.keys().any(|key| RECORD_FIELDS.contains(&key.as_str()))
}

/// Interpret a parsed document as batch items
///
/// In a name map, top-level values that are not records are skipped.
fn items_from_value(value: Value) -> Vec<BatchItem> {
    match value {
        Value::Array(records) => records
            .into_iter()
            .map(|record| item_from_record(None, record))
            .collect(),
        Value::Object(map) if is_named_map(&map) => map
            .into_iter()
            .filter_map(|(name, record)| {
                if record.is_object() {
                    Some(item_from_record(Some(name), record))
                } else {
                    tracing::warn!(key = %name, "skipping top-level value that is not a record");
                    None
                }
            })
            .collect(),
        record => vec![item_from_record(None, record)],
    }
}

/// Parse batch items from text in the given format
///
/// Only malformed documents are errors. A record with a badly typed field
/// becomes a rejected item.
fn parse_batch(content: &str, format: ConfigFormat) -> Result<Vec<BatchItem>, String> {
    match format {
        ConfigFormat::Json => {
            let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
            Ok(items_from_value(value))
        }
        ConfigFormat::Ron => {
            let records: Vec<Value> = ron_options()
                .from_str(content)
                .map_err(|e| e.to_string())?;
            Ok(items_from_value(Value::Array(records)))
        }
    }
}

/// Load batch items from a `.json` or `.ron` file, in file order
pub fn load_batch_file(path: &Path) -> Result<Vec<BatchItem>, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    let items = parse_batch(&content, format).map_err(|e| parse_error(path, e))?;
    tracing::debug!(path = %path.display(), items = items.len(), "batch file loaded");
    Ok(items)
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    match format {
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        ConfigFormat::Ron => ron_options()
            .from_str(&content)
            .map_err(|e| parse_error(path, e)),
    }
}

/// Load and check sampling ranges from a `.json` or `.ron` file
///
/// Fields that are left out keep their default range.
pub fn load_sampling_ranges(path: &Path) -> Result<SamplingRanges, ConfigError> {
    let ranges: SamplingRanges = load_document(path)?;
    ranges.validate()?;
    Ok(ranges)
}
