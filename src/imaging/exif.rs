//! EXIF tag-table extraction.
//!
//! Reads the embedded EXIF container of an image file and translates it into
//! a JSON-friendly mapping from tag name to value. Extraction is never fatal
//! to a request, but the outcome type keeps "the image carries no tags" and
//! "extraction failed" distinguishable so the caller can log the latter.
//!
//! Value translation mirrors what photographers expect to see:
//! - ASCII fields become plain strings
//! - single numeric values become JSON numbers
//! - rationals, multi-valued fields, and undecodable byte strings fall back
//!   to the tag's display representation

use exif::{Field, In, Reader, Value};
use serde_json::Value as JsonValue;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tag name → value mapping, ordered for stable JSON output.
pub type TagTable = BTreeMap<String, JsonValue>;

/// Result of reading an image's EXIF container.
///
/// `Absent` and `Failed` produce the same external behavior (an empty
/// mapping) but only `Failed` is worth logging.
#[derive(Debug)]
pub enum MetadataOutcome {
    /// The image carries at least one EXIF tag.
    Extracted(TagTable),
    /// The image has no EXIF container (or an empty one).
    Absent,
    /// The container exists but could not be read.
    Failed(exif::Error),
}

impl MetadataOutcome {
    /// Collapse to the external representation: tags, or an empty table.
    pub fn into_tags(self) -> TagTable {
        match self {
            MetadataOutcome::Extracted(tags) => tags,
            MetadataOutcome::Absent | MetadataOutcome::Failed(_) => TagTable::new(),
        }
    }
}

/// Read the EXIF tag table of the image at `path`.
///
/// Only primary-image tags are reported; thumbnail-IFD duplicates are
/// skipped. When a tag name repeats across IFDs the first occurrence wins.
pub fn read_tag_table(path: &Path) -> MetadataOutcome {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return MetadataOutcome::Failed(exif::Error::Io(e)),
    };
    let mut reader = BufReader::new(file);

    match Reader::new().read_from_container(&mut reader) {
        Ok(data) => {
            let mut tags = TagTable::new();
            for field in data.fields().filter(|f| f.ifd_num == In::PRIMARY) {
                tags.entry(field.tag.to_string())
                    .or_insert_with(|| field_value(field));
            }
            if tags.is_empty() {
                MetadataOutcome::Absent
            } else {
                MetadataOutcome::Extracted(tags)
            }
        }
        // No EXIF segment in the container at all
        Err(exif::Error::NotFound(_)) => MetadataOutcome::Absent,
        Err(e) => MetadataOutcome::Failed(e),
    }
}

/// Translate a single EXIF field value into JSON.
fn field_value(field: &Field) -> JsonValue {
    match &field.value {
        Value::Ascii(strings) if strings.len() == 1 => {
            json!(String::from_utf8_lossy(&strings[0]).into_owned())
        }
        Value::Byte(v) if v.len() == 1 => json!(v[0]),
        Value::Short(v) if v.len() == 1 => json!(v[0]),
        Value::Long(v) if v.len() == 1 => json!(v[0]),
        Value::SByte(v) if v.len() == 1 => json!(v[0]),
        Value::SShort(v) if v.len() == 1 => json!(v[0]),
        Value::SLong(v) if v.len() == 1 => json!(v[0]),
        Value::Float(v) if v.len() == 1 => json!(v[0]),
        Value::Double(v) if v.len() == 1 => json!(v[0]),
        Value::Undefined(bytes, _) => match std::str::from_utf8(bytes) {
            Ok(text) if !text.is_empty() && text.chars().all(|c| !c.is_control()) => {
                json!(text)
            }
            // Not text: fall back to the display form of the raw bytes
            _ => json!(field.display_value().to_string()),
        },
        _ => json!(field.display_value().to_string()),
    }
}
