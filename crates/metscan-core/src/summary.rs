//! Serializable summary of a decoded MET file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::PrimitiveDateTime;
use time::format_description::well_known::Rfc3339;

use crate::format::met::error::DecodeError;
use crate::format::met::parse_file;
use crate::record::{Field, FieldValue, MeteorRecord};

/// Current summary schema version.
pub const SUMMARY_VERSION: u32 = 1;
/// Tool name embedded in summaries.
pub const TOOL_NAME: &str = "metscan";

/// Optional, potentially large sections of a summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryOptions {
    /// Include the 500-point correlation amplitude and phase arrays.
    pub correlation_arrays: bool,
    /// Include raw channel samples as `[re, im]` pairs.
    pub samples: bool,
}

/// Decoded file summary, with header and record fields in file order.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use metscan_core::{SummaryOptions, summarize_file};
///
/// let summary = summarize_file(Path::new("meteor.met"), SummaryOptions::default())?;
/// println!("{} samples per channel", summary.record_length);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteorSummary {
    /// Summary schema version (not the binary version).
    pub summary_version: u32,
    pub tool: ToolInfo,
    pub input: InputInfo,
    /// `RECL_PTS`, the sample count of every channel.
    pub record_length: usize,
    pub header: Vec<FieldEntry>,
    pub ambiguity: i64,
    pub record: RecordSummary,
    pub correlation: CorrelationSummary,
    pub channels: Vec<ChannelSummary>,
}

/// Tool metadata embedded in summaries.
///
/// # Examples
/// ```
/// use metscan_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "metscan".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "metscan");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input file metadata embedded in summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// One named field rendered as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    /// RFC3339 detection time (UTC assumed).
    pub date: String,
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub count: u32,
    pub lag: f32,
    pub time_shift: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Channel label (`rx1`..`rx5`).
    pub name: String,
    pub samples: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<[f32; 2]>>,
}

impl MeteorSummary {
    pub fn from_record(
        input_path: &str,
        input_bytes: u64,
        record: &MeteorRecord,
        options: SummaryOptions,
    ) -> Self {
        let correlation = &record.correlation;
        Self {
            summary_version: SUMMARY_VERSION,
            tool: ToolInfo {
                name: TOOL_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            input: InputInfo {
                path: input_path.to_string(),
                bytes: input_bytes,
            },
            record_length: record.record_length(),
            header: field_entries(&record.header.fields),
            ambiguity: record.header.ambiguity,
            record: RecordSummary {
                date: format_timestamp(record.record.date),
                fields: field_entries(&record.record.fields),
            },
            correlation: CorrelationSummary {
                count: correlation.count,
                lag: correlation.lag,
                time_shift: correlation.time_shift,
                amplitude: options
                    .correlation_arrays
                    .then(|| correlation.amplitude.clone()),
                phase: options.correlation_arrays.then(|| correlation.phase.clone()),
            },
            channels: record
                .channels()
                .map(|(channel, samples)| ChannelSummary {
                    name: channel.label().to_string(),
                    samples: samples.len(),
                    data: options
                        .samples
                        .then(|| samples.iter().map(|s| [s.re, s.im]).collect()),
                })
                .collect(),
        }
    }
}

/// Decode `path` and summarize it.
///
/// # Errors
/// Returns `DecodeError::Io` when the file cannot be read, or the decode
/// error of the first malformed section.
pub fn summarize_file(path: &Path, options: SummaryOptions) -> Result<MeteorSummary, DecodeError> {
    let bytes = fs::metadata(path)?.len();
    let record = parse_file(path)?;
    Ok(MeteorSummary::from_record(
        &path.display().to_string(),
        bytes,
        &record,
        options,
    ))
}

fn field_entries(fields: &[Field]) -> Vec<FieldEntry> {
    fields
        .iter()
        .map(|field| FieldEntry {
            name: field.name.to_string(),
            value: value_to_json(&field.value),
        })
        .collect()
}

fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Int(value) => json!(value),
        FieldValue::Float(value) => json!(value),
        FieldValue::Text(value) => json!(value),
        FieldValue::Location {
            latitude,
            longitude,
        } => json!({ "latitude": latitude, "longitude": longitude }),
        FieldValue::FloatVec(values) => json!(values),
        FieldValue::IntVec(values) => json!(values),
        FieldValue::DateTime(value) => json!(format_timestamp(*value)),
    }
}

/// Years outside 0..=9999 have no RFC3339 form and fall back to `Display`.
fn format_timestamp(value: PrimitiveDateTime) -> String {
    value
        .assume_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.to_string())
}
