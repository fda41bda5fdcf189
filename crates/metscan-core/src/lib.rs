//! metscan core library for decoding MET meteor-radar detection files.
//!
//! A MET file holds one meteor detection: an ASCII header of named fields,
//! one detection record line, a binary correlation block and five channels
//! of raw 16-bit I/Q samples. This crate decodes the whole file in a single
//! fail-fast pass into a [`MeteorRecord`], and can encode a record back into
//! the same layout.
//!
//! The format is implemented in layers (grammar/value/reader/parser). Field
//! tables are data in `grammar`; the parser walks them in order, so adding
//! or retyping a field never touches the decoding loop. All I/O happens on
//! the reader passed in; decoding never logs and never partially succeeds.
//!
//! Invariants:
//! - Header fields appear in grammar order with no gaps or extras.
//! - Every channel holds exactly `RECL_PTS` samples.
//! - Sample values are the stored i16 values widened to f32, unscaled.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use metscan_core::{Channel, parse_file};
//!
//! let record = parse_file(Path::new("meteor.met"))?;
//! println!("{} samples per channel", record.record_length());
//! println!("first rx3 sample: {:?}", record.channel(Channel::Rx3).first());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod format;
mod record;
mod summary;

#[cfg(test)]
mod fixtures;

pub use num_complex::Complex32;

pub use format::met::error::{DecodeError, ValueError};
pub use format::met::grammar::{
    CHANNEL_COUNT, CORRELATION_POINTS, FieldKind, FieldSpec, HEADER_FIELDS, RECL_PTS_FIELD,
    RECORD_FIELDS, SIGNAL_MARKER,
};
pub use format::met::value::parse_datetime;
pub use format::met::{encode, parse, parse_file, write_record};
pub use record::{
    Channel, Correlation, DetectionRecord, Field, FieldValue, Header, MeteorRecord,
};
pub use summary::{
    ChannelSummary, CorrelationSummary, FieldEntry, InputInfo, MeteorSummary, RecordSummary,
    SUMMARY_VERSION, SummaryOptions, TOOL_NAME, ToolInfo, summarize_file,
};

/// Samples per receive channel of a decoded record (`RECL_PTS`).
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// let record = metscan_core::parse_file(Path::new("meteor.met"))?;
/// assert_eq!(metscan_core::record_length(&record), record.channels[0].len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn record_length(record: &MeteorRecord) -> usize {
    record.record_length()
}
