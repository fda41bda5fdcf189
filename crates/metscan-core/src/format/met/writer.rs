use std::io::{self, Write};

use super::grammar::{
    AMBIGUITY_PREFIX, BLANK_LINE, CORRELATION_POINTS, CORRELATION_SECTION, DATA_SECTION,
    FieldSpec, HEADER_FIELDS, RECORD_FIELDS, SIGNAL_MARKER, TRAILER_LEN,
};
use super::value::{format_date, format_time};
use crate::record::{Channel, Field, MeteorRecord};

/// Encode a record into the MET byte layout.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// let record = metscan_core::parse_file(Path::new("meteor.met"))?;
/// let bytes = metscan_core::encode(&record)?;
/// let decoded = metscan_core::parse(bytes.as_slice())?;
/// assert_eq!(decoded.channels, record.channels);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
/// Returns `InvalidInput` for records the layout cannot represent.
pub fn encode(record: &MeteorRecord) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_record(record, &mut out)?;
    Ok(out)
}

/// Write a record in the MET byte layout, the inverse of `parse`.
///
/// Values are rendered from their typed form; `raw_text` is not consulted.
/// The trailer is the marker followed by zero padding.
///
/// # Errors
/// Returns `InvalidInput` for records the layout cannot represent, or the
/// underlying write error.
pub fn write_record<W: Write>(record: &MeteorRecord, out: &mut W) -> io::Result<()> {
    let recl_pts = record
        .header
        .recl_pts()
        .ok_or_else(|| invalid("RECL_PTS must be a positive integer"))?;

    check_fields(&record.header.fields, HEADER_FIELDS, "header")?;
    for field in &record.header.fields {
        let text = field.value.to_string();
        check_line_text(field.name, &text)?;
        writeln!(out, "{} {}", field.name, text)?;
    }

    writeln!(out, "{DATA_SECTION}")?;
    writeln!(out, "{}", column_header())?;
    writeln!(out, "{AMBIGUITY_PREFIX}{}", record.header.ambiguity)?;

    check_fields(&record.record.fields, RECORD_FIELDS, "record")?;
    let mut tokens = vec![
        format_date(&record.record.date),
        format_time(&record.record.date),
    ];
    for field in &record.record.fields {
        let text = field.value.to_string();
        if text.is_empty() || text.contains(char::is_whitespace) {
            return Err(invalid(format!(
                "record field {} must be a single token, got {text:?}",
                field.name
            )));
        }
        tokens.push(text);
    }
    writeln!(out, "{}", tokens.join(" "))?;

    writeln!(out, "{CORRELATION_SECTION}")?;
    write_correlation(record, out)?;
    writeln!(out, "{BLANK_LINE}")?;
    writeln!(out, "{DATA_SECTION}")?;

    for (channel, samples) in record.channels() {
        write_channel(channel, samples, recl_pts, out)?;
    }

    out.write_all(SIGNAL_MARKER)?;
    out.write_all(&[0u8; TRAILER_LEN - SIGNAL_MARKER.len()])?;
    Ok(())
}

fn check_fields(fields: &[Field], specs: &[FieldSpec], block: &str) -> io::Result<()> {
    if fields.len() != specs.len() {
        return Err(invalid(format!(
            "{block} has {} fields, expected {}",
            fields.len(),
            specs.len()
        )));
    }
    for (field, spec) in fields.iter().zip(specs) {
        if field.name != spec.name {
            return Err(invalid(format!(
                "{block} field {} found where {} is expected",
                field.name, spec.name
            )));
        }
        if !spec.kind.accepts(&field.value) {
            return Err(invalid(format!(
                "{block} field {} does not hold a {:?} value",
                field.name, spec.kind
            )));
        }
    }
    Ok(())
}

/// A header value must survive the line read: one line, nothing that
/// trailing-whitespace stripping would remove.
fn check_line_text(name: &str, text: &str) -> io::Result<()> {
    if text.is_empty() || text.contains(['\n', '\r']) || text.trim_end().len() != text.len() {
        return Err(invalid(format!(
            "header field {name} cannot be written as a single line: {text:?}"
        )));
    }
    Ok(())
}

fn column_header() -> String {
    let mut columns = vec!["Date", "Time"];
    columns.extend(RECORD_FIELDS.iter().map(|spec| spec.name));
    columns.join("  ")
}

fn write_correlation<W: Write>(record: &MeteorRecord, out: &mut W) -> io::Result<()> {
    let correlation = &record.correlation;
    for (name, values) in [
        ("amplitude", &correlation.amplitude),
        ("phase", &correlation.phase),
    ] {
        if values.len() != CORRELATION_POINTS {
            return Err(invalid(format!(
                "correlation {name} has {} points, expected {CORRELATION_POINTS}",
                values.len()
            )));
        }
    }

    out.write_all(&correlation.count.to_le_bytes())?;
    out.write_all(&correlation.lag.to_le_bytes())?;
    out.write_all(&correlation.time_shift.to_le_bytes())?;
    for value in correlation.amplitude.iter().chain(&correlation.phase) {
        out.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn write_channel<W: Write>(
    channel: Channel,
    samples: &[num_complex::Complex32],
    recl_pts: usize,
    out: &mut W,
) -> io::Result<()> {
    if samples.len() != recl_pts {
        return Err(invalid(format!(
            "{} has {} samples, RECL_PTS is {recl_pts}",
            channel.label(),
            samples.len()
        )));
    }

    out.write_all(SIGNAL_MARKER)?;
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&to_i16(sample.re, channel)?.to_le_bytes());
        bytes.extend_from_slice(&to_i16(sample.im, channel)?.to_le_bytes());
    }
    out.write_all(&bytes)
}

fn to_i16(value: f32, channel: Channel) -> io::Result<i16> {
    let in_range = value.fract() == 0.0
        && value >= f32::from(i16::MIN)
        && value <= f32::from(i16::MAX);
    if !in_range {
        return Err(invalid(format!(
            "{} sample component {value} is not a 16-bit integer",
            channel.label()
        )));
    }
    Ok(value as i16)
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}
