//! Decoded MET file structure.
//!
//! A [`MeteorRecord`] is built in one decode call and owned by the caller;
//! nothing in it refers back to the decoder.

use std::fmt;

use num_complex::Complex32;
use time::PrimitiveDateTime;

use crate::format::met::grammar::{CHANNEL_COUNT, RECL_PTS_FIELD};
use crate::format::met::value::format_joined_datetime;

/// Typed result of a field parser.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Location { latitude: f64, longitude: f64 },
    FloatVec(Vec<f64>),
    IntVec(Vec<i64>),
    DateTime(PrimitiveDateTime),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// `(latitude, longitude)`.
    pub fn as_location(&self) -> Option<(f64, f64)> {
        match self {
            FieldValue::Location {
                latitude,
                longitude,
            } => Some((*latitude, *longitude)),
            _ => None,
        }
    }

    pub fn as_float_vec(&self) -> Option<&[f64]> {
        match self {
            FieldValue::FloatVec(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_int_vec(&self) -> Option<&[i64]> {
        match self {
            FieldValue::IntVec(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<PrimitiveDateTime> {
        match self {
            FieldValue::DateTime(value) => Some(*value),
            _ => None,
        }
    }
}

/// Renders the value in the text form the field parsers accept.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Location {
                latitude,
                longitude,
            } => write!(f, "{latitude},{longitude}"),
            FieldValue::FloatVec(values) => write_joined(f, values),
            FieldValue::IntVec(values) => write_joined(f, values),
            FieldValue::DateTime(value) => f.write_str(&format_joined_datetime(value)),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

/// One named value with the text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub raw_text: String,
    pub value: FieldValue,
}

impl Field {
    /// Build a field whose raw text is the canonical rendering of `value`.
    pub fn new(name: &'static str, value: FieldValue) -> Self {
        Self {
            name,
            raw_text: value.to_string(),
            value,
        }
    }
}

fn find<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|field| field.name == name)
}

/// Header block in file order, plus the ambiguity line that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub fields: Vec<Field>,
    pub ambiguity: i64,
}

impl Header {
    pub fn field(&self, name: &str) -> Option<&Field> {
        find(&self.fields, name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.field(name).map(|field| &field.value)
    }

    /// Samples per receive channel, when present and positive.
    pub fn recl_pts(&self) -> Option<usize> {
        self.get(RECL_PTS_FIELD)
            .and_then(FieldValue::as_int)
            .filter(|value| *value > 0)
            .and_then(|value| usize::try_from(value).ok())
    }
}

/// The per-detection measurement line.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub date: PrimitiveDateTime,
    pub fields: Vec<Field>,
}

impl DetectionRecord {
    pub fn field(&self, name: &str) -> Option<&Field> {
        find(&self.fields, name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.field(name).map(|field| &field.value)
    }
}

/// Binary correlation block. `amplitude` and `phase` hold 500 points each.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub count: u32,
    pub lag: f32,
    pub time_shift: f32,
    pub amplitude: Vec<f32>,
    pub phase: Vec<f32>,
}

/// Receive channel, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Rx1,
    Rx2,
    Rx3,
    Rx4,
    Rx5,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Rx1,
        Channel::Rx2,
        Channel::Rx3,
        Channel::Rx4,
        Channel::Rx5,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Rx1 => "rx1",
            Channel::Rx2 => "rx2",
            Channel::Rx3 => "rx3",
            Channel::Rx4 => "rx4",
            Channel::Rx5 => "rx5",
        }
    }
}

/// A fully decoded MET file.
#[derive(Debug, Clone, PartialEq)]
pub struct MeteorRecord {
    pub header: Header,
    pub record: DetectionRecord,
    pub correlation: Correlation,
    /// Raw I/Q samples for `rx1..rx5`, each `RECL_PTS` long.
    pub channels: [Vec<Complex32>; CHANNEL_COUNT],
}

impl MeteorRecord {
    /// `RECL_PTS` from the header (0 if the header lacks a positive value,
    /// which the decoder never produces).
    pub fn record_length(&self) -> usize {
        self.header.recl_pts().unwrap_or(0)
    }

    pub fn channel(&self, channel: Channel) -> &[Complex32] {
        &self.channels[channel.index()]
    }

    pub fn channels(&self) -> impl Iterator<Item = (Channel, &[Complex32])> {
        Channel::ALL
            .into_iter()
            .map(move |channel| (channel, self.channel(channel)))
    }
}
