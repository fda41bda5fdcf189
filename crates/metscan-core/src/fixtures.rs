use num_complex::Complex32;
use time::macros::datetime;

use crate::format::met::grammar::{
    CHANNEL_COUNT, CORRELATION_POINTS, FieldKind, HEADER_FIELDS, RECORD_FIELDS,
};
use crate::record::{Correlation, DetectionRecord, Field, FieldValue, Header, MeteorRecord};

pub(crate) fn value_for(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Int => FieldValue::Int(4),
        FieldKind::Float => FieldValue::Float(2.5),
        FieldKind::Text => FieldValue::Text("text".to_string()),
        FieldKind::Location => FieldValue::Location {
            latitude: 1.0,
            longitude: 2.0,
        },
        FieldKind::FloatVec(count) => FieldValue::FloatVec(vec![0.5; count]),
        FieldKind::IntVec(count) => FieldValue::IntVec(vec![1; count]),
        FieldKind::JoinedDateTime => FieldValue::DateTime(datetime!(2024-01-02 03:04:05)),
    }
}

/// Every field holds a placeholder of its kind; `RECL_PTS` is 4.
pub(crate) fn minimal_record() -> MeteorRecord {
    let header = Header {
        fields: HEADER_FIELDS
            .iter()
            .map(|spec| Field::new(spec.name, value_for(spec.kind)))
            .collect(),
        ambiguity: 2,
    };
    let record = DetectionRecord {
        date: datetime!(2024-01-02 03:04:05.5),
        fields: RECORD_FIELDS
            .iter()
            .map(|spec| Field::new(spec.name, value_for(spec.kind)))
            .collect(),
    };
    let correlation = Correlation {
        count: 1,
        lag: 0.0,
        time_shift: 0.0,
        amplitude: vec![0.0; CORRELATION_POINTS],
        phase: vec![0.0; CORRELATION_POINTS],
    };
    let channels: [Vec<Complex32>; CHANNEL_COUNT] =
        std::array::from_fn(|_| vec![Complex32::new(1.0, -1.0); 4]);
    MeteorRecord {
        header,
        record,
        correlation,
        channels,
    }
}
