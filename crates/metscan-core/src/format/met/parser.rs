use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use num_complex::Complex32;

use super::error::{DecodeError, ValueError};
use super::grammar::{
    self, AMBIGUITY_FIELD, AMBIGUITY_PREFIX, BLANK_LINE, BLANK_LINE_CONTEXT, CHANNEL_COUNT,
    COLUMN_HEADER_CONTEXT, CORRELATION_POINTS, CORRELATION_SECTION, DATA_SECTION, FieldSpec,
    HEADER_FIELDS, RECL_PTS_FIELD, RECORD_DATE_FIELD, RECORD_DATE_TOKENS, RECORD_FIELDS,
    RECORD_LINE_CONTEXT, SAMPLE_SIZE, TRAILER_LEN, TRAILER_POSITION,
};
use super::reader::{MetReader, check_marker};
use super::value::{parse_datetime, parse_int};
use crate::record::{Channel, Correlation, DetectionRecord, Field, Header, MeteorRecord};

/// Decode one MET file from a byte stream.
///
/// The stream is consumed sequentially and never rewound. The first
/// malformed field or section aborts the decode; no partial record is
/// returned.
///
/// # Errors
/// Returns the `DecodeError` variant naming the field or section that failed.
pub fn parse<R: Read>(input: R) -> Result<MeteorRecord, DecodeError> {
    let mut reader = MetReader::new(BufReader::new(input));
    parse_met(&mut reader)
}

/// Open `path` and decode it with [`parse`].
pub fn parse_file(path: &Path) -> Result<MeteorRecord, DecodeError> {
    let file = File::open(path)?;
    parse(file)
}

fn parse_met<R: BufRead>(reader: &mut MetReader<R>) -> Result<MeteorRecord, DecodeError> {
    let fields = parse_header_fields(reader)?;
    reader.expect_line(DATA_SECTION, DATA_SECTION)?;
    reader.skip_line(COLUMN_HEADER_CONTEXT)?;
    let ambiguity = parse_ambiguity(reader)?;
    let header = Header { fields, ambiguity };

    let record = parse_detection(reader)?;

    reader.expect_line(CORRELATION_SECTION, CORRELATION_SECTION)?;
    let correlation = parse_correlation(reader)?;
    reader.expect_line(BLANK_LINE, BLANK_LINE_CONTEXT)?;
    reader.expect_line(DATA_SECTION, DATA_SECTION)?;

    let recl_pts = header.recl_pts().ok_or(DecodeError::MissingHeaderField {
        field: RECL_PTS_FIELD,
    })?;
    let channels = parse_channels(reader, recl_pts)?;
    parse_trailer(reader)?;

    Ok(MeteorRecord {
        header,
        record,
        correlation,
        channels,
    })
}

fn parse_header_fields<R: BufRead>(reader: &mut MetReader<R>) -> Result<Vec<Field>, DecodeError> {
    let mut fields = Vec::with_capacity(HEADER_FIELDS.len());
    for spec in HEADER_FIELDS {
        let line = reader.read_line(spec.name)?;
        let raw_text = match line
            .strip_prefix(spec.name)
            .and_then(|rest| rest.strip_prefix(' '))
        {
            Some(rest) => rest.to_string(),
            None => {
                return Err(DecodeError::FieldMismatch {
                    expected: spec.name,
                    found: line,
                });
            }
        };
        let field = parse_field(spec, raw_text)?;
        if spec.name == RECL_PTS_FIELD {
            check_record_length(&field)?;
        }
        fields.push(field);
    }
    Ok(fields)
}

fn parse_field(spec: &FieldSpec, raw_text: String) -> Result<Field, DecodeError> {
    match spec.kind.parse(&raw_text) {
        Ok(value) => Ok(Field {
            name: spec.name,
            raw_text,
            value,
        }),
        Err(reason) => Err(DecodeError::InvalidFieldValue {
            field: spec.name,
            value: raw_text,
            reason,
        }),
    }
}

/// `RECL_PTS` sizes every signal block, so it must be positive and small
/// enough for its byte length to be addressable.
fn check_record_length(field: &Field) -> Result<(), DecodeError> {
    let valid = field
        .value
        .as_int()
        .filter(|points| *points > 0)
        .and_then(|points| usize::try_from(points).ok())
        .and_then(|points| points.checked_mul(SAMPLE_SIZE))
        .is_some();
    if valid {
        return Ok(());
    }
    Err(DecodeError::InvalidFieldValue {
        field: RECL_PTS_FIELD,
        value: field.raw_text.clone(),
        reason: ValueError::OutOfRange("sample count must be a positive integer".to_string()),
    })
}

fn parse_ambiguity<R: BufRead>(reader: &mut MetReader<R>) -> Result<i64, DecodeError> {
    let line = reader.read_line(AMBIGUITY_FIELD)?;
    let Some(rest) = line.strip_prefix(AMBIGUITY_PREFIX) else {
        return Err(DecodeError::UnexpectedSection {
            expected: AMBIGUITY_PREFIX,
            found: line,
        });
    };
    parse_int(rest).map_err(|reason| DecodeError::InvalidFieldValue {
        field: AMBIGUITY_FIELD,
        value: rest.to_string(),
        reason,
    })
}

fn parse_detection<R: BufRead>(reader: &mut MetReader<R>) -> Result<DetectionRecord, DecodeError> {
    let line = reader.read_line(RECORD_LINE_CONTEXT)?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let needed = RECORD_DATE_TOKENS + RECORD_FIELDS.len();
    if tokens.len() < needed {
        return Err(DecodeError::InsufficientTokens {
            needed,
            got: tokens.len(),
        });
    }

    let date = parse_datetime(tokens[0], tokens[1]).map_err(|reason| {
        DecodeError::InvalidFieldValue {
            field: RECORD_DATE_FIELD,
            value: format!("{} {}", tokens[0], tokens[1]),
            reason,
        }
    })?;

    let fields = RECORD_FIELDS
        .iter()
        .zip(&tokens[RECORD_DATE_TOKENS..])
        .map(|(spec, token)| parse_field(spec, token.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DetectionRecord { date, fields })
}

fn parse_correlation<R: BufRead>(reader: &mut MetReader<R>) -> Result<Correlation, DecodeError> {
    let count = reader.read_u32_le(grammar::CORRELATION_COUNT_SECTION)?;
    let lag = reader.read_f32_le(grammar::CORRELATION_LAG_SECTION)?;
    let time_shift = reader.read_f32_le(grammar::CORRELATION_TIME_SHIFT_SECTION)?;
    let amplitude =
        reader.read_f32_array(CORRELATION_POINTS, grammar::CORRELATION_AMPLITUDE_SECTION)?;
    let phase = reader.read_f32_array(CORRELATION_POINTS, grammar::CORRELATION_PHASE_SECTION)?;
    Ok(Correlation {
        count,
        lag,
        time_shift,
        amplitude,
        phase,
    })
}

fn parse_channels<R: BufRead>(
    reader: &mut MetReader<R>,
    recl_pts: usize,
) -> Result<[Vec<Complex32>; CHANNEL_COUNT], DecodeError> {
    let mut channels: [Vec<Complex32>; CHANNEL_COUNT] = Default::default();
    for channel in Channel::ALL {
        reader.expect_marker(channel.label())?;
        channels[channel.index()] = reader.read_iq_samples(recl_pts, channel.label())?;
    }
    Ok(channels)
}

/// Up to 16 bytes follow the last channel; only the marker prefix is
/// checked, the rest is padding.
fn parse_trailer<R: BufRead>(reader: &mut MetReader<R>) -> Result<(), DecodeError> {
    let trailer = reader.read_up_to(TRAILER_LEN)?;
    check_marker(&trailer, TRAILER_POSITION)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::format::met::grammar::SIGNAL_MARKER;

    const HEADER_TEXT: &str = "TYPE 2
SITENAME Buckland Park
LOCATION -34.62,138.46
TIME_ZONE 9.5
FREQUENCY 55.0
LO_FREQUENCY 54.9
CHANNELS 5
RANGE 60
RESOLUTION 2
GATES 90
PRF 430
ANTENNA_COORDS 0 0 1 0 0 1 -1 0 0 -1
PHASE_OFFSETS 0 0.1 0.2 0.3 0.4
INTEGRATIONS 4
BASETIME 0
DATE 2024/03/01_12:30:45.5
FILE_SPOOL spool01
MET.RGE# 17
START.POS 100
PEAK.POS 120
RECL_PTS 3
RECORD_LENGTH 1.5
NSMOOTH 2
MINHT 70
MAXHT 110
RXLIST 1 2 3 4 5
RX_GAIN 30
TIME_ACCURACY GPS
GPS_STATUS locked
VEL_ERR_LIM 5.0
SN_ACCEPT_RATIO 1.5
T_DECAY_MAX 2.0
PLANE_NORMAL 0.0 1.0
PULSE_CODE none
MODE met
";

    const RECORD_TEXT: &str = "DATA
Date Time File Rge Ht Vrad delVr Theta Phi0 Ambig Delphase ant-pair IREX amax Tau vmet snrdb
AMBIGUITY = 1
2024/03/01 12:30:45.123 met0001 112.5 95.2 -12.5 0.4 35.0 120.0 1 0.25 3 0.8 1500.0 0.05 35.2 18.5
CORR12
";

    fn correlation_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&42u32.to_le_bytes());
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-0.25f32).to_le_bytes());
        for idx in 0..CORRELATION_POINTS {
            bytes.extend_from_slice(&(idx as f32).to_le_bytes());
        }
        for idx in 0..CORRELATION_POINTS {
            bytes.extend_from_slice(&(-(idx as f32)).to_le_bytes());
        }
        bytes
    }

    fn channel_bytes(recl_pts: usize) -> Vec<u8> {
        let mut bytes = b"\nDATA\n".to_vec();
        for channel in 0..CHANNEL_COUNT {
            bytes.extend_from_slice(SIGNAL_MARKER);
            for point in 0..recl_pts {
                let re = (channel * 100 + point) as i16;
                bytes.extend_from_slice(&re.to_le_bytes());
                bytes.extend_from_slice(&(-re).to_le_bytes());
            }
        }
        bytes
    }

    fn sample_file() -> Vec<u8> {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(RECORD_TEXT.as_bytes());
        bytes.extend(correlation_bytes());
        bytes.extend(channel_bytes(3));
        bytes.extend_from_slice(SIGNAL_MARKER);
        bytes.extend_from_slice(&[0u8; 12]);
        bytes
    }

    fn parse_bytes(bytes: Vec<u8>) -> Result<MeteorRecord, DecodeError> {
        parse(Cursor::new(bytes))
    }

    #[test]
    fn parse_valid_file() {
        let record = parse_bytes(sample_file()).unwrap();

        assert_eq!(record.header.fields.len(), HEADER_FIELDS.len());
        assert_eq!(record.header.ambiguity, 1);
        assert_eq!(record.record_length(), 3);
        assert_eq!(
            record.header.get("SITENAME").and_then(|v| v.as_text()),
            Some("Buckland Park")
        );
        assert_eq!(
            record.header.get("LOCATION").and_then(|v| v.as_location()),
            Some((-34.62, 138.46))
        );
        let date = record.header.get("DATE").and_then(|v| v.as_datetime()).unwrap();
        assert_eq!(date.microsecond(), 500_000);

        assert_eq!(record.record.date.microsecond(), 123_000);
        assert_eq!(
            record.record.get("File").and_then(|v| v.as_text()),
            Some("met0001")
        );
        assert_eq!(record.record.get("ant pair").and_then(|v| v.as_int()), Some(3));
        assert_eq!(record.record.get("snrdb").and_then(|v| v.as_float()), Some(18.5));

        assert_eq!(record.correlation.count, 42);
        assert_eq!(record.correlation.lag, 0.5);
        assert_eq!(record.correlation.time_shift, -0.25);
        assert_eq!(record.correlation.amplitude.len(), CORRELATION_POINTS);
        assert_eq!(record.correlation.amplitude[499], 499.0);
        assert_eq!(record.correlation.phase[10], -10.0);

        let rx3 = record.channel(Channel::Rx3);
        assert_eq!(rx3.len(), 3);
        assert_eq!(rx3[2], Complex32::new(202.0, -202.0));
    }

    #[test]
    fn header_name_mismatch_fails_fast() {
        let text = HEADER_TEXT.replace("FREQUENCY 55.0", "FREQ 55.0");
        let mut bytes = text.into_bytes();
        bytes.extend_from_slice(RECORD_TEXT.as_bytes());

        let err = parse_bytes(bytes).unwrap_err();
        match err {
            DecodeError::FieldMismatch { expected, found } => {
                assert_eq!(expected, "FREQUENCY");
                assert_eq!(found, "FREQ 55.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_name_needs_separating_space() {
        let text = HEADER_TEXT.replace("CHANNELS 5", "CHANNELS5");
        let err = parse_bytes(text.into_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::FieldMismatch {
                expected: "CHANNELS",
                ..
            }
        ));
    }

    #[test]
    fn invalid_vector_arity_is_reported_for_field() {
        let text = HEADER_TEXT.replace("RXLIST 1 2 3 4 5", "RXLIST 1 2 3 4");
        let err = parse_bytes(text.into_bytes()).unwrap_err();
        match err {
            DecodeError::InvalidFieldValue {
                field,
                value,
                reason,
            } => {
                assert_eq!(field, "RXLIST");
                assert_eq!(value, "1 2 3 4");
                assert_eq!(
                    reason,
                    ValueError::Arity {
                        expected: 5,
                        actual: 4
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn truncated_header_names_missing_field() {
        let text: String = HEADER_TEXT.lines().take(5).map(|l| format!("{l}\n")).collect();
        let err = parse_bytes(text.into_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEndOfInput {
                context: "LO_FREQUENCY"
            }
        ));
    }

    #[test]
    fn non_positive_record_length_is_rejected() {
        let text = HEADER_TEXT.replace("RECL_PTS 3", "RECL_PTS 0");
        let err = parse_bytes(text.into_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidFieldValue {
                field: "RECL_PTS",
                ..
            }
        ));
    }

    #[test]
    fn missing_data_section() {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(b"DATUM\n");
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedSection {
                expected: "DATA",
                ..
            }
        ));
    }

    #[test]
    fn ambiguity_prefix_is_required() {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(b"DATA\ncolumns\nAMBIG = 1\n");
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedSection {
                expected: AMBIGUITY_PREFIX,
                ..
            }
        ));
    }

    #[test]
    fn ambiguity_must_be_an_integer() {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(b"DATA\ncolumns\nAMBIGUITY = two\n");
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidFieldValue {
                field: "AMBIGUITY",
                ..
            }
        ));
    }

    #[test]
    fn short_record_line() {
        let record = RECORD_TEXT.replace(" 35.2 18.5", "");
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(record.as_bytes());
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InsufficientTokens { needed: 17, got: 15 }
        ));
    }

    #[test]
    fn extra_record_tokens_are_ignored() {
        let record = RECORD_TEXT.replace(" 35.2 18.5", " 35.2 18.5 extra 99");
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(record.as_bytes());
        bytes.extend(correlation_bytes());
        bytes.extend(channel_bytes(3));
        bytes.extend_from_slice(SIGNAL_MARKER);

        let parsed = parse_bytes(bytes).unwrap();
        assert_eq!(parsed.record.fields.len(), RECORD_FIELDS.len());
    }

    #[test]
    fn record_integer_fields_reject_floats() {
        let record = RECORD_TEXT.replace(" 120.0 1 0.25", " 120.0 1.5 0.25");
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(record.as_bytes());
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidFieldValue { field: "Ambig", .. }
        ));
    }

    #[test]
    fn truncated_amplitude_block() {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(RECORD_TEXT.as_bytes());
        let correlation = correlation_bytes();
        // count, lag, time shift, then 499 amplitude floats
        bytes.extend_from_slice(&correlation[..12 + 499 * 4]);

        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedBinarySection {
                section: "correlation amplitude",
                expected_bytes: 2000,
                got_bytes: 1996,
            }
        ));
    }

    #[test]
    fn file_ending_after_correlation_names_blank_line() {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(RECORD_TEXT.as_bytes());
        let correlation = correlation_bytes();
        assert_eq!(correlation.len(), 12 + 2 * CORRELATION_POINTS * 4);
        bytes.extend(correlation);

        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEndOfInput {
                context: BLANK_LINE_CONTEXT
            }
        ));
        assert!(err.to_string().ends_with("blank line after correlation block"));
    }

    #[test]
    fn binary_block_needs_blank_line_after() {
        let mut bytes = HEADER_TEXT.as_bytes().to_vec();
        bytes.extend_from_slice(RECORD_TEXT.as_bytes());
        bytes.extend(correlation_bytes());
        bytes.extend_from_slice(b"junk\nDATA\n");
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedSection { expected: "", .. }
        ));
    }

    #[test]
    fn bad_channel_marker_names_channel() {
        let mut bytes = sample_file();
        let channels = channel_bytes(3);
        let start = bytes.len() - channels.len() - 16;
        // "\nDATA\n", then three full channel blocks of 4 + 3 * 4 bytes
        let rx4_marker = start + 6 + 3 * 16;
        bytes[rx4_marker] = b'#';

        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidSeparator {
                position: "rx4",
                ..
            }
        ));
    }

    #[test]
    fn trailer_accepts_marker_only() {
        let mut bytes = sample_file();
        bytes.truncate(bytes.len() - 12);
        assert!(parse_bytes(bytes).is_ok());
    }

    #[test]
    fn trailer_padding_is_not_checked() {
        let mut bytes = sample_file();
        let len = bytes.len();
        bytes[len - 12..].copy_from_slice(b"anything...!");
        assert!(parse_bytes(bytes).is_ok());
    }

    #[test]
    fn trailer_marker_is_checked() {
        let mut bytes = sample_file();
        let len = bytes.len();
        bytes[len - 16..len - 12].copy_from_slice(b"END!");
        let err = parse_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidSeparator {
                position: "trailer",
                ..
            }
        ));
    }

    #[test]
    fn missing_trailer_is_rejected() {
        let mut bytes = sample_file();
        bytes.truncate(bytes.len() - 16);
        assert!(matches!(
            parse_bytes(bytes).unwrap_err(),
            DecodeError::InvalidSeparator {
                position: "trailer",
                ..
            }
        ));
    }
}
