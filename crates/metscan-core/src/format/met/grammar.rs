/// Value parser selected for a named field.
///
/// Vector kinds carry the exact number of whitespace-separated tokens the
/// value must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Text,
    Location,
    FloatVec(usize),
    IntVec(usize),
    JoinedDateTime,
}

/// One entry of a field table: a unique name and the parser applied to its
/// value text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

pub const HEADER_FIELDS: &[FieldSpec] = &[
    field("TYPE", FieldKind::Int),
    field("SITENAME", FieldKind::Text),
    field("LOCATION", FieldKind::Location),
    field("TIME_ZONE", FieldKind::Float),
    field("FREQUENCY", FieldKind::Float),
    field("LO_FREQUENCY", FieldKind::Float),
    field("CHANNELS", FieldKind::Int),
    field("RANGE", FieldKind::Int),
    field("RESOLUTION", FieldKind::Int),
    field("GATES", FieldKind::Int),
    field("PRF", FieldKind::Int),
    field("ANTENNA_COORDS", FieldKind::FloatVec(10)),
    field("PHASE_OFFSETS", FieldKind::FloatVec(5)),
    field("INTEGRATIONS", FieldKind::Int),
    field("BASETIME", FieldKind::Int),
    field("DATE", FieldKind::JoinedDateTime),
    field("FILE_SPOOL", FieldKind::Text),
    field("MET.RGE#", FieldKind::Int),
    field("START.POS", FieldKind::Int),
    field("PEAK.POS", FieldKind::Int),
    field(RECL_PTS_FIELD, FieldKind::Int),
    field("RECORD_LENGTH", FieldKind::Float),
    field("NSMOOTH", FieldKind::Int),
    field("MINHT", FieldKind::Int),
    field("MAXHT", FieldKind::Int),
    field("RXLIST", FieldKind::IntVec(5)),
    field("RX_GAIN", FieldKind::Int),
    field("TIME_ACCURACY", FieldKind::Text),
    field("GPS_STATUS", FieldKind::Text),
    field("VEL_ERR_LIM", FieldKind::Float),
    field("SN_ACCEPT_RATIO", FieldKind::Float),
    field("T_DECAY_MAX", FieldKind::Float),
    field("PLANE_NORMAL", FieldKind::FloatVec(2)),
    field("PULSE_CODE", FieldKind::Text),
    field("MODE", FieldKind::Text),
];

pub const RECORD_FIELDS: &[FieldSpec] = &[
    field("File", FieldKind::Text),
    field("Rge", FieldKind::Float),
    field("Ht", FieldKind::Float),
    field("Vrad", FieldKind::Float),
    field("delVr", FieldKind::Float),
    field("Theta", FieldKind::Float),
    field("Phi0", FieldKind::Float),
    field("Ambig", FieldKind::Int),
    field("Delphase", FieldKind::Float),
    field("ant pair", FieldKind::Int),
    field("IREX", FieldKind::Float),
    field("amax", FieldKind::Float),
    field("Tau", FieldKind::Float),
    field("vmet", FieldKind::Float),
    field("snrdb", FieldKind::Float),
];

pub const RECL_PTS_FIELD: &str = "RECL_PTS";

pub const DATA_SECTION: &str = "DATA";
pub const CORRELATION_SECTION: &str = "CORR12";
pub const BLANK_LINE: &str = "";
pub const BLANK_LINE_CONTEXT: &str = "blank line after correlation block";
pub const AMBIGUITY_PREFIX: &str = "AMBIGUITY = ";
pub const AMBIGUITY_FIELD: &str = "AMBIGUITY";
pub const COLUMN_HEADER_CONTEXT: &str = "column header line";
pub const RECORD_LINE_CONTEXT: &str = "record line";
pub const RECORD_DATE_FIELD: &str = "date";
/// Date and time tokens that open the record line.
pub const RECORD_DATE_TOKENS: usize = 2;

pub const CORRELATION_POINTS: usize = 500;
pub const CORRELATION_COUNT_SECTION: &str = "correlation count";
pub const CORRELATION_LAG_SECTION: &str = "correlation lag";
pub const CORRELATION_TIME_SHIFT_SECTION: &str = "correlation time shift";
pub const CORRELATION_AMPLITUDE_SECTION: &str = "correlation amplitude";
pub const CORRELATION_PHASE_SECTION: &str = "correlation phase";

pub const SIGNAL_MARKER: &[u8; 4] = b"****";
pub const CHANNEL_COUNT: usize = 5;
/// Bytes per interleaved (real, imaginary) i16 sample.
pub const SAMPLE_SIZE: usize = 4;

/// Bytes requested for the trailer read; only the marker prefix is checked.
pub const TRAILER_LEN: usize = 16;
pub const TRAILER_POSITION: &str = "trailer";
