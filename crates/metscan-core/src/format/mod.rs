//! File format decoding modules.
//!
//! Each format follows a layered structure:
//! - `grammar`: field tables, delimiters and block sizes (source of truth)
//! - `value`: typed value parsers selected by the grammar
//! - `reader`: sequential line and binary access over one stream
//! - `parser`: domain-level decoding (no direct byte handling)
//! - `writer`: the inverse of the parser, used to build fixtures
//! - `error`: explicit, actionable errors
//!
//! Parsers hold no state between calls and do not log; callers decide how
//! to surface failures.

pub mod met;
