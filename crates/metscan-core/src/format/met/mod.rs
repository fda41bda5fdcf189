//! MET meteor-radar file decoding.
//!
//! A MET file is one detection: a block of named ASCII header lines, a
//! `DATA` section with an ambiguity line and one whitespace-separated record
//! line, a `CORR12` binary correlation block, and five `****`-prefixed blocks
//! of little-endian i16 I/Q samples, closed by a `****` trailer.
//!
//! The decoder is fail-fast and strictly ordered: every header field must
//! appear in grammar order, every delimiter line must match exactly, and
//! every binary block must be complete. Field tables live in `grammar`,
//! stream conventions in `reader`.

pub mod error;
pub mod grammar;
pub mod parser;
pub mod reader;
pub mod value;
pub mod writer;

pub use parser::{parse, parse_file};
pub use writer::{encode, write_record};
