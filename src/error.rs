//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when parsing font data or building glyph geometry
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    /// A glyph index or array index was out of range.
    BadIndex,
    /// Composite glyphs were nested deeper than the recursion limit.
    LimitExceeded,
    MissingTable(u32),
    /// A `cmap` subtable is in a format other than 4.
    UnsupportedFormat(u16),
    /// A contour could not be reconstructed into (on, off, on) curve segments.
    MalformedContour,
    /// A composite glyph refers back to itself, directly or through other composites.
    CompositeCycle(u16),
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::LimitExceeded => write!(f, "limit exceeded"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::UnsupportedFormat(format) => {
                write!(f, "unsupported cmap subtable format {}", format)
            }
            ParseError::MalformedContour => write!(f, "malformed glyph contour"),
            ParseError::CompositeCycle(glyph_index) => {
                write!(f, "composite glyph {} references itself", glyph_index)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    #[test]
    fn display_missing_table() {
        let err = ParseError::MissingTable(tag::LOCA);
        assert_eq!(err.to_string(), "font is missing 'loca' table");
    }

    #[test]
    fn display_unsupported_format() {
        assert_eq!(
            ParseError::UnsupportedFormat(12).to_string(),
            "unsupported cmap subtable format 12"
        );
    }
}
