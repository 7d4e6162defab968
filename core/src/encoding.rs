//! Text encodings accepted for submission XML bodies.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Encoding applied to submission XML before it is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum XmlEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1.
    Latin1,
    Ascii,
}

impl XmlEncoding {
    pub fn name(self) -> &'static str {
        match self {
            XmlEncoding::Utf8 => "utf-8",
            XmlEncoding::Utf16Le => "utf-16le",
            XmlEncoding::Utf16Be => "utf-16be",
            XmlEncoding::Latin1 => "iso-8859-1",
            XmlEncoding::Ascii => "us-ascii",
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, ApiError> {
        match self {
            XmlEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            XmlEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            XmlEncoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            XmlEncoding::Latin1 => self.single_byte(text, 0xFF),
            XmlEncoding::Ascii => self.single_byte(text, 0x7F),
        }
    }

    fn single_byte(self, text: &str, max: u32) -> Result<Vec<u8>, ApiError> {
        text.chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .ok()
                    .filter(|b| u32::from(*b) <= max)
                    .ok_or_else(|| ApiError::Encoding {
                        encoding: self.name(),
                        reason: format!("character {c:?} is not representable"),
                    })
            })
            .collect()
    }
}

impl fmt::Display for XmlEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for XmlEncoding {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(XmlEncoding::Utf8),
            "utf-16le" | "utf-16-le" => Ok(XmlEncoding::Utf16Le),
            "utf-16be" | "utf-16-be" => Ok(XmlEncoding::Utf16Be),
            "iso-8859-1" | "latin-1" | "latin1" => Ok(XmlEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(XmlEncoding::Ascii),
            _ => Err(ApiError::invalid(
                "encoding",
                crate::error::ValidationKind::InvalidParameter,
                format!("unsupported encoding {s:?}"),
            )),
        }
    }
}
