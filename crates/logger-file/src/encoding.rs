//! Text encodings for log files

use crate::{Error, Result};
use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8};
use serde::Deserialize;

/// Encoding applied to rendered text, with or without a byte order mark.
///
/// UTF-16 variants always carry a BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct FileEncoding {
    encoding: &'static Encoding,
    bom: bool,
}

impl FileEncoding {
    /// UTF-8 without a BOM.
    pub fn utf8() -> Self {
        Self {
            encoding: UTF_8,
            bom: false,
        }
    }

    /// UTF-8 preceded by `EF BB BF`.
    pub fn utf8_bom() -> Self {
        Self {
            encoding: UTF_8,
            bom: true,
        }
    }

    /// Little-endian UTF-16.
    pub fn utf16_le() -> Self {
        Self {
            encoding: UTF_16LE,
            bom: true,
        }
    }

    /// Big-endian UTF-16.
    pub fn utf16_be() -> Self {
        Self {
            encoding: UTF_16BE,
            bom: true,
        }
    }

    /// Look up an encoding by its WHATWG label (`utf-8`, `utf-16`,
    /// `windows-1252`, ...). `utf-8-bom` selects UTF-8 with a BOM.
    pub fn for_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("utf-8-bom") || trimmed.eq_ignore_ascii_case("utf8-bom") {
            return Ok(Self::utf8_bom());
        }

        match Encoding::for_label(trimmed.as_bytes()) {
            Some(encoding) if encoding == REPLACEMENT => Err(Error::UnknownEncoding(label.into())),
            Some(encoding) => Ok(Self {
                encoding,
                bom: encoding == UTF_16LE || encoding == UTF_16BE,
            }),
            None => Err(Error::UnknownEncoding(label.into())),
        }
    }

    /// The underlying encoding.
    pub const fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Bytes written at the start of an empty file.
    pub fn preamble(&self) -> &'static [u8] {
        if !self.bom {
            &[]
        } else if self.encoding == UTF_16LE {
            &[0xFF, 0xFE]
        } else if self.encoding == UTF_16BE {
            &[0xFE, 0xFF]
        } else {
            &[0xEF, 0xBB, 0xBF]
        }
    }

    /// Encode `text`; unmappable characters become numeric character
    /// references.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        if self.encoding == UTF_16LE {
            text.encode_utf16().flat_map(u16::to_le_bytes).collect()
        } else if self.encoding == UTF_16BE {
            text.encode_utf16().flat_map(u16::to_be_bytes).collect()
        } else {
            self.encoding.encode(text).0.into_owned()
        }
    }
}

impl Default for FileEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl TryFrom<String> for FileEncoding {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::for_label(&value)
    }
}
