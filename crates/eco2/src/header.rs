//! # The fixed-width save-file header
//!
//! Every save file starts with a fixed-width block of metadata: version
//! tags, project name and description, timestamps. Textual fields are
//! stored as EUC-KR bytes, left-justified and padded with trailing NULs.
//!
//! Two layouts exist: the [`CURRENT`] seven-field one and the [`LEGACY`]
//! one with an extra trailing `Password` field. The header keeps its raw
//! bytes verbatim, so re-encoding a file reproduces the header
//! bit-for-bit even when a field does not decode as text.

use std::fmt;

use bstr::{BStr, ByteSlice};
use displaydoc::Display;
use encoding_rs::EUC_KR;
use serde_json::{Map, Value};
use thiserror::Error;

/// One named fixed-width header field
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Field {
    /// Width in bytes
    pub width: usize,
    /// Field name, as used in the json sidecar
    pub name: &'static str,
}

const fn field(width: usize, name: &'static str) -> Field {
    Field { width, name }
}

/// An ordered set of header fields
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    /// The fields in on-disk order
    pub fields: &'static [Field],
}

impl Layout {
    /// Total header width, the sum of all field widths
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Find the layout whose total width is exactly `len` bytes
    pub fn for_width(len: usize) -> Option<&'static Layout> {
        [&CURRENT, &LEGACY].into_iter().find(|l| l.width() == len)
    }
}

/// The current seven-field layout
pub static CURRENT: Layout = Layout {
    fields: &[
        field(2, "SFType"),
        field(10, "UIVersion"),
        field(10, "LGVersion"),
        field(100, "Name"),
        field(256, "Desc"),
        field(19, "MakeTime"),
        field(19, "EditTime"),
    ],
};

/// The legacy layout with a trailing password field
pub static LEGACY: Layout = Layout {
    fields: &[
        field(2, "SFType"),
        field(10, "UIVersion"),
        field(10, "LGVersion"),
        field(100, "Name"),
        field(256, "Desc"),
        field(19, "MakeTime"),
        field(19, "EditTime"),
        field(8, "Password"),
    ],
};

/// The save-file type tag stored in the first header field.
///
/// Three codes are seen in real files. Their exact meaning is not
/// documented; the codec treats them as opaque and never validates the
/// field on decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SfType {
    /// `"00"`
    Sf00,
    /// `"01"`
    Sf01,
    /// `"10"`
    Sf10,
}

impl SfType {
    /// All known codes, in fan-out order
    pub const ALL: [SfType; 3] = [SfType::Sf00, SfType::Sf01, SfType::Sf10];

    /// The two-character code
    pub fn code(&self) -> &'static str {
        match self {
            SfType::Sf00 => "00",
            SfType::Sf01 => "01",
            SfType::Sf10 => "10",
        }
    }
}

impl fmt::Display for SfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug)]
/// Failed to parse an SFType code
pub struct SfTypeError {}

impl fmt::Display for SfTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Use one of `00`, `01` or `10`")
    }
}

impl std::error::Error for SfTypeError {}

impl std::str::FromStr for SfType {
    type Err = SfTypeError;
    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val {
            "00" => Ok(Self::Sf00),
            "01" => Ok(Self::Sf01),
            "10" => Ok(Self::Sf10),
            _ => Err(SfTypeError {}),
        }
    }
}

/// Errors turning header sidecars back into a [`Header`]
#[derive(Debug, Display, Error)]
pub enum HeaderError {
    /// no known header layout is {0} bytes wide
    UnknownLayout(usize),
    /// header field `{0}` is missing from the json map
    MissingField(&'static str),
    /// header field `{0}` does not fit its declared width of {1} bytes
    Oversize(&'static str, usize),
    /// header field `{0}` cannot be encoded as EUC-KR
    Encoding(&'static str),
    /// header field `{0}` holds bytes that are not text
    NotText(&'static str),
    /// malformed header json: {0}
    Json(#[from] serde_json::Error),
}

/// A decoded header field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// Valid EUC-KR text, trailing NUL padding stripped
    Text(String),
    /// Bytes that do not decode in the legacy encoding, kept verbatim
    Raw(&'a BStr),
}

fn decode_field(bytes: &[u8]) -> FieldValue<'_> {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let (text, had_errors) = EUC_KR.decode_without_bom_handling(&bytes[..end]);
    if had_errors {
        FieldValue::Raw(bytes.as_bstr())
    } else {
        FieldValue::Text(text.into_owned())
    }
}

/// The fixed-width metadata block of a save file
#[derive(Clone, PartialEq)]
pub struct Header {
    raw: Vec<u8>,
    layout: &'static Layout,
}

impl Header {
    /// Wrap raw sidecar bytes, picking the layout that matches the length
    pub fn from_raw(raw: Vec<u8>) -> Result<Self, HeaderError> {
        let layout =
            Layout::for_width(raw.len()).ok_or(HeaderError::UnknownLayout(raw.len()))?;
        Ok(Header { raw, layout })
    }

    /// Split `input` into the fixed-width header and the remaining body.
    ///
    /// Returns `None` when the buffer is shorter than the layout.
    pub fn split<'a>(input: &'a [u8], layout: &'static Layout) -> Option<(Header, &'a [u8])> {
        let width = layout.width();
        if input.len() < width {
            return None;
        }
        let (head, body) = input.split_at(width);
        let header = Header {
            raw: head.to_vec(),
            layout,
        };
        Some((header, body))
    }

    /// The layout this header was read with
    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// The raw on-disk bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// The SFType code exactly as stored (may be arbitrary bytes)
    pub fn sftype(&self) -> &BStr {
        self.raw[..self.layout.fields[0].width].as_bstr()
    }

    /// A copy of this header with the SFType code replaced.
    ///
    /// Every byte after the first field is preserved untouched.
    pub fn with_sftype(&self, sftype: SfType) -> Header {
        let mut raw = self.raw.clone();
        raw[..self.layout.fields[0].width].copy_from_slice(sftype.code().as_bytes());
        Header {
            raw,
            layout: self.layout,
        }
    }

    /// Iterate over the decoded fields in declared order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldValue<'_>)> + '_ {
        let mut offset = 0;
        self.layout.fields.iter().map(move |f| {
            let bytes = &self.raw[offset..offset + f.width];
            offset += f.width;
            (f.name, decode_field(bytes))
        })
    }

    /// Decode one field by name
    pub fn get(&self, name: &str) -> Option<FieldValue<'_>> {
        self.fields().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Render the fields as a json object, in declared order.
    ///
    /// Fails when a field holds bytes that are not legacy-encoded text;
    /// the raw `.header` sidecar is the lossless fallback for such files.
    pub fn to_json(&self) -> Result<String, HeaderError> {
        let mut map = Map::new();
        for (name, value) in self.fields() {
            match value {
                FieldValue::Text(text) => {
                    map.insert(name.to_owned(), Value::String(text));
                }
                FieldValue::Raw(_) => return Err(HeaderError::NotText(name)),
            }
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }

    /// Rebuild a header from the json sidecar written by [`Header::to_json`].
    ///
    /// The layout is inferred from the keys: a map with a `Password` entry
    /// is the legacy layout.
    pub fn from_json(json: &str) -> Result<Self, HeaderError> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        let layout = if map.contains_key("Password") {
            &LEGACY
        } else {
            &CURRENT
        };
        let mut raw = Vec::with_capacity(layout.width());
        for field in layout.fields {
            let value = map
                .get(field.name)
                .and_then(Value::as_str)
                .ok_or(HeaderError::MissingField(field.name))?;
            let (encoded, _, had_errors) = EUC_KR.encode(value);
            if had_errors {
                return Err(HeaderError::Encoding(field.name));
            }
            if encoded.len() > field.width {
                return Err(HeaderError::Oversize(field.name, field.width));
            }
            let pad = field.width - encoded.len();
            raw.extend_from_slice(&encoded);
            raw.extend(std::iter::repeat(0).take(pad));
        }
        Ok(Header { raw, layout })
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Header");
        for (name, value) in self.fields() {
            s.field(name, &value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Header, Layout, SfType, CURRENT, LEGACY};

    fn sample(layout: &'static Layout) -> Header {
        let mut raw = vec![0u8; layout.width()];
        raw[..2].copy_from_slice(b"01");
        raw[2..8].copy_from_slice(b"2024.1");
        Header::from_raw(raw).unwrap()
    }

    #[test]
    fn layout_widths() {
        assert_eq!(CURRENT.width(), 416);
        assert_eq!(LEGACY.width(), 424);
        assert_eq!(LEGACY.width() - CURRENT.width(), 8);
        assert!(Layout::for_width(416).is_some());
        assert!(Layout::for_width(145).is_none());
    }

    #[test]
    fn replace_sftype_preserves_rest() {
        let header = sample(&LEGACY);
        let replaced = header.with_sftype(SfType::Sf10);
        assert_eq!(replaced.sftype(), "10");
        assert_eq!(&replaced.as_bytes()[2..], &header.as_bytes()[2..]);
    }

    #[test]
    fn decode_with_raw_fallback() {
        let mut raw = vec![0u8; CURRENT.width()];
        raw[..2].copy_from_slice(b"10");
        // 0xFF is not a valid EUC-KR lead byte
        raw[2] = 0xFF;
        raw[3] = 0xFF;
        let header = Header::from_raw(raw).unwrap();
        assert_eq!(header.get("SFType"), Some(FieldValue::Text("10".into())));
        assert!(matches!(header.get("UIVersion"), Some(FieldValue::Raw(_))));
    }

    #[test]
    fn json_round_trip() {
        let name = "사무소";
        let mut raw = vec![0u8; CURRENT.width()];
        raw[..2].copy_from_slice(b"00");
        let (encoded, _, _) = encoding_rs::EUC_KR.encode(name);
        raw[22..22 + encoded.len()].copy_from_slice(&encoded);
        let header = Header::from_raw(raw).unwrap();

        let json = header.to_json().unwrap();
        let back = Header::from_json(&json).unwrap();
        assert_eq!(back.as_bytes(), header.as_bytes());
        assert_eq!(back.get("Name"), Some(FieldValue::Text(name.into())));
    }

    #[test]
    fn json_oversize_field() {
        let json = format!(
            "{{\"SFType\": \"{}\", \"UIVersion\": \"\", \"LGVersion\": \"\", \
             \"Name\": \"\", \"Desc\": \"\", \"MakeTime\": \"\", \"EditTime\": \"\"}}",
            "x".repeat(3)
        );
        assert!(Header::from_json(&json).is_err());
    }

    #[test]
    fn unknown_layout_width() {
        assert!(Header::from_raw(vec![0u8; 145]).is_err());
    }
}
