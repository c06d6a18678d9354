//! # Decoding and encoding save files
//!
//! A save file is the fixed-width [`Header`] followed by the XML body.
//! Two generations of the wire format exist and both are supported:
//!
//! * the current form prefixes each body segment with its byte length as
//!   a little-endian `i64`;
//! * the legacy form stores the body as one text blob and the result
//!   segment is located by scanning for its open-tag marker.
//!
//! [`SaveFile::decode`] sniffs the generation, trying the current form
//! first: a legacy buffer fails the length-prefixed parse structurally,
//! while the reverse ambiguity does not exist (see [`FormatVariant`]).
//!
//! Body text uses CRLF on the wire and LF in memory; the conversion is
//! part of decode/encode and independent of the XOR transform.

use std::{fs, path::Path};

use bstr::ByteSlice;
use displaydoc::Display;
use log::{debug, info, warn};
use nom::{number::complete::le_i64, Finish};
use thiserror::Error;

use crate::{
    cipher,
    header::{self, Header, HeaderError, Layout},
    kind::SaveKind,
    lzo::{Lzo, LzoError},
    util::{crlf_to_lf, lf_to_crlf},
};

/// Closing tag of the design segment
pub const DS_CLOSE: &str = "</DS>";
/// Open-tag marker of the result segment
pub const DSR_OPEN: &str = "<DSR xmlns=\"http://tempuri.org/DSR.xsd";
/// Closing tag of the result segment
pub const DSR_CLOSE: &str = "</DSR>";
/// Placeholder written when a file carries no result segment
pub const EMPTY_DSR: &str = "<DSR xmlns=\"http://tempuri.org/DSR.xsd\"></DSR>";

/// How the XML body is carved out of the buffer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Segmentation {
    /// Each segment is preceded by its byte length as an `i64` LE
    LengthPrefixed,
    /// Segments are located by scanning for the DSR open-tag marker
    MarkerScan,
}

/// A tagged descriptor for one generation of the wire format
#[derive(Debug, PartialEq, Eq)]
pub struct FormatVariant {
    /// The header layout of this generation
    pub layout: &'static Layout,
    /// The body segmentation strategy
    pub segmentation: Segmentation,
    /// Short name for log output
    pub name: &'static str,
}

/// The current length-prefixed format
pub static CURRENT: FormatVariant = FormatVariant {
    layout: &header::CURRENT,
    segmentation: Segmentation::LengthPrefixed,
    name: "current",
};

/// The legacy marker-scanned format
pub static LEGACY: FormatVariant = FormatVariant {
    layout: &header::LEGACY,
    segmentation: Segmentation::MarkerScan,
    name: "legacy",
};

impl FormatVariant {
    /// Pick the variant whose header layout is `len` bytes wide
    pub fn for_header_len(len: usize) -> Option<&'static FormatVariant> {
        [&CURRENT, &LEGACY]
            .into_iter()
            .find(|v| v.layout.width() == len)
    }
}

/// Errors decoding a save buffer
#[derive(Debug, Display, Error)]
pub enum DecodeError {
    /// save data is truncated: expected at least {expected} bytes, found {actual}
    TooShort {
        /// Bytes required
        expected: usize,
        /// Bytes present
        actual: usize,
    },
    /// design segment root tag not found
    MissingDsRoot,
    /// segment length {0} is out of range
    SegmentLength(i64),
    /// MiniLZO support is not compiled into this build
    CompressionUnavailable,
    /// malformed MiniLZO data: {0}
    Compression(String),
}

impl DecodeError {
    /// Whether this is a structural error.
    ///
    /// Structural errors are eligible for the retry with the inverted
    /// XOR policy; compression errors are not.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DecodeError::TooShort { .. }
                | DecodeError::MissingDsRoot
                | DecodeError::SegmentLength(_)
        )
    }
}

impl From<LzoError> for DecodeError {
    fn from(e: LzoError) -> Self {
        match e {
            LzoError::Unavailable => DecodeError::CompressionUnavailable,
            LzoError::Malformed(msg) => DecodeError::Compression(msg),
        }
    }
}

/// Errors reading save files and their sidecars from disk
#[derive(Debug, Display, Error)]
pub enum ReadError {
    /// {0}
    Io(#[from] std::io::Error),
    /// {0}
    Decode(#[from] DecodeError),
    /// {0}
    Header(#[from] HeaderError),
}

impl From<LzoError> for ReadError {
    fn from(e: LzoError) -> Self {
        ReadError::Decode(e.into())
    }
}

/// Split body text into the design segment and the optional result
/// segment by scanning for the DSR open-tag marker.
///
/// The design segment ends at the nearest `</DS>` before the marker;
/// anything between the two (undecodable filler in real files) is
/// dropped.
pub fn split_xml(text: &str) -> (&str, Option<&str>) {
    match text.find(DSR_OPEN) {
        None => (text, None),
        Some(i) => {
            let end = text[..i]
                .rfind(DS_CLOSE)
                .map(|j| j + DS_CLOSE.len())
                .unwrap_or(i);
            (&text[..end], Some(&text[i..]))
        }
    }
}

/// Read one `i64`-length-prefixed segment, returning `(rest, segment)`
fn take_segment(input: &[u8]) -> Result<(&[u8], &[u8]), DecodeError> {
    let (rest, len) = le_i64::<_, nom::error::Error<&[u8]>>(input)
        .finish()
        .map_err(|_| DecodeError::TooShort {
            expected: 8,
            actual: input.len(),
        })?;
    let n = usize::try_from(len)
        .ok()
        .filter(|n| *n <= rest.len())
        .ok_or(DecodeError::SegmentLength(len))?;
    Ok((&rest[n..], &rest[..n]))
}

/// One decoded save file
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFile {
    /// Project metadata
    pub header: Header,
    /// The design (input) XML document, LF line endings
    pub ds: String,
    /// The result XML document, if present
    pub dsr: Option<String>,
}

impl SaveFile {
    /// Decode a plain (de-obfuscated, decompressed) buffer as `variant`
    pub fn decode_as(raw: &[u8], variant: &'static FormatVariant) -> Result<Self, DecodeError> {
        let width = variant.layout.width();
        let (header, body) =
            Header::split(raw, variant.layout).ok_or(DecodeError::TooShort {
                expected: width,
                actual: raw.len(),
            })?;

        match variant.segmentation {
            Segmentation::LengthPrefixed => {
                let (rest, ds_bytes) = take_segment(body)?;
                let ds = crlf_to_lf(&String::from_utf8_lossy(ds_bytes));
                if !ds.starts_with("<DS") {
                    return Err(DecodeError::MissingDsRoot);
                }

                let dsr = if rest.is_empty() || raw.find(DSR_CLOSE.as_bytes()).is_none() {
                    if !rest.is_empty() {
                        warn!("ignoring {} trailing bytes after the DS segment", rest.len());
                    }
                    None
                } else {
                    let (tail, dsr_bytes) = take_segment(rest)?;
                    if !tail.is_empty() {
                        warn!(
                            "ignoring {} trailing bytes after the DSR segment",
                            tail.len()
                        );
                    }
                    let dsr = crlf_to_lf(&String::from_utf8_lossy(dsr_bytes));
                    if !dsr.starts_with("<DSR") {
                        warn!("unexpected DSR start: {}", dsr.lines().next().unwrap_or(""));
                    }
                    Some(dsr)
                };

                Ok(SaveFile { header, ds, dsr })
            }
            Segmentation::MarkerScan => {
                // lossy on purpose: some producers leave undecodable
                // filler between the segments
                let text = crlf_to_lf(&String::from_utf8_lossy(body));
                if !text.contains(DS_CLOSE) {
                    return Err(DecodeError::MissingDsRoot);
                }
                let (ds, dsr) = split_xml(&text);
                Ok(SaveFile {
                    header,
                    ds: ds.to_owned(),
                    dsr: dsr.map(str::to_owned),
                })
            }
        }
    }

    /// Decode a plain buffer, sniffing the format generation
    pub fn decode(raw: &[u8]) -> Result<(Self, &'static FormatVariant), DecodeError> {
        match SaveFile::decode_as(raw, &CURRENT) {
            Ok(save) => Ok((save, &CURRENT)),
            Err(e) => {
                debug!("not a {} save ({}), trying {}", CURRENT.name, e, LEGACY.name);
                let save = SaveFile::decode_as(raw, &LEGACY)?;
                Ok((save, &LEGACY))
            }
        }
    }

    /// De-obfuscate, decompress and decode a raw file buffer
    pub fn decrypt(
        raw: &[u8],
        xor: bool,
        decompress: bool,
        lzo: &dyn Lzo,
    ) -> Result<(Self, &'static FormatVariant), DecodeError> {
        let data = if xor {
            cipher::transform(raw)
        } else {
            raw.to_vec()
        };
        let data = if decompress {
            lzo.decompress(&data)?
        } else {
            data
        };
        SaveFile::decode(&data)
    }

    /// Decrypt with the given policy, retrying once with the XOR flag
    /// inverted when the buffer fails structurally.
    ///
    /// Some files circulate with a misleading extension; the retry makes
    /// them readable without user intervention.
    pub fn decrypt_with_retry(
        raw: &[u8],
        xor: bool,
        decompress: bool,
        lzo: &dyn Lzo,
    ) -> Result<(Self, &'static FormatVariant), DecodeError> {
        match SaveFile::decrypt(raw, xor, decompress, lzo) {
            Ok(v) => Ok(v),
            Err(e) if e.is_structural() => {
                info!("decode with xor={} failed ({}); retrying with xor={}", xor, e, !xor);
                SaveFile::decrypt(raw, !xor, decompress, lzo)
            }
            Err(e) => Err(e),
        }
    }

    /// Read and decrypt a save file, inferring the XOR and compression
    /// policy from the extension.
    ///
    /// Unknown extensions are treated as plain (`.tpl`-like) saves; the
    /// structural retry still catches obfuscated ones.
    pub fn read(path: &Path, lzo: &dyn Lzo) -> Result<(Self, &'static FormatVariant), ReadError> {
        let kind = SaveKind::from_path(path);
        if kind.is_none() {
            debug!(
                "unknown extension on \"{}\", assuming a plain save",
                path.display()
            );
        }
        let (xor, decompress) = kind
            .map(|k| (k.obfuscated(), k.compressed()))
            .unwrap_or((false, false));
        let raw = fs::read(path)?;
        Ok(SaveFile::decrypt_with_retry(&raw, xor, decompress, lzo)?)
    }

    /// The combined XML text: ds, then dsr on a new line when present
    pub fn xml(&self) -> String {
        match &self.dsr {
            None => self.ds.clone(),
            Some(dsr) => format!("{}\n{}", self.ds, dsr),
        }
    }

    /// A copy with the result segment dropped
    pub fn without_dsr(&self) -> SaveFile {
        SaveFile {
            header: self.header.clone(),
            ds: self.ds.clone(),
            dsr: None,
        }
    }

    /// A copy with the SFType header code replaced
    pub fn with_sftype(&self, sftype: header::SfType) -> SaveFile {
        SaveFile {
            header: self.header.with_sftype(sftype),
            ds: self.ds.clone(),
            dsr: self.dsr.clone(),
        }
    }

    /// The segmentation matching this file's header layout
    pub fn segmentation(&self) -> Segmentation {
        FormatVariant::for_header_len(self.header.as_bytes().len())
            .map_or(Segmentation::LengthPrefixed, |v| v.segmentation)
    }

    /// Render the plain (un-obfuscated, uncompressed) wire bytes
    pub fn encode(&self, segmentation: Segmentation) -> Vec<u8> {
        let mut data = self.header.as_bytes().to_vec();
        match segmentation {
            Segmentation::LengthPrefixed => {
                let ds = lf_to_crlf(&self.ds).into_bytes();
                data.extend_from_slice(&(ds.len() as i64).to_le_bytes());
                data.extend_from_slice(&ds);
                let dsr = lf_to_crlf(self.dsr.as_deref().unwrap_or(EMPTY_DSR)).into_bytes();
                data.extend_from_slice(&(dsr.len() as i64).to_le_bytes());
                data.extend_from_slice(&dsr);
            }
            Segmentation::MarkerScan => {
                data.extend_from_slice(lf_to_crlf(&self.xml()).as_bytes());
            }
        }
        data
    }

    /// Encode, then compress and obfuscate per the target policy.
    ///
    /// Compression runs before the XOR transform, mirroring the decode
    /// order exactly.
    pub fn encrypt(
        &self,
        segmentation: Segmentation,
        xor: bool,
        compress: bool,
        lzo: &dyn Lzo,
    ) -> Result<Vec<u8>, LzoError> {
        let mut data = self.encode(segmentation);
        if compress {
            data = lzo.compress(&data)?;
        }
        if xor {
            data = cipher::transform(&data);
        }
        Ok(data)
    }
}
