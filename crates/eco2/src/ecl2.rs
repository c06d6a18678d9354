//! # ECO2-OD exchange files (`.ECL2`)
//!
//! Unlike the binary save kinds, an `.ECL2` file is the XML body alone,
//! with neither header nor obfuscation. Its first line starts with a
//! short non-XML prefix and is required to end with the `<DS ...>` open
//! tag; the line is re-synthesized from that tag on read.

use std::{fs, path::Path};

use crate::{
    save::{split_xml, DecodeError, ReadError},
    util::crlf_to_lf,
};

/// Open tag of the design segment
pub const DS_OPEN: &str = "<DS xmlns=\"http://tempuri.org/DS.xsd\">";

/// Whether a path uses the `.ecl2` extension (case-insensitive)
pub fn matches(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("ecl2"))
        .unwrap_or(false)
}

/// Extract the design and result segments from ECL2 bytes.
///
/// Everything before the `<DS ...>` open tag on the first line is the
/// encoding prefix and is dropped.
pub fn parse(raw: &[u8]) -> Result<(String, Option<String>), DecodeError> {
    let text = crlf_to_lf(&String::from_utf8_lossy(raw));
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (text.as_str(), None),
    };
    let i = first.find("<DS ").ok_or(DecodeError::MissingDsRoot)?;

    let mut body = first[i..].to_owned();
    if let Some(rest) = rest {
        body.push('\n');
        body.push_str(rest);
    }

    let (ds, dsr) = split_xml(&body);
    Ok((ds.to_owned(), dsr.map(str::to_owned)))
}

/// Read an `.ECL2` file
pub fn read(path: &Path) -> Result<(String, Option<String>), ReadError> {
    let raw = fs::read(path)?;
    Ok(parse(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::{parse, DS_OPEN};
    use crate::save::DecodeError;

    #[test]
    fn resynthesizes_first_line() {
        let raw = format!("\u{feff}#12{}\r\n<a/>\r\n</DS>", DS_OPEN);
        let (ds, dsr) = parse(raw.as_bytes()).unwrap();
        assert_eq!(ds, format!("{}\n<a/>\n</DS>", DS_OPEN));
        assert_eq!(dsr, None);
    }

    #[test]
    fn keeps_result_segment() {
        let raw = format!(
            "{}</DS>\n<DSR xmlns=\"http://tempuri.org/DSR.xsd\"></DSR>",
            DS_OPEN
        );
        let (ds, dsr) = parse(raw.as_bytes()).unwrap();
        assert!(ds.ends_with("</DS>"));
        assert!(dsr.unwrap().starts_with("<DSR"));
    }

    #[test]
    fn rejects_missing_root() {
        assert!(matches!(
            parse(b"<html></html>"),
            Err(DecodeError::MissingDsRoot)
        ));
    }
}
