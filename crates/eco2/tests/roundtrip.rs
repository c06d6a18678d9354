//! Round-trip tests against synthetic save buffers.

use eco2::{
    cipher, header,
    lzo::NoLzo,
    save::{self, DecodeError, SaveFile, Segmentation, CURRENT, LEGACY},
    SfType,
};

/// A legacy buffer: all-zero header with SFType `10`, then `body`
fn legacy_raw(body: &[u8]) -> Vec<u8> {
    let mut raw = vec![0u8; header::LEGACY.width()];
    raw[..2].copy_from_slice(b"10");
    raw.extend_from_slice(body);
    raw
}

/// A current-format buffer with length-prefixed segments
fn current_raw(ds: &str, dsr: &str) -> Vec<u8> {
    let mut raw = vec![0u8; header::CURRENT.width()];
    raw[..2].copy_from_slice(b"00");
    raw.extend_from_slice(&(ds.len() as i64).to_le_bytes());
    raw.extend_from_slice(ds.as_bytes());
    raw.extend_from_slice(&(dsr.len() as i64).to_le_bytes());
    raw.extend_from_slice(dsr.as_bytes());
    raw
}

#[test]
fn minimal_legacy_save() {
    let raw = legacy_raw(b"<DS></DS>");
    assert_eq!(raw.len(), header::LEGACY.width() + 9);

    let (save_file, variant) = SaveFile::decode(&raw).unwrap();
    assert_eq!(variant, &LEGACY);
    assert_eq!(save_file.header.sftype(), "10");
    assert_eq!(save_file.ds, "<DS></DS>");
    assert_eq!(save_file.dsr, None);

    assert_eq!(save_file.encode(Segmentation::MarkerScan), raw);
}

#[test]
fn marker_scan_drops_filler() {
    let dsr = "<DSR xmlns=\"http://tempuri.org/DSR.xsd\"><r/></DSR>";
    let mut raw = legacy_raw(b"<DS><wall/></DS>");
    // undecodable filler between the segments
    raw.extend_from_slice(&[0xC1, 0xC2]);
    raw.extend_from_slice(dsr.as_bytes());

    let (save_file, variant) = SaveFile::decode(&raw).unwrap();
    assert_eq!(variant, &LEGACY);
    assert_eq!(save_file.ds, "<DS><wall/></DS>");
    assert_eq!(save_file.dsr.as_deref(), Some(dsr));
    assert_eq!(save_file.xml(), format!("<DS><wall/></DS>\n{}", dsr));
}

#[test]
fn current_round_trip() {
    let ds = "<DS>\r\n  <area>42</area>\r\n</DS>";
    let raw = current_raw(ds, save::EMPTY_DSR);

    let (save_file, variant) = SaveFile::decode(&raw).unwrap();
    assert_eq!(variant, &CURRENT);
    assert_eq!(save_file.ds, ds.replace("\r\n", "\n"));
    assert_eq!(save_file.dsr.as_deref(), Some(save::EMPTY_DSR));

    assert_eq!(save_file.encode(Segmentation::LengthPrefixed), raw);
}

#[test]
fn placeholder_for_missing_dsr() {
    let raw = current_raw("<DS></DS>", save::EMPTY_DSR);
    let (save_file, _) = SaveFile::decode(&raw).unwrap();

    let encoded = save_file.without_dsr().encode(Segmentation::LengthPrefixed);
    assert_eq!(encoded, raw);
}

#[test]
fn eco_round_trip() {
    let plain = legacy_raw(b"<DS></DS>");
    let raw = cipher::transform(&plain);

    let (save_file, variant) = SaveFile::decrypt(&raw, true, false, &NoLzo).unwrap();
    assert_eq!(variant, &LEGACY);

    let encoded = save_file
        .encrypt(Segmentation::MarkerScan, true, false, &NoLzo)
        .unwrap();
    assert_eq!(encoded, raw);
}

#[test]
fn retry_recovers_mislabeled_file() {
    let plain = legacy_raw(b"<DS></DS>");
    let raw = cipher::transform(&plain);

    // the extension claimed a plain save, the content is obfuscated
    let (save_file, _) = SaveFile::decrypt_with_retry(&raw, false, false, &NoLzo).unwrap();
    assert_eq!(save_file.ds, "<DS></DS>");
}

#[test]
fn sftype_fan_out_changes_two_bytes() {
    let raw = legacy_raw(b"<DS></DS>");
    let (save_file, _) = SaveFile::decode(&raw).unwrap();

    let outputs: Vec<Vec<u8>> = SfType::ALL
        .iter()
        .map(|sf| save_file.with_sftype(*sf).encode(Segmentation::MarkerScan))
        .collect();

    assert_eq!(outputs.len(), 3);
    for (sf, out) in SfType::ALL.iter().zip(&outputs) {
        assert_eq!(&out[..2], sf.code().as_bytes());
        assert_eq!(&out[2..], &outputs[0][2..]);
    }
}

#[test]
fn structural_errors() {
    assert!(matches!(
        SaveFile::decode(&[0u8; 16]),
        Err(DecodeError::TooShort { .. })
    ));

    let raw = vec![b'x'; header::LEGACY.width() + 32];
    assert!(matches!(
        SaveFile::decode(&raw),
        Err(DecodeError::MissingDsRoot)
    ));
}

#[test]
fn missing_codec_is_soft_error() {
    let raw = current_raw("<DS></DS>", save::EMPTY_DSR);

    let err = SaveFile::decrypt(&raw, false, true, &NoLzo).unwrap_err();
    assert!(matches!(err, DecodeError::CompressionUnavailable));
    assert!(!err.is_structural());
}

#[cfg(feature = "minilzo")]
#[test]
fn ecox_pipeline() {
    use eco2::{lzo::MiniLzo, Header};

    let ds = "<DS>\n  <zone>A</zone>\n</DS>";
    let mut raw_header = vec![0u8; header::CURRENT.width()];
    raw_header[..2].copy_from_slice(b"10");
    let save_file = SaveFile {
        header: Header::from_raw(raw_header).unwrap(),
        ds: ds.to_owned(),
        dsr: None,
    };

    let data = save_file
        .encrypt(Segmentation::LengthPrefixed, true, true, &MiniLzo)
        .unwrap();
    let (back, variant) = SaveFile::decrypt(&data, true, true, &MiniLzo).unwrap();
    assert_eq!(variant, &CURRENT);
    assert_eq!(back.ds, ds);
    assert_eq!(back.dsr.as_deref(), Some(save::EMPTY_DSR));
    assert_eq!(back.header, save_file.header);
}
