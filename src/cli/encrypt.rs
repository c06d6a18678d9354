//! Encrypt header and xml sidecars back into save files.

use std::{fs, path::Path};

use color_eyre::eyre::{self, eyre};
use log::{debug, error, info};

use eco2::{
    lzo::{self, Lzo},
    save::{self, ReadError},
    util::crlf_to_lf,
    Header, SaveFile,
};

use super::{
    opt::{EncryptOpts, SfTypeArg},
    util,
};

/// Run the `encrypt` subcommand
pub fn run(opt: &EncryptOpts) -> eyre::Result<()> {
    let lzo = lzo::detect();
    if opt.kind.compressed() && !lzo.available() {
        return Err(eyre!(
            "`.{}` output needs MiniLZO support, which is not compiled in",
            opt.kind.extension()
        ));
    }

    let targets = util::collect_targets(&opt.input, |p| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xml"))
            .unwrap_or(false)
    })?;

    let shared_header = match &opt.header {
        Some(path) => Some(read_header(path)?),
        None => None,
    };

    let mut failed = 0usize;
    for xml in &targets {
        if let Err(e) = encrypt_one(xml, shared_header.clone(), opt, lzo) {
            error!("failed to encrypt `{}`: {}", xml.display(), e);
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(eyre!("{} of {} file(s) failed", failed, targets.len()));
    }
    Ok(())
}

/// Read a header sidecar: json field map or raw fixed-width bytes
fn read_header(path: &Path) -> Result<Header, ReadError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let header = if is_json {
        Header::from_json(&fs::read_to_string(path)?)?
    } else {
        Header::from_raw(fs::read(path)?)?
    };
    debug!("header=`{}`", path.display());
    Ok(header)
}

fn encrypt_one(
    xml: &Path,
    header: Option<Header>,
    opt: &EncryptOpts,
    lzo: &dyn Lzo,
) -> Result<(), ReadError> {
    let header = match header {
        Some(header) => header,
        None => {
            let raw = xml.with_extension("header");
            let path = if raw.exists() {
                raw
            } else {
                xml.with_extension("json")
            };
            read_header(&path)?
        }
    };

    info!("xml=`{}`", xml.display());
    let text = crlf_to_lf(&fs::read_to_string(xml)?);
    let (ds, dsr) = save::split_xml(&text);
    let save = SaveFile {
        header,
        ds: ds.to_owned(),
        dsr: dsr.filter(|_| opt.dsr).map(str::to_owned),
    };

    let dir = util::out_dir(xml, opt.output.as_deref())?;
    let stem = util::stem(xml);
    let segmentation = save.segmentation();

    for sftype in opt.sftype.codes() {
        let save = save.with_sftype(sftype);
        let data = save.encrypt(
            segmentation,
            opt.kind.obfuscated(),
            opt.kind.compressed(),
            lzo,
        )?;
        let name = match opt.sftype {
            SfTypeArg::All => format!("{} SF{}.{}", stem, sftype.code(), opt.kind.extension()),
            SfTypeArg::One(_) => format!("{}.{}", stem, opt.kind.extension()),
        };
        let dst = dir.join(name);
        fs::write(&dst, data)?;
        info!("dst=`{}`", dst.display());
    }
    Ok(())
}
