//! Decrypt save files into header and xml sidecars.

use std::{fs, path::Path};

use color_eyre::eyre::{self, eyre};
use log::{debug, error, info, warn};

use eco2::{
    ecl2,
    lzo::{self, Lzo},
    save::{DecodeError, ReadError},
    SaveFile, SaveKind,
};

use super::{opt::DecryptOpts, util};

/// Run the `decrypt` subcommand
pub fn run(opt: &DecryptOpts) -> eyre::Result<()> {
    let lzo = lzo::detect();
    if !lzo.available() {
        warn!("MiniLZO support is not compiled in; `.ecox`/`.tplx` files will be skipped");
    }

    let targets = util::collect_targets(&opt.input, |p| {
        SaveKind::from_path(p).is_some() || ecl2::matches(p)
    })?;

    let mut failed = 0usize;
    for src in &targets {
        match decrypt_one(src, opt, lzo) {
            Ok(()) => {}
            Err(ReadError::Decode(DecodeError::CompressionUnavailable)) => {
                warn!(
                    "skipping `{}`: MiniLZO support is not available",
                    src.display()
                );
            }
            Err(e) => {
                error!("failed to decrypt `{}`: {}", src.display(), e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(eyre!("{} of {} file(s) failed", failed, targets.len()));
    }
    Ok(())
}

fn decrypt_one(src: &Path, opt: &DecryptOpts, lzo: &dyn Lzo) -> Result<(), ReadError> {
    let dir = util::out_dir(src, opt.output.as_deref())?;
    let stem = util::stem(src);
    // string concat on purpose: stems may contain dots
    let xml_path = dir.join(format!("{}.xml", stem));

    info!("src=`{}`", src.display());

    // exchange files carry no header, only the xml body
    if ecl2::matches(src) {
        let (ds, dsr) = ecl2::read(src)?;
        let text = match dsr.filter(|_| !opt.no_dsr) {
            Some(dsr) => format!("{}\n{}", ds, dsr),
            None => ds,
        };
        fs::write(&xml_path, text)?;
        info!("xml=`{}`", xml_path.display());
        return Ok(());
    }

    let (save, variant) = SaveFile::read(src, lzo)?;
    debug!("format variant: {}", variant.name);
    for (name, value) in save.header.fields() {
        if name == "Password" {
            continue;
        }
        debug!("[Header] {:9} = {:?}", name, value);
    }

    if !opt.no_header {
        let ext = if opt.json { "json" } else { "header" };
        let header_path = dir.join(format!("{}.{}", stem, ext));
        if opt.json {
            fs::write(&header_path, save.header.to_json()?)?;
        } else {
            fs::write(&header_path, save.header.as_bytes())?;
        }
        debug!("header=`{}`", header_path.display());
    }

    let text = if opt.no_dsr {
        save.ds.clone()
    } else {
        save.xml()
    };
    fs::write(&xml_path, text)?;
    info!("xml=`{}`", xml_path.display());
    Ok(())
}
