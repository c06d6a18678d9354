//! Print save-file metadata.

use std::path::Path;

use color_eyre::eyre::{self, eyre};
use log::error;
use prettytable::{format, row, Table};

use eco2::{header::FieldValue, lzo, save::FormatVariant, util::Buf, SaveFile};

use super::opt::InfoOpts;

/// Run the `info` subcommand
pub fn run(opt: &InfoOpts) -> eyre::Result<()> {
    let lzo = lzo::detect();
    let mut failed = 0usize;
    for src in &opt.input {
        match SaveFile::read(src, lzo) {
            Ok((save, variant)) => print_info(src, &save, variant),
            Err(e) => {
                error!("failed to read `{}`: {}", src.display(), e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(eyre!("{} of {} file(s) failed", failed, opt.input.len()));
    }
    Ok(())
}

fn print_info(src: &Path, save: &SaveFile, variant: &FormatVariant) {
    println!("{}", src.display());

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.add_row(row!["Variant", variant.name]);
    for (name, value) in save.header.fields() {
        if name == "Password" {
            continue;
        }
        let shown = match value {
            FieldValue::Text(text) => text,
            FieldValue::Raw(bytes) => format!("{}", Buf(bytes.as_ref())),
        };
        table.add_row(row![name, shown]);
    }
    table.add_row(row!["DS", format!("{} chars", save.ds.chars().count())]);
    let dsr = match &save.dsr {
        Some(dsr) => format!("{} chars", dsr.chars().count()),
        None => "absent".to_owned(),
    };
    table.add_row(row!["DSR", dsr]);
    table.printstd();
}
