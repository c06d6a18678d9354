//! # ECO2 file tool
#![warn(missing_docs)]

mod cli;

use clap::Parser;

use cli::opt::{Command, Options};

fn main() -> color_eyre::Result<()> {
    let options = Options::parse();
    cli::init(options.verbose)?;
    match options.command {
        Command::Decrypt(opt) => cli::decrypt::run(&opt),
        Command::Encrypt(opt) => cli::encrypt::run(&opt),
        Command::Info(opt) => cli::info::run(&opt),
    }
}
