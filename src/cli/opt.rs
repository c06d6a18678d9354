use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};
use eco2::{SaveKind, SfType};

/// Decrypt, inspect and re-encrypt ECO2 save files
#[derive(Parser)]
#[clap(name = "eco2-tool", version)]
pub struct Options {
    /// Show debug output
    #[clap(long, short, global = true)]
    pub verbose: bool,
    /// The subcommand to run
    #[clap(subcommand)]
    pub command: Command,
}

/// The tool's subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Decrypt save files into header and xml sidecars
    Decrypt(DecryptOpts),
    /// Encrypt header and xml sidecars back into save files
    Encrypt(EncryptOpts),
    /// Print save-file metadata
    Info(InfoOpts),
}

/// Options for `decrypt`
#[derive(Args)]
pub struct DecryptOpts {
    /// Save files to decrypt, or a single directory of save files
    #[clap(required = true)]
    pub input: Vec<PathBuf>,
    /// Directory for the output files (defaults to each source's folder)
    #[clap(long, short)]
    pub output: Option<PathBuf>,
    /// Skip the header sidecar
    #[clap(long)]
    pub no_header: bool,
    /// Write the header as a json field map instead of raw bytes
    #[clap(long)]
    pub json: bool,
    /// Drop the result segment (DSR) from the xml output
    #[clap(long)]
    pub no_dsr: bool,
}

/// Options for `encrypt`
#[derive(Args)]
pub struct EncryptOpts {
    /// XML files to encrypt, or a single directory of xml files
    #[clap(required = true)]
    pub input: Vec<PathBuf>,
    /// Header sidecar to apply to every input.
    ///
    /// Defaults to the `.header` (or `.json`) file next to each xml.
    #[clap(long)]
    pub header: Option<PathBuf>,
    /// Directory for the output files (defaults to each source's folder)
    #[clap(long, short)]
    pub output: Option<PathBuf>,
    /// Target save kind: "eco", "ecox", "tpl" or "tplx"
    #[clap(long, short, default_value = "eco")]
    pub kind: SaveKind,
    /// SFType code to write: "00", "01", "10" or "all"
    #[clap(long, default_value = "10")]
    pub sftype: SfTypeArg,
    /// Keep the result segment (DSR); ECO2 may refuse to load such files
    #[clap(long)]
    pub dsr: bool,
}

/// Options for `info`
#[derive(Args)]
pub struct InfoOpts {
    /// Save files to inspect
    #[clap(required = true)]
    pub input: Vec<PathBuf>,
}

/// Either one SFType code or the `all` fan-out
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SfTypeArg {
    /// Write one file with this code
    One(SfType),
    /// Write one file per known code
    All,
}

impl SfTypeArg {
    /// The codes to fan out over
    pub fn codes(&self) -> Vec<SfType> {
        match *self {
            SfTypeArg::One(sftype) => vec![sftype],
            SfTypeArg::All => SfType::ALL.to_vec(),
        }
    }
}

#[derive(Debug)]
/// Failed to parse an SFType argument
pub struct SfTypeArgError {}

impl fmt::Display for SfTypeArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Use one of `00`, `01`, `10` or `all`")
    }
}

impl std::error::Error for SfTypeArgError {}

impl FromStr for SfTypeArg {
    type Err = SfTypeArgError;
    fn from_str(val: &str) -> Result<Self, Self::Err> {
        if val.eq_ignore_ascii_case("all") {
            Ok(SfTypeArg::All)
        } else {
            val.parse().map(SfTypeArg::One).map_err(|_| SfTypeArgError {})
        }
    }
}

impl fmt::Display for SfTypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SfTypeArg::One(sftype) => sftype.fmt(f),
            SfTypeArg::All => f.write_str("all"),
        }
    }
}
