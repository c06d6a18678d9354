#![warn(missing_docs)]
//! # File formats of *ECO2*
//!
//! This crate is an implementation of the save-file formats (`*.eco`,
//! `*.ecox`, `*.tpl`, `*.tplx`) used by the Korean building-energy
//! assessment tool *ECO2*, reverse engineered from real save files.
//!
//! A save file is a fixed-width metadata [`Header`] followed by one or two
//! XML documents: the design inputs (`DS`) and, optionally, the computed
//! results (`DSR`). Depending on the file extension the whole buffer is
//! XOR-obfuscated and/or MiniLZO-compressed, see [`kind::SaveKind`].

pub mod cipher;
pub mod ecl2;
pub mod header;
pub mod kind;
pub mod lzo;
pub mod save;
pub mod util;

pub use header::{Header, SfType};
pub use kind::SaveKind;
pub use save::{DecodeError, FormatVariant, ReadError, SaveFile, Segmentation};
