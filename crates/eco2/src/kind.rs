//! # Save-file kinds
//!
//! The file extension decides how a save buffer is wrapped: `.eco` and
//! `.ecox` are XOR-obfuscated, a trailing `x` means MiniLZO compression.
//! The codec itself never looks at file names; callers derive the policy
//! here and pass explicit flags.

use std::{fmt, path::Path, str::FromStr};

/// The four binary save-file kinds
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveKind {
    /// `.eco`: obfuscated project file
    Eco,
    /// `.ecox`: obfuscated, compressed project file
    Ecox,
    /// `.tpl`: plain template file
    Tpl,
    /// `.tplx`: compressed template file
    Tplx,
}

impl SaveKind {
    /// All binary save kinds, used when scanning a directory
    pub const ALL: [SaveKind; 4] = [SaveKind::Eco, SaveKind::Ecox, SaveKind::Tpl, SaveKind::Tplx];

    /// The extension used for files of this kind, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            SaveKind::Eco => "eco",
            SaveKind::Ecox => "ecox",
            SaveKind::Tpl => "tpl",
            SaveKind::Tplx => "tplx",
        }
    }

    /// Whether the whole buffer is XOR-obfuscated
    pub fn obfuscated(&self) -> bool {
        matches!(self, SaveKind::Eco | SaveKind::Ecox)
    }

    /// Whether the buffer is wrapped in a MiniLZO container
    pub fn compressed(&self) -> bool {
        matches!(self, SaveKind::Ecox | SaveKind::Tplx)
    }

    /// Detect the kind from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<SaveKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        SaveKind::ALL.iter().copied().find(|k| k.extension() == ext)
    }
}

impl fmt::Display for SaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug)]
/// Failed to parse a save kind name
pub struct SaveKindError {}

impl fmt::Display for SaveKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Use one of `eco`, `ecox`, `tpl` or `tplx`")
    }
}

impl std::error::Error for SaveKindError {}

impl FromStr for SaveKind {
    type Err = SaveKindError;
    fn from_str(val: &str) -> Result<Self, Self::Err> {
        SaveKind::ALL
            .iter()
            .copied()
            .find(|k| k.extension().eq_ignore_ascii_case(val))
            .ok_or(SaveKindError {})
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::SaveKind;

    #[test]
    fn from_path() {
        assert_eq!(SaveKind::from_path(Path::new("a/b.eco")), Some(SaveKind::Eco));
        assert_eq!(SaveKind::from_path(Path::new("b.TPLX")), Some(SaveKind::Tplx));
        assert_eq!(SaveKind::from_path(Path::new("b.ecl2")), None);
        assert_eq!(SaveKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn policy_flags() {
        assert!(SaveKind::Eco.obfuscated() && !SaveKind::Eco.compressed());
        assert!(SaveKind::Ecox.obfuscated() && SaveKind::Ecox.compressed());
        assert!(!SaveKind::Tpl.obfuscated() && !SaveKind::Tpl.compressed());
        assert!(!SaveKind::Tplx.obfuscated() && SaveKind::Tplx.compressed());
    }
}
