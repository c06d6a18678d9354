use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::eyre::{self, eyre};

/// Expand a single-directory input into the matching files inside it.
///
/// Any other input list is passed through untouched.
pub(super) fn collect_targets(
    input: &[PathBuf],
    keep: impl Fn(&Path) -> bool,
) -> eyre::Result<Vec<PathBuf>> {
    if let [dir] = input {
        if dir.is_dir() {
            let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && keep(p))
                .collect();
            paths.sort();
            if paths.is_empty() {
                return Err(eyre!("No matching files in `{}`", dir.display()));
            }
            return Ok(paths);
        }
    }
    Ok(input.to_vec())
}

/// The directory output files go to, created on demand
pub(super) fn out_dir(src: &Path, output: Option<&Path>) -> std::io::Result<PathBuf> {
    let dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => src.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// The file stem as a displayable string
pub(super) fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
