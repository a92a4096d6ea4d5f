//! Write-then-rename file replacement.

use crate::error::Result;
use std::fs::{self, File};
use std::path::Path;
use tempfile::NamedTempFile;

/// Directory a file lives in; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Replace `path` with content written by `write`.
///
/// The content goes to a temporary file in the same directory, is synced to
/// disk and then renamed over the target, so readers see either the old or
/// the new file, never a torn one.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&File) -> Result<()>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("leads.csv")), Path::new("."));
        assert_eq!(parent_dir(Path::new("out/leads.csv")), Path::new("out"));
    }

    #[test]
    fn test_write_atomically_replaces_content() {
        let tmp = TempDir::new().expect("create temp dir");
        let target = tmp.path().join("nested").join("state.json");

        write_atomically(&target, |mut f| Ok(f.write_all(b"first")?)).expect("first write");
        write_atomically(&target, |mut f| Ok(f.write_all(b"second")?)).expect("second write");

        assert_eq!(fs::read_to_string(&target).expect("read back"), "second");
        let leftovers = fs::read_dir(target.parent().expect("parent"))
            .expect("list dir")
            .count();
        assert_eq!(leftovers, 1, "temporary file must not be left behind");
    }
}
