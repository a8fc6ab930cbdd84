use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stubs::Unit;

/// Writes every unit into `dir`, creating it if needed. Returns the paths
/// written, in unit order.
pub fn write_units(dir: &Path, units: &[Unit]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| {
        format!("{}: error creating destination subdirectory", dir.display())
    })?;
    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = dir.join(&unit.file);
        fs::write(&path, &unit.text)
            .with_context(|| format!("cannot write to file {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
