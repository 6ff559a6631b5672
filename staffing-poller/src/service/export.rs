//! Export directory inspection
//!
//! The scraper does not tell us which file it wrote, so the directory is
//! snapshotted before the run and compared afterwards.

use staffing_core::domain::export::ExportArtifact;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Modification times of the CSV files present before a run
#[derive(Debug, Default, Clone)]
pub struct ExportSnapshot {
    mtimes: HashMap<PathBuf, SystemTime>,
}

impl ExportSnapshot {
    /// Records every `*.csv` in `dir`; a missing directory counts as empty
    pub fn capture(dir: &Path) -> io::Result<Self> {
        Ok(Self {
            mtimes: csv_files(dir)?.into_iter().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.mtimes.len()
    }

    /// Finds the file the run produced
    ///
    /// Picks the newest CSV that is either new or modified since the
    /// snapshot. When nothing changed, falls back to the newest CSV overall;
    /// `None` only if the directory holds no CSV at all.
    pub fn detect_new(&self, dir: &Path) -> io::Result<Option<PathBuf>> {
        let mut candidates = csv_files(dir)?;
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let changed = candidates.iter().find(|(path, mtime)| {
            self.mtimes
                .get(path)
                .is_none_or(|before| mtime > before)
        });

        Ok(changed
            .or_else(|| candidates.first())
            .map(|(path, _)| path.clone()))
    }
}

/// Loads the artifact metadata for an export file
pub fn load_artifact(path: PathBuf) -> io::Result<ExportArtifact> {
    let rows = count_lines(&path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ExportArtifact {
        path,
        file_name,
        rows,
    })
}

/// Counts lines, header included; a trailing line without newline counts too
pub fn count_lines(path: &Path) -> io::Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0;
    for line in reader.split(b'\n') {
        line?;
        lines += 1;
    }
    Ok(lines)
}

fn csv_files(dir: &Path) -> io::Result<Vec<(PathBuf, SystemTime)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "csv") {
            continue;
        }

        let metadata = entry.metadata()?;
        if metadata.is_file() {
            files.push((path, metadata.modified()?));
        }
    }
    Ok(files)
}
