use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use flate2::read::GzDecoder;
use tracing::info;

use crate::app::{AppError, Result};
use crate::domain::{Column, QueryTable};
use crate::enrich::{count_folded, fold};

/// Whole-site text dump, loaded from a gzip file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSnapshot {
    text: String,
}

impl SiteSnapshot {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: fold(&text.into()),
        }
    }

    /// Decompress a gzip snapshot; invalid UTF-8 is replaced, not rejected
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::Snapshot(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mut bytes = Vec::new();
        GzDecoder::new(file).read_to_end(&mut bytes).map_err(|e| {
            AppError::Snapshot(format!("cannot decompress {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), bytes = bytes.len(), "loaded site snapshot");
        Ok(Self::from_text(String::from_utf8_lossy(&bytes)))
    }

    /// Case-insensitive, non-overlapping occurrences of `query`
    pub fn count(&self, query: &str) -> i64 {
        count_folded(&self.text, &fold(query))
    }

    /// Set `exists_on_site` on every row from the whole-site text
    pub fn enrich(&self, mut table: QueryTable) -> QueryTable {
        for row in table.rows_mut() {
            row.exists_on_site = Some(self.count(&row.query));
        }
        table.add_column(Column::ExistsOnSite);
        table
    }
}

/// Most recently created `*.gz` file directly inside `dir`.
///
/// Falls back to the modification time where the filesystem does not
/// record creation time.
pub fn find_latest_snapshot(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::Snapshot(format!("cannot read {}: {}", dir.display(), e))
    })?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("gz") {
            continue;
        }

        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let stamp = meta
            .created()
            .or_else(|_| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if latest.as_ref().map_or(true, |(best, _)| stamp > *best) {
            latest = Some((stamp, path));
        }
    }

    latest.map(|(_, path)| path).ok_or_else(|| {
        AppError::Snapshot(format!("no .gz snapshot found in {}", dir.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    use crate::domain::{Cell, QueryRow, Table};

    fn write_gz(path: &Path, content: &[u8]) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_load_and_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.gz");
        write_gz(&path, "Rust guide. rust tips. RUST".as_bytes());

        let snapshot = SiteSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.count("rust"), 3);
        assert_eq!(snapshot.count("python"), 0);
    }

    #[test]
    fn test_count_folds_sharp_s() {
        let snapshot = SiteSnapshot::from_text("Die Straße ist lang");
        assert_eq!(snapshot.count("strasse"), 1);
        assert_eq!(snapshot.count("STRASSE"), 1);
    }

    #[test]
    fn test_load_tolerates_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.gz");
        write_gz(&path, b"caf\xff rust");

        let snapshot = SiteSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.count("rust"), 1);
    }

    #[test]
    fn test_load_rejects_non_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.gz");
        fs::write(&path, "plain text").unwrap();

        assert!(matches!(SiteSnapshot::load(&path), Err(AppError::Snapshot(_))));
    }

    #[test]
    fn test_enrich_sets_only_exists_on_site() {
        let snapshot = SiteSnapshot::from_text("hello world, Hello World");
        let table = QueryTable::new(vec![QueryRow::new("hello world", 0, 1, 0.0, 1.0)]);

        let enriched = snapshot.enrich(table);
        assert_eq!(enriched.cell(0, Column::ExistsOnSite), Cell::Int(2));
        assert!(!enriched.has_column(Column::Title));
    }

    #[test]
    fn test_find_latest_snapshot_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("report.xlsx"), "x").unwrap();
        write_gz(&dir.path().join("old.gz"), b"old");
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_gz(&dir.path().join("new.gz"), b"new");

        let latest = find_latest_snapshot(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap(), "new.gz");
    }

    #[test]
    fn test_find_latest_snapshot_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_latest_snapshot(dir.path()),
            Err(AppError::Snapshot(_))
        ));
    }
}
