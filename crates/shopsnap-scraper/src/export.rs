//! CSV and JSON snapshot serialization, and per-job artifact storage.
//!
//! Each job writes into its own directory under the export root, keyed by the
//! job's UUID, so concurrent jobs never touch the same files:
//!
//! ```text
//! <export_dir>/<job_id>/products.csv
//! <export_dir>/<job_id>/snapshot.json
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ScraperError;
use crate::flatten::{FlatRow, EXPORT_COLUMNS};
use crate::types::ScrapeSnapshot;

pub const CSV_FILE_NAME: &str = "products.csv";
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

/// Writes the header and every row as CSV into `writer`.
///
/// The header comes from [`EXPORT_COLUMNS`] and is written even when `rows`
/// is empty.
///
/// # Errors
///
/// Returns [`ScraperError::Csv`] if a record cannot be written.
pub fn write_csv<W: Write>(rows: &[FlatRow], writer: W) -> Result<(), ScraperError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(EXPORT_COLUMNS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders rows to an in-memory CSV document.
///
/// # Errors
///
/// Returns [`ScraperError::Csv`] if a record cannot be written.
pub fn render_csv(rows: &[FlatRow]) -> Result<Vec<u8>, ScraperError> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(buf)
}

/// Renders the snapshot as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ScraperError::Json`] if serialization fails.
pub fn render_snapshot(snapshot: &ScrapeSnapshot) -> Result<Vec<u8>, ScraperError> {
    Ok(serde_json::to_vec_pretty(snapshot)?)
}

/// Paths of the artifacts persisted for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub job_id: Uuid,
    /// `None` when the job produced no rows (e.g. page-only scrapes).
    pub csv: Option<PathBuf>,
    pub snapshot: PathBuf,
}

/// Which artifact of a job to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Csv,
    Snapshot,
}

impl ArtifactKind {
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Csv => CSV_FILE_NAME,
            Self::Snapshot => SNAPSHOT_FILE_NAME,
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Snapshot => "application/json",
        }
    }
}

/// Filesystem store for job artifacts rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct ExportStore {
    root: PathBuf,
}

impl ExportStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn job_dir(&self, job_id: Uuid) -> PathBuf {
        self.root.join(job_id.to_string())
    }

    #[must_use]
    pub fn artifact_path(&self, job_id: Uuid, kind: ArtifactKind) -> PathBuf {
        self.job_dir(job_id).join(kind.file_name())
    }

    /// Persists the job's CSV (when `rows` is non-empty) and snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Io`] if the job directory or a file cannot be
    /// written, or a serialization error from [`render_csv`] /
    /// [`render_snapshot`].
    pub async fn save(
        &self,
        job_id: Uuid,
        rows: &[FlatRow],
        snapshot: &ScrapeSnapshot,
    ) -> Result<SavedArtifacts, ScraperError> {
        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir).await?;

        let csv = if rows.is_empty() {
            None
        } else {
            let path = dir.join(CSV_FILE_NAME);
            write_atomic(&path, &render_csv(rows)?).await?;
            Some(path)
        };

        let snapshot_path = dir.join(SNAPSHOT_FILE_NAME);
        write_atomic(&snapshot_path, &render_snapshot(snapshot)?).await?;

        tracing::info!(
            %job_id,
            rows = rows.len(),
            dir = %dir.display(),
            "export artifacts written"
        );

        Ok(SavedArtifacts {
            job_id,
            csv,
            snapshot: snapshot_path,
        })
    }

    /// Reads a persisted artifact. Returns `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Io`] for any read failure other than not-found.
    pub async fn read(
        &self,
        job_id: Uuid,
        kind: ArtifactKind,
    ) -> Result<Option<Vec<u8>>, ScraperError> {
        match tokio::fs::read(self.artifact_path(job_id, kind)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes to a sibling temp file, then renames it over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ScraperError> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
