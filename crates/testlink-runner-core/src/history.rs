use std::path::{
    Path,
    PathBuf,
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::domain::Report;

pub const HISTORY_FILE: &str = "last-report.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub report: Report,
}

/// Keeps the report of the last finished build so the next summary can show
/// what changed. History problems are logged and never fail a build.
#[derive(Debug, Clone)]
pub struct ReportHistory {
    path: PathBuf,
}

impl ReportHistory {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(HISTORY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<HistoryEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read report history");
                return None;
            }
        };

        match serde_json::from_str::<HistoryEntry>(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt report history");
                None
            }
        }
    }

    pub fn previous_report(&self) -> Option<Report> {
        self.load().map(|entry| entry.report)
    }

    pub fn save(&self, report: &Report) {
        if let Err(e) = self.try_save(report) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to save report history");
        }
    }

    fn try_save(&self, report: &Report) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entry = HistoryEntry {
            recorded_at: Utc::now(),
            report: report.clone(),
        };
        let json = serde_json::to_string_pretty(&entry).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, json)?;

        tracing::debug!(path = %self.path.display(), "Saved report history");
        Ok(())
    }
}
