//! Result seekers scan the workspace after the steps ran and set the
//! execution status of the test cases they find results for.

pub mod junit;
pub mod tap;

use std::path::{
    Path,
    PathBuf,
};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use testlink_api::{
    Attachment,
    ExecutionStatus,
};
use thiserror::Error;

pub use self::junit::{
    JUnitMatch,
    JUnitResultSeeker,
};
pub use self::tap::TapResultSeeker;
use crate::config::SeekerConfig;
use crate::domain::TestCaseWrapper;
use crate::env::expand_variables;
use crate::steps::BuildContext;

#[derive(Debug, Error)]
pub enum ResultSeekerError {
    #[error("Invalid include pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

pub type ResultSeekerResult<T> = Result<T, ResultSeekerError>;

#[async_trait]
pub trait ResultSeeker: Send + Sync {
    fn name(&self) -> &str;

    /// Updates the status, notes and attachments of the test cases that
    /// have results in the workspace. Test cases without results are left
    /// untouched.
    async fn seek(
        &self, test_cases: &mut [TestCaseWrapper], context: &BuildContext,
    ) -> ResultSeekerResult<()>;
}

pub fn from_config(config: &SeekerConfig) -> Box<dyn ResultSeeker> {
    match config {
        SeekerConfig::JunitCaseName(c) => Box::new(JUnitResultSeeker::from_config(c, JUnitMatch::CaseName)),
        SeekerConfig::JunitClassName(c) => {
            Box::new(JUnitResultSeeker::from_config(c, JUnitMatch::ClassName))
        }
        SeekerConfig::JunitSuiteName(c) => {
            Box::new(JUnitResultSeeker::from_config(c, JUnitMatch::SuiteName))
        }
        SeekerConfig::TapFileName(c) => Box::new(TapResultSeeker::from_config(c)),
    }
}

/// Files under the workspace matching `pattern`, sorted. Variables in the
/// pattern are expanded against the build environment first.
pub fn find_files(pattern: &str, context: &BuildContext) -> ResultSeekerResult<Vec<PathBuf>> {
    let expanded = expand_variables(pattern, &context.environment().materialize());
    let full = context.workspace().join(&expanded);
    let full = full.to_string_lossy();

    let paths = glob::glob(&full).map_err(|e| ResultSeekerError::InvalidPattern {
        pattern: expanded.clone(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ResultSeekerError::Io {
            path: e.path().to_path_buf(),
            source: e.into(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    tracing::debug!(pattern = %expanded, files = files.len(), "Found result files");
    Ok(files)
}

pub async fn read_file(path: &Path) -> ResultSeekerResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ResultSeekerError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Attachment holding the base64 encoded content of `path`
pub async fn attachment_from_file(path: &Path) -> ResultSeekerResult<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ResultSeekerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Attachment {
        title: file_name.clone(),
        description: format!("Result file {}", path.display()),
        file_type: mime_guess::from_path(path).first_or_octet_stream().to_string(),
        file_name,
        content: STANDARD.encode(bytes),
    })
}

/// Combines the statuses found for one test case: a failure wins over a
/// blocked result, which wins over a pass.
pub fn aggregate_status(statuses: &[ExecutionStatus]) -> Option<ExecutionStatus> {
    if statuses.is_empty() {
        None
    } else if statuses.contains(&ExecutionStatus::Failed) {
        Some(ExecutionStatus::Failed)
    } else if statuses.contains(&ExecutionStatus::Blocked) {
        Some(ExecutionStatus::Blocked)
    } else if statuses.contains(&ExecutionStatus::Passed) {
        Some(ExecutionStatus::Passed)
    } else {
        None
    }
}

fn add_attachment_once(test_case: &mut TestCaseWrapper, attachment: &Attachment) {
    if !test_case
        .attachments()
        .iter()
        .any(|a| a.file_name == attachment.file_name && a.content == attachment.content)
    {
        test_case.add_attachment(attachment.clone());
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_aggregate_status() {
        use ExecutionStatus::*;

        assert_eq!(aggregate_status(&[]), None);
        assert_eq!(aggregate_status(&[Passed, Passed]), Some(Passed));
        assert_eq!(aggregate_status(&[Passed, Blocked]), Some(Blocked));
        assert_eq!(aggregate_status(&[Blocked, Failed, Passed]), Some(Failed));
        assert_eq!(aggregate_status(&[NotRun]), None);
    }

    #[test]
    fn test_find_files_sorted_and_relative_to_workspace() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("reports")).unwrap();
        std::fs::write(dir.path().join("reports/b.xml"), "").unwrap();
        std::fs::write(dir.path().join("reports/a.xml"), "").unwrap();
        std::fs::write(dir.path().join("reports/c.txt"), "").unwrap();
        let ctx = BuildContext::detached(dir.path());

        let files = find_files("reports/*.xml", &ctx).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_find_files_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let ctx = BuildContext::detached(dir.path());

        assert!(matches!(
            find_files("reports/[.xml", &ctx),
            Err(ResultSeekerError::InvalidPattern { .. })
        ));
    }

    #[tokio::test]
    async fn test_attachment_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TEST-login.xml");
        std::fs::write(&path, "<a/>").unwrap();

        let attachment = attachment_from_file(&path).await.unwrap();
        assert_eq!(attachment.file_name, "TEST-login.xml");
        assert_eq!(attachment.title, "TEST-login.xml");
        assert!(attachment.file_type.contains("xml"));
        assert_eq!(attachment.content, "PGEvPg==");
    }
}
