use testlink_api::TestLinkError;
use thiserror::Error;

use crate::config::ConfigLoadError;
use crate::seekers::ResultSeekerError;

/// Errors that abort a build. The message is the short text shown to the
/// user; the full chain is logged where the error is raised.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("TestLink installation not found: {0}")]
    InstallationNotFound(String),

    #[error("Invalid TestLink URL: {0}")]
    InvalidUrl(String),

    #[error("Error communicating with TestLink: {0}")]
    Communication(#[source] TestLinkError),

    #[error("Error looking for test results: {0}")]
    ResultSeeking(#[from] ResultSeekerError),

    #[error("Failed to update TestLink test results: {0}")]
    FailedToUpdate(#[source] TestLinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

impl From<TestLinkError> for RunnerError {
    fn from(err: TestLinkError) -> Self {
        match err {
            TestLinkError::InvalidUrl(url) => RunnerError::InvalidUrl(url),
            other => RunnerError::Communication(other),
        }
    }
}
