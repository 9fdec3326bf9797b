use thiserror::Error;

/// Errors raised while talking to a TestLink server
#[derive(Error, Debug)]
pub enum TestLinkError {
    #[error("Invalid TestLink URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("TestLink API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type TestLinkResult<T> = Result<T, TestLinkError>;

impl From<quick_xml::Error> for TestLinkError {
    fn from(err: quick_xml::Error) -> Self {
        TestLinkError::InvalidResponse(err.to_string())
    }
}
