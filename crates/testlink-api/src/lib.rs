//! TestLink API for TestLink Runner
//!
//! Talks to a TestLink server over its XML-RPC interface.
//!
//! # Architecture
//!
//! - `api` - the [`TestLinkApi`] trait the runner is written against
//! - `client` - reqwest based XML-RPC implementation
//! - `xmlrpc` - request encoding and response decoding
//! - `mapper` - response to model mapping
//! - `types` - TestLink data model
//!
//! # Example Usage
//!
//! ```no_run
//! use secrecy::SecretString;
//! use testlink_api::{TestLinkApi, TestLinkClient};
//!
//! # async fn run() -> testlink_api::TestLinkResult<()> {
//! let client = TestLinkClient::new(
//!     "http://localhost/testlink/lib/api/xmlrpc/v1/xmlrpc.php",
//!     SecretString::from("dev-key".to_string()),
//! )?;
//! let project = client.get_test_project_by_name("shop").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
mod mapper;
pub mod types;
pub mod xmlrpc;

pub use api::TestLinkApi;
pub use client::{
    parse_url,
    TestLinkClient,
};
pub use error::{
    TestLinkError,
    TestLinkResult,
};
pub use types::{
    Attachment,
    Build,
    CustomField,
    ExecutionReport,
    ExecutionStatus,
    ExecutionType,
    Platform,
    TestCase,
    TestPlan,
    TestProject,
    TestSuite,
};
