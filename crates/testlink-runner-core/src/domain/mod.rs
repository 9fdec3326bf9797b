pub mod error;
pub mod ordering;
pub mod report;
pub mod result;
pub mod wrapper;

pub use error::{
    RunnerError,
    RunnerResult,
};
pub use ordering::{
    by_execution_order,
    sort_by_execution_order,
};
pub use report::Report;
pub use result::{
    BuildResult,
    ResultPolicy,
};
pub use wrapper::TestCaseWrapper;
