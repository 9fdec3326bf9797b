pub mod builder;
pub mod config;
pub mod domain;
pub mod env;
pub mod event;
pub mod history;
pub mod logging;
pub mod orchestrator;
pub mod seekers;
pub mod site;
pub mod steps;
pub mod summary;
pub mod transform;

#[cfg(test)]
mod testing;

pub use builder::{
    BuildOutcome,
    TestLinkBuilder,
};
pub use config::{
    ConfigLoadError,
    ConfigLoader,
    RunnerConfig,
};
pub use domain::{
    BuildResult,
    Report,
    ResultPolicy,
    RunnerError,
    RunnerResult,
    TestCaseWrapper,
};
pub use env::BuildEnvironment;
pub use event::{
    EventBus,
    NoOpEventBus,
    RunEvent,
    StepGroup,
};
pub use history::ReportHistory;
pub use orchestrator::IterationOrchestrator;
pub use seekers::{
    ResultSeeker,
    ResultSeekerError,
};
pub use site::TestLinkSite;
pub use steps::{
    BuildContext,
    BuildStep,
    ShellStep,
};
