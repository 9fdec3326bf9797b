use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};
use testlink_api::ExecutionStatus;

use crate::domain::BuildResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepGroup {
    Single,
    Before,
    Iterative,
    After,
}

impl std::fmt::Display for StepGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepGroup::Single => write!(f, "single"),
            StepGroup::Before => write!(f, "before"),
            StepGroup::Iterative => write!(f, "iterative"),
            StepGroup::After => write!(f, "after"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RunEvent {
    BuildCreated {
        build_id: i64,
        build_name: String,
    },

    TestCasesFound {
        count: usize,
    },

    TestCaseStarted {
        test_case_id: i64,
        name: String,
    },

    TestCaseBlocked {
        test_case_id: i64,
        name: String,
    },

    StepFailed {
        group: StepGroup,
        step: String,
    },

    ResultsSought {
        seeker: String,
    },

    ResultReported {
        test_case_id: i64,
        execution_id: i64,
        status: ExecutionStatus,
    },

    BuildFinished {
        result: BuildResult,
        passed: usize,
        failed: usize,
        blocked: usize,
        not_run: usize,
    },
}

impl RunEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            RunEvent::BuildCreated { .. } => "build-created",
            RunEvent::TestCasesFound { .. } => "test-cases-found",
            RunEvent::TestCaseStarted { .. } => "test-case-started",
            RunEvent::TestCaseBlocked { .. } => "test-case-blocked",
            RunEvent::StepFailed { .. } => "step-failed",
            RunEvent::ResultsSought { .. } => "results-sought",
            RunEvent::ResultReported { .. } => "result-reported",
            RunEvent::BuildFinished { .. } => "build-finished",
        }
    }

    pub fn to_json_payload(&self) -> serde_json::Value {
        match self {
            RunEvent::BuildCreated {
                build_id,
                build_name,
            } => serde_json::json!({
                "build_id": build_id,
                "build_name": build_name,
            }),
            RunEvent::TestCasesFound { count } => serde_json::json!(count),
            RunEvent::TestCaseStarted { test_case_id, name }
            | RunEvent::TestCaseBlocked { test_case_id, name } => serde_json::json!({
                "test_case_id": test_case_id,
                "name": name,
            }),
            RunEvent::StepFailed { group, step } => serde_json::json!({
                "group": group,
                "step": step,
            }),
            RunEvent::ResultsSought { seeker } => serde_json::json!(seeker),
            RunEvent::ResultReported {
                test_case_id,
                execution_id,
                status,
            } => serde_json::json!({
                "test_case_id": test_case_id,
                "execution_id": execution_id,
                "status": status,
            }),
            RunEvent::BuildFinished {
                result,
                passed,
                failed,
                blocked,
                not_run,
            } => serde_json::json!({
                "result": result,
                "passed": passed,
                "failed": failed,
                "blocked": blocked,
                "not_run": not_run,
            }),
        }
    }
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn emit(&self, event: RunEvent);
}

pub struct NoOpEventBus;

#[async_trait]
impl EventBus for NoOpEventBus {
    async fn emit(&self, _event: RunEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            RunEvent::TestCasesFound { count: 3 }.event_name(),
            "test-cases-found"
        );
        assert_eq!(
            RunEvent::StepFailed {
                group: StepGroup::After,
                step: "cleanup".to_string(),
            }
            .event_name(),
            "step-failed"
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = RunEvent::TestCaseBlocked {
            test_case_id: 42,
            name: "login".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TestCaseBlocked"));
        assert!(json.contains("42"));
    }

    #[test]
    fn test_json_payload() {
        let payload = RunEvent::StepFailed {
            group: StepGroup::Before,
            step: "setup".to_string(),
        }
        .to_json_payload();
        assert_eq!(payload["group"], "before");
        assert_eq!(payload["step"], "setup");
    }
}
