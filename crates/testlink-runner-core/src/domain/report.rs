use serde::{
    Deserialize,
    Serialize,
};
use testlink_api::{
    Build,
    ExecutionStatus,
    TestPlan,
    TestProject,
};

use super::wrapper::TestCaseWrapper;

/// Outcome of one build: counters per execution status and the evaluated
/// test cases. The total is always derived from the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    project: TestProject,
    plan: TestPlan,
    build_id: i64,
    build_name: String,
    passed: usize,
    failed: usize,
    blocked: usize,
    not_run: usize,
    #[serde(default)]
    test_cases: Vec<TestCaseWrapper>,
}

impl Report {
    pub fn new(
        project: TestProject, plan: TestPlan, build_id: i64, build_name: impl Into<String>,
    ) -> Self {
        Self {
            project,
            plan,
            build_id,
            build_name: build_name.into(),
            passed: 0,
            failed: 0,
            blocked: 0,
            not_run: 0,
            test_cases: Vec::new(),
        }
    }

    /// Builds the report of a finished run from the full list of test cases
    pub fn from_test_cases(
        project: TestProject, plan: TestPlan, build: &Build, test_cases: &[TestCaseWrapper],
    ) -> Self {
        let mut report = Self::new(project, plan, build.id, build.name.clone());
        for test_case in test_cases {
            report.add_test_case(test_case.clone());
        }
        report
    }

    pub fn add_test_case(&mut self, test_case: TestCaseWrapper) {
        match test_case.execution_status() {
            ExecutionStatus::Passed => self.passed += 1,
            ExecutionStatus::Failed => self.failed += 1,
            ExecutionStatus::Blocked => self.blocked += 1,
            ExecutionStatus::NotRun => self.not_run += 1,
        }
        self.test_cases.push(test_case);
    }

    pub fn project(&self) -> &TestProject {
        &self.project
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn build_id(&self) -> i64 {
        self.build_id
    }

    pub fn build_name(&self) -> &str {
        &self.build_name
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn set_passed(&mut self, passed: usize) {
        self.passed = passed;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn set_failed(&mut self, failed: usize) {
        self.failed = failed;
    }

    pub fn blocked(&self) -> usize {
        self.blocked
    }

    pub fn set_blocked(&mut self, blocked: usize) {
        self.blocked = blocked;
    }

    pub fn not_run(&self) -> usize {
        self.not_run
    }

    pub fn set_not_run(&mut self, not_run: usize) {
        self.not_run = not_run;
    }

    pub fn tests_total(&self) -> usize {
        self.passed + self.failed + self.blocked + self.not_run
    }

    pub fn test_cases(&self) -> &[TestCaseWrapper] {
        &self.test_cases
    }
}
