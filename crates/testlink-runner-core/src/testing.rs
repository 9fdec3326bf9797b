//! In-crate test doubles for the TestLink API, build steps and the event bus

use std::collections::HashMap;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
};

use async_trait::async_trait;
use testlink_api::{
    Attachment,
    Build,
    ExecutionReport,
    ExecutionStatus,
    TestCase,
    TestLinkApi,
    TestLinkError,
    TestLinkResult,
    TestPlan,
    TestProject,
    TestSuite,
};

use crate::event::{
    EventBus,
    RunEvent,
};
use crate::steps::{
    BuildContext,
    BuildStep,
};

pub fn test_case(id: i64, execution_order: i64, suite_id: i64) -> TestCase {
    TestCase {
        id,
        version_id: id + 1000,
        external_id: id,
        full_external_id: format!("T-{id}"),
        version: 1,
        name: format!("tc{id}"),
        test_suite_id: suite_id,
        execution_order,
        ..Default::default()
    }
}

#[derive(Default)]
pub struct MockApi {
    pub project: TestProject,
    pub plan: TestPlan,
    pub test_cases: Vec<TestCase>,
    pub suites: HashMap<i64, String>,
    pub fail_test_case_lookup: bool,
    pub fail_reporting: bool,
    pub full_lookups: AtomicUsize,
    pub suite_lookups: Mutex<Vec<i64>>,
    pub created_builds: Mutex<Vec<Build>>,
    pub reports: Mutex<Vec<ExecutionReport>>,
    pub uploads: Mutex<Vec<(i64, String)>>,
}

impl MockApi {
    pub fn with_test_cases(test_cases: Vec<TestCase>) -> Self {
        let mut suites = HashMap::new();
        for tc in &test_cases {
            suites.insert(tc.test_suite_id, format!("Test Suite {}", tc.test_suite_id));
        }
        Self {
            project: TestProject {
                id: 123,
                name: "test project".to_string(),
                prefix: "T".to_string(),
            },
            plan: TestPlan {
                id: 1234,
                name: "test plan".to_string(),
            },
            test_cases,
            suites,
            ..Default::default()
        }
    }

    pub fn suite_lookups(&self) -> Vec<i64> {
        self.suite_lookups.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<ExecutionReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestLinkApi for MockApi {
    async fn get_test_project_by_name(&self, project_name: &str) -> TestLinkResult<TestProject> {
        if project_name == self.project.name {
            Ok(self.project.clone())
        } else {
            Err(TestLinkError::Api {
                code: 7011,
                message: format!("Test project {project_name} does not exist"),
            })
        }
    }

    async fn get_test_plan_by_name(
        &self, plan_name: &str, _project_name: &str,
    ) -> TestLinkResult<TestPlan> {
        if plan_name == self.plan.name {
            Ok(self.plan.clone())
        } else {
            Err(TestLinkError::Api {
                code: 3033,
                message: format!("Test plan {plan_name} does not exist"),
            })
        }
    }

    async fn create_build(&self, _plan_id: i64, name: &str, notes: &str) -> TestLinkResult<Build> {
        let mut builds = self.created_builds.lock().unwrap();
        let build = Build {
            id: builds.len() as i64 + 1,
            name: name.to_string(),
            notes: notes.to_string(),
        };
        builds.push(build.clone());
        Ok(build)
    }

    async fn get_automated_test_cases(
        &self, _project: &TestProject, _plan: &TestPlan, _custom_field_names: &[String],
    ) -> TestLinkResult<Vec<TestCase>> {
        // the plan listing carries neither suite id nor name
        Ok(self
            .test_cases
            .iter()
            .map(|tc| TestCase {
                test_suite_id: 0,
                name: String::new(),
                ..tc.clone()
            })
            .collect())
    }

    async fn get_test_case_by_external_id(
        &self, full_external_id: &str, _version: i64,
    ) -> TestLinkResult<TestCase> {
        self.full_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_test_case_lookup {
            return Err(TestLinkError::Network("connection reset".to_string()));
        }
        self.test_cases
            .iter()
            .find(|tc| tc.full_external_id == full_external_id)
            .map(|tc| TestCase {
                summary: format!("summary of {}", tc.name),
                author_login: "admin".to_string(),
                ..tc.clone()
            })
            .ok_or_else(|| TestLinkError::NotFound(full_external_id.to_string()))
    }

    async fn get_test_suites_by_id(&self, ids: &[i64]) -> TestLinkResult<Vec<TestSuite>> {
        self.suite_lookups.lock().unwrap().extend_from_slice(ids);
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.suites.get(id).map(|name| TestSuite {
                    id: *id,
                    name: name.clone(),
                })
            })
            .collect())
    }

    async fn report_test_case_result(&self, execution: &ExecutionReport) -> TestLinkResult<i64> {
        if self.fail_reporting {
            return Err(TestLinkError::Network("connection refused".to_string()));
        }
        let mut reports = self.reports.lock().unwrap();
        reports.push(execution.clone());
        Ok(reports.len() as i64 + 500)
    }

    async fn upload_execution_attachment(
        &self, execution_id: i64, attachment: &Attachment,
    ) -> TestLinkResult<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((execution_id, attachment.file_name.clone()));
        Ok(())
    }
}

/// Build step with a fixed outcome that counts its invocations and records
/// the test case id it saw in the environment
pub struct MockStep {
    name: String,
    succeeds: bool,
    pub calls: Arc<AtomicUsize>,
    pub seen_test_case_ids: Arc<Mutex<Vec<String>>>,
}

impl MockStep {
    pub fn new(name: &str, succeeds: bool) -> Self {
        Self {
            name: name.to_string(),
            succeeds,
            calls: Arc::new(AtomicUsize::new(0)),
            seen_test_case_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl BuildStep for MockStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perform(&self, context: &BuildContext) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = context
            .environment()
            .materialize()
            .get("TESTLINK_TESTCASE_ID")
        {
            self.seen_test_case_ids.lock().unwrap().push(id.clone());
        }
        self.succeeds
    }
}

#[derive(Default)]
pub struct RecordingEventBus {
    pub events: Mutex<Vec<RunEvent>>,
}

impl RecordingEventBus {
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_name())
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn emit(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn status_of(test_cases: &[crate::domain::TestCaseWrapper]) -> Vec<ExecutionStatus> {
    test_cases.iter().map(|tc| tc.execution_status()).collect()
}
