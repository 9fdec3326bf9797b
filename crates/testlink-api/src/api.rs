use async_trait::async_trait;

use crate::error::TestLinkResult;
use crate::types::*;

/// Remote TestLink operations used by the runner.
///
/// Every call is a single request/response; implementations do not retry.
#[async_trait]
pub trait TestLinkApi: Send + Sync {
    async fn get_test_project_by_name(&self, project_name: &str) -> TestLinkResult<TestProject>;

    async fn get_test_plan_by_name(
        &self, plan_name: &str, project_name: &str,
    ) -> TestLinkResult<TestPlan>;

    /// Creates a build in the plan. TestLink returns the existing build when
    /// the name is already taken.
    async fn create_build(&self, plan_id: i64, name: &str, notes: &str) -> TestLinkResult<Build>;

    /// Automated test cases of a plan, with the values of the requested
    /// custom fields filled in
    async fn get_automated_test_cases(
        &self, project: &TestProject, plan: &TestPlan, custom_field_names: &[String],
    ) -> TestLinkResult<Vec<TestCase>>;

    async fn get_test_case_by_external_id(
        &self, full_external_id: &str, version: i64,
    ) -> TestLinkResult<TestCase>;

    async fn get_test_suites_by_id(&self, ids: &[i64]) -> TestLinkResult<Vec<TestSuite>>;

    /// Reports an execution and returns its id
    async fn report_test_case_result(&self, execution: &ExecutionReport) -> TestLinkResult<i64>;

    async fn upload_execution_attachment(
        &self, execution_id: i64, attachment: &Attachment,
    ) -> TestLinkResult<()>;
}
