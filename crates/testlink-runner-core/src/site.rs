use std::sync::Arc;

use testlink_api::{
    Build,
    ExecutionReport,
    TestCase,
    TestLinkApi,
    TestLinkResult,
    TestPlan,
    TestProject,
};

use crate::domain::TestCaseWrapper;

/// The project, plan and build a run reports to, plus the API to reach them
pub struct TestLinkSite {
    api: Arc<dyn TestLinkApi>,
    project: TestProject,
    plan: TestPlan,
    build: Build,
}

impl TestLinkSite {
    pub fn new(api: Arc<dyn TestLinkApi>, project: TestProject, plan: TestPlan, build: Build) -> Self {
        Self {
            api,
            project,
            plan,
            build,
        }
    }

    /// Looks up the project and plan, then creates the build
    pub async fn connect(
        api: Arc<dyn TestLinkApi>, project_name: &str, plan_name: &str, build_name: &str,
        build_notes: &str,
    ) -> TestLinkResult<Self> {
        let project = api.get_test_project_by_name(project_name).await?;
        let plan = api.get_test_plan_by_name(plan_name, project_name).await?;
        let build = api.create_build(plan.id, build_name, build_notes).await?;

        tracing::info!(
            project = %project.name,
            plan = %plan.name,
            build_id = build.id,
            build = %build.name,
            "Connected to TestLink"
        );

        Ok(Self::new(api, project, plan, build))
    }

    pub fn project(&self) -> &TestProject {
        &self.project
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn build(&self) -> &Build {
        &self.build
    }

    pub async fn get_automated_test_cases(
        &self, custom_field_names: &[String],
    ) -> TestLinkResult<Vec<TestCase>> {
        self.api
            .get_automated_test_cases(&self.project, &self.plan, custom_field_names)
            .await
    }

    /// Reports the wrapper's status and uploads its attachments. Returns the
    /// execution id.
    pub async fn update_test_case(&self, test_case: &TestCaseWrapper) -> TestLinkResult<i64> {
        let execution = ExecutionReport {
            test_case_id: test_case.id(),
            test_plan_id: self.plan.id,
            build_id: self.build.id,
            platform_id: test_case.test_case().platform.as_ref().map(|p| p.id),
            status: test_case.execution_status(),
            notes: test_case.notes().to_string(),
        };

        let execution_id = self.api.report_test_case_result(&execution).await?;

        for attachment in test_case.attachments() {
            self.api
                .upload_execution_attachment(execution_id, attachment)
                .await?;
        }

        tracing::debug!(
            test_case_id = test_case.id(),
            execution_id,
            status = %test_case.execution_status(),
            attachments = test_case.attachments().len(),
            "Reported test case result"
        );

        Ok(execution_id)
    }
}
