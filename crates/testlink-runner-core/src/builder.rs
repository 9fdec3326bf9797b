//! A complete TestLink build: connect, iterate, seek results, report

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use testlink_api::{
    parse_url,
    ExecutionStatus,
    TestLinkApi,
    TestLinkClient,
};

use crate::config::{
    JobConfig,
    RunnerConfig,
};
use crate::domain::{
    sort_by_execution_order,
    BuildResult,
    Report,
    ResultPolicy,
    RunnerError,
    RunnerResult,
};
use crate::env::{
    expand_variables,
    split_custom_fields,
};
use crate::event::RunEvent;
use crate::history::ReportHistory;
use crate::orchestrator::IterationOrchestrator;
use crate::seekers::{
    self,
    ResultSeeker,
};
use crate::site::TestLinkSite;
use crate::steps::{
    BuildContext,
    BuildStep,
    ShellStep,
};
use crate::summary::{
    create_report_summary,
    create_report_summary_details,
};
use crate::transform::transform;

pub const BUILD_NOTES: &str = "Build created automatically with TestLink Runner";

/// What a finished build produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub result: BuildResult,
    pub report: Report,
    pub summary_html: String,
    pub details_html: String,
}

pub struct TestLinkBuilder {
    config: RunnerConfig,
    orchestrator: IterationOrchestrator,
    seekers: Vec<Box<dyn ResultSeeker>>,
    history: Option<ReportHistory>,
}

fn shell_steps(steps: &[crate::config::StepConfig]) -> Vec<Box<dyn BuildStep>> {
    steps
        .iter()
        .map(|step| Box::new(ShellStep::from_config(step)) as Box<dyn BuildStep>)
        .collect()
}

/// Logs the full error before it aborts the build
fn abort(err: RunnerError) -> RunnerError {
    tracing::error!(error = %err, details = ?err, "Build aborted");
    err
}

impl TestLinkBuilder {
    /// Builder running the shell steps and result seekers of the `[job]`
    /// table
    pub fn from_config(config: RunnerConfig) -> Self {
        let job = &config.job;
        let orchestrator = IterationOrchestrator::new()
            .with_single_steps(shell_steps(&job.single_steps))
            .with_before_steps(shell_steps(&job.before_steps))
            .with_iterative_steps(shell_steps(&job.iterative_steps))
            .with_after_steps(shell_steps(&job.after_steps))
            .with_transactional(job.transactional);
        let seekers = job.result_seekers.iter().map(seekers::from_config).collect();

        Self {
            config,
            orchestrator,
            seekers,
            history: None,
        }
    }

    pub fn with_orchestrator(mut self, orchestrator: IterationOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    pub fn with_seekers(mut self, seekers: Vec<Box<dyn ResultSeeker>>) -> Self {
        self.seekers = seekers;
        self
    }

    pub fn with_history(mut self, history: ReportHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn job(&self) -> &JobConfig {
        &self.config.job
    }

    fn result_policy(&self) -> ResultPolicy {
        ResultPolicy {
            fail_if_no_results: self.job().fail_if_no_results,
            failed_tests_mark_build_as_failure: self.job().failed_tests_mark_build_as_failure,
        }
    }

    /// Runs the build against the configured TestLink installation
    pub async fn perform(&mut self, context: &mut BuildContext) -> RunnerResult<BuildOutcome> {
        let name = &self.job().testlink_name;
        let installation = self
            .config
            .installation(name)
            .ok_or_else(|| abort(RunnerError::InstallationNotFound(name.clone())))?;

        tracing::info!(installation = %name, url = %installation.url, "Preparing TestLink API");

        parse_url(&installation.url).map_err(|e| abort(e.into()))?;
        let client = TestLinkClient::new(
            &installation.url,
            SecretString::from(installation.dev_key.clone()),
        )
        .map_err(|e| abort(e.into()))?;

        self.perform_with_api(Arc::new(client), context).await
    }

    /// Runs the build against any TestLink API implementation
    pub async fn perform_with_api(
        &mut self, api: Arc<dyn TestLinkApi>, context: &mut BuildContext,
    ) -> RunnerResult<BuildOutcome> {
        tracing::info!("TestLink builder started");
        self.orchestrator.reset();

        // command line overrides win over job variables
        for (key, value) in &self.config.job.variables {
            let value = expand_variables(value, &context.environment().materialize());
            context.environment_mut().set(key.clone(), value);
        }

        let env = context.environment().materialize();
        let project_name = expand_variables(&self.job().test_project_name, &env);
        let plan_name = expand_variables(&self.job().test_plan_name, &env);
        let build_name = expand_variables(&self.job().build_name, &env);
        let custom_fields = split_custom_fields(&expand_variables(&self.job().custom_fields, &env));

        tracing::debug!(
            project = %project_name,
            plan = %plan_name,
            build = %build_name,
            custom_fields = ?custom_fields,
            "Resolved job names"
        );

        let site = TestLinkSite::connect(
            Arc::clone(&api),
            &project_name,
            &plan_name,
            &build_name,
            BUILD_NOTES,
        )
        .await
        .map_err(|e| abort(e.into()))?;

        context
            .event_bus()
            .emit(RunEvent::BuildCreated {
                build_id: site.build().id,
                build_name: site.build().name.clone(),
            })
            .await;

        let test_cases = site
            .get_automated_test_cases(&custom_fields)
            .await
            .map_err(|e| abort(e.into()))?;

        let mut suite_cache = HashMap::new();
        let mut test_cases = transform(api.as_ref(), test_cases, &mut suite_cache)
            .await
            .map_err(|e| abort(e.into()))?;

        tracing::info!(count = test_cases.len(), "Found automated test cases");
        context
            .event_bus()
            .emit(RunEvent::TestCasesFound {
                count: test_cases.len(),
            })
            .await;

        sort_by_execution_order(&mut test_cases);
        for tc in &test_cases {
            tracing::debug!(test_case_id = tc.id(), name = %tc.name(), "Automated test case");
        }

        tracing::info!("Executing single build steps");
        self.orchestrator.execute_single_build_steps(context).await;

        tracing::info!("Executing iterative build steps");
        self.orchestrator
            .execute_iterative_build_steps(&mut test_cases, &site, context)
            .await;

        tracing::info!("Looking for test results");
        for seeker in &self.seekers {
            tracing::info!(seeker = seeker.name(), "Seeking test results");
            seeker
                .seek(&mut test_cases, context)
                .await
                .map_err(|e| abort(e.into()))?;
            context
                .event_bus()
                .emit(RunEvent::ResultsSought {
                    seeker: seeker.name().to_string(),
                })
                .await;
        }

        for tc in test_cases
            .iter()
            .filter(|tc| tc.execution_status() != ExecutionStatus::NotRun)
        {
            let execution_id = site
                .update_test_case(tc)
                .await
                .map_err(|e| abort(RunnerError::FailedToUpdate(e)))?;
            context
                .event_bus()
                .emit(RunEvent::ResultReported {
                    test_case_id: tc.id(),
                    execution_id,
                    status: tc.execution_status(),
                })
                .await;
        }

        let report = Report::from_test_cases(
            site.project().clone(),
            site.plan().clone(),
            site.build(),
            &test_cases,
        );
        tracing::info!(total = report.tests_total(), "Found test results");

        let mut result = BuildResult::Success;
        if self.orchestrator.failure() {
            tracing::warn!("At least one build step failed");
            result = result.combine(BuildResult::Failure);
        }
        if report.tests_total() == 0 && self.job().fail_if_no_results {
            tracing::warn!("No test results found. Setting the build result as FAILURE");
        }
        let result = self.result_policy().apply(result, &report);

        let previous = self
            .history
            .as_ref()
            .and_then(|history| history.previous_report());
        let summary_html = create_report_summary(&report, previous.as_ref());
        let details_html = create_report_summary_details(&report, previous.as_ref());

        if let Some(history) = &self.history {
            history.save(&report);
        }

        context
            .event_bus()
            .emit(RunEvent::BuildFinished {
                result,
                passed: report.passed(),
                failed: report.failed(),
                blocked: report.blocked(),
                not_run: report.not_run(),
            })
            .await;

        tracing::info!(
            %result,
            passed = report.passed(),
            failed = report.failed(),
            blocked = report.blocked(),
            not_run = report.not_run(),
            "TestLink builder finished"
        );

        Ok(BuildOutcome {
            result,
            report,
            summary_html,
            details_html,
        })
    }
}
