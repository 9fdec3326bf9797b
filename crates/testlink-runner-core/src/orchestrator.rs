//! Runs the configured step groups around the test cases of a plan

use testlink_api::ExecutionStatus;

use crate::domain::TestCaseWrapper;
use crate::env::build_test_case_env_vars;
use crate::event::{
    RunEvent,
    StepGroup,
};
use crate::site::TestLinkSite;
use crate::steps::{
    BuildContext,
    BuildStep,
};

/// Sequences the single, before, iterative and after step groups.
///
/// A failing step never stops the groups; it only sets the failure flag.
/// With `transactional` set, test cases reached after the flag is raised
/// are marked BLOCKED and their iterative steps are skipped. After steps
/// always run.
#[derive(Default)]
pub struct IterationOrchestrator {
    single: Vec<Box<dyn BuildStep>>,
    before: Vec<Box<dyn BuildStep>>,
    iterative: Vec<Box<dyn BuildStep>>,
    after: Vec<Box<dyn BuildStep>>,
    transactional: bool,
    failure: bool,
}

impl IterationOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_single_steps(mut self, steps: Vec<Box<dyn BuildStep>>) -> Self {
        self.single = steps;
        self
    }

    pub fn with_before_steps(mut self, steps: Vec<Box<dyn BuildStep>>) -> Self {
        self.before = steps;
        self
    }

    pub fn with_iterative_steps(mut self, steps: Vec<Box<dyn BuildStep>>) -> Self {
        self.iterative = steps;
        self
    }

    pub fn with_after_steps(mut self, steps: Vec<Box<dyn BuildStep>>) -> Self {
        self.after = steps;
        self
    }

    pub fn with_transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Whether any step failed so far
    pub fn failure(&self) -> bool {
        self.failure
    }

    /// Clears the failure flag before a new run
    pub fn reset(&mut self) {
        self.failure = false;
    }

    pub async fn execute_single_build_steps(&mut self, context: &BuildContext) {
        let failed = run_group(&self.single, StepGroup::Single, context).await;
        self.failure |= failed;
    }

    pub async fn execute_iterative_build_steps(
        &mut self, test_cases: &mut [TestCaseWrapper], site: &TestLinkSite,
        context: &mut BuildContext,
    ) {
        let failed = run_group(&self.before, StepGroup::Before, context).await;
        self.failure |= failed;

        for test_case in test_cases.iter_mut() {
            if self.failure && self.transactional {
                tracing::info!(
                    test_case_id = test_case.id(),
                    name = %test_case.name(),
                    "Blocking test case after an earlier failure"
                );
                test_case.set_execution_status(ExecutionStatus::Blocked);
                context
                    .event_bus()
                    .emit(RunEvent::TestCaseBlocked {
                        test_case_id: test_case.id(),
                        name: test_case.name().to_string(),
                    })
                    .await;
                continue;
            }

            tracing::info!(
                test_case_id = test_case.id(),
                name = %test_case.name(),
                execution_order = test_case.execution_order(),
                "Executing test case"
            );
            context
                .event_bus()
                .emit(RunEvent::TestCaseStarted {
                    test_case_id: test_case.id(),
                    name: test_case.name().to_string(),
                })
                .await;

            let vars = build_test_case_env_vars(test_case, site.project(), site.plan(), site.build());
            context.environment_mut().contribute(vars);

            let failed = run_group(&self.iterative, StepGroup::Iterative, context).await;
            self.failure |= failed;
        }

        let failed = run_group(&self.after, StepGroup::After, context).await;
        self.failure |= failed;
    }
}

/// Runs every step of a group. Returns whether any of them failed.
async fn run_group(steps: &[Box<dyn BuildStep>], group: StepGroup, context: &BuildContext) -> bool {
    let mut failed = false;

    for step in steps {
        if step.perform(context).await {
            tracing::debug!(%group, step = step.name(), "Step succeeded");
            continue;
        }

        tracing::warn!(%group, step = step.name(), "Step failed");
        context
            .event_bus()
            .emit(RunEvent::StepFailed {
                group,
                step: step.name().to_string(),
            })
            .await;
        failed = true;
    }

    failed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use testlink_api::Build;

    use super::*;
    use crate::env::BuildEnvironment;
    use crate::testing::{
        status_of,
        test_case,
        MockApi,
        MockStep,
        RecordingEventBus,
    };

    fn site() -> TestLinkSite {
        let api = MockApi::with_test_cases(vec![]);
        let project = api.project.clone();
        let plan = api.plan.clone();
        TestLinkSite::new(
            Arc::new(api),
            project,
            plan,
            Build {
                id: 1,
                name: "My build".to_string(),
                notes: String::new(),
            },
        )
    }

    fn wrappers(count: i64) -> Vec<TestCaseWrapper> {
        (1..=count)
            .map(|id| TestCaseWrapper::new(test_case(id, id * 10, 1)))
            .collect()
    }

    fn context(bus: Arc<RecordingEventBus>) -> BuildContext {
        BuildContext::new(".", BuildEnvironment::default(), bus)
    }

    #[tokio::test]
    async fn test_all_steps_run_without_failure() {
        let bus = Arc::new(RecordingEventBus::default());
        let mut ctx = context(bus.clone());
        let iterative = MockStep::new("iterative", true);
        let calls = iterative.calls();
        let seen = Arc::clone(&iterative.seen_test_case_ids);

        let mut orchestrator = IterationOrchestrator::new()
            .with_iterative_steps(vec![Box::new(iterative)])
            .with_transactional(true);
        let mut cases = wrappers(3);

        orchestrator
            .execute_iterative_build_steps(&mut cases, &site(), &mut ctx)
            .await;

        assert!(!orchestrator.failure());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["1", "2", "3"]);
        assert_eq!(ctx.environment().contributions().len(), 3);
        assert_eq!(
            status_of(&cases),
            vec![ExecutionStatus::NotRun; 3]
        );
    }

    #[tokio::test]
    async fn test_transactional_failure_blocks_remaining_test_cases() {
        let bus = Arc::new(RecordingEventBus::default());
        let mut ctx = context(bus.clone());
        let iterative = MockStep::new("iterative", false);
        let calls = iterative.calls();

        let mut orchestrator = IterationOrchestrator::new()
            .with_iterative_steps(vec![Box::new(iterative)])
            .with_transactional(true);
        let mut cases = wrappers(3);

        orchestrator
            .execute_iterative_build_steps(&mut cases, &site(), &mut ctx)
            .await;

        assert!(orchestrator.failure());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            status_of(&cases),
            vec![
                ExecutionStatus::NotRun,
                ExecutionStatus::Blocked,
                ExecutionStatus::Blocked
            ]
        );
        assert_eq!(
            bus.names(),
            vec![
                "test-case-started",
                "step-failed",
                "test-case-blocked",
                "test-case-blocked"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_without_transactional_keeps_running() {
        let mut ctx = context(Arc::new(RecordingEventBus::default()));
        let iterative = MockStep::new("iterative", false);
        let calls = iterative.calls();

        let mut orchestrator =
            IterationOrchestrator::new().with_iterative_steps(vec![Box::new(iterative)]);
        let mut cases = wrappers(3);

        orchestrator
            .execute_iterative_build_steps(&mut cases, &site(), &mut ctx)
            .await;

        assert!(orchestrator.failure());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(status_of(&cases)
            .iter()
            .all(|s| *s == ExecutionStatus::NotRun));
    }

    #[tokio::test]
    async fn test_failed_before_step_blocks_every_test_case() {
        let mut ctx = context(Arc::new(RecordingEventBus::default()));
        let before = MockStep::new("before", false);
        let second_before = MockStep::new("second-before", true);
        let second_calls = second_before.calls();
        let iterative = MockStep::new("iterative", true);
        let iterative_calls = iterative.calls();

        let mut orchestrator = IterationOrchestrator::new()
            .with_before_steps(vec![Box::new(before), Box::new(second_before)])
            .with_iterative_steps(vec![Box::new(iterative)])
            .with_transactional(true);
        let mut cases = wrappers(2);

        orchestrator
            .execute_iterative_build_steps(&mut cases, &site(), &mut ctx)
            .await;

        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(iterative_calls.load(Ordering::SeqCst), 0);
        assert_eq!(status_of(&cases), vec![ExecutionStatus::Blocked; 2]);
        assert!(ctx.environment().contributions().is_empty());
    }

    #[tokio::test]
    async fn test_after_steps_run_after_transactional_failure() {
        let mut ctx = context(Arc::new(RecordingEventBus::default()));
        let after = MockStep::new("after", true);
        let after_calls = after.calls();

        let mut orchestrator = IterationOrchestrator::new()
            .with_iterative_steps(vec![Box::new(MockStep::new("iterative", false))])
            .with_after_steps(vec![Box::new(after)])
            .with_transactional(true);
        let mut cases = wrappers(2);

        orchestrator
            .execute_iterative_build_steps(&mut cases, &site(), &mut ctx)
            .await;

        assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_step_failure_is_accumulated() {
        let ctx = context(Arc::new(RecordingEventBus::default()));
        let second = MockStep::new("second", true);
        let second_calls = second.calls();

        let mut orchestrator = IterationOrchestrator::new().with_single_steps(vec![
            Box::new(MockStep::new("first", false)),
            Box::new(second),
        ]);

        orchestrator.execute_single_build_steps(&ctx).await;
        assert!(orchestrator.failure());
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);

        orchestrator.reset();
        assert!(!orchestrator.failure());
    }

    #[tokio::test]
    async fn test_failing_after_step_sets_failure() {
        let mut ctx = context(Arc::new(RecordingEventBus::default()));
        let mut orchestrator = IterationOrchestrator::new()
            .with_after_steps(vec![Box::new(MockStep::new("after", false))]);
        let mut cases = wrappers(1);

        orchestrator
            .execute_iterative_build_steps(&mut cases, &site(), &mut ctx)
            .await;

        assert!(orchestrator.failure());
        assert_eq!(status_of(&cases), vec![ExecutionStatus::NotRun]);
    }
}
