use serde::{
    Deserialize,
    Serialize,
};

use super::report::Report;

/// Overall result of a build, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildResult {
    #[default]
    Success,
    Unstable,
    Failure,
}

impl BuildResult {
    /// The worse of the two results. A result is never upgraded.
    pub fn combine(self, other: BuildResult) -> BuildResult {
        self.max(other)
    }

    /// Color used when rendering the result, as in the classic CI balls
    pub fn color(&self) -> &'static str {
        match self {
            BuildResult::Success => "blue",
            BuildResult::Unstable => "yellow",
            BuildResult::Failure => "red",
        }
    }
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildResult::Success => write!(f, "SUCCESS"),
            BuildResult::Unstable => write!(f, "UNSTABLE"),
            BuildResult::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Maps the test results of a report onto the build result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultPolicy {
    pub fail_if_no_results: bool,
    pub failed_tests_mark_build_as_failure: bool,
}

impl ResultPolicy {
    pub fn apply(&self, current: BuildResult, report: &Report) -> BuildResult {
        if report.tests_total() == 0 && self.fail_if_no_results {
            current.combine(BuildResult::Failure)
        } else if report.failed() > 0 {
            if self.failed_tests_mark_build_as_failure {
                current.combine(BuildResult::Failure)
            } else {
                current.combine(BuildResult::Unstable)
            }
        } else {
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use testlink_api::{
        TestPlan,
        TestProject,
    };

    use super::*;

    fn report(passed: usize, failed: usize) -> Report {
        let mut report = Report::new(TestProject::default(), TestPlan::default(), 1, "b1");
        report.set_passed(passed);
        report.set_failed(failed);
        report
    }

    #[test]
    fn test_no_results_fails_when_configured() {
        let policy = ResultPolicy {
            fail_if_no_results: true,
            failed_tests_mark_build_as_failure: false,
        };
        assert_eq!(
            policy.apply(BuildResult::Success, &report(0, 0)),
            BuildResult::Failure
        );

        let lenient = ResultPolicy::default();
        assert_eq!(
            lenient.apply(BuildResult::Success, &report(0, 0)),
            BuildResult::Success
        );
    }

    #[test]
    fn test_failed_tests_mark_failure() {
        let policy = ResultPolicy {
            fail_if_no_results: false,
            failed_tests_mark_build_as_failure: true,
        };
        assert_eq!(
            policy.apply(BuildResult::Success, &report(2, 1)),
            BuildResult::Failure
        );
    }

    #[test]
    fn test_failed_tests_mark_unstable() {
        let policy = ResultPolicy::default();
        assert_eq!(
            policy.apply(BuildResult::Success, &report(2, 1)),
            BuildResult::Unstable
        );
    }

    #[test]
    fn test_passing_report_keeps_result() {
        let policy = ResultPolicy {
            fail_if_no_results: true,
            failed_tests_mark_build_as_failure: true,
        };
        assert_eq!(
            policy.apply(BuildResult::Success, &report(3, 0)),
            BuildResult::Success
        );
        assert_eq!(
            policy.apply(BuildResult::Unstable, &report(3, 0)),
            BuildResult::Unstable
        );
    }

    #[test]
    fn test_result_colors() {
        assert_eq!(BuildResult::Success.color(), "blue");
        assert_eq!(BuildResult::Unstable.color(), "yellow");
        assert_eq!(BuildResult::Failure.color(), "red");
        assert_eq!(BuildResult::Unstable.to_string(), "UNSTABLE");
    }

    #[test]
    fn test_never_upgrades() {
        let policy = ResultPolicy::default();
        assert_eq!(
            policy.apply(BuildResult::Failure, &report(1, 1)),
            BuildResult::Failure
        );
        assert_eq!(
            BuildResult::Unstable.combine(BuildResult::Success),
            BuildResult::Unstable
        );
    }
}
