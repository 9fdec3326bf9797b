//! HTML fragments describing a report, optionally against the previous one.
//!
//! The markup is rendered verbatim by the consumer, so the output format is
//! fixed down to the byte.

use std::collections::HashSet;
use std::fmt::Write;

use testlink_api::ExecutionStatus;

use crate::domain::{
    Report,
    TestCaseWrapper,
};

/// `" (+n)"` when `current` exceeds `previous` by `n`, empty otherwise
pub fn plus_signal(current: usize, previous: usize) -> String {
    if current > previous {
        format!(" (+{})", current - previous)
    } else {
        String::new()
    }
}

fn delta(report: &Report, previous: Option<&Report>, count: impl Fn(&Report) -> usize) -> String {
    previous
        .map(|previous| plus_signal(count(report), count(previous)))
        .unwrap_or_default()
}

pub fn create_report_summary(report: &Report, previous: Option<&Report>) -> String {
    format!(
        "<p><b>TestLink build ID: {}</b></p>\
         <p><b>TestLink build name: {}</b></p>\
         <p><a href=\"testLinkResult\">Total of {}{} tests</a>. \
         Where {}{} passed, {}{} failed, {}{} were blocked and {}{} were not executed.</p>",
        report.build_id(),
        report.build_name(),
        report.tests_total(),
        delta(report, previous, Report::tests_total),
        report.passed(),
        delta(report, previous, Report::passed),
        report.failed(),
        delta(report, previous, Report::failed),
        report.blocked(),
        delta(report, previous, Report::blocked),
        report.not_run(),
        delta(report, previous, Report::not_run),
    )
}

pub fn create_report_summary_details(report: &Report, previous: Option<&Report>) -> String {
    let mut html = format!(
        "<p>List of test cases and execution result status for Project: {} (id:{}) Test Plan: {} (id:{})</p>\
         <table border=\"1\">\n\
         <tr><th>Test case ID</th><th>Test case external ID</th><th>Version</th><th>Name</th><th>Test Suite</th><th>Execution status</th></tr>\n",
        report.project().name,
        report.project().id,
        report.plan().name,
        report.plan().id,
    );

    for test_case in union_of_test_cases(report, previous) {
        // writing to a String never fails
        let _ = write!(
            html,
            "<tr>\n<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} (id:{})</td><td>{}</td>\n</tr>\n",
            test_case.id(),
            test_case.full_external_id(),
            test_case.version(),
            test_case.name(),
            test_case.test_suite_name(),
            test_case.test_suite_id(),
            execution_status_text_colored(test_case.execution_status()),
        );
    }

    html.push_str("</table>");
    html
}

/// Test cases of the current report followed by those only present in the
/// previous one
fn union_of_test_cases<'a>(
    report: &'a Report, previous: Option<&'a Report>,
) -> Vec<&'a TestCaseWrapper> {
    let mut seen = HashSet::new();
    let previous_cases = previous.map(Report::test_cases).unwrap_or_default();

    report
        .test_cases()
        .iter()
        .chain(previous_cases)
        .filter(|tc| seen.insert(tc.id()))
        .collect()
}

pub fn execution_status_text_colored(status: ExecutionStatus) -> String {
    let color = match status {
        ExecutionStatus::Passed => "green",
        ExecutionStatus::Failed => "red",
        ExecutionStatus::Blocked => "yellow",
        ExecutionStatus::NotRun => "gray",
    };
    format!("<span style='color: {color}'>{}</span>", status.label())
}
