//! Execution order of test cases, as assigned in the TestLink test plan

use std::cmp::Ordering;

use super::wrapper::TestCaseWrapper;

/// Ascending execution order. Ties compare equal so a stable sort keeps the
/// order TestLink returned them in.
pub fn by_execution_order(a: &TestCaseWrapper, b: &TestCaseWrapper) -> Ordering {
    a.execution_order().cmp(&b.execution_order())
}

pub fn sort_by_execution_order(test_cases: &mut [TestCaseWrapper]) {
    test_cases.sort_by(by_execution_order);
}
