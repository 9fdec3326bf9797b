//! Enrichment of the plan's test cases with the data the listing omits

use std::collections::HashMap;

use testlink_api::{
    ExecutionStatus,
    TestCase,
    TestLinkApi,
    TestLinkError,
    TestLinkResult,
};

use crate::domain::TestCaseWrapper;

/// Fetches the full record of every test case and resolves its suite name.
///
/// Issues one full test case request per test case and one suite request per
/// distinct suite id; resolved names are kept in `suite_cache`.
pub async fn transform(
    api: &dyn TestLinkApi, test_cases: Vec<TestCase>, suite_cache: &mut HashMap<i64, String>,
) -> TestLinkResult<Vec<TestCaseWrapper>> {
    let mut wrappers = Vec::with_capacity(test_cases.len());

    for mut test_case in test_cases {
        let full = api
            .get_test_case_by_external_id(&test_case.full_external_id, test_case.version)
            .await?;

        let suite_name = match suite_cache.get(&full.test_suite_id) {
            Some(name) => name.clone(),
            None => {
                let name = resolve_suite_name(api, full.test_suite_id).await?;
                suite_cache.insert(full.test_suite_id, name.clone());
                name
            }
        };

        test_case.test_suite_id = full.test_suite_id;
        test_case.name = full.name;
        // statuses are only set by this build
        test_case.execution_status = ExecutionStatus::NotRun;
        if test_case.summary.is_empty() {
            test_case.summary = full.summary;
        }
        if test_case.author_login.is_empty() {
            test_case.author_login = full.author_login;
        }

        tracing::debug!(
            test_case_id = test_case.id,
            suite_id = test_case.test_suite_id,
            suite = %suite_name,
            "Enriched test case"
        );

        let mut wrapper = TestCaseWrapper::new(test_case);
        wrapper.set_test_suite_name(suite_name);
        wrappers.push(wrapper);
    }

    Ok(wrappers)
}

async fn resolve_suite_name(api: &dyn TestLinkApi, suite_id: i64) -> TestLinkResult<String> {
    api.get_test_suites_by_id(&[suite_id])
        .await?
        .into_iter()
        .next()
        .map(|suite| suite.name)
        .ok_or_else(|| TestLinkError::NotFound(format!("test suite {suite_id}")))
}
