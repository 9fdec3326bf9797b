//! Build environment and the per test case variables exposed to steps

use std::collections::BTreeMap;

use testlink_api::{
    Build,
    TestPlan,
    TestProject,
};

use crate::domain::TestCaseWrapper;

pub type EnvVars = BTreeMap<String, String>;

const TESTCASE_PREFIX: &str = "TESTLINK_TESTCASE_";

/// Environment seen by build steps. Layers are applied in this order when
/// the environment is materialized for a process: the base variables, the
/// overrides given on the command line, then the contributions made during
/// the build.
#[derive(Debug, Clone, Default)]
pub struct BuildEnvironment {
    base: EnvVars,
    overrides: EnvVars,
    contributions: Vec<EnvVars>,
}

impl BuildEnvironment {
    pub fn new(base: EnvVars) -> Self {
        Self {
            base,
            overrides: EnvVars::new(),
            contributions: Vec::new(),
        }
    }

    pub fn from_process() -> Self {
        Self::new(std::env::vars().collect())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.base.insert(key.into(), value.into());
    }

    /// Sets a variable that base values, such as job variables, cannot
    /// replace
    pub fn set_override(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(key.into(), value.into());
    }

    /// Makes `vars` visible to every step executed from now on
    pub fn contribute(&mut self, vars: EnvVars) {
        self.contributions.push(vars);
    }

    pub fn contributions(&self) -> &[EnvVars] {
        &self.contributions
    }

    pub fn materialize(&self) -> EnvVars {
        let mut env = self.base.clone();
        env.extend(self.overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        for contribution in &self.contributions {
            env.extend(contribution.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        env
    }
}

/// `TESTLINK_TESTCASE_<NAME>` for a custom field
pub fn custom_field_env_name(field_name: &str) -> String {
    let suffix: String = field_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{TESTCASE_PREFIX}{suffix}")
}

pub fn build_test_case_env_vars(
    test_case: &TestCaseWrapper, project: &TestProject, plan: &TestPlan, build: &Build,
) -> EnvVars {
    let tc = test_case.test_case();
    let mut env = EnvVars::new();

    let mut put = |key: &str, value: String| {
        env.insert(format!("{TESTCASE_PREFIX}{key}"), value);
    };
    put("ID", tc.id.to_string());
    put("NAME", tc.name.clone());
    put("TESTPROJECTID", project.id.to_string());
    put("AUTHOR", tc.author_login.clone());
    put("SUMMARY", tc.summary.clone());
    put("EXTERNALID", tc.external_id.to_string());
    put("FULLEXTERNALID", tc.full_external_id.clone());
    put("VERSION", tc.version.to_string());
    put("TESTSUITEID", tc.test_suite_id.to_string());
    put("TESTSUITE_NAME", test_case.test_suite_name().to_string());
    put("EXECUTIONORDER", tc.execution_order.to_string());
    put("PLATFORM", test_case.platform().unwrap_or_default().to_string());

    env.insert("TESTLINK_TESTPROJECT_NAME".to_string(), project.name.clone());
    env.insert("TESTLINK_TESTPLAN_NAME".to_string(), plan.name.clone());
    env.insert("TESTLINK_BUILD_NAME".to_string(), build.name.clone());

    for field in &tc.custom_fields {
        env.insert(custom_field_env_name(&field.name), field.value.clone());
    }

    tracing::debug!(
        test_case_id = tc.id,
        variables = env.len(),
        "Built test case environment"
    );

    env
}

/// Expands `$VAR` and `${VAR}` against `env`. Unknown variables are kept.
pub fn expand_variables(input: &str, env: &EnvVars) -> String {
    shellexpand::env_with_context_no_errors(input, |var: &str| env.get(var)).into_owned()
}

/// Splits the comma separated list of custom field names
pub fn split_custom_fields(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
