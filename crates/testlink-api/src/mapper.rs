//! Data mapping from XML-RPC responses to TestLink types

use crate::error::{
    TestLinkError,
    TestLinkResult,
};
use crate::types::{
    Build,
    CustomField,
    ExecutionStatus,
    ExecutionType,
    Platform,
    TestCase,
    TestPlan,
    TestProject,
    TestSuite,
};
use crate::xmlrpc::Value;

/// TestLink reports application errors as a regular response holding
/// `[{code, message}]`
pub(crate) fn check_api_errors(value: &Value) -> TestLinkResult<()> {
    let first = match value {
        Value::Array(items) => items.first(),
        Value::Struct(_) => Some(value),
        _ => None,
    };

    if let Some(entry) = first {
        if let (Some(code), Some(message)) = (entry.i64_field("code"), entry.string_field("message"))
        {
            return Err(TestLinkError::Api { code, message });
        }
    }

    Ok(())
}

/// Some calls answer with a struct, others with a one element array
pub(crate) fn first_struct<'a>(value: &'a Value, what: &str) -> TestLinkResult<&'a Value> {
    match value {
        Value::Struct(_) => Ok(value),
        Value::Array(items) => items
            .iter()
            .find(|item| item.as_struct().is_some())
            .ok_or_else(|| TestLinkError::NotFound(what.to_string())),
        _ => Err(TestLinkError::InvalidResponse(format!(
            "Unexpected response for {what}"
        ))),
    }
}

fn required_id(value: &Value, key: &str, what: &str) -> TestLinkResult<i64> {
    value
        .i64_field(key)
        .ok_or_else(|| TestLinkError::InvalidResponse(format!("{what} without '{key}'")))
}

fn first_i64(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| value.i64_field(key))
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value.string_field(key))
}

pub(crate) fn map_test_project(value: &Value) -> TestLinkResult<TestProject> {
    let entry = first_struct(value, "test project")?;
    Ok(TestProject {
        id: required_id(entry, "id", "test project")?,
        name: entry.string_field("name").unwrap_or_default(),
        prefix: entry.string_field("prefix").unwrap_or_default(),
    })
}

pub(crate) fn map_test_plan(value: &Value) -> TestLinkResult<TestPlan> {
    let entry = first_struct(value, "test plan")?;
    Ok(TestPlan {
        id: required_id(entry, "id", "test plan")?,
        name: entry.string_field("name").unwrap_or_default(),
    })
}

pub(crate) fn map_created_build(value: &Value, name: &str, notes: &str) -> TestLinkResult<Build> {
    let entry = first_struct(value, "build")?;
    Ok(Build {
        id: required_id(entry, "id", "build")?,
        name: name.to_string(),
        notes: notes.to_string(),
    })
}

pub(crate) fn map_test_suite(value: &Value) -> TestLinkResult<TestSuite> {
    let entry = first_struct(value, "test suite")?;
    Ok(TestSuite {
        id: required_id(entry, "id", "test suite")?,
        name: entry.string_field("name").unwrap_or_default(),
    })
}

pub(crate) fn map_execution_id(value: &Value) -> TestLinkResult<i64> {
    let entry = first_struct(value, "execution")?;
    required_id(entry, "id", "execution")
}

/// Custom field value, either a plain string or the "full" struct
pub(crate) fn map_custom_field(value: &Value, name: &str) -> Option<CustomField> {
    match value {
        Value::String(s) => Some(CustomField {
            name: name.to_string(),
            value: s.clone(),
        }),
        Value::Struct(_) => Some(CustomField {
            name: value.string_field("name").unwrap_or_else(|| name.to_string()),
            value: value.string_field("value").unwrap_or_default(),
        }),
        _ => None,
    }
}

fn map_plan_entry(entry: &Value, project: &TestProject) -> TestLinkResult<TestCase> {
    let id = first_i64(entry, &["tcase_id", "tc_id", "id"])
        .ok_or_else(|| TestLinkError::InvalidResponse("test case without id".to_string()))?;
    let external_id = entry.i64_field("external_id").unwrap_or_default();
    let full_external_id = first_string(entry, &["full_external_id", "full_tc_external_id"])
        .unwrap_or_else(|| format!("{}-{}", project.prefix, external_id));

    let platform = match entry.i64_field("platform_id") {
        Some(platform_id) if platform_id > 0 => Some(Platform {
            id: platform_id,
            name: entry.string_field("platform_name").unwrap_or_default(),
        }),
        _ => None,
    };

    Ok(TestCase {
        id,
        version_id: entry.i64_field("tcversion_id").unwrap_or_default(),
        external_id,
        full_external_id,
        version: entry.i64_field("version").unwrap_or(1),
        name: first_string(entry, &["tcase_name", "name"]).unwrap_or_default(),
        test_suite_id: entry.i64_field("testsuite_id").unwrap_or_default(),
        test_project_id: project.id,
        execution_order: entry.i64_field("execution_order").unwrap_or_default(),
        execution_type: ExecutionType::from_id(
            entry.i64_field("execution_type").unwrap_or(2),
        ),
        summary: entry.string_field("summary").unwrap_or_default(),
        author_login: entry.string_field("author_login").unwrap_or_default(),
        platform,
        // exec_status is the last execution in the plan, not one of this build
        execution_status: ExecutionStatus::NotRun,
        custom_fields: Vec::new(),
    })
}

/// Maps `tl.getTestCasesForTestPlan`. The response is keyed by test case
/// id; each entry is either an array or a map keyed by platform id.
pub(crate) fn map_plan_test_cases(
    value: &Value, project: &TestProject,
) -> TestLinkResult<Vec<TestCase>> {
    let entries = match value {
        Value::Struct(members) => members.values().collect::<Vec<_>>(),
        Value::Array(items) => items.iter().collect(),
        Value::String(s) if s.is_empty() => Vec::new(),
        _ => {
            return Err(TestLinkError::InvalidResponse(
                "Unexpected test case listing".to_string(),
            ))
        }
    };

    let mut test_cases = Vec::new();
    for entry in entries {
        match entry {
            Value::Array(per_platform) => {
                for item in per_platform {
                    test_cases.push(map_plan_entry(item, project)?);
                }
            }
            Value::Struct(members) if entry.get("tcase_id").is_none() && entry.get("tc_id").is_none() => {
                for item in members.values() {
                    test_cases.push(map_plan_entry(item, project)?);
                }
            }
            Value::Struct(_) => test_cases.push(map_plan_entry(entry, project)?),
            _ => {}
        }
    }

    Ok(test_cases)
}

/// Maps `tl.getTestCase`
pub(crate) fn map_full_test_case(value: &Value) -> TestLinkResult<TestCase> {
    let entry = first_struct(value, "test case")?;
    let id = first_i64(entry, &["testcase_id", "tc_id"])
        .ok_or_else(|| TestLinkError::InvalidResponse("test case without id".to_string()))?;

    Ok(TestCase {
        id,
        version_id: entry.i64_field("id").unwrap_or_default(),
        external_id: entry.i64_field("tc_external_id").unwrap_or_default(),
        full_external_id: entry.string_field("full_tc_external_id").unwrap_or_default(),
        version: entry.i64_field("version").unwrap_or(1),
        name: entry.string_field("name").unwrap_or_default(),
        test_suite_id: entry.i64_field("testsuite_id").unwrap_or_default(),
        test_project_id: entry.i64_field("testproject_id").unwrap_or_default(),
        execution_order: entry.i64_field("node_order").unwrap_or_default(),
        execution_type: ExecutionType::from_id(
            entry.i64_field("execution_type").unwrap_or(2),
        ),
        summary: entry.string_field("summary").unwrap_or_default(),
        author_login: entry.string_field("author_login").unwrap_or_default(),
        platform: None,
        execution_status: ExecutionStatus::NotRun,
        custom_fields: Vec::new(),
    })
}
