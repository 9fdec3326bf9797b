use serde::{
    Deserialize,
    Serialize,
};

/// Execution status of a test case, as stored by TestLink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    NotRun,
    Passed,
    Failed,
    Blocked,
}

impl ExecutionStatus {
    /// Single letter code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionStatus::NotRun => "n",
            ExecutionStatus::Passed => "p",
            ExecutionStatus::Failed => "f",
            ExecutionStatus::Blocked => "b",
        }
    }

    /// Parses a wire code. Anything unknown is treated as not run.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "p" => ExecutionStatus::Passed,
            "f" => ExecutionStatus::Failed,
            "b" => ExecutionStatus::Blocked,
            _ => ExecutionStatus::NotRun,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExecutionStatus::NotRun => "Not Run",
            ExecutionStatus::Passed => "Passed",
            ExecutionStatus::Failed => "Failed",
            ExecutionStatus::Blocked => "Blocked",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    Manual,
    #[default]
    Automated,
}

impl ExecutionType {
    pub fn id(&self) -> i64 {
        match self {
            ExecutionType::Manual => 1,
            ExecutionType::Automated => 2,
        }
    }

    pub fn from_id(id: i64) -> Self {
        if id == 1 {
            ExecutionType::Manual
        } else {
            ExecutionType::Automated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestProject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestPlan {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Build {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A test case as returned by TestLink.
///
/// Depending on the call that produced it, some fields are left at their
/// defaults: the test plan listing carries no suite id nor, on some
/// servers, a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestCase {
    pub id: i64,
    #[serde(default)]
    pub version_id: i64,
    #[serde(default)]
    pub external_id: i64,
    #[serde(default)]
    pub full_external_id: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub test_suite_id: i64,
    #[serde(default)]
    pub test_project_id: i64,
    #[serde(default)]
    pub execution_order: i64,
    #[serde(default)]
    pub execution_type: ExecutionType,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub author_login: String,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl TestCase {
    pub fn custom_field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|cf| cf.name == name)
    }
}

/// File attached to a test execution. `content` is base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Attachment {
    pub file_name: String,
    pub file_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip)]
    pub content: String,
}

/// Payload of a single "report test case result" call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub test_case_id: i64,
    pub test_plan_id: i64,
    pub build_id: i64,
    pub platform_id: Option<i64>,
    pub status: ExecutionStatus,
    pub notes: String,
}
