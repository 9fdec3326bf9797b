use serde::{
    Deserialize,
    Serialize,
};
use testlink_api::{
    Attachment,
    CustomField,
    ExecutionStatus,
    TestCase,
};

/// A TestLink test case plus what the runner learns about it during a build:
/// the suite name, the platform, execution notes and attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseWrapper {
    test_case: TestCase,
    #[serde(default)]
    test_suite_name: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    notes: String,
    #[serde(skip)]
    attachments: Vec<Attachment>,
}

impl TestCaseWrapper {
    pub fn new(test_case: TestCase) -> Self {
        let platform = test_case.platform.as_ref().map(|p| p.name.clone());
        Self {
            test_case,
            test_suite_name: String::new(),
            platform,
            notes: String::new(),
            attachments: Vec::new(),
        }
    }

    pub fn test_case(&self) -> &TestCase {
        &self.test_case
    }

    pub fn id(&self) -> i64 {
        self.test_case.id
    }

    pub fn name(&self) -> &str {
        &self.test_case.name
    }

    pub fn full_external_id(&self) -> &str {
        &self.test_case.full_external_id
    }

    pub fn version(&self) -> i64 {
        self.test_case.version
    }

    pub fn execution_order(&self) -> i64 {
        self.test_case.execution_order
    }

    pub fn test_suite_id(&self) -> i64 {
        self.test_case.test_suite_id
    }

    pub fn set_test_suite_id(&mut self, test_suite_id: i64) {
        self.test_case.test_suite_id = test_suite_id;
    }

    pub fn test_suite_name(&self) -> &str {
        &self.test_suite_name
    }

    pub fn set_test_suite_name(&mut self, name: impl Into<String>) {
        self.test_suite_name = name.into();
    }

    pub fn execution_status(&self) -> ExecutionStatus {
        self.test_case.execution_status
    }

    pub fn set_execution_status(&mut self, status: ExecutionStatus) {
        self.test_case.execution_status = status;
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn set_platform(&mut self, platform: Option<String>) {
        self.platform = platform;
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn append_notes(&mut self, notes: &str) {
        if notes.is_empty() {
            return;
        }
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(notes);
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn custom_fields(&self) -> &[CustomField] {
        &self.test_case.custom_fields
    }

    /// Values of the key custom field. A single field may hold several
    /// comma separated keys.
    pub fn key_custom_field_values(&self, field_name: &str) -> Vec<String> {
        self.test_case
            .custom_field(field_name)
            .map(|field| {
                field
                    .value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use testlink_api::Platform;

    use super::*;

    #[test]
    fn test_wrapper_takes_platform_name() {
        let test_case = TestCase {
            id: 1,
            platform: Some(Platform {
                id: 3,
                name: "linux".to_string(),
            }),
            ..Default::default()
        };

        let wrapper = TestCaseWrapper::new(test_case);
        assert_eq!(wrapper.platform(), Some("linux"));
        assert_eq!(wrapper.execution_status(), ExecutionStatus::NotRun);
    }

    #[test]
    fn test_key_custom_field_values() {
        let test_case = TestCase {
            custom_fields: vec![CustomField {
                name: "nodeId".to_string(),
                value: "login, logout,,".to_string(),
            }],
            ..Default::default()
        };

        let wrapper = TestCaseWrapper::new(test_case);
        assert_eq!(
            wrapper.key_custom_field_values("nodeId"),
            vec!["login".to_string(), "logout".to_string()]
        );
        assert!(wrapper.key_custom_field_values("other").is_empty());
    }

    #[test]
    fn test_append_notes() {
        let mut wrapper = TestCaseWrapper::new(TestCase::default());
        wrapper.append_notes("first");
        wrapper.append_notes("");
        wrapper.append_notes("second");
        assert_eq!(wrapper.notes(), "first\nsecond");
    }
}
