//! TestLink XML-RPC client

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::{
    Client,
    Url,
};
use secrecy::{
    ExposeSecret,
    SecretString,
};

use crate::api::TestLinkApi;
use crate::error::{
    TestLinkError,
    TestLinkResult,
};
use crate::mapper;
use crate::types::*;
use crate::xmlrpc::{
    self,
    Value,
};

/// Client for the TestLink XML-RPC endpoint
/// (usually `<testlink>/lib/api/xmlrpc/v1/xmlrpc.php`)
pub struct TestLinkClient {
    client: Client,
    url: Url,
    dev_key: SecretString,
}

impl std::fmt::Debug for TestLinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestLinkClient")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Validates a TestLink endpoint URL
pub fn parse_url(url: &str) -> TestLinkResult<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| TestLinkError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(TestLinkError::InvalidUrl(format!(
            "{url}: unsupported scheme '{scheme}'"
        ))),
    }
}

impl TestLinkClient {
    pub fn new(url: &str, dev_key: SecretString) -> TestLinkResult<Self> {
        let url = parse_url(url)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("testlink-runner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TestLinkError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            dev_key,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn params(&self) -> IndexMap<String, Value> {
        let mut params = IndexMap::new();
        params.insert(
            "devKey".to_string(),
            Value::from(self.dev_key.expose_secret()),
        );
        params
    }

    /// Posts one method call and checks the response for API errors
    async fn call(&self, method: &str, params: IndexMap<String, Value>) -> TestLinkResult<Value> {
        let body = xmlrpc::encode_method_call(method, &[Value::Struct(params)])?;

        tracing::debug!(method, url = %self.url, "Calling TestLink API");

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| TestLinkError::Network(format!("{method} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TestLinkError::Network(format!("Failed to read {method} response: {e}")))?;

        if !status.is_success() {
            let preview = if text.len() > 300 {
                format!("{}...", text.chars().take(300).collect::<String>())
            } else {
                text
            };
            return Err(TestLinkError::Network(format!(
                "{method} returned HTTP {status}: {preview}"
            )));
        }

        let value = xmlrpc::parse_method_response(&text)?;
        mapper::check_api_errors(&value)?;
        Ok(value)
    }

    async fn get_custom_field_value(
        &self, test_case: &TestCase, project_id: i64, field_name: &str,
    ) -> TestLinkResult<Option<CustomField>> {
        let mut params = self.params();
        params.insert(
            "testcaseexternalid".to_string(),
            Value::from(test_case.full_external_id.as_str()),
        );
        params.insert("version".to_string(), Value::from(test_case.version));
        params.insert("testprojectid".to_string(), Value::from(project_id));
        params.insert("customfieldname".to_string(), Value::from(field_name));
        params.insert("details".to_string(), Value::from("full"));

        let value = self
            .call("tl.getTestCaseCustomFieldDesignValue", params)
            .await?;
        Ok(mapper::map_custom_field(&value, field_name))
    }
}

#[async_trait]
impl TestLinkApi for TestLinkClient {
    async fn get_test_project_by_name(&self, project_name: &str) -> TestLinkResult<TestProject> {
        let mut params = self.params();
        params.insert("testprojectname".to_string(), Value::from(project_name));

        let value = self.call("tl.getTestProjectByName", params).await?;
        mapper::map_test_project(&value)
    }

    async fn get_test_plan_by_name(
        &self, plan_name: &str, project_name: &str,
    ) -> TestLinkResult<TestPlan> {
        let mut params = self.params();
        params.insert("testprojectname".to_string(), Value::from(project_name));
        params.insert("testplanname".to_string(), Value::from(plan_name));

        let value = self.call("tl.getTestPlanByName", params).await?;
        mapper::map_test_plan(&value)
    }

    async fn create_build(&self, plan_id: i64, name: &str, notes: &str) -> TestLinkResult<Build> {
        let mut params = self.params();
        params.insert("testplanid".to_string(), Value::from(plan_id));
        params.insert("buildname".to_string(), Value::from(name));
        params.insert("buildnotes".to_string(), Value::from(notes));

        let value = self.call("tl.createBuild", params).await?;
        mapper::map_created_build(&value, name, notes)
    }

    async fn get_automated_test_cases(
        &self, project: &TestProject, plan: &TestPlan, custom_field_names: &[String],
    ) -> TestLinkResult<Vec<TestCase>> {
        let mut params = self.params();
        params.insert("testplanid".to_string(), Value::from(plan.id));
        params.insert(
            "executiontype".to_string(),
            Value::from(ExecutionType::Automated.id()),
        );
        params.insert("getstepsinfo".to_string(), Value::from(false));
        params.insert("details".to_string(), Value::from("full"));

        let value = self.call("tl.getTestCasesForTestPlan", params).await?;
        let mut test_cases = mapper::map_plan_test_cases(&value, project)?;

        for test_case in test_cases.iter_mut() {
            for field_name in custom_field_names {
                if let Some(field) = self
                    .get_custom_field_value(test_case, project.id, field_name)
                    .await?
                {
                    test_case.custom_fields.push(field);
                }
            }
        }

        Ok(test_cases)
    }

    async fn get_test_case_by_external_id(
        &self, full_external_id: &str, version: i64,
    ) -> TestLinkResult<TestCase> {
        let mut params = self.params();
        params.insert(
            "testcaseexternalid".to_string(),
            Value::from(full_external_id),
        );
        params.insert("version".to_string(), Value::from(version));

        let value = self.call("tl.getTestCase", params).await?;
        mapper::map_full_test_case(&value)
    }

    async fn get_test_suites_by_id(&self, ids: &[i64]) -> TestLinkResult<Vec<TestSuite>> {
        let mut suites = Vec::with_capacity(ids.len());
        for id in ids {
            let mut params = self.params();
            params.insert("testsuiteid".to_string(), Value::from(*id));

            let value = self.call("tl.getTestSuiteByID", params).await?;
            suites.push(mapper::map_test_suite(&value)?);
        }
        Ok(suites)
    }

    async fn report_test_case_result(&self, execution: &ExecutionReport) -> TestLinkResult<i64> {
        let mut params = self.params();
        params.insert("testcaseid".to_string(), Value::from(execution.test_case_id));
        params.insert("testplanid".to_string(), Value::from(execution.test_plan_id));
        params.insert("buildid".to_string(), Value::from(execution.build_id));
        params.insert("status".to_string(), Value::from(execution.status.code()));
        params.insert("notes".to_string(), Value::from(execution.notes.as_str()));
        if let Some(platform_id) = execution.platform_id {
            params.insert("platformid".to_string(), Value::from(platform_id));
        }

        let value = self.call("tl.reportTCResult", params).await?;
        mapper::map_execution_id(&value)
    }

    async fn upload_execution_attachment(
        &self, execution_id: i64, attachment: &Attachment,
    ) -> TestLinkResult<()> {
        let mut params = self.params();
        params.insert("executionid".to_string(), Value::from(execution_id));
        params.insert("title".to_string(), Value::from(attachment.title.as_str()));
        params.insert(
            "description".to_string(),
            Value::from(attachment.description.as_str()),
        );
        params.insert(
            "filename".to_string(),
            Value::from(attachment.file_name.as_str()),
        );
        params.insert(
            "filetype".to_string(),
            Value::from(attachment.file_type.as_str()),
        );
        params.insert(
            "content".to_string(),
            Value::from(attachment.content.as_str()),
        );

        self.call("tl.uploadExecutionAttachment", params).await?;
        Ok(())
    }
}
