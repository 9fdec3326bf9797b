use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub installations: IndexMap<String, InstallationConfig>,

    #[serde(default)]
    pub job: JobConfig,
}

impl RunnerConfig {
    pub fn data_dir(&self) -> PathBuf {
        if self.general.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.general.data_dir)
        }
    }

    pub fn default_data_dir() -> PathBuf {
        std::env::var("TESTLINK_RUNNER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .map(|p| p.join("testlink-runner"))
                    .unwrap_or_else(|| PathBuf::from(".testlink-runner"))
            })
    }

    pub fn installation(&self, name: &str) -> Option<&InstallationConfig> {
        self.installations.get(name)
    }

    /// Problems that make the job impossible to run, one message each
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let job = &self.job;

        for (field, value) in [
            ("job.testlink_name", &job.testlink_name),
            ("job.test_project_name", &job.test_project_name),
            ("job.test_plan_name", &job.test_plan_name),
            ("job.build_name", &job.build_name),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{field}: must not be empty"));
            }
        }

        if !job.testlink_name.trim().is_empty() && self.installation(&job.testlink_name).is_none()
        {
            errors.push(format!(
                "job.testlink_name: unknown installation '{}'",
                job.testlink_name
            ));
        }

        for (name, installation) in &self.installations {
            if installation.url.trim().is_empty() {
                errors.push(format!("installations.{name}.url: must not be empty"));
            }
            if installation.dev_key.trim().is_empty() {
                errors.push(format!("installations.{name}.dev_key: must not be empty"));
            }
        }

        for (group, steps) in [
            ("single_steps", &job.single_steps),
            ("before_steps", &job.before_steps),
            ("iterative_steps", &job.iterative_steps),
            ("after_steps", &job.after_steps),
        ] {
            for (index, step) in steps.iter().enumerate() {
                if step.command.trim().is_empty() {
                    errors.push(format!("job.{group}[{index}].command: must not be empty"));
                }
            }
        }

        for (index, seeker) in job.result_seekers.iter().enumerate() {
            let (pattern, key) = seeker.pattern_and_key();
            if pattern.trim().is_empty() {
                errors.push(format!(
                    "job.result_seekers[{index}].include_pattern: must not be empty"
                ));
            }
            if key.trim().is_empty() {
                errors.push(format!(
                    "job.result_seekers[{index}].key_custom_field: must not be empty"
                ));
            }
        }

        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Where the last report is kept between runs
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_dir: String,
}

/// A TestLink server the job can report to
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct InstallationConfig {
    pub url: String,

    #[serde(default)]
    pub dev_key: String,
}

impl std::fmt::Debug for InstallationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationConfig")
            .field("url", &self.url)
            .field("dev_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobConfig {
    #[serde(default)]
    pub testlink_name: String,

    #[serde(default)]
    pub test_project_name: String,

    #[serde(default)]
    pub test_plan_name: String,

    #[serde(default)]
    pub build_name: String,

    /// Comma separated custom field names fetched for every test case
    #[serde(default)]
    pub custom_fields: String,

    /// Extra variables added to the build environment
    #[serde(default)]
    pub variables: IndexMap<String, String>,

    #[serde(default)]
    pub single_steps: Vec<StepConfig>,

    #[serde(default)]
    pub before_steps: Vec<StepConfig>,

    #[serde(default)]
    pub iterative_steps: Vec<StepConfig>,

    #[serde(default)]
    pub after_steps: Vec<StepConfig>,

    #[serde(default)]
    pub transactional: bool,

    #[serde(default)]
    pub failed_tests_mark_build_as_failure: bool,

    #[serde(default)]
    pub fail_if_no_results: bool,

    #[serde(default)]
    pub result_seekers: Vec<SeekerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StepConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub command: String,

    /// Relative to the workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SeekerConfig {
    JunitCaseName(JUnitSeekerConfig),
    JunitClassName(JUnitSeekerConfig),
    JunitSuiteName(JUnitSeekerConfig),
    TapFileName(TapSeekerConfig),
}

impl SeekerConfig {
    fn pattern_and_key(&self) -> (&str, &str) {
        match self {
            SeekerConfig::JunitCaseName(c)
            | SeekerConfig::JunitClassName(c)
            | SeekerConfig::JunitSuiteName(c) => (&c.include_pattern, &c.key_custom_field),
            SeekerConfig::TapFileName(c) => (&c.include_pattern, &c.key_custom_field),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JUnitSeekerConfig {
    pub include_pattern: String,

    pub key_custom_field: String,

    #[serde(default)]
    pub attach_junit_xml: bool,

    #[serde(default)]
    pub include_notes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TapSeekerConfig {
    pub include_pattern: String,

    pub key_custom_field: String,

    #[serde(default)]
    pub attach_tap_stream: bool,

    #[serde(default)]
    pub include_notes: bool,
}
