use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use testlink_api::ExecutionStatus;

use super::{
    add_attachment_once,
    attachment_from_file,
    find_files,
    read_file,
    ResultSeeker,
    ResultSeekerResult,
};
use crate::config::TapSeekerConfig;
use crate::domain::TestCaseWrapper;
use crate::steps::BuildContext;

static TEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(not )?ok\b\s*(\d+)?\s*-?\s*([^#]*?)\s*(?:#\s*(\S+)(.*))?$")
        .expect("Invalid regex pattern")
});

static BAIL_OUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Bail out!\s*(.*)$").expect("Invalid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapTestPoint {
    pub ok: bool,
    pub number: Option<u32>,
    pub description: String,
    pub directive: Option<String>,
}

impl TapTestPoint {
    /// `# TODO` and `# SKIP` points never fail a stream
    fn counts_as_failure(&self) -> bool {
        if self.ok {
            return false;
        }
        !matches!(
            self.directive.as_deref().map(str::to_ascii_uppercase).as_deref(),
            Some(d) if d.starts_with("TODO") || d.starts_with("SKIP")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapStream {
    pub test_points: Vec<TapTestPoint>,
    pub bail_out: Option<String>,
}

impl TapStream {
    pub fn parse(content: &str) -> Self {
        let mut stream = TapStream::default();

        for line in content.lines() {
            if let Some(cap) = BAIL_OUT.captures(line) {
                stream.bail_out = Some(cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default());
                break;
            }

            if let Some(cap) = TEST_LINE.captures(line) {
                stream.test_points.push(TapTestPoint {
                    ok: cap.get(1).is_none(),
                    number: cap.get(2).and_then(|m| m.as_str().parse().ok()),
                    description: cap
                        .get(3)
                        .map(|m| m.as_str().trim().to_string())
                        .unwrap_or_default(),
                    directive: cap.get(4).map(|m| m.as_str().to_string()),
                });
            }
        }

        stream
    }

    pub fn status(&self) -> Option<ExecutionStatus> {
        if self.bail_out.is_some() {
            Some(ExecutionStatus::Blocked)
        } else if self.test_points.iter().any(TapTestPoint::counts_as_failure) {
            Some(ExecutionStatus::Failed)
        } else if self.test_points.is_empty() {
            None
        } else {
            Some(ExecutionStatus::Passed)
        }
    }

    fn notes(&self, file_name: &str) -> String {
        let mut notes = format!("TAP stream {file_name}");
        if let Some(reason) = &self.bail_out {
            notes.push_str("\nBail out! ");
            notes.push_str(reason);
        }
        for point in self.test_points.iter().filter(|p| p.counts_as_failure()) {
            notes.push_str("\nnot ok");
            if let Some(number) = point.number {
                notes.push_str(&format!(" {number}"));
            }
            if !point.description.is_empty() {
                notes.push_str(&format!(" - {}", point.description));
            }
        }
        notes
    }
}

/// Matches TAP files to test cases by file stem
#[derive(Debug, Clone)]
pub struct TapResultSeeker {
    include_pattern: String,
    key_custom_field: String,
    attach_tap_stream: bool,
    include_notes: bool,
}

impl TapResultSeeker {
    pub fn new(include_pattern: impl Into<String>, key_custom_field: impl Into<String>) -> Self {
        Self {
            include_pattern: include_pattern.into(),
            key_custom_field: key_custom_field.into(),
            attach_tap_stream: false,
            include_notes: false,
        }
    }

    pub fn from_config(config: &TapSeekerConfig) -> Self {
        Self {
            include_pattern: config.include_pattern.clone(),
            key_custom_field: config.key_custom_field.clone(),
            attach_tap_stream: config.attach_tap_stream,
            include_notes: config.include_notes,
        }
    }

    pub fn with_attach_tap_stream(mut self, attach: bool) -> Self {
        self.attach_tap_stream = attach;
        self
    }

    pub fn with_include_notes(mut self, include: bool) -> Self {
        self.include_notes = include;
        self
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl ResultSeeker for TapResultSeeker {
    fn name(&self) -> &str {
        "TAP file name"
    }

    async fn seek(
        &self, test_cases: &mut [TestCaseWrapper], context: &BuildContext,
    ) -> ResultSeekerResult<()> {
        let files = find_files(&self.include_pattern, context)?;

        let mut streams = Vec::with_capacity(files.len());
        for file in files {
            let content = read_file(&file).await?;
            streams.push((file_stem(&file), file, TapStream::parse(&content)));
        }

        for test_case in test_cases.iter_mut() {
            let keys = test_case.key_custom_field_values(&self.key_custom_field);

            let mut statuses = Vec::new();
            for (stem, file, stream) in &streams {
                if !keys.iter().any(|key| key == stem) {
                    continue;
                }
                let Some(status) = stream.status() else {
                    continue;
                };
                statuses.push(status);

                if self.include_notes {
                    test_case.append_notes(&stream.notes(stem));
                }
                if self.attach_tap_stream {
                    let attachment = attachment_from_file(file).await?;
                    add_attachment_once(test_case, &attachment);
                }
            }

            if let Some(status) = super::aggregate_status(&statuses) {
                tracing::debug!(test_case_id = test_case.id(), %status, "Matched TAP streams");
                test_case.set_execution_status(status);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use testlink_api::CustomField;

    use super::*;
    use crate::testing::test_case;

    fn wrapper(id: i64, key: &str) -> TestCaseWrapper {
        let mut tc = test_case(id, id, 1);
        tc.custom_fields.push(CustomField {
            name: "tap".to_string(),
            value: key.to_string(),
        });
        TestCaseWrapper::new(tc)
    }

    #[test]
    fn test_parse_stream() {
        let stream = TapStream::parse(
            "TAP version 13\n1..4\nok 1 - first\nnot ok 2 - second\nnot ok 3 - later # TODO not done\nok 4 # SKIP no db\n",
        );

        assert_eq!(stream.test_points.len(), 4);
        assert_eq!(stream.test_points[1].description, "second");
        assert_eq!(stream.test_points[2].directive.as_deref(), Some("TODO"));
        assert_eq!(stream.status(), Some(ExecutionStatus::Failed));
    }

    #[test]
    fn test_stream_status() {
        assert_eq!(
            TapStream::parse("1..2\nok 1\nnot ok 2 # todo flaky\n").status(),
            Some(ExecutionStatus::Passed)
        );
        assert_eq!(
            TapStream::parse("1..2\nok 1\nBail out! database down\n").status(),
            Some(ExecutionStatus::Blocked)
        );
        assert_eq!(TapStream::parse("1..0\n").status(), None);
    }

    #[tokio::test]
    async fn test_seek_by_file_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("login.tap"), "1..1\nok 1 - login\n").unwrap();
        std::fs::write(dir.path().join("cart.tap"), "1..1\nnot ok 1 - add item\n").unwrap();
        std::fs::write(dir.path().join("pay.tap"), "Bail out! no gateway\n").unwrap();
        let ctx = BuildContext::detached(dir.path());

        let mut cases = vec![
            wrapper(1, "login"),
            wrapper(2, "cart"),
            wrapper(3, "pay"),
            wrapper(4, "missing"),
        ];
        TapResultSeeker::new("*.tap", "tap")
            .with_include_notes(true)
            .with_attach_tap_stream(true)
            .seek(&mut cases, &ctx)
            .await
            .unwrap();

        assert_eq!(cases[0].execution_status(), ExecutionStatus::Passed);
        assert_eq!(cases[1].execution_status(), ExecutionStatus::Failed);
        assert!(cases[1].notes().contains("not ok 1 - add item"));
        assert_eq!(cases[2].execution_status(), ExecutionStatus::Blocked);
        assert!(cases[2].notes().contains("no gateway"));
        assert_eq!(cases[2].attachments()[0].file_name, "pay.tap");
        assert_eq!(cases[3].execution_status(), ExecutionStatus::NotRun);
    }
}
