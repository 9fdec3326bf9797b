use std::path::Path;

use async_trait::async_trait;
use quick_xml::events::{
    BytesStart,
    Event,
};
use quick_xml::Reader;
use testlink_api::ExecutionStatus;

use super::{
    add_attachment_once,
    aggregate_status,
    attachment_from_file,
    find_files,
    read_file,
    ResultSeeker,
    ResultSeekerError,
    ResultSeekerResult,
};
use crate::config::JUnitSeekerConfig;
use crate::domain::TestCaseWrapper;
use crate::steps::BuildContext;

/// Which JUnit name the key custom field is compared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JUnitMatch {
    CaseName,
    ClassName,
    SuiteName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JUnitCase {
    pub name: String,
    pub class_name: String,
    pub suite_name: String,
    pub failure: Option<String>,
    pub skipped: bool,
    pub system_out: String,
}

impl JUnitCase {
    fn status(&self) -> Option<ExecutionStatus> {
        if self.failure.is_some() {
            Some(ExecutionStatus::Failed)
        } else if self.skipped {
            None
        } else {
            Some(ExecutionStatus::Passed)
        }
    }

    fn key(&self, mode: JUnitMatch) -> &str {
        match mode {
            JUnitMatch::CaseName => &self.name,
            JUnitMatch::ClassName => &self.class_name,
            JUnitMatch::SuiteName => &self.suite_name,
        }
    }
}

#[derive(Clone, Copy)]
enum Capture {
    Failure,
    SystemOut,
}

fn attribute(
    element: &BytesStart<'_>, name: &str, path: &Path,
) -> ResultSeekerResult<Option<String>> {
    let parse_error = |message: String| ResultSeekerError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match element
        .try_get_attribute(name)
        .map_err(|e| parse_error(e.to_string()))?
    {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .map_err(|e| parse_error(e.to_string()))?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

/// Flattens a JUnit report into its test cases. `<testsuites>` roots and
/// nested suites are supported; a case belongs to its innermost suite.
pub fn parse_junit(xml: &str, path: &Path) -> ResultSeekerResult<Vec<JUnitCase>> {
    let parse_error = |message: String| ResultSeekerError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_str(xml);
    let mut suites: Vec<String> = Vec::new();
    let mut cases = Vec::new();
    let mut current: Option<JUnitCase> = None;
    let mut capture: Option<Capture> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(e.to_string()))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"testsuite" => {
                    suites.push(attribute(&e, "name", path)?.unwrap_or_default());
                }
                b"testcase" => {
                    current = Some(new_case(&e, &suites, path)?);
                }
                b"failure" | b"error" => {
                    if let Some(case) = current.as_mut() {
                        case.failure = Some(attribute(&e, "message", path)?.unwrap_or_default());
                        capture = Some(Capture::Failure);
                    }
                }
                b"skipped" => {
                    if let Some(case) = current.as_mut() {
                        case.skipped = true;
                    }
                }
                b"system-out" => {
                    if current.is_some() {
                        capture = Some(Capture::SystemOut);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"testcase" => cases.push(new_case(&e, &suites, path)?),
                b"failure" | b"error" => {
                    if let Some(case) = current.as_mut() {
                        case.failure = Some(attribute(&e, "message", path)?.unwrap_or_default());
                    }
                }
                b"skipped" => {
                    if let Some(case) = current.as_mut() {
                        case.skipped = true;
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"testsuite" => {
                    suites.pop();
                }
                b"testcase" => {
                    if let Some(case) = current.take() {
                        cases.push(case);
                    }
                    capture = None;
                }
                b"failure" | b"error" | b"system-out" => capture = None,
                _ => {}
            },
            Event::Text(t) => {
                if let (Some(target), Some(case)) = (capture, current.as_mut()) {
                    let text = t.unescape().map_err(|e| parse_error(e.to_string()))?;
                    append_captured(case, target, &text);
                }
            }
            Event::CData(c) => {
                if let (Some(target), Some(case)) = (capture, current.as_mut()) {
                    let bytes = c.into_inner();
                    append_captured(case, target, &String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(cases)
}

fn new_case(element: &BytesStart<'_>, suites: &[String], path: &Path) -> ResultSeekerResult<JUnitCase> {
    Ok(JUnitCase {
        name: attribute(element, "name", path)?.unwrap_or_default(),
        class_name: attribute(element, "classname", path)?.unwrap_or_default(),
        suite_name: suites.last().cloned().unwrap_or_default(),
        ..Default::default()
    })
}

fn append_captured(case: &mut JUnitCase, target: Capture, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let buffer = match target {
        Capture::Failure => case.failure.get_or_insert_with(String::new),
        Capture::SystemOut => &mut case.system_out,
    };
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(text);
}

/// Matches JUnit results to test cases through a key custom field
#[derive(Debug, Clone)]
pub struct JUnitResultSeeker {
    name: String,
    include_pattern: String,
    key_custom_field: String,
    mode: JUnitMatch,
    attach_junit_xml: bool,
    include_notes: bool,
}

impl JUnitResultSeeker {
    pub fn new(
        include_pattern: impl Into<String>, key_custom_field: impl Into<String>, mode: JUnitMatch,
    ) -> Self {
        let name = match mode {
            JUnitMatch::CaseName => "JUnit case name",
            JUnitMatch::ClassName => "JUnit class name",
            JUnitMatch::SuiteName => "JUnit suite name",
        };
        Self {
            name: name.to_string(),
            include_pattern: include_pattern.into(),
            key_custom_field: key_custom_field.into(),
            mode,
            attach_junit_xml: false,
            include_notes: false,
        }
    }

    pub fn from_config(config: &JUnitSeekerConfig, mode: JUnitMatch) -> Self {
        Self::new(
            config.include_pattern.clone(),
            config.key_custom_field.clone(),
            mode,
        )
        .with_attach_junit_xml(config.attach_junit_xml)
        .with_include_notes(config.include_notes)
    }

    pub fn with_attach_junit_xml(mut self, attach: bool) -> Self {
        self.attach_junit_xml = attach;
        self
    }

    pub fn with_include_notes(mut self, include: bool) -> Self {
        self.include_notes = include;
        self
    }

    fn notes_for(&self, case: &JUnitCase) -> String {
        let mut notes = format!("JUnit test case {} ({})", case.name, case.class_name);
        if let Some(failure) = case.failure.as_deref().filter(|f| !f.is_empty()) {
            notes.push('\n');
            notes.push_str(failure);
        }
        if !case.system_out.is_empty() {
            notes.push('\n');
            notes.push_str(&case.system_out);
        }
        notes
    }
}

#[async_trait]
impl ResultSeeker for JUnitResultSeeker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn seek(
        &self, test_cases: &mut [TestCaseWrapper], context: &BuildContext,
    ) -> ResultSeekerResult<()> {
        let files = find_files(&self.include_pattern, context)?;

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            let xml = read_file(&file).await?;
            let cases = parse_junit(&xml, &file)?;
            reports.push((file, cases));
        }

        for test_case in test_cases.iter_mut() {
            let keys = test_case.key_custom_field_values(&self.key_custom_field);
            if keys.is_empty() {
                continue;
            }

            let mut statuses = Vec::new();
            for (file, cases) in &reports {
                let matched: Vec<&JUnitCase> = cases
                    .iter()
                    .filter(|case| keys.iter().any(|key| key == case.key(self.mode)))
                    .collect();
                if matched.is_empty() {
                    continue;
                }

                for case in &matched {
                    if let Some(status) = case.status() {
                        statuses.push(status);
                        if self.include_notes {
                            test_case.append_notes(&self.notes_for(case));
                        }
                    }
                }

                if self.attach_junit_xml {
                    let attachment = attachment_from_file(file).await?;
                    add_attachment_once(test_case, &attachment);
                }
            }

            if let Some(status) = aggregate_status(&statuses) {
                tracing::debug!(
                    test_case_id = test_case.id(),
                    %status,
                    results = statuses.len(),
                    "Matched JUnit results"
                );
                test_case.set_execution_status(status);
            }
        }

        Ok(())
    }
}
