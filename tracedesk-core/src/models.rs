use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ApiError, ApiResult};

/// A single requirement as served by the API
///
/// The wire form carries a display id (`req_id`, e.g. "REQ-001"), a server
/// id (`id`, usually a UUID), or both. Whichever is present identifies the
/// requirement; when both are present `req_id` is the one shown and
/// selected on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RequirementWire")]
pub struct Requirement {
    /// Identifier shown in the matrix and used for selection
    pub req_id: String,

    /// Server-assigned identifier, when different from `req_id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The requirement text
    pub content: String,

    /// Free-form classification, e.g. "Functional" or "Security"
    pub classification: String,

    /// Module / domain the requirement belongs to
    pub module: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct RequirementWire {
    #[serde(default)]
    req_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    classification: String,
    #[serde(default)]
    module: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl TryFrom<RequirementWire> for Requirement {
    type Error = String;

    fn try_from(wire: RequirementWire) -> Result<Self, Self::Error> {
        let (req_id, id) = match (wire.req_id, wire.id) {
            (Some(req_id), id) if !req_id.is_empty() => (req_id, id.filter(|i| !i.is_empty())),
            (_, Some(id)) if !id.is_empty() => (id, None),
            _ => return Err("requirement has neither `req_id` nor `id`".to_string()),
        };
        Ok(Self {
            req_id,
            id,
            content: wire.content,
            classification: wire.classification,
            module: wire.module,
            description: wire.description,
            priority: wire.priority,
            status: wire.status,
        })
    }
}

impl Requirement {
    /// Creates a new requirement with the given display id and text
    pub fn new(req_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            req_id: req_id.into(),
            id: None,
            content: content.into(),
            classification: String::new(),
            module: String::new(),
            description: None,
            priority: None,
            status: None,
        }
    }

    /// Identifier to use in resource URLs
    pub fn server_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.req_id)
    }

    /// True if `id` names this requirement by either identifier
    pub fn matches_id(&self, id: &str) -> bool {
        self.req_id == id || self.id.as_deref() == Some(id)
    }

    /// Required-field check run before a create call
    pub fn validate(&self) -> ApiResult<()> {
        require("requirement id", &self.req_id)?;
        require("content", &self.content)
    }
}

/// Execution status of a test case
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseStatus {
    #[serde(alias = "not-run")]
    NotRun,
    Passed,
    Failed,
    Blocked,
}

impl fmt::Display for TestCaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCaseStatus::NotRun => write!(f, "Not Run"),
            TestCaseStatus::Passed => write!(f, "Passed"),
            TestCaseStatus::Failed => write!(f, "Failed"),
            TestCaseStatus::Blocked => write!(f, "Blocked"),
        }
    }
}

/// A test case / test specification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "TestCaseWire")]
pub struct TestCase {
    /// Unique test identifier, normally assigned by the server
    pub test_id: String,
    pub description: String,
    pub preconditions: String,
    /// Steps in execution order
    pub steps: Vec<String>,
    /// Expected outcomes in order
    pub expected_outcome: Vec<String>,
    pub classification: String,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TestCaseStatus>,
}

/// Steps and outcomes arrive either as a list or as one delimited string
#[derive(Deserialize)]
#[serde(untagged)]
enum LinesOrText {
    Lines(Vec<String>),
    Text(String),
}

impl Default for LinesOrText {
    fn default() -> Self {
        LinesOrText::Lines(Vec::new())
    }
}

impl LinesOrText {
    fn into_lines(self) -> Vec<String> {
        match self {
            LinesOrText::Lines(lines) => lines,
            LinesOrText::Text(text) => split_lines(&text),
        }
    }
}

#[derive(Deserialize)]
struct TestCaseWire {
    #[serde(default)]
    test_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    preconditions: Option<String>,
    #[serde(default)]
    steps: Option<LinesOrText>,
    #[serde(default, alias = "expectedOutcome")]
    expected_outcome: Option<LinesOrText>,
    #[serde(default)]
    classification: String,
    #[serde(default)]
    module: String,
    #[serde(default)]
    status: Option<TestCaseStatus>,
}

impl TryFrom<TestCaseWire> for TestCase {
    type Error = String;

    fn try_from(wire: TestCaseWire) -> Result<Self, Self::Error> {
        let test_id = wire
            .test_id
            .filter(|t| !t.is_empty())
            .or(wire.id.filter(|i| !i.is_empty()))
            .ok_or_else(|| "test case has neither `test_id` nor `id`".to_string())?;
        Ok(Self {
            test_id,
            description: wire.description,
            preconditions: wire.preconditions.unwrap_or_default(),
            steps: wire.steps.unwrap_or_default().into_lines(),
            expected_outcome: wire.expected_outcome.unwrap_or_default().into_lines(),
            classification: wire.classification,
            module: wire.module,
            status: wire.status,
        })
    }
}

impl TestCase {
    pub fn new(test_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            description: description.into(),
            preconditions: String::new(),
            steps: Vec::new(),
            expected_outcome: Vec::new(),
            classification: String::new(),
            module: String::new(),
            status: None,
        }
    }

    /// Required-field check run before a create call
    pub fn validate(&self) -> ApiResult<()> {
        require("description", &self.description)
    }
}

/// Split a delimited block into trimmed, non-empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Progress of a remediation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    Pending,
    InProgress,
    Completed,
    NotRequired,
}

impl fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationStatus::Pending => write!(f, "Pending"),
            RemediationStatus::InProgress => write!(f, "In Progress"),
            RemediationStatus::Completed => write!(f, "Completed"),
            RemediationStatus::NotRequired => write!(f, "Not Required"),
        }
    }
}

/// How serious the gap behind a remediation is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RemediationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RemediationSeverity {
    /// One-letter badge used in compact tables
    pub fn badge(&self) -> &'static str {
        match self {
            RemediationSeverity::Low => "L",
            RemediationSeverity::Medium => "M",
            RemediationSeverity::High => "H",
            RemediationSeverity::Critical => "C",
        }
    }
}

impl fmt::Display for RemediationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationSeverity::Low => write!(f, "Low"),
            RemediationSeverity::Medium => write!(f, "Medium"),
            RemediationSeverity::High => write!(f, "High"),
            RemediationSeverity::Critical => write!(f, "Critical"),
        }
    }
}

/// Follow-up work recorded against a requirement (legacy row field)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remediation {
    pub id: String,
    pub req_id: String,
    pub description: String,
    pub status: RemediationStatus,
    pub severity: RemediationSeverity,
    #[serde(rename = "assignedTo", default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(rename = "dueDate", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Remediation {
    pub fn new(
        id: impl Into<String>,
        req_id: impl Into<String>,
        description: impl Into<String>,
        severity: RemediationSeverity,
    ) -> Self {
        Self {
            id: id.into(),
            req_id: req_id.into(),
            description: description.into(),
            status: RemediationStatus::Pending,
            severity,
            assigned_to: None,
            due_date: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Link stating that a test case verifies a requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub requirement_id: String,
    pub testcase_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TraceabilityMapping {
    pub fn new(
        requirement_id: impl Into<String>,
        testcase_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            requirement_id: requirement_id.into(),
            testcase_id: testcase_id.into(),
            description: description.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Both ends of the link must be named before it is sent
    pub fn validate(&self) -> ApiResult<()> {
        require("requirement id", &self.requirement_id)?;
        require("test case id", &self.testcase_id)
    }
}

/// One row of the traceability matrix
///
/// Derived from the requirement list on every refresh; never persisted.
/// A row without a requirement is an orphan and cannot be selected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TraceabilityItem {
    pub requirement: Option<Requirement>,
    #[serde(rename = "testCases", default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
}

impl TraceabilityItem {
    /// A row for a freshly fetched requirement, with no test cases yet
    pub fn for_requirement(requirement: Requirement) -> Self {
        Self {
            requirement: Some(requirement),
            test_cases: Vec::new(),
            remediation: None,
        }
    }

    /// The display id of the row's requirement, if it has one
    pub fn requirement_id(&self) -> Option<&str> {
        self.requirement.as_ref().map(|r| r.req_id.as_str())
    }

    pub fn is_orphan(&self) -> bool {
        self.requirement.is_none()
    }
}

/// An organization account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
}

impl Organization {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            admin_email: None,
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        require("organization name", &self.name)
    }
}

/// Credentials posted to the login endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login: a bearer token and the signed-in user
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// New account details posted to the register endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> ApiResult<()> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

/// The current user as described by the server. Fields the client does not
/// know about are kept in `extra` for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
