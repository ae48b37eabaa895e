//! Matrix critique
//!
//! Sends the selected matrix rows to the analysis webhook and turns the
//! findings it returns into display text.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{decode, Gateway};
use crate::models::TraceabilityItem;
use crate::selection::RowSelection;

/// Webhook discriminator for matrix critiques
pub const CRITIQUE_WEBHOOK_TYPE: &str = "critique_traceability_matrix";

/// Text shown when a critique fails
pub const CRITIQUE_FAILED_TEXT: &str = "An error occurred during the critique.";

/// How serious a finding is. Labels outside the usual four are kept,
/// upper-cased, as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
    Critical,
    /// Upper-cased label the service sent
    Other(String),
}

impl FindingSeverity {
    pub fn as_str(&self) -> &str {
        match self {
            FindingSeverity::Low => "LOW",
            FindingSeverity::Medium => "MEDIUM",
            FindingSeverity::High => "HIGH",
            FindingSeverity::Critical => "CRITICAL",
            FindingSeverity::Other(label) => label,
        }
    }
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindingSeverity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for FindingSeverity {
    fn from(value: String) -> Self {
        let label = value.trim().to_ascii_uppercase();
        match label.as_str() {
            "LOW" => FindingSeverity::Low,
            "MEDIUM" => FindingSeverity::Medium,
            "HIGH" => FindingSeverity::High,
            "CRITICAL" => FindingSeverity::Critical,
            _ => FindingSeverity::Other(label),
        }
    }
}

impl From<FindingSeverity> for String {
    fn from(severity: FindingSeverity) -> Self {
        match severity {
            FindingSeverity::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// One issue raised about the submitted rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "finding_severity")]
    pub severity: FindingSeverity,
    #[serde(rename = "finding_description")]
    pub description: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.description)
    }
}

/// `SEVERITY: description`, one finding per line
pub fn format_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull the findings out of a webhook response. They may sit under
/// `results.findings` or at the top level.
pub fn parse_findings(response: Value) -> ApiResult<Vec<Finding>> {
    let findings = match response {
        Value::Object(mut map) => {
            let nested = map
                .get_mut("results")
                .and_then(|r| r.get_mut("findings"))
                .map(Value::take)
                .filter(|f| !f.is_null());
            nested.or_else(|| map.remove("findings").filter(|f| !f.is_null()))
        }
        _ => None,
    };

    match findings {
        Some(findings) => decode(findings),
        None => Err(ApiError::InvalidPayload(
            "critique response has no findings".to_string(),
        )),
    }
}

/// Something that can review matrix rows
pub trait Critic {
    fn critique(&self, rows: &[&TraceabilityItem]) -> ApiResult<Vec<Finding>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CritiqueRequest<'a> {
    webhook_type: &'static str,
    traceability_matrix: &'a [&'a TraceabilityItem],
}

/// Critic backed by the analysis webhook
#[derive(Debug)]
pub struct WebhookCritic<'a> {
    gateway: &'a Gateway,
    url: String,
}

impl<'a> WebhookCritic<'a> {
    pub fn new(gateway: &'a Gateway, url: impl Into<String>) -> Self {
        Self {
            gateway,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Critic for WebhookCritic<'_> {
    fn critique(&self, rows: &[&TraceabilityItem]) -> ApiResult<Vec<Finding>> {
        let request = CritiqueRequest {
            webhook_type: CRITIQUE_WEBHOOK_TYPE,
            traceability_matrix: rows,
        };
        log::info!("Requesting critique of {} rows", rows.len());
        let response = self.gateway.post(&self.url, &request)?;
        parse_findings(response)
    }
}

/// The critique text area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CritiquePanel {
    text: String,
}

impl CritiquePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Critique the selected rows.
    ///
    /// Does nothing when the selection is empty. On success the text holds
    /// the formatted findings; on failure it holds the generic failure
    /// message and the error is returned for the caller to report.
    pub fn run<C: Critic + ?Sized>(
        &mut self,
        critic: &C,
        selection: &RowSelection,
        rows: &[TraceabilityItem],
    ) -> ApiResult<()> {
        if selection.is_empty() {
            return Ok(());
        }

        let selected = selection.selected_rows(rows);
        match critic.critique(&selected) {
            Ok(findings) => {
                self.text = format_findings(&findings);
                Ok(())
            }
            Err(e) => {
                log::error!("Critique failed: {}", e);
                self.text = CRITIQUE_FAILED_TEXT.to_string();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_client;
    use crate::gateway::Method;
    use crate::models::Requirement;
    use serde_json::json;
    use std::cell::RefCell;

    fn rows(ids: &[&str]) -> Vec<TraceabilityItem> {
        ids.iter()
            .map(|id| TraceabilityItem::for_requirement(Requirement::new(*id, "text")))
            .collect()
    }

    /// Records what it was asked to review and returns a canned answer
    struct StubCritic {
        seen: RefCell<Vec<String>>,
        answer: fn() -> ApiResult<Vec<Finding>>,
    }

    impl StubCritic {
        fn new(answer: fn() -> ApiResult<Vec<Finding>>) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                answer,
            }
        }
    }

    impl Critic for StubCritic {
        fn critique(&self, rows: &[&TraceabilityItem]) -> ApiResult<Vec<Finding>> {
            self.seen.borrow_mut().extend(
                rows.iter()
                    .filter_map(|r| r.requirement_id())
                    .map(ToString::to_string),
            );
            (self.answer)()
        }
    }

    #[test]
    fn test_format_findings() {
        let findings = vec![
            Finding {
                severity: FindingSeverity::High,
                description: "REQ-001 has limited test coverage.".into(),
            },
            Finding {
                severity: FindingSeverity::Low,
                description: "TC-001 lacks validation steps.".into(),
            },
        ];
        assert_eq!(
            format_findings(&findings),
            "HIGH: REQ-001 has limited test coverage.\nLOW: TC-001 lacks validation steps."
        );
        assert_eq!(format_findings(&[]), "");
    }

    #[test]
    fn test_parse_nested_and_top_level_findings() {
        let nested = json!({"results": {"findings": [
            {"finding_severity": "medium", "finding_description": "a"}
        ]}});
        let top = json!({"findings": [
            {"finding_severity": "CRITICAL", "finding_description": "b"}
        ]});

        let findings = parse_findings(nested).unwrap();
        assert_eq!(findings[0].severity, FindingSeverity::Medium);
        let findings = parse_findings(top).unwrap();
        assert_eq!(findings[0].to_string(), "CRITICAL: b");
    }

    #[test]
    fn test_parse_keeps_unfamiliar_severities() {
        let response = json!({"findings": [
            {"finding_severity": "HIGH", "finding_description": "R1 has no tests"},
            {"finding_severity": "INFO", "finding_description": "R2 looks fine"},
            {"finding_severity": "warning", "finding_description": "R3 is vague"}
        ]});

        let findings = parse_findings(response).unwrap();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].severity, FindingSeverity::High);
        assert_eq!(findings[1].severity, FindingSeverity::Other("INFO".into()));
        assert_eq!(
            format_findings(&findings),
            "HIGH: R1 has no tests\nINFO: R2 looks fine\nWARNING: R3 is vague"
        );
        assert_eq!(String::from(findings[2].severity.clone()), "WARNING");
    }

    #[test]
    fn test_parse_rejects_missing_or_malformed_findings() {
        assert!(matches!(
            parse_findings(json!({"message": "ok"})),
            Err(ApiError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_findings(json!({"findings": [{"finding_severity": 3, "finding_description": "x"}]})),
            Err(ApiError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_findings(json!({"findings": [{"finding_severity": "LOW"}]})),
            Err(ApiError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_webhook_critic_posts_selected_rows() {
        let (client, transport) = mock_client();
        transport.push_json(
            200,
            json!({"results": {"findings": [
                {"finding_severity": "HIGH", "finding_description": "R2 is untested"}
            ]}}),
        );

        let rows = rows(&["R1", "R2"]);
        let critic = WebhookCritic::new(client.gateway(), "http://hooks.test/call-webhook");
        let findings = critic.critique(&[&rows[1]]).unwrap();
        assert_eq!(findings.len(), 1);

        let req = transport.last_request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://hooks.test/call-webhook");
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["webhookType"], CRITIQUE_WEBHOOK_TYPE);
        assert_eq!(sent["traceabilityMatrix"].as_array().unwrap().len(), 1);
        assert_eq!(sent["traceabilityMatrix"][0]["requirement"]["req_id"], "R2");
        assert!(sent["traceabilityMatrix"][0]["testCases"].is_array());
    }

    #[test]
    fn test_panel_ignores_empty_selection() {
        let critic = StubCritic::new(|| Ok(Vec::new()));
        let mut panel = CritiquePanel::new();

        panel.run(&critic, &RowSelection::new(), &rows(&["R1"])).unwrap();
        assert!(critic.seen.borrow().is_empty());
        assert_eq!(panel.text(), "");
    }

    #[test]
    fn test_panel_shows_findings_for_selection() {
        let critic = StubCritic::new(|| {
            Ok(vec![Finding {
                severity: FindingSeverity::Medium,
                description: "needs more cases".into(),
            }])
        });
        let rows = rows(&["R1", "R2", "R3"]);
        let mut selection = RowSelection::new();
        selection.select_row(&rows, 2, false);
        selection.select_row(&rows, 0, false);

        let mut panel = CritiquePanel::new();
        panel.run(&critic, &selection, &rows).unwrap();
        assert_eq!(*critic.seen.borrow(), vec!["R1", "R3"]);
        assert_eq!(panel.text(), "MEDIUM: needs more cases");
    }

    #[test]
    fn test_panel_failure_text_replaces_previous_result() {
        let rows = rows(&["R1"]);
        let mut selection = RowSelection::new();
        selection.toggle_select_all(&rows);

        let mut panel = CritiquePanel::new();
        let ok = StubCritic::new(|| {
            Ok(vec![Finding {
                severity: FindingSeverity::Low,
                description: "fine".into(),
            }])
        });
        panel.run(&ok, &selection, &rows).unwrap();

        let failing = StubCritic::new(|| Err(ApiError::Transport("connection reset".into())));
        let err = panel.run(&failing, &selection, &rows).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(panel.text(), CRITIQUE_FAILED_TEXT);
    }
}
