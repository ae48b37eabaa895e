//! Matrix state and the closed set of transitions over it

use crate::models::{Remediation, TestCase, TraceabilityItem, TraceabilityMapping};

/// Everything the matrix view renders from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixState {
    /// One row per requirement, in the order the server returned them
    pub rows: Vec<TraceabilityItem>,
    /// Explicit requirement ↔ test case links, kept independently of `rows`
    pub mappings: Vec<TraceabilityMapping>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Every way the matrix state can change
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixAction {
    /// Replace the rows outright
    SetMatrix(Vec<TraceabilityItem>),
    FetchStart,
    FetchSuccess(Vec<TraceabilityItem>),
    FetchError(String),
    AddTestCase {
        requirement_id: String,
        test_case: TestCase,
    },
    DeleteTestCase {
        requirement_id: String,
        test_case_id: String,
    },
    AddRemediation {
        requirement_id: String,
        remediation: Remediation,
    },
    UpdateRemediation {
        requirement_id: String,
        remediation: Remediation,
    },
    DeleteRequirement {
        requirement_id: String,
    },
    FetchMappingsSuccess(Vec<TraceabilityMapping>),
    AddMapping(TraceabilityMapping),
    RemoveMapping(String),
}

impl MatrixState {
    /// Apply one action. Actions naming a requirement that has no row are
    /// no-ops.
    pub fn apply(&mut self, action: MatrixAction) {
        match action {
            MatrixAction::SetMatrix(rows) | MatrixAction::FetchSuccess(rows) => {
                self.rows = rows;
                self.is_loading = false;
                self.error = None;
            }
            MatrixAction::FetchStart => {
                self.is_loading = true;
            }
            MatrixAction::FetchError(message) => {
                self.is_loading = false;
                self.error = Some(message);
            }
            MatrixAction::AddTestCase {
                requirement_id,
                test_case,
            } => {
                if let Some(row) = self.row_mut(&requirement_id) {
                    row.test_cases.push(test_case);
                }
            }
            MatrixAction::DeleteTestCase {
                requirement_id,
                test_case_id,
            } => {
                if let Some(row) = self.row_mut(&requirement_id) {
                    row.test_cases.retain(|tc| tc.test_id != test_case_id);
                }
            }
            MatrixAction::AddRemediation {
                requirement_id,
                remediation,
            }
            | MatrixAction::UpdateRemediation {
                requirement_id,
                remediation,
            } => {
                if let Some(row) = self.row_mut(&requirement_id) {
                    row.remediation = Some(remediation);
                }
            }
            MatrixAction::DeleteRequirement { requirement_id } => {
                self.rows.retain(|row| {
                    !row.requirement
                        .as_ref()
                        .is_some_and(|r| r.matches_id(&requirement_id))
                });
            }
            MatrixAction::FetchMappingsSuccess(mappings) => {
                self.mappings = mappings;
            }
            MatrixAction::AddMapping(mapping) => {
                self.mappings.push(mapping);
            }
            MatrixAction::RemoveMapping(id) => {
                self.mappings.retain(|m| m.id.as_deref() != Some(id.as_str()));
            }
        }
    }

    /// The row whose requirement is named by `requirement_id`
    pub fn row(&self, requirement_id: &str) -> Option<&TraceabilityItem> {
        self.rows.iter().find(|row| {
            row.requirement
                .as_ref()
                .is_some_and(|r| r.matches_id(requirement_id))
        })
    }

    fn row_mut(&mut self, requirement_id: &str) -> Option<&mut TraceabilityItem> {
        self.rows.iter_mut().find(|row| {
            row.requirement
                .as_ref()
                .is_some_and(|r| r.matches_id(requirement_id))
        })
    }
}
