//! The matrix state container: the only owner of the row and mapping lists

use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{Remediation, Requirement, TestCase, TraceabilityItem, TraceabilityMapping};

use super::state::{MatrixAction, MatrixState};

/// Where the matrix gets its remote data
///
/// [`ApiClient`] is the production implementation; anything else that can
/// list requirements and manage mappings can stand in for it.
pub trait MatrixSource {
    fn fetch_requirements(&self) -> ApiResult<Vec<Requirement>>;

    fn fetch_mappings(&self) -> ApiResult<Vec<TraceabilityMapping>>;

    /// Persist a mapping and return the server's copy (with its id)
    fn create_mapping(&self, mapping: &TraceabilityMapping) -> ApiResult<TraceabilityMapping>;

    fn delete_mapping(&self, id: &str) -> ApiResult<()>;
}

impl MatrixSource for ApiClient {
    fn fetch_requirements(&self) -> ApiResult<Vec<Requirement>> {
        self.requirements().list()
    }

    fn fetch_mappings(&self) -> ApiResult<Vec<TraceabilityMapping>> {
        self.traceability().list()
    }

    fn create_mapping(&self, mapping: &TraceabilityMapping) -> ApiResult<TraceabilityMapping> {
        self.traceability().create(mapping)
    }

    fn delete_mapping(&self, id: &str) -> ApiResult<()> {
        self.traceability().delete(id).map(|_| ())
    }
}

impl<T: MatrixSource + ?Sized> MatrixSource for &T {
    fn fetch_requirements(&self) -> ApiResult<Vec<Requirement>> {
        (**self).fetch_requirements()
    }

    fn fetch_mappings(&self) -> ApiResult<Vec<TraceabilityMapping>> {
        (**self).fetch_mappings()
    }

    fn create_mapping(&self, mapping: &TraceabilityMapping) -> ApiResult<TraceabilityMapping> {
        (**self).create_mapping(mapping)
    }

    fn delete_mapping(&self, id: &str) -> ApiResult<()> {
        (**self).delete_mapping(id)
    }
}

/// Identifies one refresh. Only the most recently issued ticket may write
/// its result into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

pub struct MatrixStore<S> {
    source: S,
    state: MatrixState,
    latest_ticket: u64,
}

impl<S: MatrixSource> MatrixStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: MatrixState::default(),
            latest_ticket: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &MatrixState {
        &self.state
    }

    pub fn rows(&self) -> &[TraceabilityItem] {
        &self.state.rows
    }

    pub fn mappings(&self) -> &[TraceabilityMapping] {
        &self.state.mappings
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    fn dispatch(&mut self, action: MatrixAction) {
        self.state.apply(action);
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Mark the matrix as loading and issue a ticket for the fetch that
    /// follows. Any ticket issued earlier becomes stale.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest_ticket += 1;
        self.dispatch(MatrixAction::FetchStart);
        RefreshTicket(self.latest_ticket)
    }

    /// Apply the outcome of a fetch started with `ticket`.
    ///
    /// Returns `Ok(true)` when the rows were replaced, `Ok(false)` when the
    /// ticket was stale and the outcome was dropped, and the fetch error when
    /// it was recorded in the state.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: ApiResult<Vec<Requirement>>,
    ) -> ApiResult<bool> {
        if ticket.0 != self.latest_ticket {
            log::debug!(
                "Dropping stale refresh {} (latest is {})",
                ticket.0,
                self.latest_ticket
            );
            return Ok(false);
        }

        match result {
            Ok(requirements) => {
                // Test cases are not joined server-side yet, so every row
                // starts empty.
                let rows = requirements
                    .into_iter()
                    .map(TraceabilityItem::for_requirement)
                    .collect::<Vec<_>>();
                log::debug!("Matrix refreshed with {} rows", rows.len());
                self.dispatch(MatrixAction::FetchSuccess(rows));
                Ok(true)
            }
            Err(e) => {
                log::error!("Error fetching matrix: {}", e);
                self.dispatch(MatrixAction::FetchError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Rebuild every row from the requirement list. No retry on failure.
    pub fn refresh(&mut self) -> ApiResult<()> {
        let ticket = self.begin_refresh();
        let result = self.source.fetch_requirements();
        self.complete_refresh(ticket, result).map(|_| ())
    }

    // =========================================================================
    // Mappings (round-trip through the source)
    // =========================================================================

    /// Replace the mapping list. On failure the error is logged and the
    /// previous list is kept; row state is never touched.
    pub fn fetch_mappings(&mut self) -> ApiResult<()> {
        match self.source.fetch_mappings() {
            Ok(mappings) => {
                self.dispatch(MatrixAction::FetchMappingsSuccess(mappings));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to fetch traceability mappings: {}", e);
                Err(e)
            }
        }
    }

    /// Create a mapping and append the server's copy
    pub fn create_mapping(&mut self, mapping: &TraceabilityMapping) -> ApiResult<TraceabilityMapping> {
        mapping.validate()?;
        let created = self.source.create_mapping(mapping)?;
        self.dispatch(MatrixAction::AddMapping(created.clone()));
        Ok(created)
    }

    /// Delete a mapping, then drop it from the list
    pub fn delete_mapping(&mut self, id: &str) -> ApiResult<()> {
        self.source.delete_mapping(id)?;
        self.dispatch(MatrixAction::RemoveMapping(id.to_string()));
        Ok(())
    }

    // =========================================================================
    // Local-only row edits
    // =========================================================================

    pub fn add_test_case(&mut self, requirement_id: &str, test_case: TestCase) {
        self.dispatch(MatrixAction::AddTestCase {
            requirement_id: requirement_id.to_string(),
            test_case,
        });
    }

    pub fn delete_test_case(&mut self, requirement_id: &str, test_case_id: &str) {
        self.dispatch(MatrixAction::DeleteTestCase {
            requirement_id: requirement_id.to_string(),
            test_case_id: test_case_id.to_string(),
        });
    }

    pub fn add_remediation(&mut self, requirement_id: &str, remediation: Remediation) {
        self.dispatch(MatrixAction::AddRemediation {
            requirement_id: requirement_id.to_string(),
            remediation,
        });
    }

    pub fn update_remediation(&mut self, requirement_id: &str, remediation: Remediation) {
        self.dispatch(MatrixAction::UpdateRemediation {
            requirement_id: requirement_id.to_string(),
            remediation,
        });
    }

    pub fn delete_requirement(&mut self, requirement_id: &str) {
        self.dispatch(MatrixAction::DeleteRequirement {
            requirement_id: requirement_id.to_string(),
        });
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn row_for_requirement(&self, requirement_id: &str) -> Option<&TraceabilityItem> {
        self.state.row(requirement_id)
    }

    /// Mappings that point at the requirement, by either of its ids
    pub fn mappings_for_requirement(&self, requirement_id: &str) -> Vec<&TraceabilityMapping> {
        let requirement = self
            .row_for_requirement(requirement_id)
            .and_then(|row| row.requirement.as_ref());
        self.state
            .mappings
            .iter()
            .filter(|m| match requirement {
                Some(req) => req.matches_id(&m.requirement_id),
                None => m.requirement_id == requirement_id,
            })
            .collect()
    }
}
