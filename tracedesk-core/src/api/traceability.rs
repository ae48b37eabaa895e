use serde_json::Value;

use super::endpoints::Endpoints;
use crate::error::ApiResult;
use crate::gateway::{decode, Gateway};
use crate::models::TraceabilityMapping;

/// `/traceability`: requirement ↔ test case links
pub struct TraceabilityApi<'a> {
    gateway: &'a Gateway,
    endpoints: &'a Endpoints,
}

impl<'a> TraceabilityApi<'a> {
    pub(super) fn new(gateway: &'a Gateway, endpoints: &'a Endpoints) -> Self {
        Self { gateway, endpoints }
    }

    /// Every mapping the server knows about
    pub fn list(&self) -> ApiResult<Vec<TraceabilityMapping>> {
        decode(self.gateway.get(&self.endpoints.traceability())?)
    }

    pub fn by_requirement(&self, requirement_id: &str) -> ApiResult<Vec<TraceabilityMapping>> {
        decode(
            self.gateway
                .get(&self.endpoints.mappings_by_requirement(requirement_id))?,
        )
    }

    pub fn by_test_case(&self, testcase_id: &str) -> ApiResult<Vec<TraceabilityMapping>> {
        decode(
            self.gateway
                .get(&self.endpoints.mappings_by_test_case(testcase_id))?,
        )
    }

    /// Create a mapping; the returned copy carries the server-assigned id
    pub fn create(&self, mapping: &TraceabilityMapping) -> ApiResult<TraceabilityMapping> {
        mapping.validate()?;
        decode(self.gateway.post(&self.endpoints.traceability(), mapping)?)
    }

    pub fn update(
        &self,
        id: &str,
        mapping: &TraceabilityMapping,
    ) -> ApiResult<TraceabilityMapping> {
        mapping.validate()?;
        decode(self.gateway.put(&self.endpoints.mapping(id), mapping)?)
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.gateway.delete(&self.endpoints.mapping(id))
    }
}
