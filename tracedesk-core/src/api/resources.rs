use serde_json::Value;

use super::endpoints::Endpoints;
use crate::error::ApiResult;
use crate::gateway::{decode, Gateway};
use crate::models::{Organization, Requirement, TestCase};

/// `/requirements`
pub struct RequirementsApi<'a> {
    gateway: &'a Gateway,
    endpoints: &'a Endpoints,
}

impl<'a> RequirementsApi<'a> {
    pub(super) fn new(gateway: &'a Gateway, endpoints: &'a Endpoints) -> Self {
        Self { gateway, endpoints }
    }

    pub fn list(&self) -> ApiResult<Vec<Requirement>> {
        decode(self.gateway.get(&self.endpoints.requirements())?)
    }

    pub fn list_by_project(&self, project_id: &str) -> ApiResult<Vec<Requirement>> {
        decode(
            self.gateway
                .get(&self.endpoints.requirements_by_project(project_id))?,
        )
    }

    pub fn get(&self, id: &str) -> ApiResult<Requirement> {
        decode(self.gateway.get(&self.endpoints.requirement(id))?)
    }

    pub fn create(&self, requirement: &Requirement) -> ApiResult<Requirement> {
        requirement.validate()?;
        decode(
            self.gateway
                .post(&self.endpoints.requirements(), requirement)?,
        )
    }

    pub fn update(&self, requirement: &Requirement) -> ApiResult<Requirement> {
        requirement.validate()?;
        decode(self.gateway.put(
            &self.endpoints.requirement(requirement.server_id()),
            requirement,
        )?)
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.gateway.delete(&self.endpoints.requirement(id))
    }
}

/// `/organizations/test-cases`
pub struct TestCasesApi<'a> {
    gateway: &'a Gateway,
    endpoints: &'a Endpoints,
}

impl<'a> TestCasesApi<'a> {
    pub(super) fn new(gateway: &'a Gateway, endpoints: &'a Endpoints) -> Self {
        Self { gateway, endpoints }
    }

    pub fn list_by_project(&self, project_id: &str) -> ApiResult<Vec<TestCase>> {
        decode(
            self.gateway
                .get(&self.endpoints.test_cases_by_project(project_id))?,
        )
    }

    pub fn get(&self, id: &str) -> ApiResult<TestCase> {
        decode(self.gateway.get(&self.endpoints.test_case(id))?)
    }

    pub fn create(&self, test_case: &TestCase) -> ApiResult<TestCase> {
        test_case.validate()?;
        decode(self.gateway.post(&self.endpoints.test_cases(), test_case)?)
    }

    pub fn update(&self, test_case: &TestCase) -> ApiResult<TestCase> {
        test_case.validate()?;
        decode(
            self.gateway
                .put(&self.endpoints.test_case(&test_case.test_id), test_case)?,
        )
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.gateway.delete(&self.endpoints.test_case(id))
    }
}

/// `/organizations`
pub struct OrganizationsApi<'a> {
    gateway: &'a Gateway,
    endpoints: &'a Endpoints,
}

impl<'a> OrganizationsApi<'a> {
    pub(super) fn new(gateway: &'a Gateway, endpoints: &'a Endpoints) -> Self {
        Self { gateway, endpoints }
    }

    pub fn list(&self) -> ApiResult<Vec<Organization>> {
        decode(self.gateway.get(&self.endpoints.organizations())?)
    }

    pub fn get(&self, id: &str) -> ApiResult<Organization> {
        decode(self.gateway.get(&self.endpoints.organization(id))?)
    }

    pub fn create(&self, organization: &Organization) -> ApiResult<Organization> {
        organization.validate()?;
        decode(
            self.gateway
                .post(&self.endpoints.organizations(), organization)?,
        )
    }

    pub fn update(&self, id: &str, organization: &Organization) -> ApiResult<Organization> {
        organization.validate()?;
        decode(
            self.gateway
                .put(&self.endpoints.organization(id), organization)?,
        )
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.gateway.delete(&self.endpoints.organization(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{mock_client, BASE};
    use crate::error::ApiError;
    use crate::gateway::Method;
    use crate::models::{Organization, Requirement, TestCase};
    use serde_json::json;

    #[test]
    fn test_list_requirements() {
        let (client, transport) = mock_client();
        transport.push_json(
            200,
            json!([{"id": "R1", "content": "a"}, {"req_id": "R2", "content": "b"}]),
        );

        let reqs = client.requirements().list().unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1].req_id, "R2");
        assert_eq!(transport.last_request().url, format!("{}/requirements", BASE));
    }

    #[test]
    fn test_list_rejects_non_list_body() {
        let (client, transport) = mock_client();
        transport.push_json(200, json!({"message": "ok"}));

        let err = client.requirements().list().unwrap_err();
        assert!(matches!(err, ApiError::InvalidPayload(_)));
    }

    #[test]
    fn test_create_requirement_validates_first() {
        let (client, transport) = mock_client();

        let err = client
            .requirements()
            .create(&Requirement::new("REQ-001", ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_update_requirement_uses_server_id() {
        let (client, transport) = mock_client();
        transport.push_json(200, json!({"id": "uuid-1", "req_id": "REQ-001", "content": "b"}));

        let mut req = Requirement::new("REQ-001", "b");
        req.id = Some("uuid-1".into());
        client.requirements().update(&req).unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Put);
        assert_eq!(sent.url, format!("{}/requirements/uuid-1", BASE));
    }

    #[test]
    fn test_test_cases_by_project() {
        let (client, transport) = mock_client();
        transport.push_json(
            200,
            json!([{"id": "TC-1", "description": "d", "steps": "one\ntwo"}]),
        );

        let cases = client.test_cases().list_by_project("p1").unwrap();
        assert_eq!(cases[0].steps, vec!["one", "two"]);
        assert_eq!(
            transport.last_request().url,
            format!("{}/organizations/test-cases/project/p1", BASE)
        );
    }

    #[test]
    fn test_create_test_case_returns_server_copy() {
        let (client, transport) = mock_client();
        transport.push_json(201, json!({"id": "srv-9", "description": "Login works"}));

        let created = client
            .test_cases()
            .create(&TestCase::new("", "Login works"))
            .unwrap();
        assert_eq!(created.test_id, "srv-9");
        assert_eq!(transport.last_request().method, Method::Post);
    }

    #[test]
    fn test_delete_organization() {
        let (client, transport) = mock_client();
        transport.push_text(200, "Organization deleted");

        let body = client.organizations().delete("org-1").unwrap();
        assert_eq!(body["message"], "Organization deleted");
        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Delete);
        assert_eq!(sent.url, format!("{}/organizations/org-1", BASE));
    }

    #[test]
    fn test_create_organization_requires_name() {
        let (client, _transport) = mock_client();
        let err = client
            .organizations()
            .create(&Organization::new("", "desc"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
