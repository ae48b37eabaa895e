//! URL construction for every resource the client talks to

use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: &str) -> ApiResult<Self> {
        let url = Url::parse(base)
            .map_err(|e| ApiError::Validation(format!("invalid server URL '{}': {}", base, e)))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "server URL '{}' cannot take a path",
                base
            )));
        }
        Ok(Self { base: url })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(&config.server_url)
    }

    pub fn base(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Base URL with `segments` appended, each one percent-encoded
    fn join(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        // Only fails for cannot-be-a-base URLs, which `new` rejects
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    // Requirements

    pub fn requirements(&self) -> String {
        self.join(&["requirements"])
    }

    pub fn requirement(&self, id: &str) -> String {
        self.join(&["requirements", id])
    }

    pub fn requirements_by_project(&self, project_id: &str) -> String {
        self.join(&["requirements", "projects", project_id])
    }

    // Auth

    pub fn register(&self) -> String {
        self.join(&["auth", "register"])
    }

    pub fn login(&self) -> String {
        self.join(&["auth", "login"])
    }

    pub fn me(&self) -> String {
        self.join(&["auth", "me"])
    }

    // Organizations

    pub fn organizations(&self) -> String {
        self.join(&["organizations"])
    }

    pub fn organization(&self, id: &str) -> String {
        self.join(&["organizations", id])
    }

    // Traceability mappings

    pub fn traceability(&self) -> String {
        self.join(&["traceability"])
    }

    pub fn mapping(&self, id: &str) -> String {
        self.join(&["traceability", id])
    }

    pub fn mappings_by_requirement(&self, requirement_id: &str) -> String {
        self.join(&["traceability", "requirements", requirement_id])
    }

    pub fn mappings_by_test_case(&self, testcase_id: &str) -> String {
        self.join(&["traceability", "testcases", testcase_id])
    }

    // Test cases (served under organizations)

    pub fn test_cases(&self) -> String {
        self.join(&["organizations", "test-cases"])
    }

    pub fn test_cases_by_project(&self, project_id: &str) -> String {
        self.join(&["organizations", "test-cases", "project", project_id])
    }

    pub fn test_case(&self, id: &str) -> String {
        self.join(&["organizations", "test-cases", id])
    }
}
