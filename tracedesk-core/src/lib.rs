pub mod api;
pub mod config;
pub mod coverage;
pub mod critique;
pub mod error;
pub mod export;
pub mod gateway;
pub mod matrix;
pub mod models;
pub mod selection;
pub mod session;
pub mod storage;
pub mod theme;

// Re-export commonly used types
pub use api::{
    ApiClient, AuthApi, Endpoints, OrganizationsApi, RequirementsApi, TestCasesApi,
    TraceabilityApi,
};
pub use config::{get_state_path, ClientConfig, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS};
pub use coverage::{needle_angle, CoverageBand, CoverageStats};
pub use critique::{
    format_findings, Critic, CritiquePanel, Finding, FindingSeverity, WebhookCritic,
    CRITIQUE_FAILED_TEXT,
};
pub use error::{ApiError, ApiResult};
pub use gateway::{Gateway, Transport};
pub use matrix::{MatrixAction, MatrixSource, MatrixState, MatrixStore, RefreshTicket};
pub use models::{
    LoginRequest,
    LoginResponse,
    Organization,
    RegisterRequest,
    Remediation,
    RemediationSeverity,
    RemediationStatus,
    Requirement,
    TestCase,
    TestCaseStatus,
    // Matrix row and link types
    TraceabilityItem,
    TraceabilityMapping,
    UserProfile,
};
pub use selection::RowSelection;
pub use session::{Session, SessionHandle, USER_ROLE};
pub use storage::{LocalState, StateStorage};
pub use theme::Theme;
