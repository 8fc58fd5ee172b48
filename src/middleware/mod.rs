pub mod auth;
pub mod json;
pub mod metrics;
pub mod response;

pub use auth::{jwt_auth, require_role, AuthUser};
pub use json::JsonBody;
pub use metrics::{log_requests, MetricsSink, MetricsSnapshot, RequestMetrics};
pub use response::{ApiResponse, ApiResult};
