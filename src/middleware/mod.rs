pub mod auth;
pub mod request_metrics;
pub mod security_headers;

pub use auth::{AuthMiddleware, Claims};
pub use request_metrics::RequestTiming;
pub use security_headers::SecurityHeaders;
