//! Ambient logging and metrics shared by every topic-discovery service
//! binary: tracing initialization, a request-logging middleware, and the
//! `GET /metrics` contract stub. Trimmed from the teacher's own, larger
//! `conhub-observability` crate to the pieces these four services need.

mod init;
mod metrics;
mod middleware;

pub use init::init_tracing_for;
pub use metrics::{metrics_handler, Metrics};
pub use middleware::RequestLogging;
