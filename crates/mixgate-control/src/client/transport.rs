//! Pluggable transports for the three policy calls.
//!
//! The wire protocol lives behind these traits. A transport error is returned
//! as a [`Status`] so the client can apply its unavailable-handling rules.

use std::time::Duration;

use async_trait::async_trait;

use mixgate_core::{Attributes, ReferencedAttributes, Status};

#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default)]
pub struct CheckResponse {
    /// Outcome of the precondition evaluation on the server.
    pub precondition: Status,
    pub valid_duration: Duration,
    pub valid_use_count: i32,
    /// Attributes the server looked at, for the response cache.
    pub referenced: ReferencedAttributes,
}

#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub attributes: Vec<Attributes>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportResponse;

#[derive(Debug, Clone, Default)]
pub struct QuotaRequest {
    /// Everything except the extracted quota keys.
    pub attributes: Attributes,
    pub quota: String,
    pub amount: i64,
    pub deduplication_id: String,
    pub best_effort: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QuotaResponse {
    pub granted_amount: i64,
    pub valid_duration: Duration,
}

#[async_trait]
pub trait CheckTransport: Send + Sync {
    async fn check(&self, request: CheckRequest) -> Result<CheckResponse, Status>;
}

#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn report(&self, request: ReportRequest) -> Result<ReportResponse, Status>;
}

#[async_trait]
pub trait QuotaTransport: Send + Sync {
    async fn quota(&self, request: QuotaRequest) -> Result<QuotaResponse, Status>;
}
