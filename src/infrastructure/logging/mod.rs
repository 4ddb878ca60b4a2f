pub mod in_memory;

use crate::core::errors::CofundError;
use crate::core::models::audit::{AppLog, AuditQuery};
use async_trait::async_trait;

/// Append-only application audit trail, served back over the API. Separate
/// from `tracing` output.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn append(&self, entry: AppLog) -> Result<(), CofundError>;
    /// Matching entries, oldest first.
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AppLog>, CofundError>;
}
