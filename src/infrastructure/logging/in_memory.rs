use crate::core::errors::CofundError;
use crate::core::models::audit::{AppLog, AuditQuery};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    entries: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn append(&self, entry: AppLog) -> Result<(), CofundError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AppLog>, CofundError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| query.matches(e)).cloned().collect())
    }
}
