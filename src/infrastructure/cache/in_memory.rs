use crate::core::errors::CofundError;
use crate::infrastructure::cache::{Cache, cache_keys::balance_key};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryCache {
    cache: Arc<RwLock<HashMap<String, (Decimal, DateTime<Utc>)>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_balance(&self, account_id: &str) -> Result<Option<Decimal>, CofundError> {
        let cache = self.cache.read().await;
        let now = Utc::now();
        Ok(cache
            .get(&balance_key(account_id))
            .filter(|(_, expiry)| *expiry > now)
            .map(|(balance, _)| *balance))
    }

    async fn save_balance(
        &self,
        account_id: &str,
        balance: Decimal,
        ttl: std::time::Duration,
    ) -> Result<(), CofundError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CofundError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        let mut cache = self.cache.write().await;
        let now = Utc::now();
        cache.retain(|_, (_, expiry)| *expiry > now);
        cache.insert(balance_key(account_id), (balance, now + ttl));
        Ok(())
    }

    async fn invalidate_balance(&self, account_id: &str) -> Result<(), CofundError> {
        let mut cache = self.cache.write().await;
        cache.remove(&balance_key(account_id));
        Ok(())
    }
}
