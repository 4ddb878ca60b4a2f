pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::CofundError;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_balance(&self, account_id: &str) -> Result<Option<Decimal>, CofundError>;
    async fn save_balance(
        &self,
        account_id: &str,
        balance: Decimal,
        ttl: std::time::Duration,
    ) -> Result<(), CofundError>;
    async fn invalidate_balance(&self, account_id: &str) -> Result<(), CofundError>;
}
