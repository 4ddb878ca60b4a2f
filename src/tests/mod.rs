mod concurrency_tests;
mod engine_tests;
mod group_tests;
mod user_tests;

use crate::core::models::{group::Group, payout::PayoutRequest, user::User};
use crate::core::payouts::PayoutPolicy;
use crate::core::services::{CofundService, ServiceSettings};
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use rust_decimal::Decimal;
use std::time::Duration;

pub type TestService = CofundService<InMemoryLogging, InMemoryStorage, InMemoryCache>;

pub fn test_settings(payout_policy: PayoutPolicy) -> ServiceSettings {
    ServiceSettings {
        jwt_secret: "test-secret".to_string(),
        token_ttl: chrono::Duration::hours(1),
        bcrypt_cost: 4,
        balance_cache_ttl: Duration::from_secs(300),
        payout_policy,
    }
}

pub fn create_test_service() -> TestService {
    create_test_service_with(PayoutPolicy::default())
}

pub fn create_test_service_with(policy: PayoutPolicy) -> TestService {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let cache = InMemoryCache::new();
    CofundService::new(storage, logging, cache, test_settings(policy))
}

pub async fn add_test_user(service: &TestService, id: &str) -> User {
    service
        .add_user(
            User {
                id: id.to_string(),
                name: format!("User {}", id),
                email: format!("{}@example.com", id),
                password: "password123".to_string(),
            },
            None,
        )
        .await
        .unwrap()
}

/// Creates the leader and members as users and a group the leader leads.
pub async fn co_guaranteed_group(service: &TestService, leader_id: &str, member_ids: &[&str]) -> (User, Vec<User>, Group) {
    let leader = add_test_user(service, leader_id).await;
    let mut members = Vec::new();
    for id in member_ids {
        members.push(add_test_user(service, id).await);
    }
    let group = service
        .create_group(format!("{} guarantors", leader_id), members.clone(), &leader)
        .await
        .unwrap();
    (leader, members, group)
}

pub async fn request_test_payout(service: &TestService, leader: &User, amount: i64, quorum: Option<usize>) -> PayoutRequest {
    service
        .request_payout("project-1", &leader.id, Decimal::new(amount, 0), quorum, leader)
        .await
        .unwrap()
}
