use crate::core::errors::CofundError;
use crate::core::models::{
    group::{Group, GroupMember, Role},
    payout::{ApprovalOutcome, ApprovalResult, PayoutRequest, PayoutState, RejectionResult},
    user::User,
};
use crate::core::payouts::{PayoutEngine, PayoutPolicy};
use crate::infrastructure::storage::{LedgerStore, PayoutStore, Storage, in_memory::InMemoryStorage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Delegates to the in-memory store but can be told to fail every commit.
#[derive(Clone)]
struct FaultyPayoutStore {
    inner: InMemoryStorage,
    failing: Arc<AtomicBool>,
}

impl FaultyPayoutStore {
    fn check(&self) -> Result<(), CofundError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CofundError::StorageError("injected commit failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PayoutStore for FaultyPayoutStore {
    async fn insert_payout(&self, payout: PayoutRequest) -> Result<(), CofundError> {
        self.inner.insert_payout(payout).await
    }

    async fn get_payout(&self, payout_id: &str) -> Result<Option<PayoutRequest>, CofundError> {
        self.inner.get_payout(payout_id).await
    }

    async fn pending_payouts_for(&self, recipient_ids: &HashSet<String>) -> Result<Vec<PayoutRequest>, CofundError> {
        self.inner.pending_payouts_for(recipient_ids).await
    }

    async fn commit_approval(
        &self,
        payout_id: &str,
        approver_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ApprovalResult, CofundError> {
        self.check()?;
        self.inner.commit_approval(payout_id, approver_id, now).await
    }

    async fn commit_rejection(
        &self,
        payout_id: &str,
        rejected_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RejectionResult, CofundError> {
        self.check()?;
        self.inner.commit_rejection(payout_id, rejected_by, reason, now).await
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<PayoutRequest>, CofundError> {
        self.check()?;
        self.inner.expire_due(now).await
    }
}

fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: id.to_string(),
        email: format!("{}@example.com", id),
        password: String::new(),
    }
}

async fn seed_group(storage: &InMemoryStorage, leader_id: &str, member_ids: &[&str]) {
    let mut members = vec![GroupMember {
        user: storage.create_user(user(leader_id)).await.unwrap(),
        role: Role::Leader,
    }];
    for id in member_ids {
        members.push(GroupMember {
            user: storage.create_user(user(id)).await.unwrap(),
            role: Role::Member,
        });
    }
    storage
        .save_group(Group {
            id: format!("{}-group", leader_id),
            name: "Circle".to_string(),
            members,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_commit_leaves_request_untouched_and_retry_finalizes() {
    let storage = InMemoryStorage::new();
    seed_group(&storage, "leader", &["a", "b"]).await;
    let failing = Arc::new(AtomicBool::new(false));
    let store = FaultyPayoutStore {
        inner: storage.clone(),
        failing: Arc::clone(&failing),
    };
    let engine = PayoutEngine::new(storage.clone(), store, PayoutPolicy::default());

    let payout = engine
        .create_payout("project-1", "leader", Decimal::new(500, 0), None)
        .await
        .unwrap();
    assert_eq!(
        engine.record_approval(&payout.id, "a").await.unwrap().outcome,
        ApprovalOutcome::Recorded
    );

    failing.store(true, Ordering::SeqCst);
    let result = engine.record_approval(&payout.id, "b").await;
    assert!(matches!(result, Err(CofundError::StorageError(_))));

    let stored = engine.get_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(stored.state, PayoutState::PendingApproval);
    assert_eq!(stored.approvals.len(), 1);
    assert!(!stored.approvals.contains("b"));
    assert!(storage.ledger_entries("leader").await.unwrap().is_empty());

    failing.store(false, Ordering::SeqCst);
    let retry = engine.record_approval(&payout.id, "b").await.unwrap();
    assert_eq!(retry.outcome, ApprovalOutcome::Finalized);
    assert_eq!(storage.ledger_entries("leader").await.unwrap().len(), 1);
    assert_eq!(storage.ledger_balance("leader").await.unwrap(), Decimal::new(500, 0));
}

#[tokio::test]
async fn test_eligibility_is_read_fresh_on_every_vote() {
    let storage = InMemoryStorage::new();
    seed_group(&storage, "leader", &["a", "b"]).await;
    let engine = PayoutEngine::new(storage.clone(), storage.clone(), PayoutPolicy::default());
    let payout = engine
        .create_payout("project-1", "leader", Decimal::new(100, 0), None)
        .await
        .unwrap();

    assert_eq!(
        engine.record_approval(&payout.id, "late").await.unwrap().outcome,
        ApprovalOutcome::NotEligible
    );

    let mut group = storage.get_group("leader-group").await.unwrap().unwrap();
    group.members.push(GroupMember {
        user: storage.create_user(user("late")).await.unwrap(),
        role: Role::Member,
    });
    storage.save_group(group).await.unwrap();

    assert_eq!(
        engine.record_approval(&payout.id, "late").await.unwrap().outcome,
        ApprovalOutcome::Recorded
    );
}

#[tokio::test]
async fn test_engine_applies_default_quorum_and_ttl() {
    let storage = InMemoryStorage::new();
    seed_group(&storage, "leader", &["a", "b", "c"]).await;
    let policy = PayoutPolicy {
        default_quorum: 3,
        ttl: Some(chrono::Duration::hours(48)),
    };
    let engine = PayoutEngine::new(storage.clone(), storage.clone(), policy);

    let payout = engine
        .create_payout("project-1", "leader", Decimal::new(100, 0), None)
        .await
        .unwrap();
    assert_eq!(payout.quorum, 3);
    let expires_at = payout.expires_at.unwrap();
    assert_eq!(expires_at - payout.created_at, chrono::Duration::hours(48));

    let eligible = engine.eligible_approvers("leader").await.unwrap();
    assert_eq!(eligible.len(), 3);
    assert!(!eligible.contains("leader"));
}
