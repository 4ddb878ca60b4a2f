use crate::core::errors::CofundError;
use crate::core::models::{
    audit::GroupAudit,
    group::Group,
    ledger::LedgerEntry,
    payout::{ApprovalResult, PayoutRequest, RejectionResult},
    user::User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, CofundError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, CofundError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, CofundError>;
    async fn save_group(&self, group: Group) -> Result<(), CofundError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, CofundError>;
    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), CofundError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, CofundError>;
}

/// Read side of group membership. Answers reflect the current state; nothing
/// here is cached.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn identity_exists(&self, user_id: &str) -> Result<bool, CofundError>;
    /// Every member (leader included) of every group led by `leader_id`.
    async fn members_led_by(&self, leader_id: &str) -> Result<HashSet<String>, CofundError>;
    /// Leaders of every group `member_id` belongs to.
    async fn leaders_of(&self, member_id: &str) -> Result<HashSet<String>, CofundError>;
}

/// Durable payout requests. The `commit_*` and `expire_due` methods are each a
/// single unit of work: either every write they imply lands, or none does.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn insert_payout(&self, payout: PayoutRequest) -> Result<(), CofundError>;
    async fn get_payout(&self, payout_id: &str) -> Result<Option<PayoutRequest>, CofundError>;
    async fn pending_payouts_for(&self, recipient_ids: &HashSet<String>) -> Result<Vec<PayoutRequest>, CofundError>;
    /// Applies the vote and, when it reaches quorum, appends the ledger credit
    /// in the same unit of work.
    async fn commit_approval(
        &self,
        payout_id: &str,
        approver_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ApprovalResult, CofundError>;
    async fn commit_rejection(
        &self,
        payout_id: &str,
        rejected_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RejectionResult, CofundError>;
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<PayoutRequest>, CofundError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn ledger_entries(&self, account_id: &str) -> Result<Vec<LedgerEntry>, CofundError>;
    async fn ledger_balance(&self, account_id: &str) -> Result<Decimal, CofundError>;
}

/// Everything the service needs from one backend.
pub trait StorageBackend: Storage + MembershipDirectory + PayoutStore + LedgerStore + Clone {}

impl<T> StorageBackend for T where T: Storage + MembershipDirectory + PayoutStore + LedgerStore + Clone {}

pub mod in_memory;
