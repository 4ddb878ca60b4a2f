use crate::core::errors::CofundError;
use crate::core::models::{
    audit::GroupAudit,
    group::Group,
    ledger::LedgerEntry,
    payout::{ApprovalOutcome, ApprovalResult, PayoutRequest, RejectionOutcome, RejectionResult},
    user::User,
};
use crate::infrastructure::storage::{LedgerStore, MembershipDirectory, PayoutStore, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

// Lock order when more than one is held: payouts, then ledger.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
    group_audits: Arc<RwLock<HashMap<String, Vec<GroupAudit>>>>,
    payouts: Arc<RwLock<HashMap<String, PayoutRequest>>>,
    ledger: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, CofundError> {
        let mut users_by_email = self.users_by_email.write().await;
        if users_by_email.contains_key(&user.email) {
            return Err(CofundError::EmailAlreadyRegistered(user.email));
        }
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(CofundError::StorageError(format!("User id {} already exists", user.id)));
        }
        users_by_email.insert(user.email.clone(), user.id.clone());
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, CofundError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, CofundError> {
        let users_by_email = self.users_by_email.read().await;
        let users = self.users.read().await;
        Ok(users_by_email.get(email).and_then(|id| users.get(id).cloned()))
    }

    async fn save_group(&self, group: Group) -> Result<(), CofundError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, CofundError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), CofundError> {
        let mut group_audits = self.group_audits.write().await;
        group_audits.entry(audit.group_id.clone()).or_default().push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, CofundError> {
        let group_audits = self.group_audits.read().await;
        Ok(group_audits.get(group_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryStorage {
    async fn identity_exists(&self, user_id: &str) -> Result<bool, CofundError> {
        let users = self.users.read().await;
        Ok(users.contains_key(user_id))
    }

    async fn members_led_by(&self, leader_id: &str) -> Result<HashSet<String>, CofundError> {
        let groups = self.groups.read().await;
        Ok(groups
            .values()
            .filter(|g| g.leader_id() == Some(leader_id))
            .flat_map(|g| g.members.iter().map(|m| m.user.id.clone()))
            .collect())
    }

    async fn leaders_of(&self, member_id: &str) -> Result<HashSet<String>, CofundError> {
        let groups = self.groups.read().await;
        Ok(groups
            .values()
            .filter(|g| g.has_member(member_id))
            .filter_map(|g| g.leader_id().map(String::from))
            .collect())
    }
}

#[async_trait]
impl PayoutStore for InMemoryStorage {
    async fn insert_payout(&self, payout: PayoutRequest) -> Result<(), CofundError> {
        let mut payouts = self.payouts.write().await;
        if payouts.contains_key(&payout.id) {
            return Err(CofundError::StorageError(format!("Payout {} already exists", payout.id)));
        }
        payouts.insert(payout.id.clone(), payout);
        Ok(())
    }

    async fn get_payout(&self, payout_id: &str) -> Result<Option<PayoutRequest>, CofundError> {
        let payouts = self.payouts.read().await;
        Ok(payouts.get(payout_id).cloned())
    }

    async fn pending_payouts_for(&self, recipient_ids: &HashSet<String>) -> Result<Vec<PayoutRequest>, CofundError> {
        let payouts = self.payouts.read().await;
        let mut pending: Vec<PayoutRequest> = payouts
            .values()
            .filter(|p| p.is_pending() && recipient_ids.contains(&p.recipient_id))
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }

    async fn commit_approval(
        &self,
        payout_id: &str,
        approver_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ApprovalResult, CofundError> {
        let mut payouts = self.payouts.write().await;
        let mut ledger = self.ledger.write().await;

        let Some(stored) = payouts.get(payout_id) else {
            return Ok(ApprovalResult::bare(ApprovalOutcome::NotFound, None));
        };

        // Work on a copy so nothing is visible until both writes are ready.
        let mut updated = stored.clone();
        let before = updated.state;
        let outcome = updated.apply_approval(approver_id, now);
        let credit = (outcome == ApprovalOutcome::Finalized).then(|| LedgerEntry::credit_for(&updated, now));

        if outcome.is_write() || updated.state != before {
            payouts.insert(updated.id.clone(), updated.clone());
        }
        if let Some(entry) = &credit {
            ledger.push(entry.clone());
        }

        Ok(ApprovalResult {
            outcome,
            payout: Some(updated),
            credit,
        })
    }

    async fn commit_rejection(
        &self,
        payout_id: &str,
        rejected_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RejectionResult, CofundError> {
        let mut payouts = self.payouts.write().await;
        let Some(payout) = payouts.get_mut(payout_id) else {
            return Ok(RejectionResult {
                outcome: RejectionOutcome::NotFound,
                payout: None,
            });
        };
        let outcome = payout.apply_rejection(rejected_by, reason, now);
        Ok(RejectionResult {
            outcome,
            payout: Some(payout.clone()),
        })
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<PayoutRequest>, CofundError> {
        let mut payouts = self.payouts.write().await;
        Ok(payouts
            .values_mut()
            .filter_map(|p| p.apply_expiry(now).then(|| p.clone()))
            .collect())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStorage {
    async fn ledger_entries(&self, account_id: &str) -> Result<Vec<LedgerEntry>, CofundError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.iter().filter(|e| e.account_id == account_id).cloned().collect())
    }

    async fn ledger_balance(&self, account_id: &str) -> Result<Decimal, CofundError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .iter()
            .filter(|e| e.account_id == account_id)
            .map(|e| e.amount)
            .sum())
    }
}
