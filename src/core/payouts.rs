//! Threshold payout release.
//!
//! A payout to a group leader stays pending until a quorum of that leader's
//! co-guarantors approve it. The vote that reaches quorum completes the
//! request and posts the ledger credit in one storage unit of work, so a
//! request is credited at most once however votes race or are retried.
//!
//! Eligibility is read from the membership directory on every call. A member
//! who leaves mid-flight cannot cast new votes, but votes already recorded
//! keep counting.

use crate::core::errors::CofundError;
use crate::core::models::payout::{
    ApprovalOutcome, ApprovalResult, ApprovalSet, PayoutRequest, PayoutState, RejectionOutcome, RejectionResult,
};
use crate::infrastructure::storage::{MembershipDirectory, PayoutStore};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_QUORUM: usize = 2;

#[derive(Clone, Debug)]
pub struct PayoutPolicy {
    /// Used when a request does not name its own quorum.
    pub default_quorum: usize,
    /// Pending requests older than this expire. `None` keeps them open.
    pub ttl: Option<Duration>,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        PayoutPolicy {
            default_quorum: DEFAULT_QUORUM,
            ttl: None,
        }
    }
}

pub struct PayoutEngine<D: MembershipDirectory, P: PayoutStore> {
    directory: D,
    store: P,
    policy: PayoutPolicy,
}

impl<D: MembershipDirectory, P: PayoutStore> PayoutEngine<D, P> {
    pub fn new(directory: D, store: P, policy: PayoutPolicy) -> Self {
        PayoutEngine {
            directory,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &PayoutPolicy {
        &self.policy
    }

    /// Co-guarantors of `recipient_id`: every member of a group it leads,
    /// minus the recipient itself.
    pub async fn eligible_approvers(&self, recipient_id: &str) -> Result<HashSet<String>, CofundError> {
        let mut members = self.directory.members_led_by(recipient_id).await?;
        members.remove(recipient_id);
        Ok(members)
    }

    pub async fn create_payout(
        &self,
        subject_id: &str,
        recipient_id: &str,
        amount: Decimal,
        quorum: Option<usize>,
    ) -> Result<PayoutRequest, CofundError> {
        if amount <= Decimal::ZERO {
            return Err(CofundError::InvalidAmount(format!("amount must be positive, got {}", amount)));
        }
        if !self.directory.identity_exists(recipient_id).await? {
            return Err(CofundError::UserNotFound(recipient_id.to_string()));
        }

        let quorum = quorum.unwrap_or(self.policy.default_quorum);
        let eligible = self.eligible_approvers(recipient_id).await?;
        if quorum == 0 || quorum > eligible.len() {
            return Err(CofundError::InvalidQuorum {
                quorum,
                eligible: eligible.len(),
            });
        }

        let now = Utc::now();
        let payout = PayoutRequest {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            recipient_id: recipient_id.to_string(),
            amount,
            state: PayoutState::PendingApproval,
            approvals: ApprovalSet::new(),
            quorum,
            rejected_by: None,
            rejection_reason: None,
            expires_at: self.policy.ttl.map(|ttl| now + ttl),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_payout(payout.clone()).await?;

        info!(
            payout_id = %payout.id,
            recipient_id,
            %amount,
            quorum,
            "payout request created"
        );
        Ok(payout)
    }

    pub async fn get_payout(&self, payout_id: &str) -> Result<Option<PayoutRequest>, CofundError> {
        self.store.get_payout(payout_id).await
    }

    pub async fn record_approval(&self, payout_id: &str, approver_id: &str) -> Result<ApprovalResult, CofundError> {
        let Some(payout) = self.store.get_payout(payout_id).await? else {
            debug!(payout_id, approver_id, "approval for unknown payout");
            return Ok(ApprovalResult::bare(ApprovalOutcome::NotFound, None));
        };

        if !self.is_eligible(&payout, approver_id).await? {
            warn!(payout_id, approver_id, "approval from ineligible identity");
            return Ok(ApprovalResult::bare(ApprovalOutcome::NotEligible, Some(payout)));
        }

        let result = self.store.commit_approval(payout_id, approver_id, Utc::now()).await?;
        match result.outcome {
            ApprovalOutcome::Finalized => info!(
                payout_id,
                approver_id,
                recipient_id = %payout.recipient_id,
                amount = %payout.amount,
                "payout finalized and credited"
            ),
            ApprovalOutcome::Recorded => info!(payout_id, approver_id, "approval recorded"),
            outcome => debug!(payout_id, approver_id, ?outcome, "approval not applied"),
        }
        Ok(result)
    }

    pub async fn reject_payout(
        &self,
        payout_id: &str,
        rejected_by: &str,
        reason: Option<String>,
    ) -> Result<RejectionResult, CofundError> {
        let Some(payout) = self.store.get_payout(payout_id).await? else {
            return Ok(RejectionResult {
                outcome: RejectionOutcome::NotFound,
                payout: None,
            });
        };

        if !self.is_eligible(&payout, rejected_by).await? {
            warn!(payout_id, rejected_by, "rejection from ineligible identity");
            return Ok(RejectionResult {
                outcome: RejectionOutcome::NotEligible,
                payout: Some(payout),
            });
        }

        let result = self
            .store
            .commit_rejection(payout_id, rejected_by, reason, Utc::now())
            .await?;
        if result.outcome == RejectionOutcome::Rejected {
            info!(payout_id, rejected_by, "payout rejected");
        }
        Ok(result)
    }

    /// Pending requests `approver_id` may still vote on. Recomputed from
    /// current membership on every call.
    pub async fn list_pending_for_approver(&self, approver_id: &str) -> Result<Vec<PayoutRequest>, CofundError> {
        let mut leaders = self.directory.leaders_of(approver_id).await?;
        leaders.remove(approver_id);
        if leaders.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let pending = self.store.pending_payouts_for(&leaders).await?;
        Ok(pending
            .into_iter()
            .filter(|p| !p.approvals.contains(approver_id) && !p.is_overdue(now))
            .collect())
    }

    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<PayoutRequest>, CofundError> {
        let expired = self.store.expire_due(now).await?;
        if !expired.is_empty() {
            info!(count = expired.len(), "expired overdue payout requests");
        }
        Ok(expired)
    }

    async fn is_eligible(&self, payout: &PayoutRequest, identity: &str) -> Result<bool, CofundError> {
        Ok(self.eligible_approvers(&payout.recipient_id).await?.contains(identity))
    }
}
