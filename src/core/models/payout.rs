use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

use super::ledger::LedgerEntry;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutState {
    PendingApproval,
    Completed,
    Rejected,
    Expired,
}

impl PayoutState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PayoutState::PendingApproval)
    }
}

impl std::fmt::Display for PayoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PayoutState::PendingApproval => "PENDING_APPROVAL",
            PayoutState::Completed => "COMPLETED",
            PayoutState::Rejected => "REJECTED",
            PayoutState::Expired => "EXPIRED",
        };
        write!(f, "{}", s)
    }
}

/// Approver identities in the order their votes landed.
///
/// Membership is a hash lookup and inserting an identity twice is a no-op,
/// so the vote count is always the number of distinct approvers.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ApprovalSet {
    order: Vec<String>,
    index: HashSet<String>,
}

impl ApprovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the identity had already approved.
    pub fn insert(&mut self, approver_id: &str) -> bool {
        if !self.index.insert(approver_id.to_string()) {
            return false;
        }
        self.order.push(approver_id.to_string());
        true
    }

    pub fn contains(&self, approver_id: &str) -> bool {
        self.index.contains(approver_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ApprovalSet {
    fn from(ids: Vec<String>) -> Self {
        let mut set = ApprovalSet::new();
        for id in &ids {
            set.insert(id);
        }
        set
    }
}

impl From<ApprovalSet> for Vec<String> {
    fn from(set: ApprovalSet) -> Self {
        set.order
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PayoutRequest {
    pub id: String,
    pub subject_id: String,
    pub recipient_id: String,
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    pub state: PayoutState,
    #[schema(value_type = Vec<String>)]
    pub approvals: ApprovalSet,
    pub quorum: usize,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    #[schema(value_type = Option<String>, example = "2024-06-08T12:34:56Z")]
    pub expires_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl PayoutRequest {
    pub fn is_pending(&self) -> bool {
        self.state == PayoutState::PendingApproval
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    pub fn remaining_approvals(&self) -> usize {
        self.quorum.saturating_sub(self.approvals.len())
    }

    /// Applies one vote to the record. Eligibility is the caller's concern;
    /// this only enforces idempotence and the terminal-state freeze.
    ///
    /// A duplicate vote reports `AlreadyApproved` even on a terminal request,
    /// so a caller retrying after a lost response learns its vote counted.
    pub fn apply_approval(&mut self, approver_id: &str, now: DateTime<Utc>) -> ApprovalOutcome {
        if self.approvals.contains(approver_id) {
            return ApprovalOutcome::AlreadyApproved;
        }
        if self.state.is_terminal() {
            return ApprovalOutcome::AlreadyFinal;
        }
        if self.is_overdue(now) {
            self.expire(now);
            return ApprovalOutcome::AlreadyFinal;
        }

        self.approvals.insert(approver_id);
        self.updated_at = now;
        if self.approvals.len() >= self.quorum {
            self.state = PayoutState::Completed;
            ApprovalOutcome::Finalized
        } else {
            ApprovalOutcome::Recorded
        }
    }

    pub fn apply_rejection(
        &mut self,
        rejected_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> RejectionOutcome {
        if self.state.is_terminal() {
            return RejectionOutcome::AlreadyFinal;
        }
        if self.is_overdue(now) {
            self.expire(now);
            return RejectionOutcome::AlreadyFinal;
        }

        self.state = PayoutState::Rejected;
        self.rejected_by = Some(rejected_by.to_string());
        self.rejection_reason = reason;
        self.updated_at = now;
        RejectionOutcome::Rejected
    }

    /// Returns `true` if the request moved to `Expired`.
    pub fn apply_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.state.is_terminal() || !self.is_overdue(now) {
            return false;
        }
        self.expire(now);
        true
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        self.state = PayoutState::Expired;
        self.updated_at = now;
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalOutcome {
    Recorded,
    AlreadyApproved,
    Finalized,
    NotEligible,
    NotFound,
    AlreadyFinal,
}

impl ApprovalOutcome {
    /// Whether the vote changed the stored request.
    pub fn is_write(self) -> bool {
        matches!(self, ApprovalOutcome::Recorded | ApprovalOutcome::Finalized)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionOutcome {
    Rejected,
    AlreadyFinal,
    NotEligible,
    NotFound,
}

/// What a vote did, with the request as stored afterwards and the ledger
/// credit when the vote finalized it.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ApprovalResult {
    pub outcome: ApprovalOutcome,
    pub payout: Option<PayoutRequest>,
    pub credit: Option<LedgerEntry>,
}

impl ApprovalResult {
    pub fn bare(outcome: ApprovalOutcome, payout: Option<PayoutRequest>) -> Self {
        ApprovalResult {
            outcome,
            payout,
            credit: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RejectionResult {
    pub outcome: RejectionOutcome,
    pub payout: Option<PayoutRequest>,
}
