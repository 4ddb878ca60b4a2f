use crate::auth::jwt::{Claims, JwtService};
use crate::constants::{
    GROUP_CREATED, MAX_NAME_LENGTH, MAX_REASON_LENGTH, MEMBER_ADDED, MEMBER_REMOVED, PAYOUT_APPROVED,
    PAYOUT_FINALIZED, PAYOUT_REJECTED, PAYOUT_REQUESTED, PAYOUTS_EXPIRED, USER_ADDED,
};
use crate::core::errors::{CofundError, FieldError};
use crate::core::models::{
    audit::{AppLog, AuditQuery, GroupAudit},
    group::{Group, GroupMember, Role},
    ledger::AccountLedger,
    payout::{ApprovalOutcome, ApprovalResult, PayoutRequest, RejectionOutcome, RejectionResult},
    user::User,
};
use crate::core::payouts::{PayoutEngine, PayoutPolicy};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::StorageBackend;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ServiceSettings {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub balance_cache_ttl: Duration,
    pub payout_policy: PayoutPolicy,
}

pub struct CofundService<L: LoggingService, S: StorageBackend, C: Cache> {
    storage: S,
    logging: L,
    cache: C,
    payouts: PayoutEngine<S, S>,
    jwt_service: JwtService,
    bcrypt_cost: u32,
    balance_cache_ttl: Duration,
}

impl<L: LoggingService, S: StorageBackend, C: Cache> CofundService<L, S, C> {
    pub fn new(storage: S, logging: L, cache: C, settings: ServiceSettings) -> Self {
        CofundService {
            payouts: PayoutEngine::new(storage.clone(), storage.clone(), settings.payout_policy),
            storage,
            logging,
            cache,
            jwt_service: JwtService::new(&settings.jwt_secret, settings.token_ttl),
            bcrypt_cost: settings.bcrypt_cost,
            balance_cache_ttl: settings.balance_cache_ttl,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, CofundError> {
        self.jwt_service.validate_token(token)
    }

    pub async fn validate_users(&self, user_ids: &[&str]) -> Result<(), CofundError> {
        for &user_id in user_ids {
            if self.storage.get_user(user_id).await?.is_none() {
                return Err(CofundError::UserNotFound(user_id.to_string()));
            }
        }
        Ok(())
    }

    async fn validate_group_and_leader(&self, group_id: &str, leader_id: &str) -> Result<Group, CofundError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| CofundError::GroupNotFound(group_id.to_string()))?;
        if group.leader_id() != Some(leader_id) {
            return Err(CofundError::NotGroupLeader(leader_id.to_string()));
        }
        Ok(group)
    }

    fn validate_group_roles(&self, group: &Group) -> Result<(), CofundError> {
        let leader_count = group.members.iter().filter(|m| m.is_leader()).count();
        if leader_count != 1 {
            return Err(CofundError::InvalidLeaderCount(leader_count));
        }
        Ok(())
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        log_details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), CofundError> {
        let details: HashMap<String, serde_json::Value> = serde_json::from_value(log_details)
            .map_err(|e| CofundError::LoggingError(format!("Log details must be an object: {}", e)))?;
        let timestamp = Utc::now();

        if let Some(gid) = group_id {
            self.storage
                .save_group_audit(GroupAudit {
                    id: Uuid::new_v4().to_string(),
                    group_id: gid.to_string(),
                    action: action.to_string(),
                    user_id: user_id.map(String::from),
                    details: details.clone(),
                    timestamp,
                })
                .await?;
        }
        self.logging
            .append(AppLog {
                id: Uuid::new_v4().to_string(),
                action: action.to_string(),
                user_id: user_id.map(String::from),
                details,
                timestamp,
            })
            .await
    }

    // Runs after the payout commit. Failures are logged, never returned.
    async fn audit_committed(&self, action: &str, details: serde_json::Value, user_id: &str) {
        if let Err(e) = self.log_and_audit(None, action, details, Some(user_id)).await {
            error!(action, user_id, error = %e, "audit write failed after commit");
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), CofundError> {
        if value.trim().is_empty() {
            return Err(invalid_input(field, "Empty value", format!("{} cannot be empty", field)));
        }
        if value.len() > max_length {
            return Err(invalid_input(
                field,
                "Too long",
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(invalid_input(
                field,
                "Invalid characters",
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, amount: Decimal) -> Result<(), CofundError> {
        if amount <= Decimal::ZERO {
            return Err(CofundError::InvalidAmount("amount must be greater than 0".to_string()));
        }
        if amount.normalize().scale() > 2 {
            return Err(CofundError::InvalidAmount(
                "amount cannot have more than 2 decimal places".to_string(),
            ));
        }
        Ok(())
    }

    // USERS

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, CofundError> {
        let user = self
            .storage
            .get_user_by_email(email)
            .await?
            .ok_or(CofundError::InvalidCredentials)?;

        if bcrypt::verify(password, &user.password)
            .map_err(|e| CofundError::InternalServerError(format!("Password verification error: {}", e)))?
        {
            self.jwt_service.generate_token(&user.id)
        } else {
            Err(CofundError::InvalidCredentials)
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, CofundError> {
        self.storage.get_user(user_id).await
    }

    pub async fn add_user(&self, user: User, created_by: Option<&User>) -> Result<User, CofundError> {
        if user.email.is_empty() {
            return Err(CofundError::MissingEmail);
        }
        if !user.email.contains('@') || !user.email.contains('.') || user.email.len() < 5 {
            return Err(CofundError::InvalidEmail(user.email.clone()));
        }
        if user.password.is_empty() {
            return Err(invalid_input("password", "Empty value", "password cannot be empty".to_string()));
        }
        self.validate_string_input("id", &user.id, MAX_NAME_LENGTH)?;
        self.validate_string_input("name", &user.name, MAX_NAME_LENGTH)?;

        let hashed = User {
            password: bcrypt::hash(&user.password, self.bcrypt_cost)
                .map_err(|e| CofundError::InternalServerError(format!("Password hashing error: {}", e)))?,
            ..user
        };
        let created = self.storage.create_user(hashed).await?;

        self.log_and_audit(
            None,
            USER_ADDED,
            json!({ "user_id": created.id, "name": created.name, "email": created.email }),
            created_by.map(|u| u.id.as_str()),
        )
        .await?;
        Ok(created)
    }

    // GROUPS

    pub async fn create_group(&self, name: String, members: Vec<User>, leader: &User) -> Result<Group, CofundError> {
        self.validate_users(&[&leader.id]).await?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;

        let mut all_members = members;
        if !all_members.iter().any(|m| m.id == leader.id) {
            all_members.push(leader.clone());
        }
        let mut seen = HashSet::new();
        all_members.retain(|m| seen.insert(m.id.clone()));
        self.validate_users(&all_members.iter().map(|m| m.id.as_str()).collect::<Vec<_>>())
            .await?;

        let group_members = all_members
            .into_iter()
            .map(|user| GroupMember {
                role: if user.id == leader.id { Role::Leader } else { Role::Member },
                user,
            })
            .collect();

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            members: group_members,
        };

        self.validate_group_roles(&group)?;
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "member_ids": group.members.iter().map(|m| m.user.id.clone()).collect::<Vec<_>>()
            }),
            Some(leader.id.as_str()),
        )
        .await?;

        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, CofundError> {
        self.storage.get_group(group_id).await
    }

    pub async fn add_member_to_group(&self, group_id: &str, user: User, added_by: &User) -> Result<(), CofundError> {
        let mut group = self.validate_group_and_leader(group_id, &added_by.id).await?;
        self.validate_users(&[&user.id]).await?;

        if group.has_member(&user.id) {
            return Err(CofundError::AlreadyGroupMember(user.id));
        }

        group.members.push(GroupMember {
            user: user.clone(),
            role: Role::Member,
        });
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            MEMBER_ADDED,
            json!({ "group_id": group_id, "user_id": user.id, "name": user.name }),
            Some(added_by.id.as_str()),
        )
        .await?;
        Ok(())
    }

    /// Removing a member does not retract votes it already cast; it only
    /// stops new ones.
    pub async fn remove_member_from_group(
        &self,
        group_id: &str,
        user_id: &str,
        removed_by: &User,
    ) -> Result<(), CofundError> {
        let mut group = self.validate_group_and_leader(group_id, &removed_by.id).await?;

        if user_id == removed_by.id {
            return Err(CofundError::LeaderCannotRemoveSelf);
        }
        if !group.has_member(user_id) {
            return Err(CofundError::NotGroupMember(user_id.to_string()));
        }

        group.members.retain(|m| m.user.id != user_id);
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            MEMBER_REMOVED,
            json!({ "group_id": group_id, "user_id": user_id }),
            Some(removed_by.id.as_str()),
        )
        .await?;
        Ok(())
    }

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, CofundError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| CofundError::GroupNotFound(group_id.to_string()))?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self, query: &AuditQuery) -> Result<Vec<AppLog>, CofundError> {
        self.logging.query(query).await
    }

    // PAYOUTS

    pub async fn request_payout(
        &self,
        subject_id: &str,
        recipient_id: &str,
        amount: Decimal,
        quorum: Option<usize>,
        requested_by: &User,
    ) -> Result<PayoutRequest, CofundError> {
        self.validate_string_input("subject_id", subject_id, MAX_NAME_LENGTH)?;
        self.validate_amount_input(amount)?;

        let payout = self
            .payouts
            .create_payout(subject_id, recipient_id, amount, quorum)
            .await?;

        self.log_and_audit(
            None,
            PAYOUT_REQUESTED,
            json!({
                "payout_id": payout.id,
                "subject_id": payout.subject_id,
                "recipient_id": payout.recipient_id,
                "amount": payout.amount.to_string(),
                "quorum": payout.quorum
            }),
            Some(requested_by.id.as_str()),
        )
        .await?;
        Ok(payout)
    }

    pub async fn get_payout(&self, payout_id: &str) -> Result<Option<PayoutRequest>, CofundError> {
        self.payouts.get_payout(payout_id).await
    }

    pub async fn eligible_approvers(&self, recipient_id: &str) -> Result<Vec<String>, CofundError> {
        let mut approvers: Vec<String> = self.payouts.eligible_approvers(recipient_id).await?.into_iter().collect();
        approvers.sort();
        Ok(approvers)
    }

    pub async fn approve_payout(&self, payout_id: &str, approver: &User) -> Result<ApprovalResult, CofundError> {
        let result = self.payouts.record_approval(payout_id, &approver.id).await?;

        match (&result.outcome, &result.payout) {
            (ApprovalOutcome::Finalized, Some(payout)) => {
                if let Err(e) = self.cache.invalidate_balance(&payout.recipient_id).await {
                    error!(account_id = %payout.recipient_id, error = %e, "balance cache invalidation failed");
                }
                self.audit_committed(
                    PAYOUT_FINALIZED,
                    json!({
                        "payout_id": payout.id,
                        "recipient_id": payout.recipient_id,
                        "amount": payout.amount.to_string(),
                        "approvals": payout.approvals.iter().collect::<Vec<_>>(),
                        "ledger_entry_id": result.credit.as_ref().map(|c| c.id.clone())
                    }),
                    &approver.id,
                )
                .await;
            }
            (ApprovalOutcome::Recorded, Some(payout)) => {
                self.audit_committed(
                    PAYOUT_APPROVED,
                    json!({
                        "payout_id": payout.id,
                        "approvals": payout.approvals.len(),
                        "quorum": payout.quorum
                    }),
                    &approver.id,
                )
                .await;
            }
            _ => {}
        }
        Ok(result)
    }

    pub async fn reject_payout(
        &self,
        payout_id: &str,
        rejected_by: &User,
        reason: Option<String>,
    ) -> Result<RejectionResult, CofundError> {
        if let Some(reason) = &reason {
            self.validate_string_input("reason", reason, MAX_REASON_LENGTH)?;
        }

        let result = self.payouts.reject_payout(payout_id, &rejected_by.id, reason).await?;
        if result.outcome == RejectionOutcome::Rejected {
            self.audit_committed(
                PAYOUT_REJECTED,
                json!({
                    "payout_id": payout_id,
                    "reason": result.payout.as_ref().and_then(|p| p.rejection_reason.clone())
                }),
                &rejected_by.id,
            )
            .await;
        }
        Ok(result)
    }

    pub async fn pending_payouts_for(&self, approver: &User) -> Result<Vec<PayoutRequest>, CofundError> {
        self.payouts.list_pending_for_approver(&approver.id).await
    }

    pub async fn expire_overdue_payouts(
        &self,
        now: DateTime<Utc>,
        triggered_by: &User,
    ) -> Result<Vec<PayoutRequest>, CofundError> {
        let expired = self.payouts.expire_overdue(now).await?;
        if !expired.is_empty() {
            self.audit_committed(
                PAYOUTS_EXPIRED,
                json!({ "payout_ids": expired.iter().map(|p| p.id.clone()).collect::<Vec<_>>() }),
                &triggered_by.id,
            )
            .await;
        }
        Ok(expired)
    }

    /// Balance from the cache when fresh. A read racing a finalization can
    /// repopulate the cache with the pre-credit value for at most one TTL.
    pub async fn get_balance(&self, account_id: &str) -> Result<Decimal, CofundError> {
        self.validate_users(&[account_id]).await?;

        if let Some(balance) = self.cache.get_balance(account_id).await? {
            return Ok(balance);
        }
        let balance = self.storage.ledger_balance(account_id).await?;
        self.cache
            .save_balance(account_id, balance, self.balance_cache_ttl)
            .await?;
        info!(account_id, %balance, "ledger balance cached");
        Ok(balance)
    }

    pub async fn get_account_ledger(&self, account_id: &str) -> Result<AccountLedger, CofundError> {
        self.validate_users(&[account_id]).await?;

        let entries = self.storage.ledger_entries(account_id).await?;
        let balance = entries.iter().map(|e| e.amount).sum();
        Ok(AccountLedger {
            account_id: account_id.to_string(),
            entries,
            balance,
        })
    }
}

fn invalid_input(field: &str, title: &str, description: String) -> CofundError {
    CofundError::InvalidInput(
        field.to_string(),
        FieldError {
            field: field.to_string(),
            title: title.to_string(),
            description,
        },
    )
}
