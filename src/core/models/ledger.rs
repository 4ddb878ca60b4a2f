use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::payout::PayoutRequest;

/// Immutable credit to an account, always tied to the payout that produced it.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: String,
    pub account_id: String,
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    pub payout_id: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn credit_for(payout: &PayoutRequest, now: DateTime<Utc>) -> Self {
        LedgerEntry {
            id: Uuid::new_v4().to_string(),
            account_id: payout.recipient_id.clone(),
            amount: payout.amount,
            payout_id: payout.id.clone(),
            created_at: now,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AccountLedger {
    pub account_id: String,
    pub entries: Vec<LedgerEntry>,
    #[schema(value_type = String, example = "500.00")]
    pub balance: Decimal,
}
