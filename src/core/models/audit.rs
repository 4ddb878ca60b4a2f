use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppLog {
    pub id: String,
    pub action: String,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupAudit {
    pub id: String,
    pub group_id: String,
    pub action: String,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

/// Filter over the application log. Unset fields match everything.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Exact action name, e.g. `PAYOUT_FINALIZED`.
    pub action: Option<String>,
    /// Identity that performed the action.
    pub user_id: Option<String>,
    /// Only entries whose details reference this payout.
    pub payout_id: Option<String>,
}

impl AuditQuery {
    pub fn action(action: &str) -> Self {
        AuditQuery {
            action: Some(action.to_string()),
            ..Self::default()
        }
    }

    pub fn payout(payout_id: &str) -> Self {
        AuditQuery {
            payout_id: Some(payout_id.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, log: &AppLog) -> bool {
        self.action.as_ref().is_none_or(|a| *a == log.action)
            && self.user_id.as_ref().is_none_or(|u| log.user_id.as_ref() == Some(u))
            && self.payout_id.as_ref().is_none_or(|p| references_payout(log, p))
    }
}

fn references_payout(log: &AppLog, payout_id: &str) -> bool {
    match log.details.get("payout_id") {
        Some(serde_json::Value::String(id)) => id == payout_id,
        _ => log
            .details
            .get("payout_ids")
            .and_then(|ids| ids.as_array())
            .is_some_and(|ids| ids.iter().any(|id| id.as_str() == Some(payout_id))),
    }
}
