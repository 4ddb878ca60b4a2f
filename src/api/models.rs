use axum::{Json, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::CofundError;
use crate::core::models::payout::{ApprovalOutcome, RejectionOutcome};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub member_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveMemberRequest {
    pub user_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePayoutRequest {
    pub subject_id: String,
    pub recipient_id: String,
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    pub quorum: Option<usize>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectPayoutRequest {
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    pub account_id: String,
    #[schema(value_type = String, example = "500.00")]
    pub balance: Decimal,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Status for a vote outcome. Outcomes are always returned with a body;
/// the status only lets clients branch without parsing it.
pub fn approval_status(outcome: ApprovalOutcome) -> StatusCode {
    match outcome {
        ApprovalOutcome::Recorded | ApprovalOutcome::Finalized | ApprovalOutcome::AlreadyApproved => StatusCode::OK,
        ApprovalOutcome::AlreadyFinal => StatusCode::CONFLICT,
        ApprovalOutcome::NotEligible => StatusCode::FORBIDDEN,
        ApprovalOutcome::NotFound => StatusCode::NOT_FOUND,
    }
}

pub fn rejection_status(outcome: RejectionOutcome) -> StatusCode {
    match outcome {
        RejectionOutcome::Rejected => StatusCode::OK,
        RejectionOutcome::AlreadyFinal => StatusCode::CONFLICT,
        RejectionOutcome::NotEligible => StatusCode::FORBIDDEN,
        RejectionOutcome::NotFound => StatusCode::NOT_FOUND,
    }
}

// Newtype wrapper for CofundError to implement IntoResponse
pub struct ApiError(pub CofundError);

impl From<CofundError> for ApiError {
    fn from(err: CofundError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CofundError::MissingEmail
            | CofundError::InvalidEmail(_)
            | CofundError::InvalidLeaderCount(_)
            | CofundError::InvalidAmount(_)
            | CofundError::InvalidQuorum { .. }
            | CofundError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            CofundError::InvalidCredentials | CofundError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CofundError::NotGroupMember(_) | CofundError::NotGroupLeader(_) | CofundError::LeaderCannotRemoveSelf => {
                StatusCode::FORBIDDEN
            }
            CofundError::UserNotFound(_) | CofundError::GroupNotFound(_) | CofundError::PayoutNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CofundError::EmailAlreadyRegistered(_) | CofundError::AlreadyGroupMember(_) => StatusCode::CONFLICT,
            CofundError::InternalServerError(_)
            | CofundError::StorageError(_)
            | CofundError::LoggingError(_)
            | CofundError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}
