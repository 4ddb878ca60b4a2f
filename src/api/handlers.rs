use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::CofundError,
        models::{
            audit::{AppLog, AuditQuery, GroupAudit},
            group::Group,
            ledger::AccountLedger,
            payout::{ApprovalResult, PayoutRequest, RejectionResult},
            user::User,
        },
        services::CofundService,
    },
    infrastructure::{
        cache::in_memory::InMemoryCache, logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use http::header;
use std::sync::Arc;

pub type AppService = CofundService<InMemoryLogging, InMemoryStorage, InMemoryCache>;

// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| CofundError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| CofundError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn current_user(service: &AppService, claims: &Claims) -> Result<User, ApiError> {
    Ok(service
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| CofundError::Unauthorized(format!("Unknown subject {}", claims.sub)))?)
}

// Define API routes
pub fn api_routes(service: Arc<AppService>) -> Router {
    let protected_routes = Router::new()
        .route("/users/{user_id}", get(get_user))
        .route("/groups", post(create_group))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/members", post(add_member_to_group))
        .route("/groups/{group_id}/members/remove", post(remove_member_from_group))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .route("/payouts", post(create_payout))
        .route("/payouts/pending", get(get_pending_payouts))
        .route("/payouts/expire", post(expire_payouts))
        .route("/payouts/{payout_id}", get(get_payout))
        .route("/payouts/{payout_id}/approve", post(approve_payout))
        .route("/payouts/{payout_id}/reject", post(reject_payout))
        .route("/ledger/{account_id}", get(get_account_ledger))
        .route("/ledger/{account_id}/balance", get(get_balance))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/login", post(login))
        .route("/users", post(create_user)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login(
    State(service): State<Arc<AppService>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(service): State<Arc<AppService>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = User {
        id: req.id,
        name: req.name,
        email: req.email,
        password: req.password,
    };
    let created = service.add_user(user, None).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "ID of the user to retrieve")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = User),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_user(
    State(service): State<Arc<AppService>>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| CofundError::UserNotFound(user_id))?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created with the caller as leader", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_group(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let leader = current_user(&service, &claims).await?;
    let members = req
        .member_ids
        .into_iter()
        .map(|id| {
            let service = &service;
            async move {
                service
                    .get_user(&id)
                    .await?
                    .ok_or_else(|| CofundError::UserNotFound(id))
            }
        })
        .collect::<Vec<_>>();
    let members = futures::future::try_join_all(members).await?;
    let group = service.create_group(req.name, members, &leader).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service
        .get_group(&group_id)
        .await?
        .ok_or_else(|| CofundError::GroupNotFound(group_id))?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    request_body = AddMemberRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Member added successfully"),
        (status = 403, description = "Caller is not the group leader", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse),
        (status = 409, description = "User already a member", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn add_member_to_group(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let added_by = current_user(&service, &claims).await?;
    let user = service
        .get_user(&req.user_id)
        .await?
        .ok_or_else(|| CofundError::UserNotFound(req.user_id))?;
    service.add_member_to_group(&group_id, user, &added_by).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members/remove",
    request_body = RemoveMemberRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Member removed successfully"),
        (status = 403, description = "Caller is not the group leader, or is removing themselves", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn remove_member_from_group(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<RemoveMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let removed_by = current_user(&service, &claims).await?;
    service
        .remove_member_from_group(&group_id, &req.user_id, &removed_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group audit trail", body = [GroupAudit]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group_audits(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(Json(audits))
}

#[utoipa::path(
    post,
    path = "/api/payouts",
    request_body = CreatePayoutRequest,
    responses(
        (status = 201, description = "Payout request created, pending approval", body = PayoutRequest),
        (status = 400, description = "Invalid amount or quorum", body = ErrorResponse),
        (status = 404, description = "Recipient not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_payout(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<PayoutRequest>), ApiError> {
    let requested_by = current_user(&service, &claims).await?;
    let payout = service
        .request_payout(&req.subject_id, &req.recipient_id, req.amount, req.quorum, &requested_by)
        .await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

#[utoipa::path(
    get,
    path = "/api/payouts/{payout_id}",
    params(
        ("payout_id" = String, Path, description = "ID of the payout request")
    ),
    responses(
        (status = 200, description = "Payout request", body = PayoutRequest),
        (status = 404, description = "Payout not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_payout(
    State(service): State<Arc<AppService>>,
    Path(payout_id): Path<String>,
) -> Result<Json<PayoutRequest>, ApiError> {
    let payout = service
        .get_payout(&payout_id)
        .await?
        .ok_or_else(|| CofundError::PayoutNotFound(payout_id))?;
    Ok(Json(payout))
}

#[utoipa::path(
    post,
    path = "/api/payouts/{payout_id}/approve",
    params(
        ("payout_id" = String, Path, description = "ID of the payout request")
    ),
    responses(
        (status = 200, description = "RECORDED, FINALIZED or ALREADY_APPROVED", body = ApprovalResult),
        (status = 403, description = "NOT_ELIGIBLE", body = ApprovalResult),
        (status = 404, description = "NOT_FOUND", body = ApprovalResult),
        (status = 409, description = "ALREADY_FINAL", body = ApprovalResult),
        (status = 500, description = "Storage failure, safe to retry", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn approve_payout(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(payout_id): Path<String>,
) -> Result<(StatusCode, Json<ApprovalResult>), ApiError> {
    let approver = current_user(&service, &claims).await?;
    let result = service.approve_payout(&payout_id, &approver).await?;
    Ok((approval_status(result.outcome), Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/payouts/{payout_id}/reject",
    request_body = RejectPayoutRequest,
    params(
        ("payout_id" = String, Path, description = "ID of the payout request")
    ),
    responses(
        (status = 200, description = "REJECTED", body = RejectionResult),
        (status = 403, description = "NOT_ELIGIBLE", body = RejectionResult),
        (status = 404, description = "NOT_FOUND", body = RejectionResult),
        (status = 409, description = "ALREADY_FINAL", body = RejectionResult),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn reject_payout(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(payout_id): Path<String>,
    Json(req): Json<RejectPayoutRequest>,
) -> Result<(StatusCode, Json<RejectionResult>), ApiError> {
    let rejected_by = current_user(&service, &claims).await?;
    let result = service.reject_payout(&payout_id, &rejected_by, req.reason).await?;
    Ok((rejection_status(result.outcome), Json(result)))
}

#[utoipa::path(
    get,
    path = "/api/payouts/pending",
    responses(
        (status = 200, description = "Pending payouts the caller can still vote on", body = [PayoutRequest]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_pending_payouts(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PayoutRequest>>, ApiError> {
    let approver = current_user(&service, &claims).await?;
    let pending = service.pending_payouts_for(&approver).await?;
    Ok(Json(pending))
}

#[utoipa::path(
    post,
    path = "/api/payouts/expire",
    responses(
        (status = 200, description = "Payout requests moved to EXPIRED", body = [PayoutRequest])
    ),
    security(("Bearer" = []))
)]
pub async fn expire_payouts(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PayoutRequest>>, ApiError> {
    let triggered_by = current_user(&service, &claims).await?;
    let expired = service.expire_overdue_payouts(Utc::now(), &triggered_by).await?;
    Ok(Json(expired))
}

#[utoipa::path(
    get,
    path = "/api/ledger/{account_id}",
    params(
        ("account_id" = String, Path, description = "Account (user) ID")
    ),
    responses(
        (status = 200, description = "Ledger entries and balance", body = AccountLedger),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_account_ledger(
    State(service): State<Arc<AppService>>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountLedger>, ApiError> {
    let ledger = service.get_account_ledger(&account_id).await?;
    Ok(Json(ledger))
}

#[utoipa::path(
    get,
    path = "/api/ledger/{account_id}/balance",
    params(
        ("account_id" = String, Path, description = "Account (user) ID")
    ),
    responses(
        (status = 200, description = "Cached ledger balance", body = BalanceResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_balance(
    State(service): State<Arc<AppService>>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = service.get_balance(&account_id).await?;
    Ok(Json(BalanceResponse { account_id, balance }))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    params(AuditQuery),
    responses(
        (status = 200, description = "Application audit log, oldest first", body = [AppLog])
    ),
    security(("Bearer" = []))
)]
pub async fn get_app_logs(
    State(service): State<Arc<AppService>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs(&query).await?;
    Ok(Json(logs))
}
