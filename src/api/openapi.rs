use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        AddMemberRequest, BalanceResponse, CreateGroupRequest, CreatePayoutRequest, CreateUserRequest, ErrorResponse,
        LoginRequest, LoginResponse, RejectPayoutRequest, RemoveMemberRequest,
    },
    core::models::{
        audit::{AppLog, GroupAudit},
        group::{Group, GroupMember, Role},
        ledger::{AccountLedger, LedgerEntry},
        payout::{ApprovalOutcome, ApprovalResult, PayoutRequest, PayoutState, RejectionOutcome, RejectionResult},
        user::User,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::login,
        super::handlers::create_user,
        super::handlers::get_user,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::add_member_to_group,
        super::handlers::remove_member_from_group,
        super::handlers::get_group_audits,
        super::handlers::create_payout,
        super::handlers::get_payout,
        super::handlers::approve_payout,
        super::handlers::reject_payout,
        super::handlers::get_pending_payouts,
        super::handlers::expire_payouts,
        super::handlers::get_account_ledger,
        super::handlers::get_balance,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateUserRequest,
        LoginRequest,
        LoginResponse,
        CreateGroupRequest,
        AddMemberRequest,
        RemoveMemberRequest,
        CreatePayoutRequest,
        RejectPayoutRequest,
        BalanceResponse,
        ErrorResponse,
        User,
        Group,
        GroupMember,
        Role,
        PayoutRequest,
        PayoutState,
        ApprovalOutcome,
        ApprovalResult,
        RejectionOutcome,
        RejectionResult,
        LedgerEntry,
        AccountLedger,
        AppLog,
        GroupAudit
    )),
    modifiers(&SecurityAddon),
    info(
        title = "Cofund API",
        description = "API for co-guaranteed groups and threshold-approved payouts",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
