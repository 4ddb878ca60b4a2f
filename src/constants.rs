// Audit action names
pub const USER_ADDED: &str = "USER_ADDED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const PAYOUT_REQUESTED: &str = "PAYOUT_REQUESTED";
pub const PAYOUT_APPROVED: &str = "PAYOUT_APPROVED";
pub const PAYOUT_FINALIZED: &str = "PAYOUT_FINALIZED";
pub const PAYOUT_REJECTED: &str = "PAYOUT_REJECTED";
pub const PAYOUTS_EXPIRED: &str = "PAYOUTS_EXPIRED";

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_REASON_LENGTH: usize = 500;
pub const TOKEN_TTL_SECS: i64 = 3600;
