pub mod audit;
pub mod group;
pub mod ledger;
pub mod payout;
pub mod user;
