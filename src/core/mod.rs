pub mod errors;
pub mod models;
pub mod payouts;
pub mod services;
