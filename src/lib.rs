pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::CofundError;
pub use crate::core::payouts::{PayoutEngine, PayoutPolicy};
pub use crate::core::services::{CofundService, ServiceSettings};
pub use crate::infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
