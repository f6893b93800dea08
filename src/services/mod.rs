pub mod auth_service;
pub mod user_cache;

pub use user_cache::UserCache;
