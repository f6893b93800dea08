pub mod password;
pub mod token;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use token::{Claims, JwtAuthenticator};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("invalid password hash format: {0}")]
    InvalidHash(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id")]
    InvalidSubject,
}
