pub mod auth;
pub mod diagnostics;
pub mod document;
pub mod health;
pub mod ws;

pub use auth::*;
pub use diagnostics::*;
pub use document::*;
pub use health::*;
pub use ws::*;
