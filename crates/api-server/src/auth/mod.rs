//! Accounts and session tokens

mod store;
mod token;

pub use store::{AuthError, AuthStore, UserSummary};
pub use token::{extract_bearer_token, Claims, TokenIssuer};
