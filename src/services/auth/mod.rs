pub mod claims;
pub mod factory;
pub mod key;
pub mod principal;
pub mod user_provider;
pub mod verifier;

pub use claims::Claims;
pub use factory::build_token_verifier;
pub use principal::{Principal, VerifiedToken};
pub use user_provider::{UserProvider, UserRecord, UserStoreError};
pub use verifier::{AuthError, TokenVerifier};
