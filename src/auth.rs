//! Credentials, bearer token secrets, resource identifiers, and the token manager.

pub mod credentials;
pub mod id;
pub mod manager;
pub mod secret;

pub use credentials::*;
pub use id::*;
pub use manager::*;
pub use secret::*;
