//! Quote provider adapter: broker data first, public data when the broker
//! is not configured, rejects the login, or comes back empty.

mod adapter;
mod auth;

pub use adapter::{QuoteLookup, QuoteProviderAdapter};
pub use auth::{ProviderAuthState, SamcoCredentials};
