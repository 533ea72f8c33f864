//! Static API key authentication.
//!
//! Every protected route requires `Authorization: ApiKey <key>`. The key is
//! loaded once at startup and compared for exact equality; there is no expiry,
//! rotation, or multi-tenancy.

use thiserror::Error;

/// Authorization scheme expected in front of the key
const SCHEME: &str = "ApiKey";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing or invalid API key")]
    Unauthorized,
}

/// Validates the `Authorization` header against the configured key.
///
/// Stateless given the key; safe to share across requests.
#[derive(Debug, Clone)]
pub struct Authenticator {
    api_key: String,
}

impl Authenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Accept only the exact form `ApiKey <configured_key>`.
    ///
    /// A missing header, any other scheme, or a mismatched key is rejected.
    pub fn authenticate(&self, header_value: Option<&str>) -> Result<(), AuthError> {
        let value = header_value.ok_or(AuthError::Unauthorized)?;
        let (scheme, key) = value.split_once(' ').ok_or(AuthError::Unauthorized)?;
        if scheme != SCHEME || key != self.api_key {
            return Err(AuthError::Unauthorized);
        }
        Ok(())
    }
}
