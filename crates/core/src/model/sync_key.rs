use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted key length after trimming.
pub const MIN_KEY_LEN: usize = 10;
/// Maximum accepted key length after trimming.
pub const MAX_KEY_LEN: usize = 128;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncKeyError {
    #[error("sync key must be {MIN_KEY_LEN}-{MAX_KEY_LEN} characters after trimming")]
    InvalidLength,
}

/// Opaque bearer token identifying one progress record on the remote store.
///
/// No account backs it; possession of the key is the whole credential. A
/// value of this type is always within the accepted length bounds, so a
/// malformed key can never reach the network layer.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SyncKey(String);

impl SyncKey {
    /// Generate a fresh random key (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate an externally supplied key: trim, then require a length
    /// within `[MIN_KEY_LEN, MAX_KEY_LEN]`.
    ///
    /// # Errors
    ///
    /// Returns `SyncKeyError::InvalidLength` when the trimmed input falls
    /// outside the bounds.
    pub fn parse(raw: &str) -> Result<Self, SyncKeyError> {
        let trimmed = raw.trim();
        if trimmed.len() < MIN_KEY_LEN || trimmed.len() > MAX_KEY_LEN {
            return Err(SyncKeyError::InvalidLength);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SyncKey {
    type Error = SyncKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SyncKey> for String {
    fn from(key: SyncKey) -> Self {
        key.0
    }
}

// The key is a bearer secret; keep it out of debug logs.
impl fmt::Debug for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "SyncKey({prefix}…)")
    }
}
