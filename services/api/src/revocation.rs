//! Process-wide revocation set for issued token identifiers
//!
//! Constructed once in `main` and injected through `AppState`. The set is
//! cleared on restart; the 24-hour token expiry subsumes revocation across
//! restarts.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Concurrent set of revoked token identifiers
#[derive(Debug, Clone, Default)]
pub struct RevocationList {
    revoked: Arc<RwLock<HashSet<Uuid>>>,
}

impl RevocationList {
    /// Create an empty revocation list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a token identifier as revoked
    ///
    /// Revoking the same `jti` twice is harmless.
    pub async fn revoke(&self, jti: Uuid) {
        self.revoked.write().await.insert(jti);
    }

    /// Check whether a token identifier has been revoked
    pub async fn is_revoked(&self, jti: &Uuid) -> bool {
        self.revoked.read().await.contains(jti)
    }
}
