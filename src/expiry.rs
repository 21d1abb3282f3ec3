//! Storage retention policy.
//!
//! Trust validity is always judged against a chain's own `expires_at`; the
//! policy here governs the orthogonal question of when entries are physically
//! reclaimed from a backend.

use time::{Duration, OffsetDateTime};

/// How long the backends keep entries around before
/// [`ExpiredDeletion::delete_expired`](crate::ExpiredDeletion::delete_expired)
/// reclaims them.
///
/// Sessions are ephemeral: one presentation exchange takes seconds to
/// minutes, so anything older than `session_max_age` is abandoned and safe to
/// purge. Trust chain records stay visible to the administrative read paths
/// for `chain_retention` past their expiration before they are reclaimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Maximum age of a session, measured from its creation.
    pub session_max_age: Duration,
    /// How long an expired trust chain record remains stored past its
    /// `expires_at`.
    pub chain_retention: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            session_max_age: Duration::hours(1),
            chain_retention: Duration::hours(24),
        }
    }
}

impl ExpiryPolicy {
    /// Sessions created at or before this instant are due for eviction.
    pub fn session_deadline(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.session_max_age
    }

    /// Chain records whose `expires_at` lies at or before this instant are
    /// due for eviction.
    pub fn chain_deadline(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.chain_retention
    }

    /// Whether a session created at `created_at` has outlived its retention.
    pub fn session_evictable(&self, created_at: OffsetDateTime, now: OffsetDateTime) -> bool {
        created_at <= self.session_deadline(now)
    }

    /// Whether a chain record expiring at `expires_at` has outlived its
    /// retention.
    pub fn chain_evictable(&self, expires_at: OffsetDateTime, now: OffsetDateTime) -> bool {
        expires_at <= self.chain_deadline(now)
    }
}
