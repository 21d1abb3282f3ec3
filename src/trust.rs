//! Cached federation trust chains.
//!
//! A [`TrustChainRecord`] holds the most recently resolved trust chain for a
//! federation entity together with its expiration. The chain itself is an
//! ordered sequence of signed statements, leaf first, trust anchor last;
//! resolving and verifying it is the job of an external collaborator, this
//! crate only caches the outcome.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Trust validity of a cached chain, derived from its expiration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainStatus {
    /// The chain's expiration lies in the future; it may be used as trust
    /// evidence.
    Valid,
    /// The chain's expiration has passed. It may still be physically present
    /// until evicted, but must not back any trust decision.
    Expired,
}

/// The cached trust chain for a single federation entity.
///
/// At most one record exists per entity identifier at any time;
/// [`Storage::add_chain`](crate::Storage::add_chain) and
/// [`Storage::update_chain`](crate::Storage::update_chain) replace rather
/// than append.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustChainRecord {
    /// Identifier of the federation entity the chain vouches for.
    pub entity_id: String,
    /// Ordered signed statements, leaf to trust anchor.
    pub chain: Vec<String>,
    /// Instant after which the chain no longer counts as trust evidence.
    pub expires_at: OffsetDateTime,
}

impl TrustChainRecord {
    pub fn new(
        entity_id: impl Into<String>,
        chain: Vec<String>,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self { entity_id: entity_id.into(), chain, expires_at }
    }

    /// Derives the trust validity of this record at the given instant.
    pub fn status_at(&self, now: OffsetDateTime) -> ChainStatus {
        if self.expires_at <= now {
            ChainStatus::Expired
        } else {
            ChainStatus::Valid
        }
    }

    /// Derives the trust validity of this record right now.
    pub fn status(&self) -> ChainStatus {
        self.status_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn status_is_derived_from_expiration() {
        let now = OffsetDateTime::now_utc();
        let record = TrustChainRecord::new("https://idp.example", vec!["leaf".into()], now + Duration::hours(1));
        assert_eq!(record.status_at(now), ChainStatus::Valid);
        assert_eq!(record.status_at(now + Duration::hours(2)), ChainStatus::Expired);
        // The boundary instant itself already counts as expired.
        assert_eq!(record.status_at(now + Duration::hours(1)), ChainStatus::Expired);
    }
}
