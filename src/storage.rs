//! The storage contract shared by all backends.
//!
//! [`Storage`] is the single seam through which the presentation-flow
//! endpoints and the trust-evaluation collaborator persist state. Physical
//! backends (the in-memory [`MemoryStore`](crate::MemoryStore), the Sea-ORM
//! backed [`SeaOrmStore`](crate::SeaOrmStore), or an external implementation
//! of this trait) are interchangeable without touching call sites.

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;

use crate::session::Session;
use crate::trust::TrustChainRecord;

/// Failures a storage operation can report.
///
/// Every failure is typed so callers can branch on it. [`Error::Backend`] is
/// the only transient kind and the only one worth retrying; all others
/// indicate a logic or correlation error in the flow and should propagate to
/// the endpoint layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `init_session` was called with an identifier that is already in use.
    #[error("a session with id `{0}` already exists")]
    DuplicateSession(String),

    /// No session matches the given identifier or correlation values.
    #[error("no session matches the given identifier or correlation values")]
    SessionNotFound,

    /// The given correlation values match more than one live session.
    #[error("correlation values match more than one session")]
    AmbiguousCorrelation,

    /// A response arrived for a session whose request object was never
    /// issued.
    #[error("session is not in a state that accepts this update")]
    InvalidTransition,

    /// The physical backend failed; the operation may be retried.
    #[error("backend error: {0}")]
    Backend(String),

    /// A record could not be serialized for storage.
    #[error("encode error: {0}")]
    Encode(String),

    /// A stored record could not be deserialized.
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Whether the failure is transient and the operation worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Persistence operations backing the presentation flow and the federation
/// trust evaluation.
///
/// A single backend instance is shared by all concurrently handled inbound
/// connections. Implementations must keep every operation atomic from the
/// callers' perspective: two racing `init_session` calls with the same id see
/// exactly one success, and readers never observe a half-written session or
/// chain.
///
/// # Trust chain freshness
///
/// [`find_chain`](Storage::find_chain) applies transparent expiry: a chain
/// whose `expires_at` has passed is reported as absent, exactly as if it had
/// never been stored. [`peek_chain`](Storage::peek_chain) and
/// [`has_chain`](Storage::has_chain) ignore expiry and see everything that is
/// physically present; they exist for metrics and debugging, not for trust
/// decisions.
#[async_trait]
pub trait Storage: Debug + Send + Sync + 'static {
    /// Opens a new session for a presentation exchange.
    ///
    /// The stored session starts in the [`Created`](crate::SessionStatus::Created)
    /// stage with a freshly generated correlation nonce, and carries the
    /// supplied proof-of-possession material unchanged for its whole
    /// lifetime.
    ///
    /// # Errors
    ///
    /// * [`Error::DuplicateSession`] if a session with `id` already exists.
    ///   The existing session is left untouched.
    /// * [`Error::Backend`] / [`Error::Encode`] from the physical backend.
    async fn init_session(&self, id: &str, dpop_proof: Value, attestation: Value)
        -> Result<Session>;

    /// Records the outgoing authorization request object for a session.
    ///
    /// The supplied `nonce` and `state` are the values actually embedded in
    /// the request handed to the wallet; they become authoritative for
    /// correlating the response leg. The session transitions to
    /// [`RequestIssued`](crate::SessionStatus::RequestIssued). Calling this
    /// again replaces the request object and the correlation values.
    ///
    /// # Errors
    ///
    /// * [`Error::SessionNotFound`] if no session with `id` exists.
    /// * [`Error::Backend`] / [`Error::Encode`] / [`Error::Decode`] from the
    ///   physical backend.
    async fn update_request_object(
        &self,
        id: &str,
        nonce: &str,
        state: Option<&str>,
        request_object: Value,
    ) -> Result<Session>;

    /// Records the wallet's response object.
    ///
    /// The responding party does not know the internal session identifier;
    /// it only echoes the nonce and state issued at request time, so the
    /// session is looked up by those correlation values instead. The session
    /// transitions to [`ResponseReceived`](crate::SessionStatus::ResponseReceived).
    ///
    /// # Errors
    ///
    /// * [`Error::SessionNotFound`] if no session matches `nonce`/`state`.
    /// * [`Error::AmbiguousCorrelation`] if more than one session matches;
    ///   the colliding sessions are left untouched.
    /// * [`Error::InvalidTransition`] if the matched session has no request
    ///   object yet.
    /// * [`Error::Backend`] / [`Error::Encode`] / [`Error::Decode`] from the
    ///   physical backend.
    async fn update_response_object(
        &self,
        nonce: &str,
        state: Option<&str>,
        response_object: Value,
    ) -> Result<Session>;

    /// Looks up a session by its identifier.
    ///
    /// Absence is a normal result, not an error.
    async fn find_session(&self, id: &str) -> Result<Option<Session>>;

    /// Returns the cached trust chain for an entity, if present **and still
    /// valid**.
    ///
    /// This is the hot-path read used while handling requests: an expired
    /// chain is reported as `None`, exactly as if it had never been stored,
    /// so callers can fall through to the federation resolver without
    /// inspecting timestamps themselves.
    async fn find_chain(&self, entity_id: &str) -> Result<Option<TrustChainRecord>>;

    /// Returns the stored trust chain record for an entity regardless of its
    /// expiration.
    ///
    /// Administrative companion to [`find_chain`](Storage::find_chain):
    /// useful for metrics and debugging, never for trust decisions. Check
    /// [`TrustChainRecord::status`] before relying on the result.
    async fn peek_chain(&self, entity_id: &str) -> Result<Option<TrustChainRecord>>;

    /// Whether a chain record is physically present for the entity, ignoring
    /// expiry.
    async fn has_chain(&self, entity_id: &str) -> Result<bool>;

    /// Stores the trust chain for an entity, replacing any previous record.
    ///
    /// The write is an idempotent upsert: storing the same chain and
    /// expiration twice leaves the same observable state as storing it once.
    /// Returns the identifier of the stored record (the entity id).
    async fn add_chain(
        &self,
        entity_id: &str,
        chain: Vec<String>,
        exp: OffsetDateTime,
    ) -> Result<String>;

    /// Replaces the trust chain for an entity.
    ///
    /// Behaviorally identical to [`add_chain`](Storage::add_chain); the
    /// federation resolver calls this after re-resolving a chain whether or
    /// not one is already cached.
    async fn update_chain(
        &self,
        entity_id: &str,
        chain: Vec<String>,
        exp: OffsetDateTime,
    ) -> Result<String>;
}

/// Reclamation of entries that have outlived their retention window.
///
/// Implemented by backends that can bulk-delete over-age sessions and
/// past-retention trust chain records, as configured by their
/// [`ExpiryPolicy`](crate::ExpiryPolicy).
#[async_trait]
pub trait ExpiredDeletion: Storage {
    /// Deletes all sessions older than the configured maximum age and all
    /// trust chain records past their retention window.
    async fn delete_expired(&self) -> Result<()>;

    /// Runs [`delete_expired`](ExpiredDeletion::delete_expired) every
    /// `period` until the task is dropped or an operation fails.
    ///
    /// ```no_run
    /// use openid4vp_storage::{ExpiredDeletion, MemoryStore};
    ///
    /// # async fn example() {
    /// let store = MemoryStore::new();
    /// tokio::task::spawn(
    ///     store
    ///         .clone()
    ///         .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    /// );
    /// # }
    /// ```
    async fn continuously_delete_expired(self, period: tokio::time::Duration) -> Result<()>
    where
        Self: Sized,
    {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.delete_expired().await?;
        }
    }
}
