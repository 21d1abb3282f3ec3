//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;

use crate::expiry::ExpiryPolicy;
use crate::session::Session;
use crate::storage::{Error, ExpiredDeletion, Result, Storage};
use crate::trust::{ChainStatus, TrustChainRecord};

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    /// Secondary index: correlation nonce -> ids of sessions carrying it.
    /// Maintained under the same lock as `sessions`, so the two can never
    /// disagree.
    nonce_index: HashMap<String, Vec<String>>,
    chains: HashMap<String, TrustChainRecord>,
}

/// A process-local [`Storage`] backend holding everything in mutex-guarded
/// maps.
///
/// Suitable for single-instance deployments and for tests. Cloning the store
/// is cheap and every clone shares the same underlying state, so one instance
/// can be handed to each request handler.
///
/// ```
/// use openid4vp_storage::{ExpiryPolicy, MemoryStore};
/// use time::Duration;
///
/// let store = MemoryStore::new().with_expiry_policy(ExpiryPolicy {
///     session_max_age: Duration::minutes(10),
///     chain_retention: Duration::hours(6),
/// });
/// # let _ = store;
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    policy: ExpiryPolicy,
}

impl MemoryStore {
    /// Creates an empty store with the default [`ExpiryPolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retention policy used by
    /// [`delete_expired`](ExpiredDeletion::delete_expired).
    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|e| Error::Backend(e.to_string()))
    }
}

fn unindex(nonce_index: &mut HashMap<String, Vec<String>>, nonce: &str, id: &str) {
    if let Some(ids) = nonce_index.get_mut(nonce) {
        ids.retain(|s| s != id);
        if ids.is_empty() {
            nonce_index.remove(nonce);
        }
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn init_session(
        &self,
        id: &str,
        dpop_proof: Value,
        attestation: Value,
    ) -> Result<Session> {
        let mut guard = self.lock()?;
        if guard.sessions.contains_key(id) {
            return Err(Error::DuplicateSession(id.to_owned()));
        }
        let session = Session::new(id, dpop_proof, attestation);
        guard
            .nonce_index
            .entry(session.nonce.clone())
            .or_default()
            .push(session.id.clone());
        guard.sessions.insert(session.id.clone(), session.clone());
        tracing::debug!(id = %session.id, "opened presentation session");
        Ok(session)
    }

    async fn update_request_object(
        &self,
        id: &str,
        nonce: &str,
        state: Option<&str>,
        request_object: Value,
    ) -> Result<Session> {
        let mut guard = self.lock()?;
        let Inner { sessions, nonce_index, .. } = &mut *guard;
        let session = sessions.get_mut(id).ok_or(Error::SessionNotFound)?;
        let previous_nonce = session.nonce.clone();
        session.record_request(nonce, state, request_object);
        if previous_nonce != nonce {
            unindex(nonce_index, &previous_nonce, id);
        }
        let ids = nonce_index.entry(nonce.to_owned()).or_default();
        if !ids.iter().any(|s| s == id) {
            ids.push(id.to_owned());
        }
        tracing::debug!(id, "recorded request object");
        Ok(session.clone())
    }

    async fn update_response_object(
        &self,
        nonce: &str,
        state: Option<&str>,
        response_object: Value,
    ) -> Result<Session> {
        let mut guard = self.lock()?;
        let Inner { sessions, nonce_index, .. } = &mut *guard;
        let matched: Vec<String> = nonce_index
            .get(nonce)
            .into_iter()
            .flatten()
            .filter(|id| {
                sessions
                    .get(*id)
                    .is_some_and(|s| s.correlates_with(nonce, state))
            })
            .cloned()
            .collect();
        let id = match matched.as_slice() {
            [] => return Err(Error::SessionNotFound),
            [id] => id,
            _ => return Err(Error::AmbiguousCorrelation),
        };
        let session = sessions.get_mut(id).ok_or(Error::SessionNotFound)?;
        if session.request_object.is_none() {
            return Err(Error::InvalidTransition);
        }
        session.record_response(response_object);
        tracing::debug!(id = %id, "recorded response object");
        Ok(session.clone())
    }

    async fn find_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.lock()?.sessions.get(id).cloned())
    }

    async fn find_chain(&self, entity_id: &str) -> Result<Option<TrustChainRecord>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .lock()?
            .chains
            .get(entity_id)
            .filter(|record| record.status_at(now) == ChainStatus::Valid)
            .cloned())
    }

    async fn peek_chain(&self, entity_id: &str) -> Result<Option<TrustChainRecord>> {
        Ok(self.lock()?.chains.get(entity_id).cloned())
    }

    async fn has_chain(&self, entity_id: &str) -> Result<bool> {
        Ok(self.lock()?.chains.contains_key(entity_id))
    }

    async fn add_chain(
        &self,
        entity_id: &str,
        chain: Vec<String>,
        exp: OffsetDateTime,
    ) -> Result<String> {
        let record = TrustChainRecord::new(entity_id, chain, exp);
        self.lock()?.chains.insert(entity_id.to_owned(), record);
        tracing::debug!(entity_id, "stored trust chain");
        Ok(entity_id.to_owned())
    }

    async fn update_chain(
        &self,
        entity_id: &str,
        chain: Vec<String>,
        exp: OffsetDateTime,
    ) -> Result<String> {
        self.add_chain(entity_id, chain, exp).await
    }
}

#[async_trait]
impl ExpiredDeletion for MemoryStore {
    async fn delete_expired(&self) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.lock()?;
        let Inner { sessions, nonce_index, chains } = &mut *guard;

        let sessions_before = sessions.len();
        sessions.retain(|_, s| !self.policy.session_evictable(s.created_at, now));
        if sessions.len() != sessions_before {
            nonce_index.clear();
            for (id, session) in sessions.iter() {
                nonce_index
                    .entry(session.nonce.clone())
                    .or_default()
                    .push(id.clone());
            }
        }

        let chains_before = chains.len();
        chains.retain(|_, c| !self.policy.chain_evictable(c.expires_at, now));

        tracing::debug!(
            sessions = sessions_before - sessions.len(),
            chains = chains_before - chains.len(),
            "evicted expired entries"
        );
        Ok(())
    }
}
