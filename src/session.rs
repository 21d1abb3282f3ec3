//! Presentation session record.
//!
//! A [`Session`] tracks one in-flight credential presentation exchange across
//! the uncoordinated HTTP calls that make it up: the initial challenge (QR
//! code or redirect), the outgoing authorization request handed to the wallet,
//! and the wallet's eventual response. The record carries the wallet's
//! proof-of-possession material unchanged from creation, plus the nonce and
//! optional state value used to correlate the response leg back to the
//! request leg.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle stage of a presentation exchange.
///
/// The status is derived from which legs of the exchange have completed; it
/// is never stored separately and therefore can never disagree with the
/// session's contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The session exists but no authorization request has been built yet.
    Created,
    /// The authorization request object has been recorded and handed to the
    /// wallet.
    RequestIssued,
    /// The wallet's response has been recorded; the exchange is complete.
    ResponseReceived,
}

/// A single in-flight presentation exchange.
///
/// Sessions are created by [`Storage::init_session`](crate::Storage::init_session)
/// and advanced by the two update operations. The proof-of-possession fields
/// (`dpop_proof`, `attestation`) are set once at creation and never modified
/// afterwards. The `request_object` and `response_object` fields start out
/// absent and are filled in as the exchange progresses.
///
/// Backends hand out owned copies of this record; mutating a returned
/// `Session` has no effect on what the store holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Caller-supplied unique identifier for the exchange.
    pub id: String,
    /// DPoP proof presented by the wallet when the exchange was opened.
    pub dpop_proof: Value,
    /// Wallet instance attestation presented alongside the DPoP proof.
    pub attestation: Value,
    /// Correlation nonce. Generated at creation, replaced by the value that
    /// ends up inside the outgoing request object.
    pub nonce: String,
    /// Optional OAuth-style state value echoed back by the responder.
    pub state: Option<String>,
    /// The outgoing authorization request object, once built.
    pub request_object: Option<Value>,
    /// The wallet's response object, once received.
    pub response_object: Option<Value>,
    /// When the session was created.
    pub created_at: OffsetDateTime,
    /// When the session was last modified.
    pub updated_at: OffsetDateTime,
}

impl Session {
    /// Creates a fresh session in the [`SessionStatus::Created`] stage with a
    /// newly generated correlation nonce.
    pub fn new(id: impl Into<String>, dpop_proof: Value, attestation: Value) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            dpop_proof,
            attestation,
            nonce: Uuid::new_v4().to_string(),
            state: None,
            request_object: None,
            response_object: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives the lifecycle stage from the populated fields.
    pub fn status(&self) -> SessionStatus {
        if self.response_object.is_some() {
            SessionStatus::ResponseReceived
        } else if self.request_object.is_some() {
            SessionStatus::RequestIssued
        } else {
            SessionStatus::Created
        }
    }

    /// Records the outgoing request object together with the correlation
    /// values embedded in it. The supplied nonce becomes authoritative for
    /// response correlation.
    pub(crate) fn record_request(&mut self, nonce: &str, state: Option<&str>, request_object: Value) {
        self.nonce = nonce.to_owned();
        self.state = state.map(str::to_owned);
        self.request_object = Some(request_object);
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Records the wallet's response object.
    pub(crate) fn record_response(&mut self, response_object: Value) {
        self.response_object = Some(response_object);
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Whether the session's correlation values match the given pair.
    pub(crate) fn correlates_with(&self, nonce: &str, state: Option<&str>) -> bool {
        self.nonce == nonce && self.state.as_deref() == state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_follows_populated_fields() {
        let mut session = Session::new("doc-1", json!({}), json!({}));
        assert_eq!(session.status(), SessionStatus::Created);

        session.record_request("nonce-1", Some("state-1"), json!({"aud": "wallet"}));
        assert_eq!(session.status(), SessionStatus::RequestIssued);

        session.record_response(json!({"vp_token": "..."}));
        assert_eq!(session.status(), SessionStatus::ResponseReceived);
    }

    #[test]
    fn new_sessions_get_distinct_nonces() {
        let a = Session::new("doc-a", json!({}), json!({}));
        let b = Session::new("doc-b", json!({}), json!({}));
        assert_ne!(a.nonce, b.nonce);
    }
}
