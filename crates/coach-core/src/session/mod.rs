//! Session state for credential stickiness.
//!
//! [`SessionContext`] is owned by the caller and passed explicitly to every
//! dispatch; [`SessionStore`] persists it (and the pools' round-robin
//! counters) between CLI invocations.
//!
//! # Disk format
//!
//! - `~/.coach/sessions/{safe_key}.json` — one [`SessionContext`] per session key
//! - `~/.coach/rotation.json` — the [`RotationLedger`]

pub mod store;

pub use store::{RotationLedger, SessionStore};

use serde::{Deserialize, Serialize};

use crate::types::CallPurpose;

/// Per-session dispatch state: which credential each pool should try first.
///
/// Indices may be stale (the pool can shrink between runs); the credential
/// pool re-validates them against its current size.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionContext {
    pub chat_credential: Option<usize>,
    pub document_credential: Option<usize>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sticky credential index remembered for `purpose`.
    pub fn sticky_index(&self, purpose: CallPurpose) -> Option<usize> {
        match purpose {
            CallPurpose::Chat => self.chat_credential,
            CallPurpose::Document => self.document_credential,
        }
    }

    /// Remember `index` as the preferred credential for `purpose`.
    pub fn remember(&mut self, purpose: CallPurpose, index: usize) {
        match purpose {
            CallPurpose::Chat => self.chat_credential = Some(index),
            CallPurpose::Document => self.document_credential = Some(index),
        }
    }

}
