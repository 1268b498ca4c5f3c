//! Credential pools and per-session rotation.
//!
//! A [`CredentialPool`] holds the API keys for one [`CallPurpose`]. Each
//! session remembers the index that last worked (its *sticky index*, kept in
//! the caller's [`SessionContext`]); sessions without one are fanned out over
//! the pool by a round-robin counter that outlives any single session.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use coach_core::session::SessionContext;
use coach_core::types::CallPurpose;
use coach_core::utils::mask_key;
use tracing::{debug, info, warn};

use crate::classify::ErrorClass;
use crate::error::{DispatchError, Failure};

/// Ordered API keys for one call purpose.
#[derive(Debug)]
pub struct CredentialPool {
    purpose: CallPurpose,
    keys: Vec<String>,
    next_assignment: AtomicUsize,
}

/// Why a rotation sweep produced no result.
#[derive(Debug)]
pub enum SweepError {
    /// The pool has no keys; nothing was attempted.
    Empty(CallPurpose),
    /// A terminal failure stopped the sweep early.
    Aborted(Failure),
    /// Every key failed with a failover-eligible error, in attempt order.
    Exhausted(Vec<Failure>),
}

impl SweepError {
    /// The failure that decides whether waiting and sweeping again can help.
    ///
    /// Classes are ranked by [`ErrorClass::BACKOFF_PRIORITY`]; the longest
    /// hint of the best-ranked class wins. `None` when no failure is backoff
    /// eligible, e.g. only auth failures were seen.
    pub fn backoff_failure(&self) -> Option<&Failure> {
        let SweepError::Exhausted(failures) = self else {
            return None;
        };
        failures
            .iter()
            .filter(|f| f.class.is_backoff_eligible())
            .max_by_key(|f| (backoff_rank(f.class), f.retry_after))
    }
}

/// Higher is preferred.
fn backoff_rank(class: ErrorClass) -> usize {
    let position = ErrorClass::BACKOFF_PRIORITY
        .iter()
        .position(|c| *c == class)
        .unwrap_or(ErrorClass::BACKOFF_PRIORITY.len());
    ErrorClass::BACKOFF_PRIORITY.len() - position
}

impl From<SweepError> for DispatchError {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::Empty(purpose) => DispatchError::NotConfigured(purpose),
            SweepError::Aborted(failure) => failure.into(),
            SweepError::Exhausted(mut failures) => match failures.pop() {
                Some(last) => last.into(),
                None => DispatchError::Provider {
                    status: None,
                    message: "no credential attempted".to_string(),
                },
            },
        }
    }
}

impl CredentialPool {
    /// Build a pool. Blank keys are dropped; order is kept.
    pub fn new(purpose: CallPurpose, keys: impl IntoIterator<Item = String>) -> Self {
        let keys = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            purpose,
            keys,
            next_assignment: AtomicUsize::new(0),
        }
    }

    /// Resume the round-robin counter (e.g. from a persisted ledger).
    pub fn with_next_assignment(self, next: usize) -> Self {
        self.next_assignment.store(next, Ordering::Relaxed);
        self
    }

    pub fn purpose(&self) -> CallPurpose {
        self.purpose
    }

    /// Current value of the round-robin counter.
    pub fn next_assignment(&self) -> usize {
        self.next_assignment.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys safe to print.
    pub fn masked_keys(&self) -> Vec<String> {
        self.keys.iter().map(|k| mask_key(k)).collect()
    }

    /// Index this session should start from.
    ///
    /// Reuses the sticky index when it is still in range; otherwise assigns
    /// the next round-robin slot and remembers it in `ctx`.
    pub fn session_index(&self, ctx: &mut SessionContext) -> Option<usize> {
        let len = self.keys.len();
        if len == 0 {
            return None;
        }
        if let Some(idx) = ctx.sticky_index(self.purpose).filter(|&i| i < len) {
            return Some(idx);
        }
        let idx = self.next_assignment.fetch_add(1, Ordering::Relaxed) % len;
        debug!(purpose = %self.purpose, index = idx, "Assigned credential to session");
        ctx.remember(self.purpose, idx);
        Some(idx)
    }

    /// Run one sweep: call `call` with each key, starting at the session's
    /// sticky index and wrapping around, until one succeeds.
    ///
    /// Failover-eligible failures move on to the next key; any other failure
    /// aborts the sweep. The winning index becomes the new sticky index.
    pub async fn rotate<T, F, Fut>(
        &self,
        ctx: &mut SessionContext,
        mut call: F,
    ) -> Result<T, SweepError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        let Some(start) = self.session_index(ctx) else {
            return Err(SweepError::Empty(self.purpose));
        };
        let len = self.keys.len();
        let mut failures = Vec::new();

        for offset in 0..len {
            let idx = (start + offset) % len;
            let key = &self.keys[idx];
            debug!(
                purpose = %self.purpose,
                credential = %mask_key(key),
                attempt = offset + 1,
                "Trying credential"
            );

            match call(key.clone()).await {
                Ok(value) => {
                    if offset > 0 {
                        info!(purpose = %self.purpose, index = idx, "Switched sticky credential");
                    }
                    ctx.remember(self.purpose, idx);
                    return Ok(value);
                }
                Err(failure) if failure.class.is_failover_eligible() => {
                    warn!(
                        purpose = %self.purpose,
                        credential = %mask_key(key),
                        class = ?failure.class,
                        error = %failure,
                        "Credential failed, rotating"
                    );
                    failures.push(failure);
                }
                Err(failure) => return Err(SweepError::Aborted(failure)),
            }
        }

        Err(SweepError::Exhausted(failures))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
