//! Dispatch layer for Interview Coach.
//!
//! Turns a provider-agnostic conversation into Gemini text, preferring a
//! server-side proxy and falling back to direct calls with a rotating pool
//! of API keys.
//!
//! # Architecture
//!
//! - [`traits::ChatDispatch`] — the seam task helpers depend on
//! - [`dispatcher::Dispatcher`] — proxy-first transport selection and retry
//! - [`credentials`] — per-purpose key pools with session-sticky rotation
//! - [`classify`] — data-driven failure classification tables
//! - [`translate`] — `ChatMessage` → Gemini `contents`
//! - [`repair`] — recovery of truncated / fenced JSON from model output

pub mod classify;
pub mod credentials;
pub mod direct;
pub mod dispatcher;
pub mod error;
pub mod proxy;
pub mod repair;
pub mod retry;
pub mod traits;
pub mod translate;

// Re-export main types for convenience
pub use classify::{Disposition, ErrorClass};
pub use credentials::CredentialPool;
pub use dispatcher::{create_dispatcher, Dispatcher};
pub use error::DispatchError;
pub use repair::{parse_model_json, repair_json};
pub use retry::RetryPolicy;
pub use traits::ChatDispatch;
pub use translate::translate;
