//! Interview Coach core — shared types, configuration, and session state.
//!
//! - [`types`] — `ChatMessage`, `Role`, generation params, provider/proxy wire shapes
//! - [`config`] — `~/.coach/config.json` schema, loader, env overrides
//! - [`session`] — caller-owned `SessionContext` and its on-disk store
//! - [`utils`] — paths, truncation, key masking

pub mod config;
pub mod session;
pub mod types;
pub mod utils;

pub use session::{SessionContext, SessionStore};
pub use types::{CallPurpose, ChatMessage, GenerationParams, Role};
