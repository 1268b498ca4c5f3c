//! The dispatch seam used by task helpers and the CLI.

use async_trait::async_trait;
use coach_core::session::SessionContext;
use coach_core::types::{CallPurpose, ChatMessage, GenerationParams};

use crate::error::DispatchError;

/// Anything that can turn a conversation into model text.
///
/// [`Dispatcher`](crate::Dispatcher) is the real implementation; tests plug
/// in scripted fakes.
#[async_trait]
pub trait ChatDispatch: Send + Sync {
    /// Send `messages` and return the model's raw text.
    ///
    /// `ctx` carries the caller's sticky credential indices and is updated in
    /// place when a different credential wins.
    async fn complete(
        &self,
        ctx: &mut SessionContext,
        purpose: CallPurpose,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, DispatchError>;
}
