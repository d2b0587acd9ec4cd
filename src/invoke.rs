//! The cross-boundary call primitive consumed by the registration lifecycle.
//!
//! An [`Invoker`] is the only way the local side talks to the environment
//! that owns the key-event source. How the channel is established and what
//! transport carries the calls is entirely up to the embedder; this crate
//! only requires the two calls below plus the reverse paths on [`EntryRef`]
//! and the owner's key-down hook.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::EntryRef;
use crate::keys::{AllowIn, ModKeys};

/// Errors surfaced by attach and cross-boundary calls.
///
/// These never propagate to `add` callers; they are reported through the
/// context's diagnostics channel and tracing output.
#[derive(Clone, Debug, Error)]
pub enum InvokeError {
    /// The operation establishing the channel failed; every pending and
    /// future call chained on it fails with this.
    #[error("attach to the key event source failed: {0}")]
    Attach(Arc<str>),
    /// A register or unregister call failed after the channel was up.
    #[error("cross-boundary call failed: {0}")]
    Call(Arc<str>),
}

impl InvokeError {
    pub fn attach(message: impl AsRef<str>) -> Self {
        Self::Attach(Arc::from(message.as_ref()))
    }

    pub fn call(message: impl AsRef<str>) -> Self {
        Self::Call(Arc::from(message.as_ref()))
    }
}

/// The cross-boundary call primitive.
///
/// `register` hands the remote side everything it needs to match events and
/// to call back: the entry reference, the modifier mask, the key name as the
/// author supplied it, and the allow-in mask. It returns the remote
/// registration id.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn register(
        &self,
        entry_ref: EntryRef,
        mod_keys: ModKeys,
        key_name: &str,
        allow_in: AllowIn,
    ) -> Result<i32, InvokeError>;

    async fn unregister(&self, id: i32) -> Result<(), InvokeError>;
}

/// A shareable invoker handle, as produced by an attach operation.
pub type SharedInvoker = Arc<dyn Invoker>;

/// Spawn a fire-and-forget task on the current tokio runtime.
///
/// Registration, unregistration, and suspending actions all go through here;
/// none of them are awaited by their initiator.
pub(crate) fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => {
            tracing::warn!("no tokio runtime available, dropping hotkey background task");
        }
    }
}
