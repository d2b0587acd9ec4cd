//! Registration lifecycle: contexts, the shared attach operation, and the
//! fire-and-forget register/unregister protocol.
//!
//! A [`HotKeys`] value owns the pending attach operation that produces the
//! [`Invoker`](crate::invoke::Invoker). Contexts created from it append
//! entries synchronously; every append initiates an asynchronous remote
//! registration chained on the attach future. Disposal initiates
//! unregistration for every entry and returns without blocking.
//!
//! Registration failures never reach the `add` caller. They surface on the
//! context's diagnostics channel and as tracing output, and are never
//! retried.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::dispatch::{HotKeyDownArgs, KeyDownHook};
use crate::entry::{EntryRef, HotKeyAction, HotKeyEntry, UNREGISTERED_ID};
use crate::invoke::{spawn_detached, InvokeError, SharedInvoker};
use crate::keys::{AllowIn, KeyName, ModKeys};

pub(crate) type AttachFuture = Shared<BoxFuture<'static, Result<SharedInvoker, InvokeError>>>;

/// Capacity of the per-context diagnostics channel. Events are dropped, not
/// blocked on, when nobody drains them.
const DIAGNOSTICS_CAPACITY: usize = 32;

type KeyDownHandler = Box<dyn Fn(&HotKeyDownArgs) -> bool + Send + Sync>;

/// Entry point for declaring hotkeys against one key-event source.
///
/// Holds the attach operation for its lifetime; every context created from
/// this value chains its remote calls on the same pending attach. Also acts
/// as the owner-side target of the per-keydown reverse notification.
pub struct HotKeys {
    attach: AttachFuture,
    key_down_handler: Mutex<Option<KeyDownHandler>>,
}

impl HotKeys {
    /// Bind to a pending attach operation.
    ///
    /// The future is polled lazily and shared: the first registration drives
    /// it, later ones reuse the resolved invoker. An attach failure fails
    /// every pending and future registration independently.
    pub fn new<F>(attach: F) -> Self
    where
        F: Future<Output = anyhow::Result<SharedInvoker>> + Send + 'static,
    {
        let attach = async move {
            attach
                .await
                .map_err(|e| InvokeError::attach(format!("{e:#}")))
        }
        .boxed()
        .shared();
        Self {
            attach,
            key_down_handler: Mutex::new(None),
        }
    }

    /// Bind to an already-attached invoker.
    pub fn with_invoker(invoker: SharedInvoker) -> Self {
        Self::new(async move { Ok(invoker) })
    }

    /// Create a context that owns the registration lifecycle of the entries
    /// added to it.
    pub fn create_context(&self) -> HotKeysContext {
        HotKeysContext::new(self.attach.clone())
    }

    /// Install the handler for the per-keydown notification coming back from
    /// the key-event source. The handler's return value requests suppression
    /// of the event's default action, independent of entry matching.
    pub fn set_key_down_handler(
        &self,
        handler: impl Fn(&HotKeyDownArgs) -> bool + Send + Sync + 'static,
    ) {
        *self.key_down_handler.lock() = Some(Box::new(handler));
    }

    /// Target of the reverse `on_key_down` call, invoked once per key-down
    /// regardless of how many entries matched on the originating side.
    pub fn handle_key_down(&self, args: &HotKeyDownArgs) -> bool {
        match &*self.key_down_handler.lock() {
            Some(handler) => handler(args),
            None => false,
        }
    }
}

impl KeyDownHook for HotKeys {
    fn on_key_down(&self, args: &HotKeyDownArgs) -> bool {
        self.handle_key_down(args)
    }
}

/// Optional metadata for a hotkey entry.
#[derive(Debug, Default)]
pub struct HotKeyOptions {
    /// Free text with no behavioral effect.
    pub description: String,
    /// Focus contexts in which the entry still fires; empty means "only
    /// outside text-entry elements".
    pub allow_in: AllowIn,
}

/// Registration outcome events for one context.
///
/// This is the optional diagnostic channel: exactly one terminal event per
/// registration attempt, one per resolved unregistration.
#[derive(Clone, Debug)]
pub enum HotKeyDiagnostic {
    /// The remote register call succeeded.
    Registered { id: i32, key_name: KeyName },
    /// Attach or the remote register call failed; the entry stays
    /// unregistered and is not retried.
    RegistrationFailed {
        key_name: KeyName,
        error: InvokeError,
    },
    /// Unregistration resolved; local bookkeeping was reset regardless of
    /// the remote call's outcome.
    Unregistered { id: i32, key_name: KeyName },
}

/// An ordered collection of hotkey entries owning their registration
/// lifecycle, bound to exactly one attach operation for its entire lifetime.
pub struct HotKeysContext {
    attach: AttachFuture,
    keys: Mutex<Vec<Arc<HotKeyEntry>>>,
    diagnostics: (
        async_channel::Sender<HotKeyDiagnostic>,
        async_channel::Receiver<HotKeyDiagnostic>,
    ),
}

impl HotKeysContext {
    pub(crate) fn new(attach: AttachFuture) -> Self {
        Self {
            attach,
            keys: Mutex::new(Vec::new()),
            diagnostics: async_channel::bounded(DIAGNOSTICS_CAPACITY),
        }
    }

    /// Add a hotkey entry with default options.
    ///
    /// Always succeeds synchronously; the remote registration is initiated
    /// but not awaited. The returned handle stays valid for the life of the
    /// context.
    pub fn add(
        &self,
        mod_keys: ModKeys,
        key: impl Into<KeyName>,
        action: HotKeyAction,
    ) -> Arc<HotKeyEntry> {
        self.add_with_options(mod_keys, key, action, HotKeyOptions::default())
    }

    /// Add a hotkey entry with a description and allow-in mask.
    pub fn add_with_options(
        &self,
        mod_keys: ModKeys,
        key: impl Into<KeyName>,
        action: HotKeyAction,
        options: HotKeyOptions,
    ) -> Arc<HotKeyEntry> {
        let entry = Arc::new(HotKeyEntry::new(
            mod_keys,
            key.into(),
            options.allow_in,
            options.description,
            action,
        ));
        self.keys.lock().push(Arc::clone(&entry));
        self.register(Arc::clone(&entry));
        entry
    }

    /// Handles to all entries added to this context, in registration order.
    pub fn entries(&self) -> Vec<Arc<HotKeyEntry>> {
        self.keys.lock().clone()
    }

    /// Receiver for this context's registration outcome events.
    ///
    /// Events are delivered best-effort over a bounded channel; when nobody
    /// drains it, new events are dropped rather than blocking the lifecycle
    /// tasks.
    pub fn diagnostics(&self) -> async_channel::Receiver<HotKeyDiagnostic> {
        self.diagnostics.1.clone()
    }

    /// Initiate unregistration for every entry and clear the collection.
    ///
    /// Returns before the unregistration calls complete. A key event that
    /// arrives after this returns but before an entry's unregistration
    /// resolves may still invoke that entry's action once; this window is
    /// accepted, not eliminated.
    pub fn dispose(&self) {
        let entries = std::mem::take(&mut *self.keys.lock());
        for entry in entries {
            self.unregister(entry);
        }
    }

    fn register(&self, entry: Arc<HotKeyEntry>) {
        let entry_ref = EntryRef::new(&entry);
        entry.store_ref(entry_ref.clone());

        let attach = self.attach.clone();
        let diagnostics = self.diagnostics.0.clone();
        spawn_detached(async move {
            let outcome = async {
                let invoker = attach.await?;
                invoker
                    .register(
                        entry_ref,
                        entry.mod_keys(),
                        entry.key_name().as_str(),
                        entry.allow_in(),
                    )
                    .await
            }
            .await;

            let event = match outcome {
                Ok(id) => {
                    entry.set_id(id);
                    tracing::debug!(key = %entry.key_name(), id, "registered hotkey");
                    HotKeyDiagnostic::Registered {
                        id,
                        key_name: entry.key_name().clone(),
                    }
                }
                Err(error) => {
                    tracing::warn!(key = %entry.key_name(), %error, "hotkey registration failed");
                    HotKeyDiagnostic::RegistrationFailed {
                        key_name: entry.key_name().clone(),
                        error,
                    }
                }
            };
            if diagnostics.try_send(event).is_err() {
                tracing::debug!("hotkey diagnostics channel full or closed");
            }
        });
    }

    fn unregister(&self, entry: Arc<HotKeyEntry>) {
        let id = entry.id();
        if id == UNREGISTERED_ID {
            return;
        }

        let attach = self.attach.clone();
        let diagnostics = self.diagnostics.0.clone();
        spawn_detached(async move {
            let outcome = async {
                let invoker = attach.await?;
                invoker.unregister(id).await
            }
            .await;
            if let Err(error) = outcome {
                tracing::warn!(key = %entry.key_name(), id, %error, "hotkey unregistration failed");
            }

            // Local bookkeeping proceeds regardless of the remote outcome.
            entry.set_id(UNREGISTERED_ID);
            if let Some(entry_ref) = entry.take_ref() {
                entry_ref.revoke();
            }
            tracing::debug!(key = %entry.key_name(), id, "unregistered hotkey");

            let event = HotKeyDiagnostic::Unregistered {
                id,
                key_name: entry.key_name().clone(),
            };
            if diagnostics.try_send(event).is_err() {
                tracing::debug!("hotkey diagnostics channel full or closed");
            }
        });
    }
}

impl Drop for HotKeysContext {
    fn drop(&mut self) {
        self.dispose();
    }
}
