//! Hotkey entries, their actions, and the cross-boundary entry reference.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::invoke::spawn_detached;
use crate::keys::{AllowIn, KeyName, ModKeys};

/// Sentinel id for an entry that is not currently registered remotely.
pub const UNREGISTERED_ID: i32 = -1;

/// The callback of a hotkey entry.
///
/// Four explicit shapes are supported, dispatched by variant rather than by
/// overload resolution: synchronous or suspending, with or without the entry
/// argument. Suspending actions are spawned fire-and-forget; nothing awaits
/// their completion.
pub enum HotKeyAction {
    /// Runs to completion synchronously.
    Sync(Box<dyn Fn() + Send + Sync>),
    /// Runs to completion synchronously and receives the entry.
    SyncWithEntry(Box<dyn Fn(&HotKeyEntry) + Send + Sync>),
    /// May suspend; spawned on the current runtime.
    Future(Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>),
    /// May suspend and receives the entry.
    FutureWithEntry(Box<dyn Fn(Arc<HotKeyEntry>) -> BoxFuture<'static, ()> + Send + Sync>),
}

impl HotKeyAction {
    pub fn sync(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self::Sync(Box::new(f))
    }

    pub fn sync_with_entry(f: impl Fn(&HotKeyEntry) + Send + Sync + 'static) -> Self {
        Self::SyncWithEntry(Box::new(f))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        Self::Future(Box::new(move || f().boxed()))
    }

    pub fn future_with_entry<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<HotKeyEntry>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        Self::FutureWithEntry(Box::new(move |entry| f(entry).boxed()))
    }

    fn invoke(&self, entry: &Arc<HotKeyEntry>) {
        match self {
            Self::Sync(f) => f(),
            Self::SyncWithEntry(f) => f(entry),
            Self::Future(f) => spawn_detached(f()),
            Self::FutureWithEntry(f) => spawn_detached(f(Arc::clone(entry))),
        }
    }
}

impl fmt::Debug for HotKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync(_) => "HotKeyAction::Sync",
            Self::SyncWithEntry(_) => "HotKeyAction::SyncWithEntry",
            Self::Future(_) => "HotKeyAction::Future",
            Self::FutureWithEntry(_) => "HotKeyAction::FutureWithEntry",
        })
    }
}

/// One registered hotkey: key + modifiers + allow-in policy + action.
///
/// Entries are write-once with respect to their descriptor; only the remote
/// registration id and the entry reference slot change over their lifetime.
pub struct HotKeyEntry {
    mod_keys: ModKeys,
    key_name: KeyName,
    allow_in: AllowIn,
    description: String,
    action: HotKeyAction,
    id: AtomicI32,
    entry_ref: Mutex<Option<EntryRef>>,
}

impl HotKeyEntry {
    pub(crate) fn new(
        mod_keys: ModKeys,
        key_name: KeyName,
        allow_in: AllowIn,
        description: String,
        action: HotKeyAction,
    ) -> Self {
        Self {
            mod_keys,
            key_name,
            allow_in,
            description,
            action,
            id: AtomicI32::new(UNREGISTERED_ID),
            entry_ref: Mutex::new(None),
        }
    }

    pub fn mod_keys(&self) -> ModKeys {
        self.mod_keys
    }

    pub fn key_name(&self) -> &KeyName {
        &self.key_name
    }

    pub fn allow_in(&self) -> AllowIn {
        self.allow_in
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The remote registration id, or [`UNREGISTERED_ID`] while this entry is
    /// not registered.
    pub fn id(&self) -> i32 {
        self.id.load(Ordering::SeqCst)
    }

    pub fn is_registered(&self) -> bool {
        self.id() != UNREGISTERED_ID
    }

    pub(crate) fn set_id(&self, id: i32) {
        self.id.store(id, Ordering::SeqCst);
    }

    pub(crate) fn store_ref(&self, entry_ref: EntryRef) {
        *self.entry_ref.lock() = Some(entry_ref);
    }

    pub(crate) fn take_ref(&self) -> Option<EntryRef> {
        self.entry_ref.lock().take()
    }
}

impl fmt::Debug for HotKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotKeyEntry")
            .field("mod_keys", &self.mod_keys)
            .field("key_name", &self.key_name)
            .field("allow_in", &self.allow_in)
            .field("description", &self.description)
            .field("id", &self.id())
            .finish()
    }
}

impl fmt::Display for HotKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.mod_keys.is_empty() {
            write!(f, "{} + ", self.mod_keys)?;
        }
        f.write_str(self.key_name.as_str())?;
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        Ok(())
    }
}

/// An opaque handle that lets the remote side invoke back into one entry.
///
/// The entry owns its reference; it is created when registration is initiated
/// and revoked exactly once, at unregistration, regardless of whether the
/// remote call succeeded. Clones held by the remote side after revocation
/// turn `invoke_action` into a no-op.
#[derive(Clone)]
pub struct EntryRef {
    inner: Arc<RefInner>,
}

struct RefInner {
    entry: Weak<HotKeyEntry>,
    revoked: AtomicBool,
}

impl EntryRef {
    pub(crate) fn new(entry: &Arc<HotKeyEntry>) -> Self {
        Self {
            inner: Arc::new(RefInner {
                entry: Arc::downgrade(entry),
                revoked: AtomicBool::new(false),
            }),
        }
    }

    /// Invoke the entry's action. Returns `false` when the reference has been
    /// revoked or the entry no longer exists.
    pub fn invoke_action(&self) -> bool {
        if self.inner.revoked.load(Ordering::SeqCst) {
            return false;
        }
        match self.inner.entry.upgrade() {
            Some(entry) => {
                entry.action.invoke(&entry);
                true
            }
            None => false,
        }
    }

    pub(crate) fn revoke(&self) {
        self.inner.revoked.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("revoked", &self.inner.revoked.load(Ordering::SeqCst))
            .finish()
    }
}
