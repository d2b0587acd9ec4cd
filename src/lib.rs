//! Hotkey registration and key-event matching across an asynchronous
//! boundary.
//!
//! One side of the boundary declares shortcuts; the other side owns the
//! native key-event source. The two communicate only through asynchronous
//! cross-boundary calls, abstracted by the [`Invoker`] trait.
//!
//! - [`HotKeys`] / [`HotKeysContext`] live on the declaring side: entries are
//!   added synchronously, registered remotely fire-and-forget once the
//!   attach operation resolves, and unregistered on [`HotKeysContext::dispose`].
//! - [`HotKeyDispatcher`] lives on the event-source side: it normalizes each
//!   raw key-down, filters by focused element, invokes every matching
//!   entry's action through its [`EntryRef`], and reports whether the
//!   event's default action should be suppressed.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hotkey_bridge::{
//!     HotKeyAction, HotKeyDispatcher, HotKeys, KeyDownEvent, LoopbackInvoker, ModKeys,
//! };
//!
//! let dispatcher = Arc::new(parking_lot::Mutex::new(HotKeyDispatcher::new()));
//! let hotkeys = HotKeys::with_invoker(Arc::new(LoopbackInvoker::new(dispatcher.clone())));
//!
//! let ctx = hotkeys.create_context();
//! ctx.add(ModKeys::CTRL, "S", HotKeyAction::sync(|| println!("save")));
//!
//! // On the event-source side, per native key-down:
//! let suppress = dispatcher.lock()
//!     .handle_key_down(&KeyDownEvent::new(ModKeys::CTRL, "s", "KeyS"));
//! ```

pub mod context;
pub mod dispatch;
pub mod entry;
pub mod invoke;
pub mod keys;
pub mod logging;
pub mod normalize;


pub use context::{HotKeyDiagnostic, HotKeyOptions, HotKeys, HotKeysContext};
pub use dispatch::{
    is_allowed_in, FocusTag, HotKeyDispatcher, HotKeyDownArgs, KeyDownEvent, KeyDownHook,
    LoopbackInvoker,
};
pub use entry::{EntryRef, HotKeyAction, HotKeyEntry, UNREGISTERED_ID};
pub use invoke::{InvokeError, Invoker, SharedInvoker};
pub use keys::{AllowIn, Key, KeyName, ModKeys};
pub use normalize::{fix_key_name_typo, key_name_from_event};
