//! Remote-side match engine: per-event normalization, focus filtering, and
//! entry dispatch.
//!
//! The dispatcher lives on the side that owns the key-event source. One
//! logical event loop drives capture, normalization, and dispatch in
//! sequence, so `handle_key_down` is never called concurrently for the same
//! event stream. Records are kept in registration order (Vec, the same
//! deterministic-iteration choice as the local entry collection); the id
//! counter increments for the lifetime of the dispatcher and resets only
//! when the remote side restarts.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entry::EntryRef;
use crate::invoke::{InvokeError, Invoker};
use crate::keys::{AllowIn, ModKeys};
use crate::normalize::{fix_key_name_typo, key_name_from_event};

/// Single-line input types that count as non-text for the allow-in filter.
const NON_TEXT_INPUT_TYPES: [&str; 9] = [
    "button", "checkbox", "color", "file", "image", "radio", "range", "reset", "submit",
];

/// Kind of element holding focus when a key event fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusTag {
    /// No element has focus.
    #[default]
    None,
    /// A single-line input; its type string decides text vs non-text.
    Input,
    /// A multi-line text container.
    TextArea,
    /// Anything else; never suppresses hotkeys.
    Other,
}

/// A native key-down event as delivered to the dispatcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyDownEvent {
    pub mod_keys: ModKeys,
    /// The raw logical key (`key` field of the native event).
    pub key: String,
    /// The raw physical key (`code` field); empty when not reported.
    pub code: String,
    #[serde(default)]
    pub tag: FocusTag,
    /// The focused input's type attribute, when `tag` is `Input`.
    #[serde(default)]
    pub input_type: Option<String>,
}

impl KeyDownEvent {
    pub fn new(mod_keys: ModKeys, key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            mod_keys,
            key: key.into(),
            code: code.into(),
            tag: FocusTag::None,
            input_type: None,
        }
    }

    /// Mark the event as happening while a single-line input has focus.
    pub fn in_input(mut self, input_type: impl Into<String>) -> Self {
        self.tag = FocusTag::Input;
        self.input_type = Some(input_type.into());
        self
    }

    /// Mark the event as happening while a textarea has focus.
    pub fn in_text_area(mut self) -> Self {
        self.tag = FocusTag::TextArea;
        self.input_type = None;
        self
    }
}

/// Arguments of the per-keydown notification sent back to the owner handle.
#[derive(Clone, Debug)]
pub struct HotKeyDownArgs {
    pub mod_keys: ModKeys,
    /// The canonical key name derived from the raw fields.
    pub key_name: String,
    pub tag: FocusTag,
    pub input_type: Option<String>,
    /// Raw fields, forwarded unmodified.
    pub key: String,
    pub code: String,
}

/// Owner-side target of the per-keydown reverse call.
///
/// Invoked exactly once per key-down regardless of how many entries matched;
/// returning `true` requests suppression of the event's default action.
pub trait KeyDownHook: Send + Sync {
    fn on_key_down(&self, args: &HotKeyDownArgs) -> bool;
}

/// Decide whether an entry may fire given the focused element.
pub fn is_allowed_in(allow_in: AllowIn, tag: FocusTag, input_type: Option<&str>) -> bool {
    match tag {
        FocusTag::TextArea => allow_in.contains(AllowIn::TEXT_AREA),
        FocusTag::Input => {
            if let Some(input_type) = input_type {
                if NON_TEXT_INPUT_TYPES.contains(&input_type)
                    && allow_in.contains(AllowIn::NON_TEXT_INPUT)
                {
                    return true;
                }
            }
            allow_in.contains(AllowIn::TEXT_INPUT)
        }
        FocusTag::None | FocusTag::Other => true,
    }
}

struct MatchRecord {
    id: i32,
    entry_ref: EntryRef,
    mod_keys: ModKeys,
    key_name: String,
    allow_in: AllowIn,
}

/// The live set of registered entries and the per-event match loop.
#[derive(Default)]
pub struct HotKeyDispatcher {
    records: Vec<MatchRecord>,
    id_seq: i32,
    owner: Option<Arc<dyn KeyDownHook>>,
}

impl HotKeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the owner handle notified once per key-down.
    pub fn set_key_down_hook(&mut self, hook: Arc<dyn KeyDownHook>) {
        self.owner = Some(hook);
    }

    /// Store a match record and return its id.
    ///
    /// Author-supplied key names go through the typo table here, so a
    /// misspelled registration is stored and matched under the fixed name.
    pub fn register(
        &mut self,
        entry_ref: EntryRef,
        mod_keys: ModKeys,
        key_name: &str,
        allow_in: AllowIn,
    ) -> i32 {
        let id = self.id_seq;
        self.id_seq += 1;
        let key_name = fix_key_name_typo(key_name).to_string();
        tracing::debug!(id, key = %key_name, "dispatcher stored hotkey");
        self.records.push(MatchRecord {
            id,
            entry_ref,
            mod_keys,
            key_name,
            allow_in,
        });
        id
    }

    /// Drop the record with the given id. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: i32) {
        self.records.retain(|record| record.id != id);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dispatch one native key-down event.
    ///
    /// Every matching entry fires independently, in registration order. The
    /// return value tells the event source whether to suppress the default
    /// action: true when at least one entry matched or the owner hook asked
    /// for it.
    pub fn handle_key_down(&self, event: &KeyDownEvent) -> bool {
        let key_name = key_name_from_event(&event.key, &event.code);
        let mut suppress = false;

        for record in &self.records {
            if !record.key_name.eq_ignore_ascii_case(&key_name) {
                continue;
            }
            // A shortcut bound bare to a modifier key still requires that
            // modifier to be reported as held.
            let mut required = record.mod_keys;
            match record.key_name.as_str() {
                "Shift" => required |= ModKeys::SHIFT,
                "Ctrl" => required |= ModKeys::CTRL,
                "Alt" => required |= ModKeys::ALT,
                _ => {}
            }
            if event.mod_keys != required {
                continue;
            }
            if !is_allowed_in(record.allow_in, event.tag, event.input_type.as_deref()) {
                continue;
            }
            suppress = true;
            tracing::trace!(id = record.id, key = %record.key_name, "hotkey matched");
            if !record.entry_ref.invoke_action() {
                tracing::debug!(id = record.id, "matched entry reference was revoked");
            }
        }

        if let Some(owner) = &self.owner {
            let args = HotKeyDownArgs {
                mod_keys: event.mod_keys,
                key_name,
                tag: event.tag,
                input_type: event.input_type.clone(),
                key: event.key.clone(),
                code: event.code.clone(),
            };
            if owner.on_key_down(&args) {
                suppress = true;
            }
        }

        suppress
    }
}

/// In-process [`Invoker`] over a shared dispatcher.
///
/// The reference glue for embedders whose "remote" side lives in the same
/// process; register and unregister still cross an await point, so the
/// registration lifecycle behaves exactly as it does over a real transport.
pub struct LoopbackInvoker {
    dispatcher: Arc<Mutex<HotKeyDispatcher>>,
}

impl LoopbackInvoker {
    pub fn new(dispatcher: Arc<Mutex<HotKeyDispatcher>>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> Arc<Mutex<HotKeyDispatcher>> {
        Arc::clone(&self.dispatcher)
    }
}

#[async_trait]
impl Invoker for LoopbackInvoker {
    async fn register(
        &self,
        entry_ref: EntryRef,
        mod_keys: ModKeys,
        key_name: &str,
        allow_in: AllowIn,
    ) -> Result<i32, InvokeError> {
        Ok(self
            .dispatcher
            .lock()
            .register(entry_ref, mod_keys, key_name, allow_in))
    }

    async fn unregister(&self, id: i32) -> Result<(), InvokeError> {
        self.dispatcher.lock().unregister(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{HotKeyAction, HotKeyEntry};
    use crate::keys::KeyName;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_entry(
        mod_keys: ModKeys,
        key_name: &str,
        allow_in: AllowIn,
    ) -> (Arc<HotKeyEntry>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let entry = Arc::new(HotKeyEntry::new(
            mod_keys,
            KeyName::from(key_name),
            allow_in,
            String::new(),
            HotKeyAction::sync(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            }),
        ));
        (entry, hits)
    }

    fn add(
        dispatcher: &mut HotKeyDispatcher,
        mod_keys: ModKeys,
        key_name: &str,
        allow_in: AllowIn,
    ) -> (i32, Arc<HotKeyEntry>, Arc<AtomicUsize>) {
        let (entry, hits) = counted_entry(mod_keys, key_name, allow_in);
        let id = dispatcher.register(EntryRef::new(&entry), mod_keys, key_name, allow_in);
        (id, entry, hits)
    }

    #[test]
    fn matching_entry_fires_and_suppresses() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (_, _entry, hits) = add(&mut dispatcher, ModKeys::CTRL, "S", AllowIn::empty());

        let event = KeyDownEvent::new(ModKeys::CTRL, "s", "KeyS");
        assert!(dispatcher.handle_key_down(&event));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn key_name_comparison_is_case_insensitive() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (_, _entry, hits) = add(&mut dispatcher, ModKeys::empty(), "esc", AllowIn::empty());

        let event = KeyDownEvent::new(ModKeys::empty(), "Escape", "Escape");
        assert!(dispatcher.handle_key_down(&event));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn modifier_mask_must_match_exactly() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (_, _entry, hits) = add(&mut dispatcher, ModKeys::CTRL, "S", AllowIn::empty());

        let extra = KeyDownEvent::new(ModKeys::CTRL | ModKeys::SHIFT, "s", "KeyS");
        assert!(!dispatcher.handle_key_down(&extra));
        let missing = KeyDownEvent::new(ModKeys::empty(), "s", "KeyS");
        assert!(!dispatcher.handle_key_down(&missing));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn bare_modifier_entry_forces_its_own_bit() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (_, _entry, hits) = add(&mut dispatcher, ModKeys::empty(), "Shift", AllowIn::empty());

        let held = KeyDownEvent::new(ModKeys::SHIFT, "Shift", "ShiftLeft");
        assert!(dispatcher.handle_key_down(&held));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let not_held = KeyDownEvent::new(ModKeys::empty(), "Shift", "ShiftLeft");
        assert!(!dispatcher.handle_key_down(&not_held));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_matching_entries_fire_in_registration_order() {
        let mut dispatcher = HotKeyDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut entries = Vec::new();
        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            let entry = Arc::new(HotKeyEntry::new(
                ModKeys::CTRL,
                KeyName::from("K"),
                AllowIn::empty(),
                String::new(),
                HotKeyAction::sync(move || order.lock().push(tag)),
            ));
            dispatcher.register(EntryRef::new(&entry), ModKeys::CTRL, "K", AllowIn::empty());
            entries.push(entry);
        }

        let event = KeyDownEvent::new(ModKeys::CTRL, "k", "KeyK");
        assert!(dispatcher.handle_key_down(&event));
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn unregister_stops_matching() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (id, _entry, hits) = add(&mut dispatcher, ModKeys::CTRL, "S", AllowIn::empty());

        dispatcher.unregister(id);
        assert!(dispatcher.is_empty());

        let event = KeyDownEvent::new(ModKeys::CTRL, "s", "KeyS");
        assert!(!dispatcher.handle_key_down(&event));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregister_unknown_id_is_a_noop() {
        let mut dispatcher = HotKeyDispatcher::new();
        dispatcher.unregister(42);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn ids_keep_increasing_after_unregister() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (first, _e1, _h1) = add(&mut dispatcher, ModKeys::CTRL, "A", AllowIn::empty());
        dispatcher.unregister(first);
        let (second, _e2, _h2) = add(&mut dispatcher, ModKeys::CTRL, "B", AllowIn::empty());
        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[test]
    fn typo_fix_applies_at_registration() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (_, _entry, hits) = add(&mut dispatcher, ModKeys::empty(), "BackQuart", AllowIn::empty());

        let event = KeyDownEvent::new(ModKeys::empty(), "`", "Backquote");
        // Raw code "Backquote" passes through unchanged and matches the
        // corrected name case-insensitively.
        assert!(dispatcher.handle_key_down(&event));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn allow_in_filter_table() {
        // (mask, tag, type, expected)
        let cases = [
            (AllowIn::empty(), FocusTag::None, None, true),
            (AllowIn::empty(), FocusTag::Other, None, true),
            (AllowIn::empty(), FocusTag::TextArea, None, false),
            (AllowIn::TEXT_AREA, FocusTag::TextArea, None, true),
            (AllowIn::empty(), FocusTag::Input, Some("text"), false),
            (AllowIn::TEXT_INPUT, FocusTag::Input, Some("text"), true),
            (AllowIn::empty(), FocusTag::Input, Some("button"), false),
            (AllowIn::NON_TEXT_INPUT, FocusTag::Input, Some("button"), true),
            // Non-text bit does not cover text-typed inputs.
            (AllowIn::NON_TEXT_INPUT, FocusTag::Input, Some("text"), false),
            // Text bit covers inputs with no type attribute.
            (AllowIn::TEXT_INPUT, FocusTag::Input, None, true),
            (AllowIn::NON_TEXT_INPUT, FocusTag::Input, None, false),
        ];
        for (mask, tag, input_type, expected) in cases {
            assert_eq!(
                is_allowed_in(mask, tag, input_type),
                expected,
                "mask={mask:?} tag={tag:?} type={input_type:?}"
            );
        }
    }

    #[test]
    fn suppressed_in_text_input_with_default_mask() {
        let mut dispatcher = HotKeyDispatcher::new();
        let (_, _entry, hits) = add(&mut dispatcher, ModKeys::CTRL, "S", AllowIn::empty());

        let event = KeyDownEvent::new(ModKeys::CTRL, "s", "KeyS").in_input("text");
        assert!(!dispatcher.handle_key_down(&event));

        let event = KeyDownEvent::new(ModKeys::CTRL, "s", "KeyS").in_input("button");
        assert!(dispatcher.handle_key_down(&event));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn owner_hook_sees_every_event_once_and_may_suppress() {
        struct Recorder {
            calls: AtomicUsize,
            last_key: Mutex<String>,
        }
        impl KeyDownHook for Recorder {
            fn on_key_down(&self, args: &HotKeyDownArgs) -> bool {
                self.calls.fetch_add(1, Ordering::SeqCst);
                *self.last_key.lock() = args.key_name.clone();
                args.key_name == "ESC"
            }
        }

        let recorder = Arc::new(Recorder {
            calls: AtomicUsize::new(0),
            last_key: Mutex::new(String::new()),
        });
        let mut dispatcher = HotKeyDispatcher::new();
        dispatcher.set_key_down_hook(Arc::clone(&recorder) as Arc<dyn KeyDownHook>);

        // No entries registered: suppression comes from the hook alone.
        let event = KeyDownEvent::new(ModKeys::empty(), "Escape", "Escape");
        assert!(dispatcher.handle_key_down(&event));
        let event = KeyDownEvent::new(ModKeys::empty(), "a", "KeyA");
        assert!(!dispatcher.handle_key_down(&event));

        assert_eq!(recorder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*recorder.last_key.lock(), "A");
    }

    #[test]
    fn key_down_event_wire_shape_is_stable() {
        let event = KeyDownEvent::new(ModKeys::CTRL, "s", "KeyS").in_input("text");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "mod_keys": 2,
                "key": "s",
                "code": "KeyS",
                "tag": "input",
                "input_type": "text",
            })
        );

        let back: KeyDownEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back.mod_keys, ModKeys::CTRL);
        assert_eq!(back.tag, FocusTag::Input);
    }
}
