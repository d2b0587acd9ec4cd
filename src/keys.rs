//! Key identifiers and the mask types shared across the boundary.
//!
//! This module provides:
//! - `ModKeys` - modifier key flags (Shift, Ctrl, Alt, Meta)
//! - `AllowIn` - policy flags controlling firing while a text element has focus
//! - `Key` - symbolic identifiers whose names are already in canonical form
//! - `KeyName` - an owned key name, symbolic or free-form
//!
//! The bit layouts of `ModKeys` and `AllowIn` are wire contracts and must not
//! change: `Shift=1, Ctrl=2, Alt=4, Meta=8` and
//! `TextInput=1, TextArea=2, NonTextInput=4`. Both masks serialize as their
//! raw `u32` value so every transport sees the same numbers.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Modifier keys required for a hotkey to fire.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModKeys: u32 {
        const SHIFT = 1;
        const CTRL = 2;
        const ALT = 4;
        const META = 8;
    }
}

bitflags! {
    /// Where a hotkey is still allowed to fire while a text-entry element
    /// holds focus.
    ///
    /// The empty mask means the hotkey is suppressed whenever any input or
    /// textarea is focused, and active everywhere else.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AllowIn: u32 {
        /// Single-line inputs with a text-like type (`text`, `email`, ...).
        const TEXT_INPUT = 1;
        /// Multi-line text containers.
        const TEXT_AREA = 2;
        /// Single-line inputs with a non-text type (`button`, `checkbox`, ...).
        const NON_TEXT_INPUT = 4;
    }
}

impl Default for ModKeys {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for AllowIn {
    fn default() -> Self {
        Self::empty()
    }
}

// The masks travel across the boundary as plain integers.

impl Serialize for ModKeys {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for ModKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

impl Serialize for AllowIn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for AllowIn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

impl fmt::Display for ModKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Self::SHIFT, "Shift"),
            (Self::CTRL, "Ctrl"),
            (Self::ALT, "Alt"),
            (Self::META, "Meta"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str(" + ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Symbolic key identifiers.
///
/// Each variant's `name()` is the canonical key name the normalizer produces
/// for that key, so entries added with a `Key` never need spelling fixes.
/// Keys outside this set can always be registered by their name string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Enter, ESC, Space, Tab, Backspace, Insert, Delete,
    Home, End, PgUp, PgDown,
    Up, Down, Left, Right,
    Shift, Ctrl, Alt, Meta, CapsLock, ContextMenu, Pause,
    Semicolon, SingleQuote, BackQuote, Comma, Period, Hyphen, Equal,
    Slash, BackSlash, BlaceLeft, BlaceRight,
    AudioVolumeMute, AudioVolumeDown, AudioVolumeUp,
}

impl Key {
    /// The canonical name of this key.
    pub fn name(self) -> &'static str {
        use Key::*;
        match self {
            A => "A", B => "B", C => "C", D => "D", E => "E", F => "F",
            G => "G", H => "H", I => "I", J => "J", K => "K", L => "L",
            M => "M", N => "N", O => "O", P => "P", Q => "Q", R => "R",
            S => "S", T => "T", U => "U", V => "V", W => "W", X => "X",
            Y => "Y", Z => "Z",
            Num0 => "Num0", Num1 => "Num1", Num2 => "Num2", Num3 => "Num3",
            Num4 => "Num4", Num5 => "Num5", Num6 => "Num6", Num7 => "Num7",
            Num8 => "Num8", Num9 => "Num9",
            F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5",
            F6 => "F6", F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10",
            F11 => "F11", F12 => "F12",
            Enter => "Enter", ESC => "ESC", Space => "Space", Tab => "Tab",
            Backspace => "Backspace", Insert => "Insert", Delete => "Delete",
            Home => "Home", End => "End", PgUp => "PgUp", PgDown => "PgDown",
            Up => "Up", Down => "Down", Left => "Left", Right => "Right",
            Shift => "Shift", Ctrl => "Ctrl", Alt => "Alt", Meta => "Meta",
            CapsLock => "CapsLock", ContextMenu => "ContextMenu",
            Pause => "Pause",
            Semicolon => "Semicolon", SingleQuote => "SingleQuote",
            BackQuote => "BackQuote", Comma => "Comma", Period => "Period",
            Hyphen => "Hyphen", Equal => "Equal",
            Slash => "Slash", BackSlash => "BackSlash",
            BlaceLeft => "BlaceLeft", BlaceRight => "BlaceRight",
            AudioVolumeMute => "AudioVolumeMute",
            AudioVolumeDown => "AudioVolumeDown",
            AudioVolumeUp => "AudioVolumeUp",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An owned key name for a hotkey entry, symbolic or free-form.
///
/// Matching against key names is always case-insensitive; the stored string
/// keeps the spelling the author supplied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyName(String);

impl KeyName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Key> for KeyName {
    fn from(key: Key) -> Self {
        Self(key.name().to_string())
    }
}

impl From<&str> for KeyName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for KeyName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
