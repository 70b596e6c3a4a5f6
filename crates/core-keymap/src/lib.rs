//! core-keymap: keyboard shortcut recognition.
//!
//! Hosts deliver raw key input; this crate decides whether it is one of the
//! reserved editing chords. Resolution is pure and deterministic: a chord
//! either maps to a [`Shortcut`] or it is not ours and the host keeps its
//! default handling.
//!
//! The reserved set is primary+`b`/`i`/`u` for marks, primary+`k` for the
//! link dialog, primary+`z` for undo and primary+shift+`z` for redo, where
//! "primary" is Ctrl or the platform command key. Chords carrying Alt are
//! never claimed; AltGr combinations type characters and must pass through.

use bitflags::bitflags;
use tracing::trace;

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mods: u8 {
        const CTRL  = 1 << 0;
        const ALT   = 1 << 1;
        const SHIFT = 1 << 2;
        const META  = 1 << 3;
    }
}

impl Mods {
    /// Either primary modifier: Ctrl, or the platform command key.
    pub const PRIMARY: Mods = Mods::CTRL.union(Mods::META);

    pub fn has_primary(self) -> bool {
        self.intersects(Mods::PRIMARY)
    }
}

/// One key press as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: char,
    pub mods: Mods,
}

impl KeyInput {
    pub fn new(key: char, mods: Mods) -> Self {
        Self { key, mods }
    }
}

/// An editing intent bound to a reserved chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Bold,
    Italic,
    Underline,
    Link,
    Undo,
    Redo,
}

/// Resolves key input against the reserved chord set.
#[derive(Debug, Default)]
pub struct ShortcutMap;

impl ShortcutMap {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one key press. Returns `None` for anything outside the
    /// reserved set so the host can apply its default handling.
    pub fn resolve(&self, input: KeyInput) -> Option<Shortcut> {
        if !input.mods.has_primary() || input.mods.contains(Mods::ALT) {
            return None;
        }
        let shifted = input.mods.contains(Mods::SHIFT);
        let shortcut = match (input.key.to_ascii_lowercase(), shifted) {
            ('b', false) => Shortcut::Bold,
            ('i', false) => Shortcut::Italic,
            ('u', false) => Shortcut::Underline,
            ('k', false) => Shortcut::Link,
            ('z', false) => Shortcut::Undo,
            ('z', true) => Shortcut::Redo,
            _ => return None,
        };
        trace!(target: "keymap", key = %input.key, mods = ?input.mods, ?shortcut, "chord resolved");
        Some(shortcut)
    }
}
