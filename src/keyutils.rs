//! Winit → Servo keyboard event conversion.
//!
//! Servo speaks `keyboard_types` (re-exported as `servo::Key`, `servo::Code`,
//! ...), winit has its own enums. Both follow the UI Events spec naming, so
//! most variants map one-to-one; the tables below list the keys a browser
//! shell actually needs to forward. Anything else becomes `Unidentified`.

use std::collections::HashSet;

use servo::{Code, Key, KeyState, KeyboardEvent, Location, Modifiers, NamedKey};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{
    Key as WinitKey, KeyCode, KeyLocation as WinitKeyLocation, ModifiersState,
    NamedKey as WinitNamedKey, PhysicalKey,
};

/// Builds the Servo event for a winit key event and the current modifiers.
pub fn keyboard_event_from_winit(key_event: &KeyEvent, mods: ModifiersState) -> KeyboardEvent {
    KeyboardEvent::new_without_event(
        key_state_from_winit(key_event.state),
        key_from_winit(&key_event.logical_key),
        code_from_winit(&key_event.physical_key),
        location_from_winit(key_event.location),
        modifiers_from_winit(mods),
        false,
        false,
    )
}

fn key_state_from_winit(state: ElementState) -> KeyState {
    match state {
        ElementState::Pressed => KeyState::Down,
        ElementState::Released => KeyState::Up,
    }
}

/// Same-named variants on both sides.
macro_rules! named_key_table {
    ($key:expr; $($name:ident),+ $(,)?) => {
        match $key {
            $(WinitNamedKey::$name => NamedKey::$name,)+
            _ => NamedKey::Unidentified,
        }
    };
}

macro_rules! key_code_table {
    ($code:expr; $($name:ident),+ $(,)?) => {
        match $code {
            $(KeyCode::$name => Code::$name,)+
            _ => Code::Unidentified,
        }
    };
}

#[allow(deprecated)]
fn key_from_winit(logical_key: &WinitKey) -> Key {
    let named = match logical_key {
        WinitKey::Character(s) => return Key::Character(s.to_string()),
        WinitKey::Named(WinitNamedKey::Space) => return Key::Character(" ".to_string()),
        WinitKey::Named(named) => *named,
        WinitKey::Unidentified(_) | WinitKey::Dead(_) => return Key::Named(NamedKey::Unidentified),
    };

    Key::Named(named_key_table!(named;
        // Modifiers
        Alt, AltGraph, CapsLock, Control, Fn, NumLock, ScrollLock, Shift, Meta, Super,
        // Whitespace / navigation
        Enter, Tab, ArrowDown, ArrowLeft, ArrowRight, ArrowUp, End, Home, PageDown, PageUp,
        // Editing
        Backspace, Clear, Copy, Cut, Delete, Insert, Paste, Redo, Undo,
        // UI
        ContextMenu, Escape, Find, Help, Pause, PrintScreen, ZoomIn, ZoomOut,
        // Browser / media keys
        BrowserBack, BrowserForward, BrowserHome, BrowserRefresh, BrowserSearch, BrowserStop,
        BrowserFavorites, MediaPlayPause, MediaStop, MediaTrackNext, MediaTrackPrevious,
        AudioVolumeUp, AudioVolumeDown, AudioVolumeMute,
        // Function keys
        F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    ))
}

fn location_from_winit(location: WinitKeyLocation) -> Location {
    match location {
        WinitKeyLocation::Standard => Location::Standard,
        WinitKeyLocation::Left => Location::Left,
        WinitKeyLocation::Right => Location::Right,
        WinitKeyLocation::Numpad => Location::Numpad,
    }
}

#[allow(deprecated)]
fn code_from_winit(physical_key: &PhysicalKey) -> Code {
    let code = match physical_key {
        PhysicalKey::Code(code) => *code,
        PhysicalKey::Unidentified(_) => return Code::Unidentified,
    };

    // winit says "Super", keyboard_types says "Meta".
    match code {
        KeyCode::SuperLeft => return Code::MetaLeft,
        KeyCode::SuperRight => return Code::MetaRight,
        KeyCode::Meta => return Code::Super,
        _ => {}
    }

    key_code_table!(code;
        KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
        KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
        Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
        Numpad0, Numpad1, Numpad2, Numpad3, Numpad4, Numpad5, Numpad6, Numpad7, Numpad8,
        Numpad9, NumpadAdd, NumpadSubtract, NumpadMultiply, NumpadDivide, NumpadDecimal,
        NumpadEnter,
        Backquote, Backslash, BracketLeft, BracketRight, Comma, Equal, IntlBackslash, Minus,
        Period, Quote, Semicolon, Slash,
        AltLeft, AltRight, ControlLeft, ControlRight, ShiftLeft, ShiftRight, CapsLock,
        ContextMenu, Enter, Backspace, Tab, Space, Escape,
        Delete, End, Home, Insert, PageDown, PageUp,
        ArrowDown, ArrowLeft, ArrowRight, ArrowUp,
        NumLock, ScrollLock, PrintScreen, Pause,
        F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    )
}

fn modifiers_from_winit(mods: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::CONTROL, mods.control_key());
    modifiers.set(Modifiers::SHIFT, mods.shift_key());
    modifiers.set(Modifiers::ALT, mods.alt_key());
    modifiers.set(Modifiers::META, mods.super_key());
    modifiers
}

/// Physical keys whose press the shell handled itself (shortcuts, URL bar
/// editing). Their release must not reach the page either.
#[derive(Debug, Default)]
pub struct ConsumedKeys {
    keys: HashSet<PhysicalKey>,
}

impl ConsumedKeys {
    pub fn consume(&mut self, key: PhysicalKey) {
        self.keys.insert(key);
    }

    /// Forgets `key`; `true` if its press had been consumed.
    pub fn release(&mut self, key: PhysicalKey) -> bool {
        self.keys.remove(&key)
    }
}
