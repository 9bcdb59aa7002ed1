//! Raw console keys to menu commands

use crate::console::RawKey;

const KEY_ENTER: char = '\r';

/// Logical events the menu reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Enter,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Home,
    End,
    SortOrder,
    SortKey,
    Help,
    /// One second passed without input
    Timeout,
}

impl KeyEvent {
    /// Events that move the cursor
    pub const fn is_navigation(self) -> bool {
        matches!(
            self,
            Self::ScrollUp | Self::ScrollDown | Self::PageUp | Self::PageDown | Self::Home | Self::End
        )
    }
}

/// Interpret a raw key; `None` for keys the menu has no binding for
pub fn translate(key: RawKey) -> Option<KeyEvent> {
    let event = match key {
        RawKey::Char(KEY_ENTER) | RawKey::Char('\n') => KeyEvent::Enter,
        RawKey::Char('k') | RawKey::Up => KeyEvent::ScrollUp,
        RawKey::Char('j') | RawKey::Down => KeyEvent::ScrollDown,
        RawKey::PageUp => KeyEvent::PageUp,
        RawKey::PageDown => KeyEvent::PageDown,
        RawKey::Char('g') | RawKey::Home => KeyEvent::Home,
        RawKey::Char('G') | RawKey::End => KeyEvent::End,
        RawKey::Char('o') => KeyEvent::SortOrder,
        RawKey::Char('s') => KeyEvent::SortKey,
        RawKey::Char('h') | RawKey::Char('?') => KeyEvent::Help,
        _ => return None,
    };
    Some(event)
}
