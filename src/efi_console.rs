//! Menu console on top of the UEFI simple text protocols

use uefi::prelude::*;
use uefi::proto::console::text::{Key, ScanCode};
use uefi::{cstr16, CStr16};

use raven_bemenu::console::ucs2_printable;
use raven_bemenu::{Console, ConsoleError, CursorPosition, KeyInput, RawKey};

/// Input polling interval
const POLL_INTERVAL_US: usize = 10_000;
const POLLS_PER_SECOND: u64 = 1_000_000 / POLL_INTERVAL_US as u64;

pub struct EfiConsole<'a> {
    system_table: &'a mut SystemTable<Boot>,
}

impl<'a> EfiConsole<'a> {
    pub fn new(system_table: &'a mut SystemTable<Boot>) -> Self {
        Self { system_table }
    }

    fn try_get_key(&mut self) -> Result<Option<Key>, ConsoleError> {
        self.system_table
            .stdin()
            .read_key()
            .map_err(|err| ConsoleError::Input(err.status().0))
    }
}

fn raw_key(key: Key) -> RawKey {
    match key {
        Key::Printable(c) => RawKey::Char(char::from(c)),
        Key::Special(ScanCode::UP) => RawKey::Up,
        Key::Special(ScanCode::DOWN) => RawKey::Down,
        Key::Special(ScanCode::PAGE_UP) => RawKey::PageUp,
        Key::Special(ScanCode::PAGE_DOWN) => RawKey::PageDown,
        Key::Special(ScanCode::HOME) => RawKey::Home,
        Key::Special(ScanCode::END) => RawKey::End,
        Key::Special(ScanCode::ESCAPE) => RawKey::Escape,
        Key::Special(other) => RawKey::Other(other.0),
    }
}

impl Console for EfiConsole<'_> {
    fn move_cursor(&mut self, pos: CursorPosition) -> Result<(), ConsoleError> {
        self.system_table
            .stdout()
            .set_cursor_position(pos.col, pos.row)
            .map_err(|err| ConsoleError::Output(err.status().0))
    }

    fn write_char(&mut self, ch: char) -> Result<(), ConsoleError> {
        let mut utf8 = [0u8; 4];
        let mut ucs2 = [0u16; 3];
        let text = CStr16::from_str_with_buf(ucs2_printable(ch).encode_utf8(&mut utf8), &mut ucs2)
            .unwrap_or(cstr16!("?"));
        self.system_table
            .stdout()
            .output_string(text)
            .map_err(|err| ConsoleError::Output(err.status().0))
    }

    fn read_key(&mut self, timeout_secs: Option<u32>) -> Result<KeyInput, ConsoleError> {
        let mut polls_left = timeout_secs.map(|secs| u64::from(secs) * POLLS_PER_SECOND);
        loop {
            if let Some(key) = self.try_get_key()? {
                return Ok(KeyInput::Pressed(raw_key(key)));
            }
            if let Some(left) = polls_left.as_mut() {
                if *left == 0 {
                    return Ok(KeyInput::TimedOut);
                }
                *left -= 1;
            }
            self.system_table.boot_services().stall(POLL_INTERVAL_US);
        }
    }
}
