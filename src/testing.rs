//! Console double for unit tests: a character grid plus a scripted key queue

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::console::{Console, ConsoleError, CursorPosition, KeyInput, RawKey};

/// Status reported once the key script runs dry
pub const SCRIPT_EXHAUSTED: usize = 0xdead;

pub struct ScriptedConsole {
    grid: Vec<Vec<char>>,
    cursor: CursorPosition,
    script: VecDeque<KeyInput>,
    /// Timeout passed to every `read_key`, in call order
    pub waits: Vec<Option<u32>>,
}

impl ScriptedConsole {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            grid: alloc::vec![alloc::vec![' '; cols]; rows],
            cursor: CursorPosition::default(),
            script: VecDeque::new(),
            waits: Vec::new(),
        }
    }

    pub fn with_keys(mut self, keys: &[RawKey]) -> Self {
        self.script
            .extend(keys.iter().map(|&key| KeyInput::Pressed(key)));
        self
    }

    pub fn push(&mut self, input: KeyInput) {
        self.script.push_back(input);
    }

    pub fn push_ticks(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.script.push_back(KeyInput::TimedOut);
        }
    }

    /// Row contents with trailing blanks removed
    pub fn row_text(&self, row: usize) -> String {
        let line: String = self.grid[row].iter().collect();
        String::from(line.trim_end())
    }

    pub fn contains(&self, needle: &str) -> bool {
        (0..self.grid.len()).any(|row| self.row_text(row).contains(needle))
    }
}

impl Console for ScriptedConsole {
    fn move_cursor(&mut self, pos: CursorPosition) -> Result<(), ConsoleError> {
        self.cursor = pos;
        Ok(())
    }

    fn write_char(&mut self, ch: char) -> Result<(), ConsoleError> {
        let CursorPosition { row, col } = self.cursor;
        if let Some(cell) = self.grid.get_mut(row).and_then(|line| line.get_mut(col)) {
            *cell = ch;
        }
        self.cursor.col += 1;
        Ok(())
    }

    fn read_key(&mut self, timeout_secs: Option<u32>) -> Result<KeyInput, ConsoleError> {
        self.waits.push(timeout_secs);
        self.script
            .pop_front()
            .ok_or(ConsoleError::Input(SCRIPT_EXHAUSTED))
    }
}
