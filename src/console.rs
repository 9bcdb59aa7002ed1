//! Text console abstraction
//!
//! The menu only needs a fixed character grid: position the cursor, emit a
//! character, and wait for a key with an optional timeout. [`Screen`] wraps a
//! [`Console`] for the length of one menu call and owns the cursor position.

/// Row/column on the console grid, zero based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub row: usize,
    pub col: usize,
}

impl CursorPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Key as reported by the console, before menu interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKey {
    Char(char),
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Escape,
    /// Any other scan code
    Other(u16),
}

/// Result of one input wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Pressed(RawKey),
    TimedOut,
}

/// Console device failures, carrying the device status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("console output failed (status {0:#x})")]
    Output(usize),
    #[error("console input failed (status {0:#x})")]
    Input(usize),
}

/// Shown in place of characters a UCS-2 console cannot display
pub const REPLACEMENT_CHAR: char = '?';

/// `ch` if it fits one UCS-2 code unit and is not NUL, else [`REPLACEMENT_CHAR`]
pub fn ucs2_printable(ch: char) -> char {
    match u32::from(ch) {
        0 | 0x1_0000.. => REPLACEMENT_CHAR,
        _ => ch,
    }
}

/// Character-grid console device
pub trait Console {
    fn move_cursor(&mut self, pos: CursorPosition) -> Result<(), ConsoleError>;

    /// Write `ch` at the cursor; the device advances its own cursor
    fn write_char(&mut self, ch: char) -> Result<(), ConsoleError>;

    /// Wait for a key. `None` blocks until one arrives, `Some(secs)` gives up
    /// after that many seconds.
    fn read_key(&mut self, timeout_secs: Option<u32>) -> Result<KeyInput, ConsoleError>;
}

impl<C: Console + ?Sized> Console for &mut C {
    fn move_cursor(&mut self, pos: CursorPosition) -> Result<(), ConsoleError> {
        (**self).move_cursor(pos)
    }

    fn write_char(&mut self, ch: char) -> Result<(), ConsoleError> {
        (**self).write_char(ch)
    }

    fn read_key(&mut self, timeout_secs: Option<u32>) -> Result<KeyInput, ConsoleError> {
        (**self).read_key(timeout_secs)
    }
}

/// Rectangle the menu box is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub origin: CursorPosition,
    pub rows: usize,
    pub cols: usize,
}

impl Viewport {
    pub const fn new(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self {
            origin: CursorPosition::new(row, col),
            rows,
            cols,
        }
    }

    /// Rows left for entries once the top and bottom border are drawn
    pub const fn display_rows(&self) -> usize {
        self.rows.saturating_sub(2)
    }

    /// Columns left between the side borders
    pub const fn display_cols(&self) -> usize {
        self.cols.saturating_sub(2)
    }

    /// Last column inside the viewport
    pub const fn right_col(&self) -> usize {
        self.origin.col + self.cols.saturating_sub(1)
    }

    pub const fn bottom_row(&self) -> usize {
        self.origin.row + self.rows.saturating_sub(1)
    }
}

/// Drawing handle over a console, clipped to the viewport's width
pub struct Screen<'c, C: Console + ?Sized> {
    console: &'c mut C,
    viewport: Viewport,
    cursor: CursorPosition,
}

impl<'c, C: Console + ?Sized> Screen<'c, C> {
    pub fn new(console: &'c mut C, viewport: Viewport) -> Self {
        Self {
            console,
            viewport,
            cursor: viewport.origin,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    pub fn move_to(&mut self, row: usize, col: usize) -> Result<(), ConsoleError> {
        self.cursor = CursorPosition::new(row, col);
        self.console.move_cursor(self.cursor)
    }

    /// Columns left on the current row before the viewport's right edge
    fn remaining(&self) -> usize {
        (self.viewport.right_col() + 1).saturating_sub(self.cursor.col)
    }

    pub fn put_char(&mut self, ch: char) -> Result<(), ConsoleError> {
        self.console.move_cursor(self.cursor)?;
        self.console.write_char(ch)?;
        self.cursor.col += 1;
        Ok(())
    }

    /// Print from the cursor, dropping whatever would cross the right edge
    pub fn print(&mut self, text: &str) -> Result<(), ConsoleError> {
        let room = self.remaining();
        for ch in text.chars().take(room) {
            self.put_char(ch)?;
        }
        Ok(())
    }

    /// Blank the viewport's width on `row` and park the cursor at its start
    pub fn erase_row(&mut self, row: usize) -> Result<(), ConsoleError> {
        self.move_to(row, self.viewport.origin.col)?;
        for _ in 0..self.viewport.cols {
            self.put_char(' ')?;
        }
        self.move_to(row, self.viewport.origin.col)
    }

    /// Fill the viewport's width on `row` with `ch`
    pub fn hline(&mut self, row: usize, ch: char) -> Result<(), ConsoleError> {
        self.move_to(row, self.viewport.origin.col)?;
        for _ in 0..self.viewport.cols {
            self.put_char(ch)?;
        }
        Ok(())
    }

    /// Wait for the next key; the only blocking call of the menu
    pub fn read_key(&mut self, timeout_secs: Option<u32>) -> Result<KeyInput, ConsoleError> {
        self.console.read_key(timeout_secs)
    }
}
