//! Boot environment selection menu
//!
//! Draws a bordered box holding a scrolling window of the catalog, with the
//! sort order, the auto-boot countdown and an optional key legend beneath it.
//! [`MenuState`] is the pure state machine; [`select`] drives it against a
//! console until the operator picks an entry or asks for a different sort.

use alloc::string::String;
use core::cmp::min;
use core::ops::Range;

use log::{debug, info};

use crate::bootenv::{BootEnvironment, Catalog};
use crate::console::{Console, ConsoleError, KeyInput, Screen, Viewport};
use crate::keymap::{self, KeyEvent};

const SELECT_MARKER: &str = " > ";
const IDLE_MARKER: &str = "   ";

/// (text, only shown with the help overlay)
const LEGEND: &[(&str, bool)] = &[
    ("Default BE marked with '*' at the end", false),
    ("Press 'h' or '?' to display help message", false),
    ("Press 'Enter'    to select BE for booting", true),
    ("Press 'o'        to change order of sorting", true),
    ("Press 's'        to change sort key", true),
    ("Press 'j'        to scroll down", true),
    ("Press 'k'        to scroll up", true),
    ("Press 'PgDn'     to scroll a page down", true),
    ("Press 'PgUp'     to scroll a page up", true),
    ("Press 'G'        to scroll to end", true),
    ("Press 'g'        to scroll to start", true),
];

/// How a menu call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome<'a> {
    Chosen(&'a BootEnvironment),
    SortKeyChangeRequested,
    SortOrderChangeRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuMode {
    Browsing,
    HelpOverlay,
}

/// Result of feeding one event to [`MenuState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Select(usize),
    SortKey,
    SortOrder,
}

/// Cursor, scroll and countdown state of one menu call
#[derive(Debug, Clone)]
pub struct MenuState {
    active: usize,
    default: usize,
    skip: usize,
    count: usize,
    page: usize,
    countdown: Option<u32>,
    mode: MenuMode,
}

impl MenuState {
    /// `page` is the number of entry rows in the box; `countdown` of `None`
    /// disables auto-boot.
    pub fn new(count: usize, default: usize, page: usize, countdown: Option<u32>) -> Self {
        let default = min(default, count.saturating_sub(1));
        let mut state = Self {
            active: default,
            default,
            skip: 0,
            count,
            page,
            countdown,
            mode: MenuMode::Browsing,
        };
        state.follow_cursor();
        state
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn help_visible(&self) -> bool {
        self.mode == MenuMode::HelpOverlay
    }

    /// Catalog indices currently on screen
    pub fn visible(&self) -> Range<usize> {
        self.skip..min(self.skip + self.page, self.count)
    }

    pub fn cancel_countdown(&mut self) {
        self.countdown = None;
    }

    fn last(&self) -> usize {
        self.count.saturating_sub(1)
    }

    /// Scroll the least amount that keeps the cursor inside the window
    fn follow_cursor(&mut self) {
        let page = self.page.max(1);
        if self.active < self.skip {
            self.skip = self.active;
        } else if self.active >= self.skip + page {
            self.skip = self.active + 1 - page;
        }
    }

    /// Countdown ran out: boot the preset default
    pub fn expire(&mut self) -> Step {
        self.countdown = None;
        if self.count == 0 {
            return Step::Continue;
        }
        self.active = self.default;
        self.follow_cursor();
        Step::Select(self.default)
    }

    fn tick(&mut self) -> Step {
        match self.countdown {
            Some(left) if left > 1 => {
                self.countdown = Some(left - 1);
                Step::Continue
            }
            Some(_) => self.expire(),
            None => Step::Continue,
        }
    }

    pub fn apply(&mut self, event: KeyEvent) -> Step {
        let step = match event {
            KeyEvent::Timeout => return self.tick(),
            KeyEvent::Enter if self.count == 0 => Step::Continue,
            KeyEvent::Enter => Step::Select(self.active),
            KeyEvent::ScrollUp => {
                self.active = self.active.saturating_sub(1);
                Step::Continue
            }
            KeyEvent::ScrollDown => {
                self.active = min(self.active + 1, self.last());
                Step::Continue
            }
            KeyEvent::PageUp => {
                self.active = self.active.saturating_sub(self.page);
                Step::Continue
            }
            KeyEvent::PageDown => {
                self.active = min(self.active + self.page, self.last());
                Step::Continue
            }
            KeyEvent::Home => {
                self.active = 0;
                Step::Continue
            }
            KeyEvent::End => {
                self.active = self.last();
                Step::Continue
            }
            KeyEvent::SortOrder => Step::SortOrder,
            KeyEvent::SortKey => Step::SortKey,
            KeyEvent::Help => {
                self.mode = match self.mode {
                    MenuMode::Browsing => MenuMode::HelpOverlay,
                    MenuMode::HelpOverlay => MenuMode::Browsing,
                };
                Step::Continue
            }
        };

        // Any key press stops the auto-boot
        self.countdown = None;
        if event.is_navigation() {
            self.mode = MenuMode::Browsing;
        }
        self.follow_cursor();
        step
    }
}

/// Run the menu until it resolves.
///
/// `timeout` seconds of inactivity boot the entry flagged active (or the
/// first one); `None` waits indefinitely. Precondition: the caller handles an
/// empty catalog itself and the viewport has room for at least one entry row.
pub fn select<'a, C: Console + ?Sized>(
    console: &mut C,
    viewport: &Viewport,
    catalog: &'a Catalog,
    timeout: Option<u32>,
) -> Result<SelectionOutcome<'a>, ConsoleError> {
    let mut state = MenuState::new(
        catalog.len(),
        catalog.default_index(),
        viewport.display_rows(),
        timeout,
    );
    let mut screen = Screen::new(console, *viewport);

    loop {
        let step = match state.countdown() {
            Some(0) => state.expire(),
            countdown => {
                draw(&mut screen, catalog, &state)?;
                match screen.read_key(countdown.map(|_| 1))? {
                    KeyInput::TimedOut => state.apply(KeyEvent::Timeout),
                    KeyInput::Pressed(raw) => match keymap::translate(raw) {
                        Some(event) => {
                            let step = state.apply(event);
                            debug!(
                                "menu: {:?} -> active {} skip {}",
                                event,
                                state.active(),
                                state.skip()
                            );
                            step
                        }
                        None => {
                            state.cancel_countdown();
                            Step::Continue
                        }
                    },
                }
            }
        };

        match step {
            Step::Continue => {}
            Step::Select(index) => {
                if let Some(be) = catalog.get(index) {
                    info!("menu: selected '{}' ({})", be.name(), be.object_id());
                    return Ok(SelectionOutcome::Chosen(be));
                }
            }
            Step::SortKey => {
                info!("menu: sort key change requested");
                return Ok(SelectionOutcome::SortKeyChangeRequested);
            }
            Step::SortOrder => {
                info!("menu: sort order change requested");
                return Ok(SelectionOutcome::SortOrderChangeRequested);
            }
        }
    }
}

fn draw<C: Console + ?Sized>(
    screen: &mut Screen<'_, C>,
    catalog: &Catalog,
    state: &MenuState,
) -> Result<(), ConsoleError> {
    draw_box(screen, catalog, state)?;
    draw_status(screen, catalog, state)
}

fn draw_box<C: Console + ?Sized>(
    screen: &mut Screen<'_, C>,
    catalog: &Catalog,
    state: &MenuState,
) -> Result<(), ConsoleError> {
    let vp = *screen.viewport();
    if vp.rows == 0 {
        return Ok(());
    }

    screen.hline(vp.origin.row, '=')?;

    let width = vp.display_cols();
    let mut visible = state
        .visible()
        .filter_map(|index| catalog.get(index).map(|be| (index, be)));

    for row in vp.origin.row + 1..vp.bottom_row() {
        screen.move_to(row, vp.origin.col)?;
        screen.print("|")?;
        match visible.next() {
            Some((index, be)) => {
                let marker = if index == state.active() {
                    SELECT_MARKER
                } else {
                    IDLE_MARKER
                };
                screen.print(marker)?;
                screen.print(&be.render_line(width.saturating_sub(marker.len())))?;
            }
            None => {
                let blank: String = core::iter::repeat(' ').take(width).collect();
                screen.print(&blank)?;
            }
        }
        screen.move_to(row, vp.right_col())?;
        screen.print("|")?;
    }

    if vp.rows > 1 {
        screen.hline(vp.bottom_row(), '=')?;
    }
    Ok(())
}

fn draw_status<C: Console + ?Sized>(
    screen: &mut Screen<'_, C>,
    catalog: &Catalog,
    state: &MenuState,
) -> Result<(), ConsoleError> {
    let mut row = screen.viewport().bottom_row() + 2;

    screen.erase_row(row)?;
    screen.print("BEs sorted using ")?;
    screen.print(catalog.sort_key().description())?;
    screen.print(" ")?;
    screen.print(catalog.sort_order().description())?;

    row += 2;
    screen.erase_row(row)?;
    if let Some(left) = state.countdown() {
        screen.print(&alloc::format!("Booting default BE in {} seconds", left))?;
    }

    row += 2;
    for (offset, &(text, help_only)) in LEGEND.iter().enumerate() {
        screen.erase_row(row + offset)?;
        if help_only && !state.help_visible() {
            continue;
        }
        screen.print(text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootenv::{SortKey, SortOrder};
    use crate::console::RawKey;
    use crate::testing::{ScriptedConsole, SCRIPT_EXHAUSTED};
    use alloc::vec;
    use alloc::vec::Vec;

    fn catalog_of(n: u64, active: Option<u64>) -> Catalog {
        let mut catalog = Catalog::new(SortKey::ObjectId, SortOrder::Ascending);
        for id in 0..n {
            let name = alloc::format!("be{}", id);
            catalog
                .insert(BootEnvironment::new(&name, id, 1000 + id).with_active(Some(id) == active))
                .unwrap();
        }
        catalog
    }

    fn viewport(entry_rows: usize) -> Viewport {
        Viewport::new(0, 0, entry_rows + 2, 60)
    }

    #[test]
    fn test_three_scroll_downs_page_of_two() {
        let mut state = MenuState::new(5, 0, 2, None);
        for _ in 0..3 {
            assert_eq!(state.apply(KeyEvent::ScrollDown), Step::Continue);
        }
        assert_eq!(state.active(), 3);
        assert_eq!(state.skip(), 2);
        assert_eq!(state.visible(), 2..4);
    }

    #[test]
    fn test_cursor_stays_in_window() {
        let (count, page) = (11, 3);
        let mut state = MenuState::new(count, 0, page, None);
        for _ in 0..count + 2 {
            state.apply(KeyEvent::ScrollDown);
            assert!(state.skip() <= state.active());
            assert!(state.active() < state.skip() + page);
        }
        assert_eq!(state.active(), count - 1);
        assert_eq!(state.skip(), count - page);

        for _ in 0..count + 2 {
            state.apply(KeyEvent::ScrollUp);
            assert!(state.skip() <= state.active());
            assert!(state.active() < state.skip() + page);
        }
        assert_eq!(state.active(), 0);
        assert_eq!(state.skip(), 0);
    }

    #[test]
    fn test_paging_and_jumps_clamp() {
        let mut state = MenuState::new(10, 0, 4, None);
        state.apply(KeyEvent::PageDown);
        assert_eq!(state.active(), 4);
        state.apply(KeyEvent::PageDown);
        assert_eq!(state.active(), 8);
        state.apply(KeyEvent::PageDown);
        assert_eq!(state.active(), 9);
        assert_eq!(state.skip(), 6);

        state.apply(KeyEvent::PageUp);
        assert_eq!(state.active(), 5);
        state.apply(KeyEvent::PageUp);
        assert_eq!(state.active(), 1);
        state.apply(KeyEvent::PageUp);
        assert_eq!(state.active(), 0);
        assert_eq!(state.skip(), 0);

        state.apply(KeyEvent::End);
        assert_eq!(state.active(), 9);
        state.apply(KeyEvent::Home);
        assert_eq!(state.active(), 0);
    }

    #[test]
    fn test_default_is_scrolled_into_view() {
        let state = MenuState::new(10, 7, 3, Some(5));
        assert_eq!(state.active(), 7);
        assert_eq!(state.skip(), 5);

        let clamped = MenuState::new(2, 9, 3, None);
        assert_eq!(clamped.active(), 1);
    }

    #[test]
    fn test_help_overlay_toggles() {
        let mut state = MenuState::new(4, 0, 2, None);
        state.apply(KeyEvent::Help);
        assert_eq!(state.mode(), MenuMode::HelpOverlay);
        state.apply(KeyEvent::Help);
        assert_eq!(state.mode(), MenuMode::Browsing);

        state.apply(KeyEvent::Help);
        state.apply(KeyEvent::ScrollDown);
        assert_eq!(state.mode(), MenuMode::Browsing);
        assert_eq!(state.active(), 1);
    }

    #[test]
    fn test_terminal_steps() {
        let mut state = MenuState::new(3, 0, 2, None);
        state.apply(KeyEvent::ScrollDown);
        assert_eq!(state.apply(KeyEvent::Enter), Step::Select(1));
        assert_eq!(state.apply(KeyEvent::SortKey), Step::SortKey);
        assert_eq!(state.apply(KeyEvent::SortOrder), Step::SortOrder);
    }

    #[test]
    fn test_countdown_ticks_to_default() {
        let mut state = MenuState::new(6, 2, 3, Some(3));
        state.active = 4;
        assert_eq!(state.apply(KeyEvent::Timeout), Step::Continue);
        assert_eq!(state.countdown(), Some(2));
        assert_eq!(state.apply(KeyEvent::Timeout), Step::Continue);
        assert_eq!(state.apply(KeyEvent::Timeout), Step::Select(2));
        assert_eq!(state.countdown(), None);
    }

    #[test]
    fn test_key_cancels_countdown() {
        let mut state = MenuState::new(6, 0, 3, Some(3));
        state.apply(KeyEvent::Help);
        assert_eq!(state.countdown(), None);
        assert_eq!(state.apply(KeyEvent::Timeout), Step::Continue);
    }

    #[test]
    fn test_empty_catalog_state() {
        let mut state = MenuState::new(0, 0, 3, Some(1));
        assert_eq!(state.apply(KeyEvent::ScrollDown), Step::Continue);
        assert_eq!(state.apply(KeyEvent::End), Step::Continue);
        assert_eq!(state.active(), 0);
        assert_eq!(state.apply(KeyEvent::Enter), Step::Continue);
        assert_eq!(state.visible(), 0..0);
    }

    #[test]
    fn test_select_enter_returns_highlighted_entry() {
        let catalog = catalog_of(5, None);
        let mut console = ScriptedConsole::new(30, 80).with_keys(&[
            RawKey::Char('j'),
            RawKey::Down,
            RawKey::Char('k'),
            RawKey::Char('j'),
            RawKey::Char('\r'),
        ]);
        let outcome = select(&mut console, &viewport(2), &catalog, None).unwrap();
        assert_eq!(outcome, SelectionOutcome::Chosen(catalog.get(2).unwrap()));
        assert_eq!(console.waits, vec![None; 5]);
    }

    #[test]
    fn test_select_sort_requests() {
        let catalog = catalog_of(3, Some(1));
        let mut console = ScriptedConsole::new(30, 80).with_keys(&[RawKey::Char('s')]);
        assert_eq!(
            select(&mut console, &viewport(3), &catalog, Some(5)).unwrap(),
            SelectionOutcome::SortKeyChangeRequested
        );

        let mut console =
            ScriptedConsole::new(30, 80).with_keys(&[RawKey::Char('j'), RawKey::Char('o')]);
        assert_eq!(
            select(&mut console, &viewport(3), &catalog, None).unwrap(),
            SelectionOutcome::SortOrderChangeRequested
        );
        let ids: Vec<u64> = catalog.iter().map(|be| be.object_id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_select_times_out_to_active_entry() {
        let catalog = catalog_of(4, Some(3));
        let mut console = ScriptedConsole::new(30, 80);
        console.push_ticks(3);
        let outcome = select(&mut console, &viewport(2), &catalog, Some(3)).unwrap();
        assert_eq!(outcome, SelectionOutcome::Chosen(catalog.get(3).unwrap()));
        assert_eq!(console.waits, vec![Some(1); 3]);
    }

    #[test]
    fn test_select_key_stops_countdown() {
        let catalog = catalog_of(4, None);
        let mut console = ScriptedConsole::new(30, 80);
        console.push(KeyInput::TimedOut);
        console.push(KeyInput::Pressed(RawKey::Char('x')));
        console.push(KeyInput::Pressed(RawKey::Char('G')));
        console.push(KeyInput::Pressed(RawKey::Char('\r')));
        let outcome = select(&mut console, &viewport(2), &catalog, Some(10)).unwrap();
        assert_eq!(outcome, SelectionOutcome::Chosen(catalog.get(3).unwrap()));
        assert_eq!(console.waits, vec![Some(1), Some(1), None, None]);
    }

    #[test]
    fn test_zero_timeout_boots_default_immediately() {
        let catalog = catalog_of(3, Some(2));
        let mut console = ScriptedConsole::new(30, 80);
        let outcome = select(&mut console, &viewport(2), &catalog, Some(0)).unwrap();
        assert_eq!(outcome, SelectionOutcome::Chosen(catalog.get(2).unwrap()));
        assert!(console.waits.is_empty());
    }

    #[test]
    fn test_empty_catalog_ignores_enter() {
        let catalog = catalog_of(0, None);
        let mut console = ScriptedConsole::new(30, 80)
            .with_keys(&[RawKey::Char('\r'), RawKey::Char('h'), RawKey::Char('o')]);
        let outcome = select(&mut console, &viewport(2), &catalog, None).unwrap();
        assert_eq!(outcome, SelectionOutcome::SortOrderChangeRequested);
        assert_eq!(console.row_text(0), "=".repeat(60));
        assert_eq!(console.row_text(3), "=".repeat(60));
    }

    #[test]
    fn test_console_failure_propagates() {
        let catalog = catalog_of(2, None);
        let mut console = ScriptedConsole::new(30, 80).with_keys(&[RawKey::Char('j')]);
        let err = select(&mut console, &viewport(2), &catalog, None).unwrap_err();
        assert_eq!(err, ConsoleError::Input(SCRIPT_EXHAUSTED));
    }

    #[test]
    fn test_render_window_and_status() {
        let catalog = catalog_of(5, Some(0));
        let mut console = ScriptedConsole::new(30, 80)
            .with_keys(&[RawKey::Char('j'), RawKey::Char('j'), RawKey::Char('j')]);
        let vp = Viewport::new(1, 2, 4, 60);
        let _ = select(&mut console, &vp, &catalog, Some(9));

        // After three moves the window shows be2..be3 with be3 highlighted
        assert_eq!(console.row_text(1), alloc::format!("  {}", "=".repeat(60)));
        assert_eq!(
            console.row_text(2),
            alloc::format!("  |   {}|", catalog.get(2).unwrap().render_line(55))
        );
        assert_eq!(
            console.row_text(3),
            alloc::format!("  | > {}|", catalog.get(3).unwrap().render_line(55))
        );
        assert_eq!(console.row_text(4), alloc::format!("  {}", "=".repeat(60)));

        assert_eq!(
            console.row_text(6),
            "  BEs sorted using 'object number' in ascending order"
        );
        assert_eq!(console.row_text(8), "");
        assert!(console.contains("Default BE marked with '*' at the end"));
        assert!(!console.contains("to change sort key"));
    }

    #[test]
    fn test_box_draws_visible_window() {
        let catalog = catalog_of(5, None);
        let vp = viewport(2);
        let blank = alloc::format!("|{}|", " ".repeat(58));

        let mut state = MenuState::new(catalog.len(), 0, vp.display_rows(), None);
        state.apply(KeyEvent::End);
        assert_eq!(state.visible(), 3..5);

        let mut console = ScriptedConsole::new(10, 80);
        draw_box(&mut Screen::new(&mut console, vp), &catalog, &state).unwrap();
        for (row, index) in state.visible().enumerate() {
            let marker = if index == state.active() { " > " } else { "   " };
            assert_eq!(
                console.row_text(row + 1),
                alloc::format!("|{}{}|", marker, catalog.get(index).unwrap().render_line(55))
            );
        }

        let single = catalog_of(1, None);
        let state = MenuState::new(single.len(), 0, vp.display_rows(), None);
        assert_eq!(state.visible(), 0..1);
        let mut console = ScriptedConsole::new(10, 80);
        draw_box(&mut Screen::new(&mut console, vp), &single, &state).unwrap();
        assert!(console.row_text(1).starts_with("| > be0"));
        assert_eq!(console.row_text(2), blank);
    }

    #[test]
    fn test_render_countdown_and_help() {
        let catalog = catalog_of(2, None);
        let mut console = ScriptedConsole::new(30, 80);
        console.push(KeyInput::TimedOut);
        let _ = select(&mut console, &viewport(2), &catalog, Some(7));
        assert!(console.contains("Booting default BE in 6 seconds"));
        assert!(!console.contains("Press 'o'"));

        let mut console = ScriptedConsole::new(30, 80).with_keys(&[RawKey::Char('?')]);
        let _ = select(&mut console, &viewport(2), &catalog, Some(7));
        assert!(!console.contains("Booting default BE"));
        assert!(console.contains("Press 'o'        to change order of sorting"));
        assert!(console.contains("Press 'g'        to scroll to start"));
    }
}
