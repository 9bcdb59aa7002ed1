//! RavenBoot boot environment menu
//!
//! Lets the operator pick which boot environment (a named, timestamped
//! snapshot of the root dataset) the machine starts. The crate is `no_std`
//! and has no firmware dependencies so the catalog and the menu state machine
//! can be unit tested on the host; the UEFI glue lives in the binary.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bootenv;
pub mod config;
pub mod console;
pub mod error;
pub mod keymap;
pub mod menu;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use bootenv::{BootEnvironment, Catalog, CatalogError, SortKey, SortOrder};
pub use config::{ConfigError, MenuConfig};
pub use console::{Console, ConsoleError, CursorPosition, KeyInput, RawKey, Viewport};
pub use error::Error;
pub use keymap::KeyEvent;
pub use menu::{select, SelectionOutcome};
pub use session::MenuSession;
