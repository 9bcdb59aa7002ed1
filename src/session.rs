//! Menu session: rebuilds the catalog whenever the operator changes the sort
//! and runs the menu again until an environment is chosen.

use alloc::vec::Vec;

use log::{info, warn};

use crate::bootenv::{BootEnvironment, Catalog, CatalogError, SortKey, SortOrder};
use crate::config::MenuConfig;
use crate::console::{Console, Viewport};
use crate::error::Error;
use crate::menu::{select, SelectionOutcome};

pub struct MenuSession {
    entries: Vec<BootEnvironment>,
    sort_key: SortKey,
    sort_order: SortOrder,
    viewport: Viewport,
    timeout: Option<u32>,
}

impl MenuSession {
    pub fn new(
        entries: Vec<BootEnvironment>,
        sort_key: SortKey,
        sort_order: SortOrder,
        viewport: Viewport,
        timeout: Option<u32>,
    ) -> Self {
        Self {
            entries,
            sort_key,
            sort_order,
            viewport,
            timeout,
        }
    }

    pub fn from_config(config: MenuConfig) -> Self {
        Self::new(
            config.entries,
            config.sort_key,
            config.sort_order,
            config.viewport,
            config.timeout,
        )
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    /// Catalog of every discovered environment under the current sort
    pub fn build_catalog(&self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::new(self.sort_key, self.sort_order);
        for be in &self.entries {
            catalog.insert(be.clone())?;
        }
        Ok(catalog)
    }

    /// Show the menu until the operator picks an environment.
    ///
    /// A sort change rebuilds the catalog and shows the menu again with the
    /// cursor back on the default entry and auto-boot off. Returns `None`
    /// when there is nothing to choose from.
    pub fn run<C: Console + ?Sized>(
        &mut self,
        console: &mut C,
    ) -> Result<Option<BootEnvironment>, Error> {
        if self.entries.is_empty() {
            warn!("session: no boot environments to choose from");
            return Ok(None);
        }

        loop {
            let catalog = self.build_catalog()?;
            catalog.dump();

            match select(console, &self.viewport, &catalog, self.timeout)? {
                SelectionOutcome::Chosen(be) => return Ok(Some(be.clone())),
                SelectionOutcome::SortKeyChangeRequested => {
                    self.sort_key = self.sort_key.next();
                    info!("session: sorting by {}", self.sort_key.description());
                }
                SelectionOutcome::SortOrderChangeRequested => {
                    self.sort_order = self.sort_order.reversed();
                    info!("session: sorting {}", self.sort_order.description());
                }
            }
            self.timeout = None;
        }
    }
}
