//! Boot environment catalog
//!
//! Records are kept in an arena in insertion order; a separate index vector
//! holds the sort order. Insertion is a single forward scan, which is fine for
//! the few dozen environments a pool normally carries.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use log::{debug, info};

/// Longest name or dataset path kept for an environment, in bytes
pub const MAX_NAME_LEN: usize = 255;

/// Attribute the catalog is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ObjectId,
    Timestamp,
    Name,
}

impl SortKey {
    /// Next key in the menu's `s` rotation
    pub const fn next(self) -> Self {
        match self {
            Self::ObjectId => Self::Timestamp,
            Self::Timestamp => Self::Name,
            Self::Name => Self::ObjectId,
        }
    }

    /// Wording used in the status line
    pub const fn description(self) -> &'static str {
        match self {
            Self::ObjectId => "'object number'",
            Self::Timestamp => "'creation timestamp'",
            Self::Name => "'BE name'",
        }
    }

    /// Three-way compare of two environments on this key only
    pub fn compare(self, a: &BootEnvironment, b: &BootEnvironment) -> Ordering {
        match self {
            Self::ObjectId => a.object_id.cmp(&b.object_id),
            Self::Timestamp => a.created_at.cmp(&b.created_at),
            Self::Name => a.name.as_bytes().cmp(b.name.as_bytes()),
        }
    }
}

/// Direction of the catalog ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Ascending => "in ascending order",
            Self::Descending => "in descending order",
        }
    }

    /// Flip a three-way result for descending catalogs
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Catalog insertion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Backing storage could not grow
    #[error("out of memory while adding boot environment")]
    OutOfMemory,
    /// Every 32-bit sequence id has been handed out
    #[error("boot environment sequence ids exhausted")]
    SequenceExhausted,
}

/// One selectable boot environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootEnvironment {
    name: String,
    path: String,
    object_id: u64,
    created_at: u64,
    sequence_id: u32,
    active: bool,
}

impl BootEnvironment {
    /// Create an environment; `name` is cut to [`MAX_NAME_LEN`] bytes
    pub fn new(name: &str, object_id: u64, created_at: u64) -> Self {
        Self {
            name: String::from(bounded(name)),
            path: String::new(),
            object_id,
            created_at,
            sequence_id: 0,
            active: false,
        }
    }

    /// Set the dataset path the environment boots from
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = String::from(bounded(path));
        self
    }

    /// Mark as the currently running/default environment
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Id assigned by the catalog, 0 until inserted
    pub fn sequence_id(&self) -> u32 {
        self.sequence_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Menu line: `<name> (<objnum>) (<timestamp>) <*| >`, cut or padded to
    /// exactly `width` characters.
    pub fn render_line(&self, width: usize) -> String {
        let full = alloc::format!("{}", self);
        let mut line: String = full.chars().take(width).collect();
        let used = line.chars().count();
        line.extend(core::iter::repeat(' ').take(width - used));
        line
    }
}

impl fmt::Display for BootEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.active { '*' } else { ' ' };
        write!(
            f,
            "{} ({}) ({}) {}",
            self.name, self.object_id, self.created_at, marker
        )
    }
}

/// Cut `s` to at most [`MAX_NAME_LEN`] bytes without splitting a character
fn bounded(s: &str) -> &str {
    if s.len() <= MAX_NAME_LEN {
        return s;
    }
    let mut end = MAX_NAME_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Ordered collection of boot environments
pub struct Catalog {
    entries: Vec<BootEnvironment>,
    order: Vec<usize>,
    key: SortKey,
    direction: SortOrder,
    count: u32,
}

impl Catalog {
    pub fn new(key: SortKey, direction: SortOrder) -> Self {
        Self {
            entries: Vec::new(),
            order: Vec::new(),
            key,
            direction,
            count: 0,
        }
    }

    /// Drop every entry and start over with new ordering parameters
    pub fn reset(&mut self, key: SortKey, direction: SortOrder) {
        self.entries.clear();
        self.order.clear();
        self.key = key;
        self.direction = direction;
        self.count = 0;
    }

    pub fn sort_key(&self) -> SortKey {
        self.key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.direction
    }

    /// Number of environments inserted so far
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn compare(&self, a: &BootEnvironment, b: &BootEnvironment) -> Ordering {
        self.direction.apply(self.key.compare(a, b))
    }

    /// Insert `entry` before the first element that sorts after it, so equal
    /// keys keep their insertion order. Returns the assigned sequence id.
    ///
    /// Storage is reserved up front: on error the catalog is unchanged.
    pub fn insert(&mut self, mut entry: BootEnvironment) -> Result<u32, CatalogError> {
        let id = self
            .count
            .checked_add(1)
            .ok_or(CatalogError::SequenceExhausted)?;
        self.entries
            .try_reserve(1)
            .map_err(|_| CatalogError::OutOfMemory)?;
        self.order
            .try_reserve(1)
            .map_err(|_| CatalogError::OutOfMemory)?;

        let position = self
            .order
            .iter()
            .position(|&slot| self.compare(&self.entries[slot], &entry) == Ordering::Greater)
            .unwrap_or(self.order.len());

        entry.sequence_id = id;
        debug!("bootenv: #{} '{}' at position {}", id, entry.name, position);

        let slot = self.entries.len();
        self.entries.push(entry);
        self.order.insert(position, slot);
        self.count = id;
        Ok(id)
    }

    /// Environment at `index` in sort order
    pub fn get(&self, index: usize) -> Option<&BootEnvironment> {
        self.order.get(index).map(|&slot| &self.entries[slot])
    }

    /// Forward traversal in sort order; clone the iterator to restart it
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            entries: &self.entries,
            order: self.order.iter(),
        }
    }

    pub fn lookup_by_object_id(&self, object_id: u64) -> Option<&BootEnvironment> {
        self.iter().find(|be| be.object_id == object_id)
    }

    pub fn lookup_by_timestamp(&self, created_at: u64) -> Option<&BootEnvironment> {
        self.iter().find(|be| be.created_at == created_at)
    }

    /// Case-sensitive match on the bounded name
    pub fn lookup_by_name(&self, name: &str) -> Option<&BootEnvironment> {
        let name = bounded(name);
        self.iter().find(|be| be.name == name)
    }

    pub fn lookup_by_path(&self, path: &str) -> Option<&BootEnvironment> {
        let path = bounded(path);
        self.iter().find(|be| be.path == path)
    }

    pub fn lookup_by_sequence_id(&self, sequence_id: u32) -> Option<&BootEnvironment> {
        self.iter().find(|be| be.sequence_id == sequence_id)
    }

    /// Index of the first environment flagged active, or 0
    pub fn default_index(&self) -> usize {
        self.iter().position(|be| be.active).unwrap_or(0)
    }

    /// Toggle the active flag of the entry with `sequence_id`.
    /// Returns false when no such entry exists.
    pub fn set_active(&mut self, sequence_id: u32, active: bool) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|be| be.sequence_id == sequence_id)
        {
            Some(be) => {
                be.active = active;
                true
            }
            None => false,
        }
    }

    /// Write every entry, in order, to the log
    pub fn dump(&self) {
        for be in self.iter() {
            info!("{}", be);
        }
    }
}

/// Iterator over a [`Catalog`] in sort order
#[derive(Clone)]
pub struct Iter<'a> {
    entries: &'a [BootEnvironment],
    order: core::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a BootEnvironment;

    fn next(&mut self) -> Option<Self::Item> {
        self.order.next().map(|&slot| &self.entries[slot])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.order.next_back().map(|&slot| &self.entries[slot])
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a BootEnvironment;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
