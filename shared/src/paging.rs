//! Cursor pagination for the listing screen.
//!
//! Each request is tagged with the generation current when it was issued.
//! Starting a refresh bumps the generation, so answers to superseded
//! queries fall on the floor in [`PagedItems::apply`].

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::ItemData;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoading,
    Loading,
    Error(AppError),
}

impl LoadState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageKind {
    Refresh,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub kind: PageKind,
    pub cursor: Option<String>,
}

/// One page as delivered by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemPage {
    pub items: Vec<ItemData>,
    /// `None` once the last page has been served.
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Stale,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placeholder {
    Shimmer,
    NoConnection,
    NoResults { searching: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagedItems {
    items: Vec<ItemData>,
    next_cursor: Option<String>,
    end_reached: bool,
    refresh: LoadState,
    append: LoadState,
    generation: u64,
}

impl PagedItems {
    #[must_use]
    pub fn items(&self) -> &[ItemData] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn end_reached(&self) -> bool {
        self.end_reached
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn refresh_state(&self) -> &LoadState {
        &self.refresh
    }

    #[must_use]
    pub const fn append_state(&self) -> &LoadState {
        &self.append
    }

    /// Starts loading page one. `clear` drops what is on screen; a plain
    /// pull-to-refresh keeps it until the answer lands.
    pub fn begin_refresh(&mut self, clear: bool) -> PageRequest {
        self.generation += 1;
        if clear {
            self.items.clear();
            self.next_cursor = None;
            self.end_reached = false;
        }
        self.refresh = LoadState::Loading;
        self.append = LoadState::NotLoading;

        PageRequest {
            generation: self.generation,
            kind: PageKind::Refresh,
            cursor: None,
        }
    }

    /// Requests the page after the last one loaded, unless a load is in
    /// flight or there is nothing left to fetch.
    pub fn begin_append(&mut self) -> Option<PageRequest> {
        if self.refresh.is_loading() || self.append.is_loading() || self.end_reached {
            return None;
        }
        let cursor = self.next_cursor.clone()?;
        self.append = LoadState::Loading;

        Some(PageRequest {
            generation: self.generation,
            kind: PageKind::Append,
            cursor: Some(cursor),
        })
    }

    pub fn apply(
        &mut self,
        generation: u64,
        kind: PageKind,
        result: Result<ItemPage, AppError>,
    ) -> PageOutcome {
        let state = match kind {
            PageKind::Refresh => &mut self.refresh,
            PageKind::Append => &mut self.append,
        };
        if generation != self.generation || !state.is_loading() {
            return PageOutcome::Stale;
        }

        match result {
            Ok(page) => {
                *state = LoadState::NotLoading;
                match kind {
                    PageKind::Refresh => self.items = page.items,
                    PageKind::Append => self.items.extend(page.items),
                }
                self.end_reached = page.next_cursor.is_none();
                self.next_cursor = page.next_cursor;
                PageOutcome::Applied
            }
            Err(error) => {
                *state = LoadState::Error(error);
                PageOutcome::Failed
            }
        }
    }

    /// True when `last_visible_index` is within `distance` of the loaded tail.
    #[must_use]
    pub fn should_prefetch(&self, last_visible_index: usize, distance: usize) -> bool {
        !self.end_reached
            && self.next_cursor.is_some()
            && last_visible_index.saturating_add(distance).saturating_add(1) >= self.items.len()
    }

    /// The last loaded item is on screen and nothing more will arrive.
    #[must_use]
    pub fn is_scrolled_to_end(&self, last_visible_index: usize) -> bool {
        !self.items.is_empty()
            && last_visible_index.checked_add(1) == Some(self.items.len())
            && self.end_reached
            && !self.append.is_loading()
    }

    #[must_use]
    pub fn placeholder(&self, searching: bool) -> Option<Placeholder> {
        if let LoadState::Error(_) = self.refresh {
            return Some(Placeholder::NoConnection);
        }
        if !self.items.is_empty() {
            return None;
        }
        if self.refresh.is_loading() {
            Some(Placeholder::Shimmer)
        } else if self.end_reached {
            Some(Placeholder::NoResults { searching })
        } else {
            None
        }
    }

    /// Swaps an item in place, e.g. after it was closed.
    pub fn replace(&mut self, item: &ItemData) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item.clone();
        }
    }
}
