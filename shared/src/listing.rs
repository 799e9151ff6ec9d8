//! Home screen controller: filters, pinned banners, the floating action
//! button and the one-shot prompts shown at the bottom of the list.

use serde::{Deserialize, Serialize};

use crate::capabilities::ItemQuery;
use crate::model::{HomePreferences, ItemType};
use crate::paging::PagedItems;
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndPrompt {
    PostLostItem,
    FillProfile,
}

impl EndPrompt {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PostLostItem => {
                "Didn't find what you lost? Don't give up! Post a lost item so whoever finds it can reach you."
            }
            Self::FillProfile => {
                "Looks like your profile is empty. Fill it in to get notified when your things turn up!"
            }
        }
    }

    #[must_use]
    pub const fn action_label(self) -> &'static str {
        match self {
            Self::PostLostItem => "Post now",
            Self::FillProfile => "Fill in",
        }
    }

    #[must_use]
    pub const fn target(self) -> Route {
        match self {
            Self::PostLostItem => Route::NewItem(ItemType::Lost),
            Self::FillProfile => Route::Profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PinnedBanner {
    Explanation { item_type: ItemType },
    BrowsingOwnPosts,
}

impl PinnedBanner {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Explanation {
                item_type: ItemType::Found,
            } => "Items other people picked up are posted here.\nIf you lost something, look here first!",
            Self::Explanation {
                item_type: ItemType::Lost,
            } => "Owners post what they lost here.\nIf you spot one of these, get in touch!",
            Self::BrowsingOwnPosts => "You are browsing your own posts",
        }
    }
}

/// What closing the pinned banner asks of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDismissal {
    Nothing,
    LeaveMineOnly,
    Persist(HomePreferences),
}

/// What resolving the prompt asks of the app.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptResolution {
    pub navigate: Option<Route>,
    pub persist: Option<HomePreferences>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ScrollTracker {
    prev_index: usize,
    prev_offset: i32,
}

impl ScrollTracker {
    /// Returns whether the FAB should be extended, i.e. the list moved up
    /// or stayed put.
    fn observe(&mut self, index: usize, offset: i32) -> bool {
        let extended =
            (index == self.prev_index && offset <= self.prev_offset) || index < self.prev_index;
        self.prev_index = index;
        self.prev_offset = offset;
        extended
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    show_type: ItemType,
    mine_only: bool,
    search: Option<String>,
    prefs: Option<HomePreferences>,
    scroll: ScrollTracker,
    fab_extended: bool,
    was_at_end: bool,
    profile_prompted: bool,
    snackbar: Option<EndPrompt>,
    pub items: PagedItems,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            show_type: ItemType::Found,
            mine_only: false,
            search: None,
            prefs: None,
            scroll: ScrollTracker::default(),
            fab_extended: true,
            was_at_end: false,
            profile_prompted: false,
            snackbar: None,
            items: PagedItems::default(),
        }
    }
}

impl ListingState {
    #[must_use]
    pub const fn show_type(&self) -> ItemType {
        self.show_type
    }

    #[must_use]
    pub const fn mine_only(&self) -> bool {
        self.mine_only
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    #[must_use]
    pub const fn preferences(&self) -> Option<HomePreferences> {
        self.prefs
    }

    #[must_use]
    pub const fn fab_extended(&self) -> bool {
        self.fab_extended
    }

    #[must_use]
    pub const fn snackbar(&self) -> Option<EndPrompt> {
        self.snackbar
    }

    /// Each setter returns `true` when the filter actually changed.
    pub fn set_show_type(&mut self, show_type: ItemType) -> bool {
        let changed = self.show_type != show_type;
        self.show_type = show_type;
        changed
    }

    pub fn set_mine_only(&mut self, mine_only: bool) -> bool {
        let changed = self.mine_only != mine_only;
        self.mine_only = mine_only;
        changed
    }

    /// Blank queries mean "no search".
    pub fn set_search(&mut self, query: Option<&str>) -> bool {
        let search = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        let changed = self.search != search;
        self.search = search;
        changed
    }

    #[must_use]
    pub fn query(&self, page_size: u32, cursor: Option<String>) -> ItemQuery {
        ItemQuery {
            item_type: self.show_type,
            mine_only: self.mine_only,
            search: self.search.clone(),
            cursor,
            page_size,
        }
    }

    pub fn apply_preferences(&mut self, prefs: HomePreferences) {
        self.prefs = Some(prefs);
    }

    /// Hidden until preferences arrive, so a dismissed banner never flashes.
    #[must_use]
    pub fn pinned_banner(&self) -> Option<PinnedBanner> {
        if self.mine_only {
            return Some(PinnedBanner::BrowsingOwnPosts);
        }
        let prefs = self.prefs?;
        prefs
            .pin_mask
            .shows(self.show_type)
            .then_some(PinnedBanner::Explanation {
                item_type: self.show_type,
            })
    }

    pub fn close_pin_message(&mut self) -> PinDismissal {
        if self.mine_only {
            self.mine_only = false;
            return PinDismissal::LeaveMineOnly;
        }
        let Some(prefs) = self.prefs.as_mut() else {
            return PinDismissal::Nothing;
        };
        if !prefs.pin_mask.shows(self.show_type) {
            return PinDismissal::Nothing;
        }
        prefs.pin_mask = prefs.pin_mask.dismissed(self.show_type);
        PinDismissal::Persist(*prefs)
    }

    pub fn on_scroll(&mut self, first_visible_index: usize, first_visible_offset: i32) {
        self.fab_extended = self.scroll.observe(first_visible_index, first_visible_offset);
    }

    /// Scroll positions start over when the filter changes.
    pub fn reset_scroll(&mut self) {
        self.scroll = ScrollTracker::default();
        self.fab_extended = true;
        self.was_at_end = false;
    }

    /// Raises at most one prompt. The lost-item suggestion fires on the
    /// rising edge of "scrolled to the end of the FOUND list"; the profile
    /// nudge fires once, whenever the former does not apply.
    pub fn evaluate_prompts(&mut self, last_visible_index: Option<usize>) -> Option<EndPrompt> {
        let at_end = last_visible_index.is_some_and(|i| self.items.is_scrolled_to_end(i))
            && self.show_type == ItemType::Found
            && !self.mine_only;
        let rising = at_end && !self.was_at_end;
        self.was_at_end = at_end;

        if self.snackbar.is_some() {
            return None;
        }

        let prompt = if rising {
            Some(EndPrompt::PostLostItem)
        } else if !at_end
            && !self.profile_prompted
            && self.prefs.is_some_and(|p| p.can_show_profile_popup)
        {
            self.profile_prompted = true;
            Some(EndPrompt::FillProfile)
        } else {
            None
        };
        self.snackbar = prompt;
        prompt
    }

    pub fn resolve_prompt(&mut self, action_performed: bool) -> PromptResolution {
        let Some(prompt) = self.snackbar.take() else {
            return PromptResolution::default();
        };
        let navigate = action_performed.then(|| prompt.target());
        let persist = match (prompt, self.prefs.as_mut()) {
            (EndPrompt::FillProfile, Some(prefs)) if prefs.can_show_profile_popup => {
                prefs.can_show_profile_popup = false;
                Some(*prefs)
            }
            _ => None,
        };
        PromptResolution { navigate, persist }
    }
}
