use std::fmt;
use std::num::NonZeroUsize;

use chrono::{DateTime, FixedOffset};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::error::AppError;
use crate::listing::ListingState;
use crate::routes::Navigator;
use crate::wizard::NewItemWizard;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(ItemId);
typed_id!(SubmissionId);

impl SubmissionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Whether a listing reports something lost or something found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Lost,
    #[default]
    Found,
}

impl ItemType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lost" => Some(Self::Lost),
            "found" => Some(Self::Found),
            _ => None,
        }
    }

    /// Found items must name who picked them up before they can be posted.
    #[must_use]
    pub const fn requires_claimant(self) -> bool {
        matches!(self, Self::Found)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit timestamp unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct UnixTimeMs(pub i64);

impl UnixTimeMs {
    #[must_use]
    pub fn to_offset(self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(self.0).map(|utc| utc.with_timezone(&offset))
    }

    #[must_use]
    pub fn format(self, offset: FixedOffset) -> String {
        self.to_offset(offset)
            .map(|dt| dt.format("%Y/%m/%d %H:%M").to_string())
            .unwrap_or_default()
    }
}

/// A listing as returned by the item repository. Never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub date: UnixTimeMs,
    pub place: String,
    pub how: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub resolved: bool,
}

impl ItemData {
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub fn into_resolved(self) -> Self {
        Self {
            resolved: true,
            ..self
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub contact: String,
    pub name: Option<String>,
}

// Redact debug output because this is another user's personal data.
impl fmt::Debug for ContactInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactInfo")
            .field("contact_present", &!self.contact.is_empty())
            .field("name_present", &self.name.is_some())
            .finish()
    }
}

/// Bitmask of pinned explanation banners still to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMask(pub u8);

impl PinMask {
    pub const LOST: u8 = 0b01;
    pub const FOUND: u8 = 0b10;
    pub const ALL: Self = Self(Self::LOST | Self::FOUND);

    const fn bit(item_type: ItemType) -> u8 {
        match item_type {
            ItemType::Lost => Self::LOST,
            ItemType::Found => Self::FOUND,
        }
    }

    #[must_use]
    pub const fn shows(self, item_type: ItemType) -> bool {
        self.0 & Self::bit(item_type) != 0
    }

    #[must_use]
    pub const fn dismissed(self, item_type: ItemType) -> Self {
        Self(self.0 & !Self::bit(item_type))
    }
}

impl Default for PinMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Home screen flags kept by the shell's preference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomePreferences {
    #[serde(default)]
    pub pin_mask: PinMask,
    #[serde(default = "default_true")]
    pub can_show_profile_popup: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HomePreferences {
    fn default() -> Self {
        Self {
            pin_mask: PinMask::ALL,
            can_show_profile_popup: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(AppError),
}

impl<T> Loadable<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// State behind `item/{id}` and `item/{id}/contact`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetail {
    pub id: ItemId,
    pub item: Loadable<ItemData>,
    pub contact: Option<Loadable<ContactInfo>>,
    pub closing: bool,
}

impl ItemDetail {
    #[must_use]
    pub fn new(id: ItemId, cached: Option<ItemData>) -> Self {
        Self {
            id,
            item: cached.map_or(Loadable::Loading, Loadable::Ready),
            contact: None,
            closing: false,
        }
    }
}

pub struct Model {
    pub config: CoreConfig,
    pub navigator: Navigator,
    pub listing: ListingState,
    pub wizard: Option<NewItemWizard>,
    pub detail: Option<ItemDetail>,
    pub closed_item: Option<ItemData>,
    pub item_cache: LruCache<ItemId, ItemData>,
    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        Self::with_config(CoreConfig::default())
    }
}

impl Model {
    #[must_use]
    pub fn with_config(config: CoreConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.item_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            navigator: Navigator::default(),
            listing: ListingState::default(),
            wizard: None,
            detail: None,
            closed_item: None,
            item_cache: LruCache::new(capacity),
            active_error: None,
            config,
        }
    }

    pub fn set_error(&mut self, error: impl Into<AppError>) {
        self.active_error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn cache_item(&mut self, item: ItemData) {
        self.item_cache.put(item.id.clone(), item);
    }

    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.config.utc_offset()
    }
}
