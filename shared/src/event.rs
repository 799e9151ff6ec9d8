use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::capabilities::{PickedImage, RepositoryError};
use crate::model::{ContactInfo, HomePreferences, ItemData, ItemId, ItemType, SubmissionId};
use crate::paging::{ItemPage, PageKind};

/// One edit to the new-item draft; each maps to a dedicated setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftEdit {
    Name(String),
    Place(String),
    Description(String),
    How(String),
    Contact(String),
    Who(String),
    Date(NaiveDate),
    Time(NaiveTime),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// `config_json` is a serialized `CoreConfig`; `None` means defaults.
    AppStarted {
        config_json: Option<String>,
    },
    Navigate {
        route: String,
    },
    NavigateBack,

    // Home
    ShowTypeSelected(ItemType),
    MineOnlyChanged(bool),
    SearchSubmitted {
        query: Option<String>,
    },
    RefreshRequested,
    ListScrolled {
        first_visible_index: usize,
        first_visible_offset: i32,
        last_visible_index: Option<usize>,
    },
    PinMessageClosed,
    SnackbarResolved {
        action_performed: bool,
    },

    // New item
    DraftEdited(DraftEdit),
    PagerScrollChanged {
        in_progress: bool,
    },
    WizardAdvance,
    WizardRetreat,
    AddImageRequested,
    RemoveImage {
        index: usize,
    },

    // Item detail
    ContactRequested,
    CloseItemRequested,
    ShareItemRequested,
    ShareResultRequested,

    DismissError,

    // Capability callbacks, never sent by the shell.
    #[serde(skip)]
    PreferencesLoaded(HomePreferences),
    #[serde(skip)]
    PageLoaded {
        generation: u64,
        kind: PageKind,
        result: Result<ItemPage, RepositoryError>,
    },
    #[serde(skip)]
    ImagePicked(Option<PickedImage>),
    #[serde(skip)]
    ImagesUploaded {
        submission: SubmissionId,
        result: Result<Vec<String>, RepositoryError>,
    },
    #[serde(skip)]
    ItemCreated {
        submission: SubmissionId,
        result: Result<ItemData, RepositoryError>,
    },
    #[serde(skip)]
    ItemLoaded {
        id: ItemId,
        result: Result<ItemData, RepositoryError>,
    },
    #[serde(skip)]
    ContactLoaded {
        id: ItemId,
        result: Result<ContactInfo, RepositoryError>,
    },
    #[serde(skip)]
    ItemClosed {
        id: ItemId,
        result: Result<(), RepositoryError>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted { .. } => "app_started",
            Self::Navigate { .. } => "navigate",
            Self::NavigateBack => "navigate_back",
            Self::ShowTypeSelected(_) => "show_type_selected",
            Self::MineOnlyChanged(_) => "mine_only_changed",
            Self::SearchSubmitted { .. } => "search_submitted",
            Self::RefreshRequested => "refresh_requested",
            Self::ListScrolled { .. } => "list_scrolled",
            Self::PinMessageClosed => "pin_message_closed",
            Self::SnackbarResolved { .. } => "snackbar_resolved",
            Self::DraftEdited(_) => "draft_edited",
            Self::PagerScrollChanged { .. } => "pager_scroll_changed",
            Self::WizardAdvance => "wizard_advance",
            Self::WizardRetreat => "wizard_retreat",
            Self::AddImageRequested => "add_image_requested",
            Self::RemoveImage { .. } => "remove_image",
            Self::ContactRequested => "contact_requested",
            Self::CloseItemRequested => "close_item_requested",
            Self::ShareItemRequested => "share_item_requested",
            Self::ShareResultRequested => "share_result_requested",
            Self::DismissError => "dismiss_error",
            Self::PreferencesLoaded(_) => "preferences_loaded",
            Self::PageLoaded { .. } => "page_loaded",
            Self::ImagePicked(_) => "image_picked",
            Self::ImagesUploaded { .. } => "images_uploaded",
            Self::ItemCreated { .. } => "item_created",
            Self::ItemLoaded { .. } => "item_loaded",
            Self::ContactLoaded { .. } => "contact_loaded",
            Self::ItemClosed { .. } => "item_closed",
        }
    }

    /// Scroll and draft keystrokes are too chatty to log at info level.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::ListScrolled { .. }
                | Self::PagerScrollChanged { .. }
                | Self::DraftEdited(_)
                | Self::PreferencesLoaded(_)
                | Self::PageLoaded { .. }
                | Self::ImagePicked(_)
                | Self::ImagesUploaded { .. }
                | Self::ItemCreated { .. }
                | Self::ItemLoaded { .. }
                | Self::ContactLoaded { .. }
                | Self::ItemClosed { .. }
        )
    }
}
