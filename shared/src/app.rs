use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attachment::{decode_attachment, ImageError, WEBP_MIME_TYPE};
use crate::capabilities::{
    Items, NewItemPayload, PickedImage, Picker, Preferences, Render, RepositoryError, Share,
    ShareOperation, UploadImage,
};
use crate::config::CoreConfig;
use crate::error::{AppError, ErrorKind};
use crate::event::{DraftEdit, Event};
use crate::listing::{EndPrompt, PinDismissal, PinnedBanner};
use crate::model::{
    ContactInfo, ItemData, ItemDetail, ItemId, ItemType, Loadable, Model, SubmissionId,
    UnixTimeMs,
};
use crate::paging::{ItemPage, PageKind, PageOutcome, PageRequest, Placeholder};
use crate::routes::Route;
use crate::wizard::{
    next_button, prev_button, DraftField, NewItemDraft, NewItemWizard, PagerButton, WizardEffect,
    WizardStage,
};

/// Rows of shimmer shown while the first page loads.
const SHIMMER_ROWS: usize = 10;

#[derive(Default)]
pub struct App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub items: Items<Event>,
    pub picker: Picker<Event>,
    pub share: Share<Event>,
    pub preferences: Preferences<Event>,
    pub render: Render<Event>,
}

// --- View model ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub route: String,
    pub can_go_back: bool,
    pub screen: Screen,
    pub snackbar: Option<SnackbarView>,
    pub error: Option<UserFacingError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Home(HomeView),
    NewItem(NewItemView),
    ItemDetail(ItemDetailView),
    Contact(ContactView),
    ItemClosed(ItemClosedView),
    Profile,
    Notifications,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeView {
    pub title: String,
    pub show_type: ItemType,
    pub mine_only: bool,
    pub search: Option<String>,
    pub banner: Option<BannerView>,
    pub fab_extended: bool,
    pub cards: Vec<ItemCard>,
    pub placeholder: Option<Placeholder>,
    pub shimmer_rows: usize,
    pub refreshing: bool,
    pub loading_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerView {
    pub banner: PinnedBanner,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCard {
    pub id: ItemId,
    pub item_type: ItemType,
    pub name: String,
    pub place: String,
    pub date: String,
    pub thumbnail: Option<String>,
    pub resolved: bool,
}

impl ItemCard {
    fn new(item: &ItemData, offset: FixedOffset) -> Self {
        Self {
            id: item.id.clone(),
            item_type: item.item_type,
            name: item.name.clone(),
            place: item.place.clone(),
            date: item.date.format(offset),
            thumbnail: item.thumbnail().map(str::to_string),
            resolved: item.resolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentView {
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItemView {
    pub item_type: ItemType,
    pub stage: WizardStage,
    pub stage_index: usize,
    pub prev_button: Option<PagerButton>,
    pub next_button: Option<PagerButton>,
    pub name: String,
    pub place: String,
    pub description: String,
    pub how: String,
    pub contact: String,
    pub who: String,
    pub who_required: bool,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM`
    pub time: Option<String>,
    pub field_errors: Vec<DraftField>,
    pub images: Vec<AttachmentView>,
    pub can_add_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetailView {
    pub id: ItemId,
    pub loading: bool,
    pub item: Option<ItemDetailData>,
    pub can_close: bool,
    pub closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetailData {
    pub item_type: ItemType,
    pub name: String,
    pub description: Option<String>,
    pub place: String,
    pub how: String,
    pub date: String,
    pub images: Vec<String>,
    pub resolved: bool,
    pub is_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactView {
    pub item_id: ItemId,
    pub loading: bool,
    pub contact: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemClosedView {
    pub name: Option<String>,
    pub can_share: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnackbarView {
    pub prompt: EndPrompt,
    pub message: String,
    pub action_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacingError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&AppError> for UserFacingError {
    fn from(error: &AppError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.user_facing_message(),
            retryable: error.is_retryable(),
        }
    }
}

// --- Update helpers ---

impl App {
    fn start(model: &mut Model, caps: &Capabilities, config_json: Option<String>) {
        let (config, config_error) = match config_json.as_deref().map(CoreConfig::from_json) {
            None => (CoreConfig::default(), None),
            Some(Ok(config)) => (config, None),
            Some(Err(e)) => {
                warn!(error = %e, "invalid config, falling back to defaults");
                (CoreConfig::default(), Some(e))
            }
        };

        *model = Model::with_config(config);
        if let Some(e) = config_error {
            model.set_error(e);
        }

        caps.preferences.load(Event::PreferencesLoaded);
        Self::refresh_listing(model, caps, true);
        info!(
            page_size = model.config.page_size,
            max_images = model.config.max_images,
            "core started"
        );
    }

    fn refresh_listing(model: &mut Model, caps: &Capabilities, clear: bool) {
        let request = model.listing.items.begin_refresh(clear);
        Self::request_page(model, caps, request);
    }

    fn request_page(model: &Model, caps: &Capabilities, request: PageRequest) {
        let PageRequest {
            generation,
            kind,
            cursor,
        } = request;
        let query = model.listing.query(model.config.page_size, cursor);
        debug!(generation, ?kind, item_type = %query.item_type, "requesting page");

        caps.items.fetch_items(query, move |result| Event::PageLoaded {
            generation,
            kind,
            result,
        });
    }

    fn on_filter_changed(model: &mut Model, caps: &Capabilities) {
        model.listing.reset_scroll();
        Self::refresh_listing(model, caps, true);
    }

    fn on_page_loaded(
        model: &mut Model,
        generation: u64,
        kind: PageKind,
        result: Result<ItemPage, RepositoryError>,
    ) {
        if let Ok(page) = &result {
            if generation == model.listing.items.generation() {
                for item in &page.items {
                    model.cache_item(item.clone());
                }
            }
        }

        match model
            .listing
            .items
            .apply(generation, kind, result.map_err(AppError::from))
        {
            PageOutcome::Stale => debug!(generation, ?kind, "dropping stale page"),
            PageOutcome::Failed => warn!(generation, ?kind, "page load failed"),
            PageOutcome::Applied => debug!(
                generation,
                ?kind,
                loaded = model.listing.items.len(),
                end_reached = model.listing.items.end_reached(),
                "page applied"
            ),
        }
    }

    /// Pushes `route` and prepares the state behind it.
    fn enter_route(model: &mut Model, caps: &Capabilities, route: Route) {
        match &route {
            Route::Home(item_type) => {
                model.wizard = None;
                model.detail = None;
                model.closed_item = None;
                if model.listing.set_show_type(*item_type) {
                    Self::on_filter_changed(model, caps);
                }
            }
            // Only one draft may be open.
            Route::NewItem(_) if model.wizard.is_some() => {
                info!(%route, "a new item draft is already open");
                return;
            }
            Route::NewItem(item_type) => Self::open_wizard(model, *item_type),
            Route::Item(id) => Self::open_item(model, caps, id.clone()),
            Route::Contact(id) => Self::open_contact(model, caps, id.clone()),
            Route::ItemClosed | Route::Profile | Route::Notifications => {}
        }

        debug!(%route, "entering route");
        model.navigator.push(route);
    }

    fn open_wizard(model: &mut Model, item_type: ItemType) {
        model.wizard = Some(NewItemWizard::new(item_type, model.config.max_images));
    }

    /// Shows the cached copy, if any, while the fresh one loads.
    fn open_item(model: &mut Model, caps: &Capabilities, id: ItemId) {
        let cached = model.item_cache.get(&id).cloned();
        model.detail = Some(ItemDetail::new(id.clone(), cached));
        caps.items.fetch_item(id.clone(), move |result| Event::ItemLoaded {
            id,
            result,
        });
    }

    fn open_contact(model: &mut Model, caps: &Capabilities, id: ItemId) {
        if model.detail.as_ref().map(|d| &d.id) != Some(&id) {
            let cached = model.item_cache.get(&id).cloned();
            model.detail = Some(ItemDetail::new(id.clone(), cached));
        }
        if let Some(detail) = model.detail.as_mut() {
            detail.contact = Some(Loadable::Loading);
        }
        caps.items.get_contact(id.clone(), move |result| Event::ContactLoaded {
            id,
            result,
        });
    }

    /// Rebuilds state for the route a pop uncovered when the closed screen replaced it.
    fn resume_route(model: &mut Model, caps: &Capabilities) {
        match model.navigator.current().clone() {
            Route::NewItem(item_type) if model.wizard.is_none() => {
                Self::open_wizard(model, item_type);
            }
            Route::Item(id) if model.detail.as_ref().is_none_or(|d| d.id != id) => {
                debug!(%id, "reloading uncovered item");
                Self::open_item(model, caps, id);
            }
            Route::Contact(id)
                if model
                    .detail
                    .as_ref()
                    .is_none_or(|d| d.id != id || d.contact.is_none()) =>
            {
                debug!(%id, "reloading uncovered contact");
                Self::open_contact(model, caps, id);
            }
            _ => {}
        }
    }

    fn on_route_left(model: &mut Model, left: &Route) {
        match left {
            Route::NewItem(_) => model.wizard = None,
            Route::Item(_) => model.detail = None,
            Route::Contact(_) => {
                if let Some(detail) = model.detail.as_mut() {
                    detail.contact = None;
                }
            }
            Route::ItemClosed => model.closed_item = None,
            Route::Home(_) | Route::Profile | Route::Notifications => {}
        }
    }

    fn navigate_back(model: &mut Model, caps: &Capabilities) {
        if exit_blocked(model) {
            info!("back navigation refused while sending");
            return;
        }
        match model.navigator.pop() {
            Some(left) => {
                Self::on_route_left(model, &left);
                Self::resume_route(model, caps);
            }
            None => debug!("already at the root route"),
        }
    }

    fn on_draft_edited(draft: &mut NewItemDraft, edit: DraftEdit) {
        match edit {
            DraftEdit::Name(v) => draft.set_name(v),
            DraftEdit::Place(v) => draft.set_place(v),
            DraftEdit::Description(v) => draft.set_description(v),
            DraftEdit::How(v) => draft.set_how(v),
            DraftEdit::Contact(v) => draft.set_contact(v),
            DraftEdit::Who(v) => draft.set_who(v),
            DraftEdit::Date(v) => draft.set_date(v),
            DraftEdit::Time(v) => draft.set_time(v),
        }
    }

    fn on_wizard_advance(model: &mut Model, caps: &Capabilities) {
        let Some(wizard) = model.wizard.as_mut() else {
            debug!("advance without an open wizard");
            return;
        };
        let from = wizard.stage();
        let effect = wizard.advance();
        debug!(?from, to = ?wizard.stage(), ?effect, "wizard advance");

        match effect {
            Some(WizardEffect::Submit) => Self::submit(model, caps),
            Some(WizardEffect::Close) => Self::navigate_back(model, caps),
            Some(WizardEffect::RevealFieldErrors) | None => {}
        }
    }

    /// Uploads every attachment in order; creation follows in `on_images_uploaded`.
    fn submit(model: &Model, caps: &Capabilities) {
        let Some(wizard) = model.wizard.as_ref() else {
            return;
        };
        let Some(submission) = wizard.submission().cloned() else {
            warn!("submit without a submission id");
            return;
        };

        let images: Vec<UploadImage> = wizard
            .attachments()
            .iter()
            .map(|image| UploadImage {
                file_name: image.file_name(),
                mime_type: WEBP_MIME_TYPE.to_string(),
                data: image.data.clone(),
            })
            .collect();
        info!(%submission, images = images.len(), "submitting new item");

        caps.items.upload_images(images, move |result| Event::ImagesUploaded {
            submission,
            result,
        });
    }

    fn on_images_uploaded(
        model: &mut Model,
        caps: &Capabilities,
        submission: SubmissionId,
        result: Result<Vec<String>, RepositoryError>,
    ) {
        let offset = model.utc_offset();
        let Some(wizard) = model.wizard.as_mut() else {
            debug!(%submission, "upload finished after the wizard closed");
            return;
        };
        if wizard.submission() != Some(&submission) {
            debug!(%submission, "ignoring stale upload result");
            return;
        }

        match result {
            Ok(urls) => {
                let Some(draft) = wizard.submitted_draft() else {
                    warn!(%submission, "upload finished without a frozen draft");
                    return;
                };
                let payload = new_item_payload(draft, submission.clone(), urls, offset);
                caps.items.create_item(payload, move |result| Event::ItemCreated {
                    submission,
                    result,
                });
            }
            Err(e) => {
                warn!(%submission, error = %e, "image upload failed");
                wizard.fail_submission(&submission);
                model.set_error(e);
            }
        }
    }

    fn on_item_created(
        model: &mut Model,
        submission: SubmissionId,
        result: Result<ItemData, RepositoryError>,
    ) {
        let Some(wizard) = model.wizard.as_mut() else {
            debug!(%submission, "create finished after the wizard closed");
            return;
        };
        if wizard.submission() != Some(&submission) {
            debug!(%submission, "ignoring stale create result");
            return;
        }

        match result {
            Ok(item) => {
                wizard.complete_submission(&submission);
                info!(%submission, item = %item.id, "new item posted");
                model.cache_item(item);
            }
            Err(e) => {
                warn!(%submission, error = %e, "create item failed");
                wizard.fail_submission(&submission);
                model.set_error(e);
            }
        }
    }

    fn on_image_picked(model: &mut Model, picked: Option<PickedImage>) {
        let Some(picked) = picked else {
            debug!("image pick cancelled");
            return;
        };
        let limits = model.config.image.clone();
        let Some(wizard) = model.wizard.as_mut() else {
            debug!("image picked after the wizard closed");
            return;
        };

        if !wizard.is_editable() {
            debug!(stage = ?wizard.stage(), "image picked after leaving the edit page");
            return;
        }

        let added =
            decode_attachment(&limits, &picked.bytes).and_then(|image| wizard.add_image(image));
        if let Err(e) = added {
            warn!(error = %e, mime_type = ?picked.mime_type, "could not attach image");
            model.set_error(e);
        }
    }

    fn on_close_item_requested(model: &mut Model, caps: &Capabilities) {
        let Some(detail) = model.detail.as_mut() else {
            return;
        };
        let Some(item) = detail.item.ready() else {
            debug!(id = %detail.id, "close requested before the item loaded");
            return;
        };
        if item.resolved || detail.closing {
            return;
        }
        if !item.is_owner {
            model.set_error(AppError::new(
                ErrorKind::Validation,
                "Only the poster can close this item",
            ));
            return;
        }

        detail.closing = true;
        let id = detail.id.clone();
        info!(%id, "closing item");
        caps.items.end_item(id.clone(), move |result| Event::ItemClosed { id, result });
    }

    fn on_item_closed(model: &mut Model, id: ItemId, result: Result<(), RepositoryError>) {
        if let Err(e) = result {
            warn!(%id, error = %e, "close item failed");
            if let Some(detail) = model.detail.as_mut().filter(|d| d.id == id) {
                detail.closing = false;
            }
            model.set_error(e);
            return;
        }

        let item = model
            .detail
            .as_ref()
            .filter(|d| d.id == id)
            .and_then(|d| d.item.ready().cloned())
            .or_else(|| model.item_cache.peek(&id).cloned());
        let Some(resolved) = item.map(ItemData::into_resolved) else {
            debug!(%id, "closed item no longer in memory");
            return;
        };

        model.listing.items.replace(&resolved);
        model.cache_item(resolved.clone());

        if model.navigator.current() == &Route::Item(id.clone()) {
            model.detail = None;
            model.closed_item = Some(resolved);
            model.navigator.replace(Route::ItemClosed);
        }
    }

    fn on_item_loaded(model: &mut Model, id: ItemId, result: Result<ItemData, RepositoryError>) {
        match result {
            Ok(item) => {
                if let Some(detail) = model.detail.as_mut().filter(|d| d.id == id) {
                    detail.item = Loadable::Ready(item.clone());
                }
                model.cache_item(item);
            }
            Err(e) => {
                warn!(%id, error = %e, "item load failed");
                let Some(detail) = model.detail.as_mut().filter(|d| d.id == id) else {
                    return;
                };
                let error = AppError::from(e);
                // A cached copy stays on screen; the error is still surfaced.
                if detail.item.ready().is_none() {
                    detail.item = Loadable::Failed(error.clone());
                }
                model.set_error(error);
            }
        }
    }

    fn on_contact_loaded(
        model: &mut Model,
        id: ItemId,
        result: Result<ContactInfo, RepositoryError>,
    ) {
        let Some(detail) = model.detail.as_mut().filter(|d| d.id == id) else {
            debug!(%id, "contact arrived for an item no longer shown");
            return;
        };
        match result {
            Ok(contact) => detail.contact = Some(Loadable::Ready(contact)),
            Err(e) => {
                warn!(%id, error = %e, "contact load failed");
                let error = AppError::from(e);
                detail.contact = Some(Loadable::Failed(error.clone()));
                model.set_error(error);
            }
        }
    }

    fn share_item(model: &Model, caps: &Capabilities) {
        let Some(item) = model.detail.as_ref().and_then(|d| d.item.ready()) else {
            debug!("nothing to share");
            return;
        };
        let verb = match item.item_type {
            ItemType::Lost => "Lost",
            ItemType::Found => "Found",
        };
        let url = model
            .config
            .share_base()
            .ok()
            .flatten()
            .and_then(|base| base.join(&format!("item/{}", item.id)).ok())
            .map(String::from);

        caps.share.share(ShareOperation {
            title: item.name.clone(),
            text: format!("{verb}: {} at {}", item.name, item.place),
            url,
        });
    }

    fn share_result(model: &Model, caps: &Capabilities) {
        let Some(item) = model.closed_item.as_ref() else {
            debug!("no closed item to share");
            return;
        };
        let text = match item.item_type {
            ItemType::Lost => format!("I got my {} back!", item.name),
            ItemType::Found => format!(
                "The {} found at {} is back with its owner!",
                item.name, item.place
            ),
        };
        caps.share.share(ShareOperation {
            title: item.name.clone(),
            text,
            url: None,
        });
    }
}

/// The only screen that cannot be left is a wizard mid-submission.
fn exit_blocked(model: &Model) -> bool {
    model.wizard.as_ref().is_some_and(NewItemWizard::blocks_exit)
}

fn new_item_payload(
    draft: &NewItemDraft,
    idempotency_key: SubmissionId,
    images: Vec<String>,
    offset: FixedOffset,
) -> NewItemPayload {
    let non_blank = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    NewItemPayload {
        idempotency_key,
        item_type: draft.item_type(),
        name: draft.name().trim().to_string(),
        description: non_blank(draft.description()),
        date: draft
            .occurred_at()
            .and_then(|local| local.and_local_timezone(offset).single())
            .map(|dt| UnixTimeMs(dt.timestamp_millis())),
        place: draft.place().trim().to_string(),
        how: draft.how().trim().to_string(),
        images,
        contact: draft.contact().trim().to_string(),
        who: if draft.item_type().requires_claimant() {
            non_blank(draft.who())
        } else {
            None
        },
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_user_initiated() {
            info!(event = event.name(), "event");
        } else {
            debug!(event = event.name(), "event");
        }

        match event {
            Event::AppStarted { config_json } => Self::start(model, caps, config_json),

            Event::Navigate { route } => match Route::parse(&route) {
                Ok(route) if exit_blocked(model) => {
                    info!(%route, "navigation refused while sending");
                }
                Ok(route) => Self::enter_route(model, caps, route),
                Err(e) => {
                    warn!(error = %e, "bad route");
                    model.set_error(e);
                }
            },

            Event::NavigateBack => Self::navigate_back(model, caps),

            Event::ShowTypeSelected(item_type) => {
                if exit_blocked(model) {
                    info!(%item_type, "show type change refused while sending");
                } else {
                    Self::enter_route(model, caps, Route::Home(item_type));
                }
            }

            Event::MineOnlyChanged(mine_only) => {
                if model.listing.set_mine_only(mine_only) {
                    Self::on_filter_changed(model, caps);
                }
            }

            Event::SearchSubmitted { query } => {
                if model.listing.set_search(query.as_deref()) {
                    Self::on_filter_changed(model, caps);
                }
            }

            Event::RefreshRequested => Self::refresh_listing(model, caps, false),

            Event::ListScrolled {
                first_visible_index,
                first_visible_offset,
                last_visible_index,
            } => {
                model
                    .listing
                    .on_scroll(first_visible_index, first_visible_offset);

                let distance = model.config.prefetch_distance as usize;
                let near_end = last_visible_index
                    .is_some_and(|last| model.listing.items.should_prefetch(last, distance));
                if near_end {
                    if let Some(request) = model.listing.items.begin_append() {
                        Self::request_page(model, caps, request);
                    }
                }

                if let Some(prompt) = model.listing.evaluate_prompts(last_visible_index) {
                    info!(?prompt, "showing prompt");
                }
            }

            Event::PinMessageClosed => match model.listing.close_pin_message() {
                PinDismissal::Nothing => {}
                PinDismissal::LeaveMineOnly => Self::on_filter_changed(model, caps),
                PinDismissal::Persist(prefs) => caps.preferences.save(prefs),
            },

            Event::SnackbarResolved { action_performed } => {
                let resolution = model.listing.resolve_prompt(action_performed);
                if let Some(prefs) = resolution.persist {
                    caps.preferences.save(prefs);
                }
                if let Some(route) = resolution.navigate {
                    Self::enter_route(model, caps, route);
                }
            }

            Event::PreferencesLoaded(prefs) => {
                model.listing.apply_preferences(prefs);
                if let Some(prompt) = model.listing.evaluate_prompts(None) {
                    info!(?prompt, "showing prompt");
                }
            }

            Event::PageLoaded {
                generation,
                kind,
                result,
            } => Self::on_page_loaded(model, generation, kind, result),

            Event::DraftEdited(edit) => match model.wizard.as_mut() {
                Some(wizard) => {
                    let stage = wizard.stage();
                    match wizard.edit_draft() {
                        Some(draft) => Self::on_draft_edited(draft, edit),
                        None => debug!(?stage, "draft edit outside the edit page"),
                    }
                }
                None => debug!("draft edit without an open wizard"),
            },

            Event::PagerScrollChanged { in_progress } => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.set_scroll_in_progress(in_progress);
                }
            }

            Event::WizardAdvance => Self::on_wizard_advance(model, caps),

            Event::WizardRetreat => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.retreat();
                }
            }

            Event::AddImageRequested => {
                let state = model
                    .wizard
                    .as_ref()
                    .map(|w| (w.is_editable(), w.can_attach_more()));
                match state {
                    Some((true, true)) => caps.picker.pick_image(Event::ImagePicked),
                    Some((true, false)) => {
                        let max = model.config.max_images;
                        model.set_error(ImageError::TooMany { max });
                    }
                    Some((false, _)) => debug!("add image outside the edit page"),
                    None => debug!("add image without an open wizard"),
                }
            }

            Event::ImagePicked(picked) => Self::on_image_picked(model, picked),

            Event::RemoveImage { index } => {
                if let Some(wizard) = model.wizard.as_mut() {
                    if wizard.remove_image(index).is_none() {
                        debug!(index, stage = ?wizard.stage(), "image not removed");
                    }
                }
            }

            Event::ImagesUploaded { submission, result } => {
                Self::on_images_uploaded(model, caps, submission, result);
            }

            Event::ItemCreated { submission, result } => {
                Self::on_item_created(model, submission, result);
            }

            Event::ItemLoaded { id, result } => Self::on_item_loaded(model, id, result),

            Event::ContactRequested => {
                if let Route::Item(id) = model.navigator.current().clone() {
                    Self::enter_route(model, caps, Route::Contact(id));
                }
            }

            Event::ContactLoaded { id, result } => Self::on_contact_loaded(model, id, result),

            Event::CloseItemRequested => Self::on_close_item_requested(model, caps),

            Event::ItemClosed { id, result } => Self::on_item_closed(model, id, result),

            Event::ShareItemRequested => Self::share_item(model, caps),

            Event::ShareResultRequested => Self::share_result(model, caps),

            Event::DismissError => model.clear_error(),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let offset = model.utc_offset();
        let route = model.navigator.current();

        let screen = match route {
            Route::Home(_) => Screen::Home(home_view(model, offset)),
            Route::NewItem(item_type) => match model.wizard.as_ref() {
                Some(wizard) => Screen::NewItem(new_item_view(wizard)),
                None => Screen::NewItem(new_item_view(&NewItemWizard::new(
                    *item_type,
                    model.config.max_images,
                ))),
            },
            Route::Item(id) => Screen::ItemDetail(item_detail_view(model, id, offset)),
            Route::Contact(id) => Screen::Contact(contact_view(model, id)),
            Route::ItemClosed => Screen::ItemClosed(ItemClosedView {
                name: model.closed_item.as_ref().map(|i| i.name.clone()),
                can_share: model.closed_item.is_some(),
            }),
            Route::Profile => Screen::Profile,
            Route::Notifications => Screen::Notifications,
        };

        let snackbar = route
            .is_home()
            .then(|| model.listing.snackbar())
            .flatten()
            .map(|prompt| SnackbarView {
                prompt,
                message: prompt.message().to_string(),
                action_label: prompt.action_label().to_string(),
            });

        ViewModel {
            route: route.to_string(),
            can_go_back: model.navigator.can_go_back() && !exit_blocked(model),
            screen,
            snackbar,
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}

fn home_view(model: &Model, offset: FixedOffset) -> HomeView {
    let listing = &model.listing;
    let show_type = listing.show_type();
    let placeholder = listing.items.placeholder(listing.search().is_some());

    HomeView {
        title: match show_type {
            ItemType::Found => "Found items".into(),
            ItemType::Lost => "Lost items".into(),
        },
        show_type,
        mine_only: listing.mine_only(),
        search: listing.search().map(str::to_string),
        banner: listing.pinned_banner().map(|banner| BannerView {
            banner,
            message: banner.message().to_string(),
        }),
        fab_extended: listing.fab_extended(),
        cards: listing
            .items
            .items()
            .iter()
            .map(|item| ItemCard::new(item, offset))
            .collect(),
        shimmer_rows: if placeholder == Some(Placeholder::Shimmer) {
            SHIMMER_ROWS
        } else {
            0
        },
        placeholder,
        refreshing: listing.items.refresh_state().is_loading(),
        loading_more: listing.items.append_state().is_loading(),
    }
}

fn new_item_view(wizard: &NewItemWizard) -> NewItemView {
    let draft = wizard.draft();
    let stage = wizard.stage();

    NewItemView {
        item_type: draft.item_type(),
        stage,
        stage_index: stage.index(),
        prev_button: prev_button(stage),
        next_button: next_button(stage),
        name: draft.name().to_string(),
        place: draft.place().to_string(),
        description: draft.description().to_string(),
        how: draft.how().to_string(),
        contact: draft.contact().to_string(),
        who: draft.who().to_string(),
        who_required: draft.item_type().requires_claimant(),
        date: draft.date().map(|d| d.format("%Y-%m-%d").to_string()),
        time: draft.time().map(|t| t.format("%H:%M").to_string()),
        field_errors: wizard.field_errors(),
        images: wizard
            .attachments()
            .iter()
            .map(|image| AttachmentView {
                width: image.width,
                height: image.height,
                mime_type: WEBP_MIME_TYPE.to_string(),
                data: image.data.clone(),
            })
            .collect(),
        can_add_image: wizard.can_attach_more() && wizard.is_editable(),
    }
}

fn item_detail_view(model: &Model, id: &ItemId, offset: FixedOffset) -> ItemDetailView {
    let detail = model.detail.as_ref().filter(|d| &d.id == id);
    let item = detail.and_then(|d| d.item.ready());

    ItemDetailView {
        id: id.clone(),
        loading: detail.is_none_or(|d| d.item.is_loading()),
        item: item.map(|item| ItemDetailData {
            item_type: item.item_type,
            name: item.name.clone(),
            description: item.description.clone(),
            place: item.place.clone(),
            how: item.how.clone(),
            date: item.date.format(offset),
            images: item.images.clone(),
            resolved: item.resolved,
            is_owner: item.is_owner,
        }),
        can_close: item.is_some_and(|i| i.is_owner && !i.resolved),
        closing: detail.is_some_and(|d| d.closing),
    }
}

fn contact_view(model: &Model, id: &ItemId) -> ContactView {
    let contact = model
        .detail
        .as_ref()
        .filter(|d| &d.id == id)
        .and_then(|d| d.contact.as_ref());

    ContactView {
        item_id: id.clone(),
        loading: contact.is_none_or(Loadable::is_loading),
        contact: contact.and_then(Loadable::ready).map(|c| c.contact.clone()),
        name: contact.and_then(Loadable::ready).and_then(|c| c.name.clone()),
    }
}
