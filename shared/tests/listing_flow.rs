use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_core::Request;
use shared::capabilities::{
    ItemsOperation, ItemsOutput, PreferencesOperation, PreferencesOutput, RepositoryError,
};
use shared::listing::{EndPrompt, PinnedBanner};
use shared::model::{HomePreferences, PinMask, UnixTimeMs};
use shared::paging::{ItemPage, Placeholder};
use shared::{App, Effect, Event, ItemData, ItemId, ItemType, Model, Screen};

type Tester = AppTester<App, Effect>;

struct Harness {
    app: Tester,
    model: Model,
}

impl Harness {
    /// Starts the core and returns the initial page and preference requests.
    fn start() -> (Self, Request<ItemsOperation>, Request<PreferencesOperation>) {
        let app = Tester::default();
        let mut model = Model::default();
        let effects = app
            .update(Event::AppStarted { config_json: None }, &mut model)
            .effects;

        let mut page = None;
        let mut prefs = None;
        for effect in effects {
            match effect {
                Effect::Items(request) => page = Some(request),
                Effect::Preferences(request) => prefs = Some(request),
                _ => {}
            }
        }
        (
            Self { app, model },
            page.expect("first page requested"),
            prefs.expect("preferences requested"),
        )
    }

    fn send(&mut self, event: Event) -> Vec<Effect> {
        self.app.update(event, &mut self.model).effects
    }

    fn resolve_page(
        &mut self,
        request: &mut Request<ItemsOperation>,
        page: Result<ItemPage, RepositoryError>,
    ) {
        let output = page.map(ItemsOutput::Page);
        let update = self.app.resolve(request, output).expect("resolve page");
        for event in update.events {
            self.send(event);
        }
    }

    fn resolve_prefs(
        &mut self,
        request: &mut Request<PreferencesOperation>,
        prefs: Option<HomePreferences>,
    ) {
        let update = self
            .app
            .resolve(request, PreferencesOutput::Loaded(prefs))
            .expect("resolve preferences");
        for event in update.events {
            self.send(event);
        }
    }

    fn scroll_to(&mut self, last_visible_index: usize) -> Vec<Request<ItemsOperation>> {
        items(self.send(Event::ListScrolled {
            first_visible_index: last_visible_index.saturating_sub(4),
            first_visible_offset: 0,
            last_visible_index: Some(last_visible_index),
        }))
    }

    fn home(&self) -> shared::app::HomeView {
        match self.app.view(&self.model).screen {
            Screen::Home(home) => home,
            other => panic!("expected home screen, got {other:?}"),
        }
    }
}

fn items(effects: Vec<Effect>) -> Vec<Request<ItemsOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Items(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn saved_prefs(effects: &[Effect]) -> Option<HomePreferences> {
    effects.iter().find_map(|effect| match effect {
        Effect::Preferences(request) => match &request.operation {
            PreferencesOperation::Save(prefs) => Some(*prefs),
            PreferencesOperation::Load => None,
        },
        _ => None,
    })
}

fn page(item_type: ItemType, range: std::ops::Range<usize>, next: Option<&str>) -> ItemPage {
    ItemPage {
        items: range
            .map(|i| ItemData {
                item_type,
                id: ItemId::new(format!("{item_type}-{i}")),
                name: format!("Item {i}"),
                description: None,
                date: UnixTimeMs(0),
                place: "Library".into(),
                how: String::new(),
                images: vec![format!("https://img/{i}.webp")],
                is_owner: false,
                resolved: false,
            })
            .collect(),
        next_cursor: next.map(str::to_string),
    }
}

fn query_of(request: &Request<ItemsOperation>) -> &shared::capabilities::ItemQuery {
    match &request.operation {
        ItemsOperation::FetchItems { query } => query,
        other => panic!("expected FetchItems, got {other:?}"),
    }
}

#[test]
fn test_first_page_then_prefetch() {
    let (mut h, mut first, _) = Harness::start();
    let query = query_of(&first);
    assert_eq!(query.item_type, ItemType::Found);
    assert_eq!(query.page_size, 10);
    assert_eq!(query.cursor, None);
    assert_eq!(h.home().placeholder, Some(Placeholder::Shimmer));
    assert_eq!(h.home().shimmer_rows, 10);

    h.resolve_page(&mut first, Ok(page(ItemType::Found, 0..10, Some("c1"))));
    let home = h.home();
    assert_eq!(home.cards.len(), 10);
    assert_eq!(home.cards[0].thumbnail.as_deref(), Some("https://img/0.webp"));
    assert_eq!(home.placeholder, None);

    assert!(h.scroll_to(5).is_empty());
    let mut next = h.scroll_to(6);
    assert_eq!(next.len(), 1);
    assert_eq!(query_of(&next[0]).cursor.as_deref(), Some("c1"));
    assert!(h.scroll_to(7).is_empty(), "append already in flight");
    assert!(h.home().loading_more);

    h.resolve_page(&mut next[0], Ok(page(ItemType::Found, 10..12, None)));
    assert_eq!(h.home().cards.len(), 12);
    assert!(h.scroll_to(11).is_empty(), "end of pagination");
}

#[test]
fn test_filter_change_drops_stale_pages() {
    let (mut h, mut first, _) = Harness::start();
    h.resolve_page(&mut first, Ok(page(ItemType::Found, 0..10, Some("c1"))));
    let mut append = h.scroll_to(9);

    let mut lost = items(h.send(Event::ShowTypeSelected(ItemType::Lost)));
    assert_eq!(lost.len(), 1);
    assert_eq!(query_of(&lost[0]).item_type, ItemType::Lost);
    assert!(h.home().cards.is_empty(), "filter change clears the list");
    assert_eq!(h.home().title, "Lost items");

    h.resolve_page(&mut append[0], Ok(page(ItemType::Found, 10..20, None)));
    assert!(h.home().cards.is_empty());

    h.resolve_page(&mut lost[0], Ok(page(ItemType::Lost, 0..3, None)));
    let home = h.home();
    assert_eq!(home.cards.len(), 3);
    assert!(home.cards.iter().all(|c| c.item_type == ItemType::Lost));
}

#[test]
fn test_out_of_order_search_responses() {
    let (mut h, mut first, _) = Harness::start();
    h.resolve_page(&mut first, Ok(page(ItemType::Found, 0..2, None)));

    let mut umbrella = items(h.send(Event::SearchSubmitted {
        query: Some("umbrella".into()),
    }));
    let mut wallet = items(h.send(Event::SearchSubmitted {
        query: Some("wallet".into()),
    }));
    assert_eq!(query_of(&wallet[0]).search.as_deref(), Some("wallet"));

    h.resolve_page(&mut wallet[0], Ok(page(ItemType::Found, 0..1, None)));
    h.resolve_page(&mut umbrella[0], Ok(page(ItemType::Found, 0..5, None)));
    assert_eq!(h.home().cards.len(), 1);
    assert_eq!(h.home().search.as_deref(), Some("wallet"));

    // Same query again is not a change.
    assert!(items(h.send(Event::SearchSubmitted {
        query: Some(" wallet ".into()),
    }))
    .is_empty());
}

#[test]
fn test_refresh_keeps_items_visible() {
    let (mut h, mut first, _) = Harness::start();
    h.resolve_page(&mut first, Ok(page(ItemType::Found, 0..4, None)));

    let mut refresh = items(h.send(Event::RefreshRequested));
    assert_eq!(query_of(&refresh[0]).cursor, None);
    let home = h.home();
    assert!(home.refreshing);
    assert_eq!(home.cards.len(), 4);

    h.resolve_page(&mut refresh[0], Ok(page(ItemType::Found, 0..6, None)));
    assert_eq!(h.home().cards.len(), 6);
    assert!(!h.home().refreshing);
}

#[test]
fn test_placeholders() {
    let (mut h, mut first, _) = Harness::start();
    h.resolve_page(
        &mut first,
        Err(RepositoryError::Network {
            message: "offline".into(),
        }),
    );
    assert_eq!(h.home().placeholder, Some(Placeholder::NoConnection));

    let mut search = items(h.send(Event::SearchSubmitted {
        query: Some("keys".into()),
    }));
    h.resolve_page(&mut search[0], Ok(page(ItemType::Found, 0..0, None)));
    assert_eq!(
        h.home().placeholder,
        Some(Placeholder::NoResults { searching: true })
    );
}

#[test]
fn test_pin_message_dismissal_is_persisted() {
    let (mut h, _, mut prefs) = Harness::start();
    assert_eq!(h.home().banner, None, "hidden until preferences load");

    h.resolve_prefs(
        &mut prefs,
        Some(HomePreferences {
            pin_mask: PinMask::ALL,
            can_show_profile_popup: false,
        }),
    );
    assert_matches!(
        h.home().banner.map(|b| b.banner),
        Some(PinnedBanner::Explanation {
            item_type: ItemType::Found
        })
    );

    let saved = saved_prefs(&h.send(Event::PinMessageClosed)).expect("mask saved");
    assert_eq!(saved.pin_mask, PinMask(0b01));
    assert_eq!(h.home().banner, None);
}

#[test]
fn test_mine_only_banner_turns_mode_off() {
    let (mut h, _, mut prefs) = Harness::start();
    h.resolve_prefs(&mut prefs, None);

    let requests = items(h.send(Event::MineOnlyChanged(true)));
    assert!(query_of(&requests[0]).mine_only);
    assert_matches!(
        h.home().banner.map(|b| b.banner),
        Some(PinnedBanner::BrowsingOwnPosts)
    );

    let effects = h.send(Event::PinMessageClosed);
    assert!(saved_prefs(&effects).is_none());
    let requests = items(effects);
    assert!(!query_of(&requests[0]).mine_only);
    assert!(!h.home().mine_only);
}

#[test]
fn test_end_of_found_list_suggests_posting_lost_item() {
    let (mut h, mut first, mut prefs) = Harness::start();
    h.resolve_prefs(
        &mut prefs,
        Some(HomePreferences {
            pin_mask: PinMask(0),
            can_show_profile_popup: false,
        }),
    );
    h.resolve_page(&mut first, Ok(page(ItemType::Found, 0..3, None)));

    h.scroll_to(1);
    assert_eq!(h.app.view(&h.model).snackbar, None);
    h.scroll_to(2);
    let snackbar = h.app.view(&h.model).snackbar.expect("prompt shown");
    assert_eq!(snackbar.prompt, EndPrompt::PostLostItem);

    h.send(Event::SnackbarResolved {
        action_performed: true,
    });
    let view = h.app.view(&h.model);
    assert_eq!(view.route, "new_item/lost");
    assert_eq!(view.snackbar, None);
    assert!(h.model.wizard.is_some());
}

#[test]
fn test_profile_nudge_shown_once() {
    let (mut h, _, mut prefs) = Harness::start();
    h.resolve_prefs(&mut prefs, None);

    let snackbar = h.app.view(&h.model).snackbar.expect("nudge shown");
    assert_eq!(snackbar.prompt, EndPrompt::FillProfile);

    let saved = saved_prefs(&h.send(Event::SnackbarResolved {
        action_performed: false,
    }))
    .expect("popup flag saved");
    assert!(!saved.can_show_profile_popup);
    assert_eq!(h.app.view(&h.model).route, "home/found");

    h.scroll_to(0);
    assert_eq!(h.app.view(&h.model).snackbar, None);
}

#[test]
fn test_fab_collapses_on_downward_scroll() {
    let (mut h, mut first, _) = Harness::start();
    h.resolve_page(&mut first, Ok(page(ItemType::Found, 0..10, None)));
    assert!(h.home().fab_extended);

    h.send(Event::ListScrolled {
        first_visible_index: 2,
        first_visible_offset: 0,
        last_visible_index: Some(5),
    });
    assert!(!h.home().fab_extended);

    h.send(Event::ListScrolled {
        first_visible_index: 1,
        first_visible_offset: 40,
        last_visible_index: Some(4),
    });
    assert!(h.home().fab_extended);
}
