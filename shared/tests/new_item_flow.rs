use std::io::Cursor;

use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_core::Request;
use shared::capabilities::{
    ItemsOperation, ItemsOutput, PickedImage, PickerOperation, RepositoryError,
};
use shared::model::UnixTimeMs;
use shared::wizard::{DraftField, WizardStage};
use shared::{App, DraftEdit, Effect, ErrorKind, Event, ItemData, ItemId, ItemType, Model, Screen};

type Tester = AppTester<App, Effect>;

fn started(config_json: Option<&str>) -> (Tester, Model) {
    let app = Tester::default();
    let mut model = Model::default();
    app.update(
        Event::AppStarted {
            config_json: config_json.map(str::to_string),
        },
        &mut model,
    );
    (app, model)
}

fn navigate(app: &Tester, model: &mut Model, route: &str) -> Vec<Effect> {
    app.update(
        Event::Navigate {
            route: route.to_string(),
        },
        model,
    )
    .effects
}

fn items_requests(effects: Vec<Effect>) -> Vec<Request<ItemsOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Items(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn picker_request(effects: Vec<Effect>) -> Option<Request<PickerOperation>> {
    effects.into_iter().find_map(|effect| match effect {
        Effect::Picker(request) => Some(request),
        _ => None,
    })
}

/// Feeds resolution events back into the app and returns every effect they produce.
fn run(app: &Tester, model: &mut Model, events: Vec<Event>) -> Vec<Effect> {
    let mut effects = Vec::new();
    for event in events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

fn edit(app: &Tester, model: &mut Model, edit: DraftEdit) {
    app.update(Event::DraftEdited(edit), model);
}

fn fill_required(app: &Tester, model: &mut Model) {
    edit(app, model, DraftEdit::Name("Wallet".into()));
    edit(app, model, DraftEdit::Place("Library".into()));
    edit(app, model, DraftEdit::How("Found on desk".into()));
    edit(app, model, DraftEdit::Contact("0912345678".into()));
}

fn stage(model: &Model) -> WizardStage {
    model.wizard.as_ref().expect("wizard open").stage()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn created(id: &str) -> ItemData {
    ItemData {
        item_type: ItemType::Found,
        id: ItemId::new(id),
        name: "Wallet".into(),
        description: None,
        date: UnixTimeMs(0),
        place: "Library".into(),
        how: "Found on desk".into(),
        images: Vec::new(),
        is_owner: true,
        resolved: false,
    }
}

fn attach(app: &Tester, model: &mut Model, bytes: Vec<u8>) {
    let effects = app.update(Event::AddImageRequested, model).effects;
    let mut request = picker_request(effects).expect("picker request");
    let update = app
        .resolve(
            &mut request,
            Some(PickedImage {
                bytes,
                mime_type: Some("image/png".into()),
            }),
        )
        .expect("resolve pick");
    run(app, model, update.events);
}

#[test]
fn test_found_item_submission_flow() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/found");
    fill_required(&app, &mut model);

    // "who" is still blank: stay on Edit and flag it.
    app.update(Event::WizardAdvance, &mut model);
    assert_eq!(stage(&model), WizardStage::Edit);
    let Screen::NewItem(view) = app.view(&model).screen else {
        panic!("expected new item screen");
    };
    assert_eq!(view.field_errors, vec![DraftField::Who]);
    assert!(view.who_required);

    edit(&app, &mut model, DraftEdit::Who("Alice".into()));
    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    assert_eq!(stage(&model), WizardStage::Confirm);
    assert!(items_requests(effects).is_empty());

    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    assert_eq!(stage(&model), WizardStage::Sending);
    let mut uploads = items_requests(effects);
    assert_eq!(uploads.len(), 1, "exactly one upload per submission");
    assert_matches!(&uploads[0].operation, ItemsOperation::UploadImages { images } if images.is_empty());

    // Neither advancing nor backing out does anything while sending.
    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    assert!(items_requests(effects).is_empty());
    app.update(Event::NavigateBack, &mut model);
    assert_eq!(app.view(&model).route, "new_item/found");
    assert!(!app.view(&model).can_go_back);

    let update = app
        .resolve(&mut uploads[0], Ok(ItemsOutput::ImageUrls(Vec::new())))
        .expect("resolve upload");
    let mut creates = items_requests(run(&app, &mut model, update.events));
    assert_eq!(creates.len(), 1);
    let submission = model
        .wizard
        .as_ref()
        .and_then(|w| w.submission().cloned())
        .expect("submission in flight");
    assert_matches!(
        &creates[0].operation,
        ItemsOperation::CreateItem { item }
            if item.idempotency_key == submission
                && item.who.as_deref() == Some("Alice")
                && item.name == "Wallet"
    );
    assert_eq!(stage(&model), WizardStage::Sending);

    let update = app
        .resolve(&mut creates[0], Ok(ItemsOutput::Created(created("new-1"))))
        .expect("resolve create");
    run(&app, &mut model, update.events);
    assert_eq!(stage(&model), WizardStage::Done);
    assert!(model.item_cache.contains(&ItemId::new("new-1")));

    app.update(Event::WizardAdvance, &mut model);
    assert!(model.wizard.is_none());
    assert_eq!(app.view(&model).route, "home/found");
}

#[test]
fn test_lost_item_does_not_need_who() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);

    app.update(Event::WizardAdvance, &mut model);
    assert_eq!(stage(&model), WizardStage::Confirm);

    app.update(Event::WizardRetreat, &mut model);
    assert_eq!(stage(&model), WizardStage::Edit);

    // Retreat from the first page is a no-op.
    app.update(Event::WizardRetreat, &mut model);
    assert_eq!(stage(&model), WizardStage::Edit);
}

#[test]
fn test_pager_scroll_blocks_advance() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);

    app.update(Event::PagerScrollChanged { in_progress: true }, &mut model);
    app.update(Event::WizardAdvance, &mut model);
    assert_eq!(stage(&model), WizardStage::Edit);

    app.update(Event::PagerScrollChanged { in_progress: false }, &mut model);
    app.update(Event::WizardAdvance, &mut model);
    assert_eq!(stage(&model), WizardStage::Confirm);
}

#[test]
fn test_failed_upload_returns_to_confirm() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);
    app.update(Event::WizardAdvance, &mut model);

    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    let mut uploads = items_requests(effects);
    let update = app
        .resolve(&mut uploads[0], Err(RepositoryError::Timeout))
        .expect("resolve upload");
    let effects = run(&app, &mut model, update.events);

    assert!(items_requests(effects).is_empty(), "no create after a failed upload");
    assert_eq!(stage(&model), WizardStage::Confirm);
    let error = app.view(&model).error.expect("error surfaced");
    assert!(error.retryable);
    assert_eq!(model.active_error.as_ref().map(|e| e.kind), Some(ErrorKind::Timeout));

    // Submitting again starts a new upload.
    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    assert_eq!(items_requests(effects).len(), 1);
}

#[test]
fn test_result_after_wizard_closed_is_ignored() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);
    app.update(Event::WizardAdvance, &mut model);
    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    let mut uploads = items_requests(effects);

    // Route changes are refused while sending...
    app.update(Event::ShowTypeSelected(ItemType::Lost), &mut model);
    assert_eq!(stage(&model), WizardStage::Sending);

    // ...but a restarted core has no wizard to deliver the result to.
    app.update(Event::AppStarted { config_json: None }, &mut model);
    assert!(model.wizard.is_none());

    let update = app
        .resolve(&mut uploads[0], Ok(ItemsOutput::ImageUrls(Vec::new())))
        .expect("resolve upload");
    let effects = run(&app, &mut model, update.events);
    assert!(items_requests(effects).is_empty());
    assert!(model.active_error.is_none());
}

#[test]
fn test_attachments_keep_order_through_upload() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);

    attach(&app, &mut model, png(2, 2));
    attach(&app, &mut model, png(3, 5));
    let wizard = model.wizard.as_ref().expect("wizard open");
    let names: Vec<String> = wizard.attachments().iter().map(|a| a.file_name()).collect();
    assert_eq!(names.len(), 2);
    assert_eq!(wizard.attachments()[1].width, 3);

    app.update(Event::WizardAdvance, &mut model);
    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    let uploads = items_requests(effects);
    assert_matches!(
        &uploads[0].operation,
        ItemsOperation::UploadImages { images }
            if images.iter().map(|i| i.file_name.clone()).collect::<Vec<_>>() == names
                && images.iter().all(|i| i.mime_type == "image/webp")
    );
}

#[test]
fn test_cancelled_pick_and_bad_bytes() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");

    let effects = app.update(Event::AddImageRequested, &mut model).effects;
    let mut request = picker_request(effects).expect("picker request");
    let update = app.resolve(&mut request, None).expect("resolve pick");
    run(&app, &mut model, update.events);
    assert!(model.wizard.as_ref().unwrap().attachments().is_empty());
    assert!(model.active_error.is_none());

    attach(&app, &mut model, b"definitely not an image".to_vec());
    assert!(model.wizard.as_ref().unwrap().attachments().is_empty());
    assert_eq!(
        model.active_error.as_ref().map(|e| e.kind),
        Some(ErrorKind::ImageDecode)
    );
}

#[test]
fn test_remove_image_ignores_bad_index() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    attach(&app, &mut model, png(2, 2));

    app.update(Event::RemoveImage { index: 3 }, &mut model);
    assert_eq!(model.wizard.as_ref().unwrap().attachments().len(), 1);

    app.update(Event::RemoveImage { index: 0 }, &mut model);
    assert!(model.wizard.as_ref().unwrap().attachments().is_empty());
}

#[test]
fn test_image_limit_from_config() {
    let (app, mut model) = started(Some(r#"{ "max_images": 1 }"#));
    navigate(&app, &mut model, "new_item/lost");
    attach(&app, &mut model, png(2, 2));

    let effects = app.update(Event::AddImageRequested, &mut model).effects;
    assert!(picker_request(effects).is_none());
    assert_eq!(
        model.active_error.as_ref().map(|e| e.kind),
        Some(ErrorKind::TooManyImages)
    );
    let Screen::NewItem(view) = app.view(&model).screen else {
        panic!("expected new item screen");
    };
    assert!(!view.can_add_image);
}

#[test]
fn test_edits_after_the_edit_page_are_ignored() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);
    app.update(Event::WizardAdvance, &mut model);
    assert_eq!(stage(&model), WizardStage::Confirm);

    // Blanking a field from the confirm page cannot sneak past validation.
    edit(&app, &mut model, DraftEdit::Contact(String::new()));
    let Screen::NewItem(view) = app.view(&model).screen else {
        panic!("expected new item screen");
    };
    assert_eq!(view.contact, "0912345678");

    let effects = app.update(Event::WizardAdvance, &mut model).effects;
    assert_eq!(stage(&model), WizardStage::Sending);
    let mut uploads = items_requests(effects);

    edit(&app, &mut model, DraftEdit::Name("   ".into()));
    let update = app
        .resolve(&mut uploads[0], Ok(ItemsOutput::ImageUrls(Vec::new())))
        .expect("resolve upload");
    let creates = items_requests(run(&app, &mut model, update.events));
    assert_matches!(
        &creates[0].operation,
        ItemsOperation::CreateItem { item }
            if item.name == "Wallet" && item.contact == "0912345678"
    );
}

#[test]
fn test_images_are_frozen_outside_the_edit_page() {
    let (app, mut model) = started(None);
    navigate(&app, &mut model, "new_item/lost");
    fill_required(&app, &mut model);
    attach(&app, &mut model, png(2, 2));

    let effects = app.update(Event::AddImageRequested, &mut model).effects;
    let mut late_pick = picker_request(effects).expect("picker request");
    app.update(Event::WizardAdvance, &mut model);
    assert_eq!(stage(&model), WizardStage::Confirm);

    let effects = app.update(Event::AddImageRequested, &mut model).effects;
    assert!(picker_request(effects).is_none());

    app.update(Event::RemoveImage { index: 0 }, &mut model);
    let update = app
        .resolve(
            &mut late_pick,
            Some(PickedImage {
                bytes: png(4, 4),
                mime_type: Some("image/png".into()),
            }),
        )
        .expect("resolve pick");
    run(&app, &mut model, update.events);

    let wizard = model.wizard.as_ref().expect("wizard open");
    assert_eq!(wizard.attachments().len(), 1);
    assert_eq!(wizard.attachments()[0].width, 2);
    assert!(model.active_error.is_none());
}
