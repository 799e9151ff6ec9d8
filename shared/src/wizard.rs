//! New-item wizard: a linear Edit → Confirm → Sending → Done pager.
//!
//! The transition function is pure; the app turns [`WizardEffect`]s into
//! capability requests and route changes.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::attachment::{Attachments, DecodedImage, ImageError};
use crate::model::{ItemType, SubmissionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    #[default]
    Edit,
    Confirm,
    Sending,
    Done,
}

impl WizardStage {
    pub const COUNT: usize = 4;

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Edit => 0,
            Self::Confirm => 1,
            Self::Sending => 2,
            Self::Done => 3,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Edit),
            1 => Some(Self::Confirm),
            2 => Some(Self::Sending),
            3 => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardInput {
    Advance,
    Retreat,
    SubmissionCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEffect {
    RevealFieldErrors,
    Submit,
    Close,
}

/// Facts about the world the transition depends on but does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Guard {
    pub scroll_in_progress: bool,
    pub fields_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub stage: WizardStage,
    pub effect: Option<WizardEffect>,
}

impl Transition {
    const fn to(stage: WizardStage) -> Self {
        Self {
            stage,
            effect: None,
        }
    }

    const fn with(stage: WizardStage, effect: WizardEffect) -> Self {
        Self {
            stage,
            effect: Some(effect),
        }
    }
}

#[must_use]
pub fn transition(stage: WizardStage, input: WizardInput, guard: Guard) -> Transition {
    use WizardStage::{Confirm, Done, Edit, Sending};

    match (input, stage) {
        // Done closes even mid-animation: the pager has nowhere left to scroll.
        (WizardInput::Advance, Done) => Transition::with(Done, WizardEffect::Close),
        (WizardInput::Advance | WizardInput::Retreat, _) if guard.scroll_in_progress => {
            Transition::to(stage)
        }
        (WizardInput::Advance, Edit) if guard.fields_valid => Transition::to(Confirm),
        (WizardInput::Advance, Edit) => Transition::with(Edit, WizardEffect::RevealFieldErrors),
        (WizardInput::Advance, Confirm) if guard.fields_valid => {
            Transition::with(Sending, WizardEffect::Submit)
        }
        (WizardInput::Advance, Confirm) => Transition::with(Edit, WizardEffect::RevealFieldErrors),
        (WizardInput::Advance, Sending) => Transition::to(Sending),

        (WizardInput::Retreat, Confirm) => Transition::to(Edit),
        (WizardInput::Retreat, _) => Transition::to(stage),

        (WizardInput::SubmissionCompleted, Sending) => Transition::to(Done),
        (WizardInput::SubmissionCompleted, _) => Transition::to(stage),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Name,
    Place,
    How,
    Contact,
    Who,
}

/// The listing being written. Setters store input verbatim and never validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemDraft {
    item_type: ItemType,
    name: String,
    place: String,
    description: String,
    how: String,
    contact: String,
    who: String,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

impl NewItemDraft {
    #[must_use]
    pub fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            name: String::new(),
            place: String::new(),
            description: String::new(),
            how: String::new(),
            contact: String::new(),
            who: String::new(),
            date: None,
            time: None,
        }
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_place(&mut self, value: impl Into<String>) {
        self.place = value.into();
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }

    pub fn set_how(&mut self, value: impl Into<String>) {
        self.how = value.into();
    }

    pub fn set_contact(&mut self, value: impl Into<String>) {
        self.contact = value.into();
    }

    pub fn set_who(&mut self, value: impl Into<String>) {
        self.who = value.into();
    }

    pub fn set_date(&mut self, value: NaiveDate) {
        self.date = Some(value);
    }

    pub fn set_time(&mut self, value: NaiveTime) {
        self.time = Some(value);
    }

    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        self.item_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn place(&self) -> &str {
        &self.place
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn how(&self) -> &str {
        &self.how
    }

    #[must_use]
    pub fn contact(&self) -> &str {
        &self.contact
    }

    #[must_use]
    pub fn who(&self) -> &str {
        &self.who
    }

    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    #[must_use]
    pub const fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    /// Date and time combined; a missing time means midnight.
    #[must_use]
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        self.date
            .map(|date| date.and_time(self.time.unwrap_or(NaiveTime::MIN)))
    }

    /// Required fields that are currently blank, in display order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<DraftField> {
        let mut missing = Vec::new();
        for (field, value) in [
            (DraftField::Name, &self.name),
            (DraftField::Place, &self.place),
            (DraftField::How, &self.how),
            (DraftField::Contact, &self.contact),
        ] {
            if is_blank(value) {
                missing.push(field);
            }
        }
        if self.item_type.requires_claimant() && is_blank(&self.who) {
            missing.push(DraftField::Who);
        }
        missing
    }

    #[must_use]
    pub fn validate_fields(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// The draft as it was when the user pressed submit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Submission {
    id: SubmissionId,
    draft: NewItemDraft,
}

/// Wizard state for one `new_item/*` screen.
///
/// The draft and the attachments only change while the stage is Edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemWizard {
    draft: NewItemDraft,
    stage: WizardStage,
    show_field_errors: bool,
    scroll_in_progress: bool,
    attachments: Attachments,
    submission: Option<Submission>,
}

impl NewItemWizard {
    #[must_use]
    pub fn new(item_type: ItemType, max_images: usize) -> Self {
        Self {
            draft: NewItemDraft::new(item_type),
            stage: WizardStage::Edit,
            show_field_errors: false,
            scroll_in_progress: false,
            attachments: Attachments::new(max_images),
            submission: None,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> WizardStage {
        self.stage
    }

    #[must_use]
    pub const fn draft(&self) -> &NewItemDraft {
        &self.draft
    }

    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.stage, WizardStage::Edit)
    }

    /// `None` once the draft has left Edit.
    pub fn edit_draft(&mut self) -> Option<&mut NewItemDraft> {
        self.is_editable().then_some(&mut self.draft)
    }

    #[must_use]
    pub const fn show_field_errors(&self) -> bool {
        self.show_field_errors
    }

    #[must_use]
    pub const fn scroll_in_progress(&self) -> bool {
        self.scroll_in_progress
    }

    pub fn set_scroll_in_progress(&mut self, in_progress: bool) {
        self.scroll_in_progress = in_progress;
    }

    #[must_use]
    pub fn attachments(&self) -> &[DecodedImage] {
        self.attachments.as_slice()
    }

    #[must_use]
    pub fn can_attach_more(&self) -> bool {
        !self.attachments.is_full()
    }

    /// Returns `Ok(false)` without attaching when the draft is no longer editable.
    pub fn add_image(&mut self, image: DecodedImage) -> Result<bool, ImageError> {
        if !self.is_editable() {
            return Ok(false);
        }
        self.attachments.push(image).map(|()| true)
    }

    pub fn remove_image(&mut self, index: usize) -> Option<DecodedImage> {
        if !self.is_editable() {
            return None;
        }
        self.attachments.remove(index)
    }

    #[must_use]
    pub fn submission(&self) -> Option<&SubmissionId> {
        self.submission.as_ref().map(|s| &s.id)
    }

    /// The draft frozen when the submission in flight started.
    #[must_use]
    pub fn submitted_draft(&self) -> Option<&NewItemDraft> {
        self.submission.as_ref().map(|s| &s.draft)
    }

    /// Fields to flag in the form; empty until an advance has been refused.
    #[must_use]
    pub fn field_errors(&self) -> Vec<DraftField> {
        if self.show_field_errors {
            self.draft.missing_fields()
        } else {
            Vec::new()
        }
    }

    /// Sending cannot be abandoned until the upload resolves.
    #[must_use]
    pub const fn blocks_exit(&self) -> bool {
        matches!(self.stage, WizardStage::Sending)
    }

    pub fn advance(&mut self) -> Option<WizardEffect> {
        self.apply(WizardInput::Advance)
    }

    pub fn retreat(&mut self) -> Option<WizardEffect> {
        self.apply(WizardInput::Retreat)
    }

    /// Moves Sending → Done if `id` is the submission in flight.
    pub fn complete_submission(&mut self, id: &SubmissionId) -> bool {
        if self.submission() != Some(id) {
            return false;
        }
        self.apply(WizardInput::SubmissionCompleted);
        self.submission = None;
        self.stage == WizardStage::Done
    }

    /// A failed submission drops back to Confirm so the user can retry.
    pub fn fail_submission(&mut self, id: &SubmissionId) -> bool {
        if self.stage != WizardStage::Sending || self.submission() != Some(id) {
            return false;
        }
        self.stage = WizardStage::Confirm;
        self.submission = None;
        true
    }

    fn apply(&mut self, input: WizardInput) -> Option<WizardEffect> {
        let guard = Guard {
            scroll_in_progress: self.scroll_in_progress,
            fields_valid: self.draft.validate_fields(),
        };
        let Transition { stage, effect } = transition(self.stage, input, guard);
        self.stage = stage;

        match effect {
            Some(WizardEffect::RevealFieldErrors) => self.show_field_errors = true,
            Some(WizardEffect::Submit) => {
                self.submission = Some(Submission {
                    id: SubmissionId::generate(),
                    draft: self.draft.clone(),
                });
            }
            Some(WizardEffect::Close) | None => {}
        }
        effect
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerButton {
    pub label: String,
    pub enabled: bool,
}

impl PagerButton {
    fn new(label: &str, enabled: bool) -> Self {
        Self {
            label: label.into(),
            enabled,
        }
    }
}

#[must_use]
pub fn prev_button(stage: WizardStage) -> Option<PagerButton> {
    match stage {
        WizardStage::Edit | WizardStage::Done => None,
        WizardStage::Confirm => Some(PagerButton::new("Back to edit", true)),
        WizardStage::Sending => Some(PagerButton::new("Back to edit", false)),
    }
}

#[must_use]
pub fn next_button(stage: WizardStage) -> Option<PagerButton> {
    match stage {
        WizardStage::Edit => Some(PagerButton::new("Confirm details", true)),
        WizardStage::Confirm => Some(PagerButton::new("Submit", true)),
        WizardStage::Sending => None,
        WizardStage::Done => Some(PagerButton::new("Finish", true)),
    }
}
