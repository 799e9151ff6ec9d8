//! Item repository capability.
//!
//! The shell owns the GraphQL client; the core only sees typed operations
//! and typed results. Every request resolves exactly once.

use std::fmt;

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ContactInfo, ItemData, ItemId, ItemType, SubmissionId, UnixTimeMs};
use crate::paging::ItemPage;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RepositoryError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("request timed out")]
    Timeout,
    #[error("not signed in")]
    Unauthorized,
    #[error("item not found: {id}")]
    NotFound { id: String },
    #[error("request rejected: {reason}")]
    Rejected { reason: String },
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("shell answered with the wrong output, expected {expected}")]
    UnexpectedOutput { expected: String },
}

/// Filter and cursor for one page of listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub item_type: ItemType,
    pub mine_only: bool,
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub page_size: u32,
}

/// A processed attachment on its way to storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadImage {
    pub file_name: String,
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl fmt::Debug for UploadImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Everything needed to create a listing once its images are stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItemPayload {
    /// Lets the server drop a duplicate create after a retried request.
    pub idempotency_key: SubmissionId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<UnixTimeMs>,
    pub place: String,
    pub how: String,
    pub images: Vec<String>,
    pub contact: String,
    pub who: Option<String>,
}

// Contact details are personal data; keep them out of logs.
impl fmt::Debug for NewItemPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewItemPayload")
            .field("idempotency_key", &self.idempotency_key)
            .field("item_type", &self.item_type)
            .field("name", &self.name)
            .field("images", &self.images.len())
            .field("contact_present", &!self.contact.is_empty())
            .field("who_present", &self.who.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemsOperation {
    FetchItem { id: ItemId },
    FetchItems { query: ItemQuery },
    EndItem { id: ItemId },
    GetContact { id: ItemId },
    /// Resolves only after every image is stored, with references in input order.
    UploadImages { images: Vec<UploadImage> },
    CreateItem { item: NewItemPayload },
}

impl ItemsOperation {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FetchItem { .. } => "fetch_item",
            Self::FetchItems { .. } => "fetch_items",
            Self::EndItem { .. } => "end_item",
            Self::GetContact { .. } => "get_contact",
            Self::UploadImages { .. } => "upload_images",
            Self::CreateItem { .. } => "create_item",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemsOutput {
    Item(ItemData),
    Page(ItemPage),
    Ended,
    Contact(ContactInfo),
    ImageUrls(Vec<String>),
    Created(ItemData),
}

pub type ItemsResult = Result<ItemsOutput, RepositoryError>;

impl Operation for ItemsOperation {
    type Output = ItemsResult;
}

pub struct Items<Ev> {
    context: CapabilityContext<ItemsOperation, Ev>,
}

impl<Ev> Clone for Items<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Items<Ev> {
    type Operation = ItemsOperation;
    type MappedSelf<MappedEv> = Items<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Items::new(self.context.map_event(f))
    }
}

fn unexpected(expected: &str) -> RepositoryError {
    RepositoryError::UnexpectedOutput {
        expected: expected.to_string(),
    }
}

impl<Ev> Items<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<ItemsOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn fetch_item<F>(&self, id: ItemId, make_event: F)
    where
        F: FnOnce(Result<ItemData, RepositoryError>) -> Ev + Send + 'static,
    {
        self.request(
            ItemsOperation::FetchItem { id },
            |output| match output {
                ItemsOutput::Item(item) => Ok(item),
                _ => Err(unexpected("item")),
            },
            make_event,
        );
    }

    pub fn fetch_items<F>(&self, query: ItemQuery, make_event: F)
    where
        F: FnOnce(Result<ItemPage, RepositoryError>) -> Ev + Send + 'static,
    {
        self.request(
            ItemsOperation::FetchItems { query },
            |output| match output {
                ItemsOutput::Page(page) => Ok(page),
                _ => Err(unexpected("page")),
            },
            make_event,
        );
    }

    pub fn end_item<F>(&self, id: ItemId, make_event: F)
    where
        F: FnOnce(Result<(), RepositoryError>) -> Ev + Send + 'static,
    {
        self.request(
            ItemsOperation::EndItem { id },
            |output| match output {
                ItemsOutput::Ended => Ok(()),
                _ => Err(unexpected("ended")),
            },
            make_event,
        );
    }

    pub fn get_contact<F>(&self, id: ItemId, make_event: F)
    where
        F: FnOnce(Result<ContactInfo, RepositoryError>) -> Ev + Send + 'static,
    {
        self.request(
            ItemsOperation::GetContact { id },
            |output| match output {
                ItemsOutput::Contact(contact) => Ok(contact),
                _ => Err(unexpected("contact")),
            },
            make_event,
        );
    }

    pub fn upload_images<F>(&self, images: Vec<UploadImage>, make_event: F)
    where
        F: FnOnce(Result<Vec<String>, RepositoryError>) -> Ev + Send + 'static,
    {
        let expected = images.len();
        self.request(
            ItemsOperation::UploadImages { images },
            move |output| match output {
                ItemsOutput::ImageUrls(urls) if urls.len() == expected => Ok(urls),
                _ => Err(unexpected("one url per image")),
            },
            make_event,
        );
    }

    pub fn create_item<F>(&self, item: NewItemPayload, make_event: F)
    where
        F: FnOnce(Result<ItemData, RepositoryError>) -> Ev + Send + 'static,
    {
        self.request(
            ItemsOperation::CreateItem { item },
            |output| match output {
                ItemsOutput::Created(item) => Ok(item),
                _ => Err(unexpected("created item")),
            },
            make_event,
        );
    }

    fn request<T, P, F>(&self, operation: ItemsOperation, project: P, make_event: F)
    where
        T: Send + 'static,
        P: FnOnce(ItemsOutput) -> Result<T, RepositoryError> + Send + 'static,
        F: FnOnce(Result<T, RepositoryError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await.and_then(project);
            ctx.update_app(make_event(result));
        });
    }
}
