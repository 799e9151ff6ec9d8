#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod attachment;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod listing;
pub mod model;
pub mod paging;
pub mod routes;
pub mod wizard;

pub use app::{App, Capabilities, Effect, Screen, ViewModel};
pub use config::CoreConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{AppError, ErrorKind};
pub use event::{DraftEdit, Event};
pub use model::{ItemData, ItemId, ItemType, Model};
pub use routes::Route;
