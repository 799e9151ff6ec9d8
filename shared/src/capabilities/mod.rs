mod items;
mod picker;
mod preferences;
mod share;

pub use self::items::{
    Items, ItemsOperation, ItemsOutput, ItemsResult, ItemQuery, NewItemPayload, RepositoryError,
    UploadImage,
};
pub use self::picker::{PickedImage, Picker, PickerOperation};
pub use self::preferences::{Preferences, PreferencesOperation, PreferencesOutput};
pub use self::share::{Share, ShareOperation};
pub use crux_core::render::Render;
