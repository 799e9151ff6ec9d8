use serde::{Deserialize, Serialize};

use crate::attachment::ImageError;
use crate::capabilities::RepositoryError;
use crate::config::ConfigError;
use crate::routes::RouteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    NotFound,
    Validation,
    Server,
    ImageDecode,
    ImageTooLarge,
    TooManyImages,
    Configuration,
    InvalidRoute,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::ImageDecode => "IMAGE_DECODE_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::TooManyImages => "TOO_MANY_IMAGES",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::InvalidRoute => "INVALID_ROUTE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "No internet connection. Please connect to Wi-Fi or turn on mobile data.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::NotFound => "This item could not be found. It may have been removed.".into(),
            ErrorKind::Validation | ErrorKind::TooManyImages => self.message.clone(),
            ErrorKind::Server => "The server had a problem. Please try again later.".into(),
            ErrorKind::ImageDecode => {
                "Unable to read this photo. Please choose a different one.".into()
            }
            ErrorKind::ImageTooLarge => {
                "This photo is too large. Please choose a smaller one.".into()
            }
            ErrorKind::Configuration | ErrorKind::InvalidRoute => {
                "The app is in an invalid state. Please restart the app.".into()
            }
            ErrorKind::Internal => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        let kind = match &e {
            RepositoryError::Network { .. } => ErrorKind::Network,
            RepositoryError::Timeout => ErrorKind::Timeout,
            RepositoryError::Unauthorized => ErrorKind::Authentication,
            RepositoryError::NotFound { .. } => ErrorKind::NotFound,
            RepositoryError::Rejected { .. } => ErrorKind::Validation,
            RepositoryError::Server { .. } => ErrorKind::Server,
            RepositoryError::UnexpectedOutput { .. } => ErrorKind::Internal,
        };
        let message = match &e {
            RepositoryError::Rejected { reason } => reason.clone(),
            _ => "Request failed".into(),
        };
        AppError::new(kind, message).with_internal(e.to_string())
    }
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        let kind = match &e {
            ImageError::InputTooLarge { .. } | ImageError::ImageTooLarge { .. } => {
                ErrorKind::ImageTooLarge
            }
            ImageError::TooMany { .. } => ErrorKind::TooManyImages,
            ImageError::Decode { .. }
            | ImageError::EmptyInput
            | ImageError::UnsupportedFormat
            | ImageError::Encode { .. } => ErrorKind::ImageDecode,
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        AppError::new(ErrorKind::InvalidRoute, e.to_string())
    }
}
