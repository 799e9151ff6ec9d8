use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::attachment::ImageLimits;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PREFETCH_DISTANCE: u32 = 3;
pub const DEFAULT_MAX_IMAGES: usize = 5;
pub const DEFAULT_ITEM_CACHE_CAPACITY: usize = 64;
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(String),
    #[error("page_size must be in 1..={max}, got {value}")]
    PageSize { value: u32, max: u32 },
    #[error("max_images must be at least 1")]
    NoImagesAllowed,
    #[error("share_base_url is invalid: {0}")]
    ShareBaseUrl(String),
    #[error("utc_offset_minutes out of range: {0}")]
    UtcOffset(i32),
}

/// Settings the shell hands to the core at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub page_size: u32,
    pub prefetch_distance: u32,
    pub max_images: usize,
    pub item_cache_capacity: usize,
    /// Deep links in shared text are built on this, e.g. `https://lostfound.example.edu/`.
    pub share_base_url: Option<String>,
    pub utc_offset_minutes: i32,
    pub image: ImageLimits,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            max_images: DEFAULT_MAX_IMAGES,
            item_cache_capacity: DEFAULT_ITEM_CACHE_CAPACITY,
            share_base_url: None,
            utc_offset_minutes: 0,
            image: ImageLimits::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSize {
                value: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.max_images == 0 {
            return Err(ConfigError::NoImagesAllowed);
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::UtcOffset(self.utc_offset_minutes));
        }
        self.share_base()?;
        Ok(())
    }

    pub fn share_base(&self) -> Result<Option<Url>, ConfigError> {
        let Some(raw) = &self.share_base_url else {
            return Ok(None);
        };
        let mut url = Url::parse(raw).map_err(|e| ConfigError::ShareBaseUrl(e.to_string()))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::ShareBaseUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        // `join` replaces the last segment unless the path ends in a slash.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Some(url))
    }

    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }
}
