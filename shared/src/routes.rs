use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{ItemId, ItemType};

const MAX_ITEM_ID_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),
    #[error("invalid item id in route: {0}")]
    InvalidItemId(String),
}

/// Every screen the shell can show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home(ItemType),
    NewItem(ItemType),
    Item(ItemId),
    Contact(ItemId),
    ItemClosed,
    Profile,
    Notifications,
}

impl Route {
    pub const START: Route = Route::Home(ItemType::Found);

    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();

        match segments.as_slice() {
            ["home", kind] => ItemType::parse(kind)
                .map(Route::Home)
                .ok_or_else(|| RouteError::Unknown(path.to_string())),
            ["new_item", kind] => ItemType::parse(kind)
                .map(Route::NewItem)
                .ok_or_else(|| RouteError::Unknown(path.to_string())),
            ["item", "closed"] => Ok(Route::ItemClosed),
            ["item", id] => Ok(Route::Item(validate_item_id(id)?)),
            ["item", id, "contact"] => Ok(Route::Contact(validate_item_id(id)?)),
            ["profile"] => Ok(Route::Profile),
            ["notifications"] => Ok(Route::Notifications),
            _ => Err(RouteError::Unknown(path.to_string())),
        }
    }

    /// Screens that sit under the bottom navigation bar.
    #[must_use]
    pub const fn is_home(&self) -> bool {
        matches!(self, Route::Home(_))
    }
}

fn validate_item_id(id: &str) -> Result<ItemId, RouteError> {
    if id.is_empty()
        || id.len() > MAX_ITEM_ID_LENGTH
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RouteError::InvalidItemId(id.to_string()));
    }
    Ok(ItemId::new(id))
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home(kind) => write!(f, "home/{kind}"),
            Route::NewItem(kind) => write!(f, "new_item/{kind}"),
            Route::Item(id) => write!(f, "item/{id}"),
            Route::Contact(id) => write!(f, "item/{id}/contact"),
            Route::ItemClosed => f.write_str("item/closed"),
            Route::Profile => f.write_str("profile"),
            Route::Notifications => f.write_str("notifications"),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Back stack of routes. Never empty; the bottom entry is a home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            stack: vec![Route::START],
        }
    }
}

impl Navigator {
    #[must_use]
    pub fn current(&self) -> &Route {
        // The stack always holds the start route at the bottom.
        &self.stack[self.stack.len() - 1]
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Home screens replace each other instead of stacking.
    pub fn push(&mut self, route: Route) {
        if route.is_home() {
            self.stack.truncate(1);
            self.stack[0] = route;
        } else if self.current() != &route {
            self.stack.push(route);
        }
    }

    pub fn replace(&mut self, route: Route) {
        if self.stack.len() == 1 {
            self.push(route);
        } else {
            let top = self.stack.len() - 1;
            self.stack[top] = route;
        }
    }

    /// Returns the route that was closed, or `None` at the root.
    pub fn pop(&mut self) -> Option<Route> {
        if self.can_go_back() {
            self.stack.pop()
        } else {
            None
        }
    }
}
