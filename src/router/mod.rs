//! Client-side routes and the guard in front of them.

mod guard;

pub use guard::{resolve, step, GuardState, Resolution};

use std::fmt::Display;

use crate::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Root,
    /// `/login`
    Login,
    /// `/user/:page`
    UserList { page: u32 },
    /// `/edit-user/:id`
    EditUser { id: UserId },
    /// Anything else, kept for logging.
    Unknown(String),
}

impl Route {
    /// Where authenticated users land.
    pub fn landing() -> Self {
        Route::UserList { page: 1 }
    }

    /// Segments that do not parse as positive integers fall through to
    /// [`Route::Unknown`], same as an unmatched path.
    pub fn parse(path: &str) -> Self {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Root,
            ["login"] => Route::Login,
            ["user", page] => match positive(page) {
                Some(page) => Route::UserList { page },
                None => Route::Unknown(path.to_string()),
            },
            ["edit-user", id] => match positive(id) {
                Some(id) => Route::EditUser { id },
                None => Route::Unknown(path.to_string()),
            },
            _ => Route::Unknown(path.to_string()),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Root => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::UserList { page } => write!(f, "/user/{}", page),
            Route::EditUser { id } => write!(f, "/edit-user/{}", id),
            Route::Unknown(path) => write!(f, "{}", path),
        }
    }
}

fn positive(segment: &str) -> Option<u32> {
    segment.parse::<u32>().ok().filter(|n| *n > 0)
}
