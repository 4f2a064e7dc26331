use tracing::{debug, warn};

use super::Route;

/// Upper bound on redirect hops for one navigation.
const MAX_REDIRECTS: usize = 8;

/// What the guard sees when a navigation hits a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    AuthenticatedAtRoot,
    AuthenticatedElsewhere,
}

impl GuardState {
    pub fn evaluate(route: &Route, authenticated: bool) -> Self {
        match (authenticated, route) {
            (false, _) => GuardState::Unauthenticated,
            (true, Route::Root) => GuardState::AuthenticatedAtRoot,
            (true, _) => GuardState::AuthenticatedElsewhere,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

/// One routing decision. The intended destination is not remembered when
/// bouncing to `/login`.
pub fn step(route: &Route, authenticated: bool) -> Resolution {
    match route {
        Route::Login => Resolution::Render(Route::Login),
        Route::Unknown(_) => Resolution::Redirect(Route::landing()),
        protected => match GuardState::evaluate(protected, authenticated) {
            GuardState::Unauthenticated => Resolution::Redirect(Route::Login),
            GuardState::AuthenticatedAtRoot => Resolution::Redirect(Route::landing()),
            GuardState::AuthenticatedElsewhere => Resolution::Render(protected.clone()),
        },
    }
}

/// Follows redirects until a route renders.
pub fn resolve(route: Route, authenticated: bool) -> Route {
    let mut current = route;
    for _ in 0..MAX_REDIRECTS {
        match step(&current, authenticated) {
            Resolution::Render(route) => return route,
            Resolution::Redirect(next) => {
                debug!(from = %current, to = %next, "Redirecting");
                current = next;
            }
        }
    }
    warn!(route = %current, "Redirect limit reached");
    Route::Login
}
