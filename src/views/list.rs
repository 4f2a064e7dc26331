use tracing::{debug, error, info, instrument, warn};

use super::{Confirm, Outcome, PendingFetch, Toast, ViewState};
use crate::cache::Subscription;
use crate::clients::UserClient;
use crate::domain::{UserId, UserPage};
use crate::error::AdminResult;
use crate::router::Route;

pub const LOAD_FAILED: &str = "Failed to load users. Please try again.";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this user?";
pub const DELETE_SUCCEEDED: &str = "User deleted successfully";
pub const DELETE_FAILED: &str = "Failed to delete user";
pub const USER_NOT_FOUND: &str = "User not found";
pub const RETRYING: &str = "Retrying...";
pub const EMPTY: &str = "No users found";

const SKELETON_ROWS: usize = 6;

/// `/user/:page`
pub struct UserListView {
    client: UserClient,
    page: u32,
    state: ViewState,
    users: Option<UserPage>,
    pending: Option<PendingFetch<UserPage>>,
    subscription: Option<Subscription>,
}

impl UserListView {
    /// Subscribes to user invalidations and starts the first fetch.
    #[instrument(skip(client))]
    pub async fn mount(client: UserClient, page: u32) -> Self {
        let subscription = match client.subscribe_users().await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!(error = %e, "List will not refresh after mutations");
                None
            }
        };

        let mut view = Self {
            client,
            page,
            state: ViewState::Loading,
            users: None,
            pending: None,
            subscription,
        };
        view.start_fetch();
        view
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn users(&self) -> Option<&UserPage> {
        self.users.as_ref()
    }

    /// A fetch is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Picks up a finished fetch or a pending invalidation without waiting.
    /// Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        if let Some(result) = self.pending.as_mut().and_then(PendingFetch::try_take) {
            self.pending = None;
            self.apply(result);
            changed = true;
        }
        if self.pending.is_none() && self.invalidated() {
            self.start_fetch();
            changed = true;
        }
        changed
    }

    /// Waits until no fetch is in flight and no invalidation is queued.
    pub async fn settle(&mut self) {
        loop {
            if let Some(pending) = self.pending.take() {
                let result = pending.wait().await;
                self.apply(result);
            } else if self.invalidated() {
                self.start_fetch();
            } else {
                return;
            }
        }
    }

    pub fn next(&self) -> Outcome {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn prev(&self) -> Outcome {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Page changes push a route; the shell mounts a fresh view for it.
    pub fn go_to(&self, page: u32) -> Outcome {
        let Some(users) = self.users.as_ref().filter(|_| self.state == ViewState::Ready) else {
            return Outcome::stay().with_toast(Toast::info("Users are still loading"));
        };
        let last = users.total_pages.max(1);
        if page == 0 || page > last {
            return Outcome::stay().with_toast(Toast::info(format!("Pages run from 1 to {}", last)));
        }
        if page == self.page {
            return Outcome::stay();
        }
        Outcome::navigate(Route::UserList { page })
    }

    pub fn edit(&self, id: UserId) -> Outcome {
        if !self.shows(id) {
            return Outcome::stay().with_toast(Toast::error(USER_NOT_FOUND));
        }
        Outcome::navigate(Route::EditUser { id })
    }

    /// Asks first; the list refreshes itself once the invalidation arrives.
    #[instrument(skip(self, confirm))]
    pub async fn delete(&mut self, id: UserId, confirm: &mut dyn Confirm) -> Outcome {
        if !self.shows(id) {
            return Outcome::stay().with_toast(Toast::error(USER_NOT_FOUND));
        }
        if !confirm.confirm(DELETE_PROMPT).await {
            debug!("Delete cancelled");
            return Outcome::stay();
        }

        // A refresh may still be in flight; its state outlives the delete.
        let previous = std::mem::replace(&mut self.state, ViewState::Submitting);
        let result = self.client.delete_user(id).await;
        self.state = previous;

        match result {
            Ok(()) => {
                info!("User deleted");
                Outcome::stay().with_toast(Toast::success(DELETE_SUCCEEDED))
            }
            Err(e) => {
                error!(error = %e, "Delete failed");
                Outcome::stay().with_toast(Toast::error(DELETE_FAILED))
            }
        }
    }

    /// Manual retry, only offered from the error state.
    pub fn retry(&mut self) -> Outcome {
        if !matches!(self.state, ViewState::Error(_)) {
            return Outcome::stay();
        }
        self.start_fetch();
        Outcome::stay().with_toast(Toast::info(RETRYING))
    }

    /// Bypasses the cache; rows stay visible until the response lands.
    pub fn refresh(&mut self) -> Outcome {
        let client = self.client.clone();
        let page = self.page;
        self.state = ViewState::Loading;
        self.pending = Some(PendingFetch::spawn(async move { client.refetch_users(page).await }));
        Outcome::stay()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("User List\n\n");
        match (&self.state, &self.users) {
            (ViewState::Error(message), _) => {
                out.push_str(&format!("  ! {}\n\n  Type `retry` to try again.\n", message));
            }
            (ViewState::Loading, None) => {
                for _ in 0..SKELETON_ROWS {
                    out.push_str("  ( )  ░░░░░░░░░░░░░░░░  ░░░░░░░░░░░░░░░░░░░░░░░░\n");
                }
            }
            (_, Some(users)) if users.is_empty() => {
                out.push_str(&format!("  {}\n", EMPTY));
            }
            (state, Some(users)) => {
                for user in &users.users {
                    out.push_str(&format!("  #{:<3} {:<24} {}\n", user.id, user.full_name(), user.email));
                }
                if users.total_pages > 1 {
                    out.push_str(&format!("\n  Page {} of {}\n", self.page, users.total_pages));
                }
                if *state != ViewState::Ready {
                    out.push_str("  (refreshing...)\n");
                }
            }
            (_, None) => out.push_str(&format!("  {}\n", EMPTY)),
        }
        out
    }

    fn shows(&self, id: UserId) -> bool {
        self.users.as_ref().is_some_and(|users| users.contains(id))
    }

    fn invalidated(&mut self) -> bool {
        self.subscription.as_mut().is_some_and(Subscription::take_pending)
    }

    fn start_fetch(&mut self) {
        let client = self.client.clone();
        let page = self.page;
        self.state = ViewState::Loading;
        self.pending = Some(PendingFetch::spawn(async move { client.list_users(page).await }));
    }

    fn apply(&mut self, result: AdminResult<UserPage>) {
        match result {
            Ok(users) => {
                debug!(user_count = users.users.len(), "Users loaded");
                self.users = Some(users);
                self.state = ViewState::Ready;
            }
            Err(e) => {
                error!(error = %e, page = self.page, "Loading users failed");
                self.state = ViewState::Error(LOAD_FAILED.to_string());
            }
        }
    }
}
