use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info, instrument, warn};
use validator::{Validate, ValidationError};

use super::{FormState, Outcome, PendingFetch, Toast, ViewState};
use crate::clients::UserClient;
use crate::domain::{User, UserId, UserPage, UserPatch};
use crate::error::{AdminError, AdminResult};
use crate::router::Route;

pub const LOAD_FAILED: &str = "Failed to load user data. Please try again.";
pub const FIELDS_REQUIRED: &str = "All fields are required";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const UPDATE_SUCCEEDED: &str = "User updated successfully";
pub const UPDATE_FAILED: &str = "Failed to update user";

const FIELDS: [&str; 3] = ["first_name", "last_name", "email"];

/// The target is looked up on the first page of the list only.
const LOOKUP_PAGE: u32 = 1;

/// Something, an `@`, then a dotted domain. No whitespace anywhere.
static EDIT_EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

fn validate_edit_email(email: &str) -> Result<(), ValidationError> {
    if !EDIT_EMAIL.is_match(email) {
        return Err(ValidationError::new("email").with_message(Cow::Borrowed(INVALID_EMAIL)));
    }
    Ok(())
}

/// Names are trimmed. The email is checked exactly as typed.
#[derive(Debug, Validate)]
struct UserDraft {
    first_name: String,
    last_name: String,
    #[validate(custom(function = "validate_edit_email"))]
    email: String,
}

impl UserDraft {
    fn from_form(form: &FormState) -> Self {
        Self {
            first_name: form.value("first_name").trim().to_string(),
            last_name: form.value("last_name").trim().to_string(),
            email: form.value("email").to_string(),
        }
    }

    /// Required-field check runs before the email check.
    fn check(&self) -> AdminResult<()> {
        if [&self.first_name, &self.last_name, &self.email]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(AdminError::Validation(FIELDS_REQUIRED.to_string()));
        }
        self.validate()?;
        Ok(())
    }

    fn into_patch(self) -> UserPatch {
        UserPatch {
            first_name: Some(self.first_name),
            last_name: Some(self.last_name),
            email: Some(self.email),
        }
    }
}

/// `/edit-user/:id`
pub struct EditUserView {
    client: UserClient,
    id: UserId,
    state: ViewState,
    user: Option<User>,
    form: FormState,
    pending: Option<PendingFetch<UserPage>>,
}

impl EditUserView {
    pub fn mount(client: UserClient, id: UserId) -> Self {
        let mut view = Self {
            client,
            id,
            state: ViewState::Loading,
            user: None,
            form: FormState::new(&FIELDS),
            pending: None,
        };
        view.start_fetch();
        view
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// A fetch is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies a finished lookup without waiting. `None` while still loading.
    pub fn poll(&mut self) -> Option<Outcome> {
        let result = self.pending.as_mut().and_then(PendingFetch::try_take)?;
        self.pending = None;
        Some(self.apply(result))
    }

    pub async fn settle(&mut self) -> Outcome {
        match self.pending.take() {
            Some(pending) => {
                let result = pending.wait().await;
                self.apply(result)
            }
            None => Outcome::stay(),
        }
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> AdminResult<()> {
        self.form.set(field, value)
    }

    /// Local validation only. The failure message is also shown inline.
    pub fn validate(&mut self) -> AdminResult<UserPatch> {
        let draft = UserDraft::from_form(&self.form);
        match draft.check() {
            Ok(()) => Ok(draft.into_patch()),
            Err(e) => {
                self.form.set_error(e.to_string());
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(id = self.id))]
    pub async fn submit(&mut self) -> Outcome {
        if self.state != ViewState::Ready {
            return Outcome::stay();
        }
        let patch = match self.validate() {
            Ok(patch) => patch,
            Err(e) => {
                warn!(error = %e, "Edit blocked by validation");
                return Outcome::stay();
            }
        };

        self.state = ViewState::Submitting;
        let result = self.client.update_user(self.id, &patch).await;
        self.state = ViewState::Ready;

        match result {
            Ok(updated) => {
                if let Some(user) = &self.user {
                    self.user = Some(updated.apply_to(user));
                }
                info!("User updated");
                Outcome::navigate(Route::landing()).with_toast(Toast::success(UPDATE_SUCCEEDED))
            }
            Err(e) => {
                error!(error = %e, "Update failed");
                Outcome::stay().with_toast(Toast::error(UPDATE_FAILED))
            }
        }
    }

    pub fn cancel(&self) -> Outcome {
        Outcome::navigate(Route::landing())
    }

    pub fn retry(&mut self) -> Outcome {
        if !matches!(self.state, ViewState::Error(_)) {
            return Outcome::stay();
        }
        self.start_fetch();
        Outcome::stay().with_toast(Toast::info(super::list::RETRYING))
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Edit User Profile\n\n");
        match &self.state {
            ViewState::Loading => {
                for _ in FIELDS {
                    out.push_str("  ░░░░░░░░░░  ░░░░░░░░░░░░░░░░░░░░\n");
                }
            }
            ViewState::Error(message) => {
                out.push_str(&format!(
                    "  ! {}\n\n  Type `retry` to try again or `back` to return to the user list.\n",
                    message
                ));
            }
            ViewState::Ready | ViewState::Submitting => {
                if let Some(user) = &self.user {
                    out.push_str(&format!("  #{} {}\n\n", user.id, user.avatar));
                }
                out.push_str(&self.form.render(&[]));
                out.push_str("\n  `set <field> <value>`, then `save` or `cancel`.\n");
            }
        }
        out
    }

    fn start_fetch(&mut self) {
        let client = self.client.clone();
        self.state = ViewState::Loading;
        self.pending = Some(PendingFetch::spawn(async move { client.list_users(LOOKUP_PAGE).await }));
    }

    fn apply(&mut self, result: AdminResult<UserPage>) -> Outcome {
        let users = match result {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, id = self.id, "Loading user failed");
                self.state = ViewState::Error(LOAD_FAILED.to_string());
                return Outcome::stay();
            }
        };

        let Some(user) = users.find(self.id).cloned() else {
            let err = AdminError::NotFound(self.id);
            warn!(error = %err, "Edit target missing from the first page");
            return Outcome::navigate(Route::landing()).with_toast(Toast::error(super::list::USER_NOT_FOUND));
        };

        let mut form = FormState::new(&FIELDS);
        for (field, value) in [
            ("first_name", &user.first_name),
            ("last_name", &user.last_name),
            ("email", &user.email),
        ] {
            // Every name here is one of FIELDS.
            let _ = form.set(field, value.as_str());
        }
        self.form = form;
        self.user = Some(user);
        self.state = ViewState::Ready;
        Outcome::stay()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, InMemoryUsersApi};
    use crate::cache::QueryCache;
    use crate::views::Navigation;
    use rstest::rstest;
    use std::sync::Arc;

    fn client(api: Arc<InMemoryUsersApi>) -> UserClient {
        let (cache, cache_client) = QueryCache::new(16);
        tokio::spawn(cache.run());
        UserClient::new(api, cache_client)
    }

    async fn loaded(api: Arc<InMemoryUsersApi>, id: UserId) -> (EditUserView, Outcome) {
        let mut view = EditUserView::mount(client(api), id);
        let outcome = view.settle().await;
        (view, outcome)
    }

    #[tokio::test]
    async fn test_form_is_prefilled() {
        let (view, outcome) = loaded(Arc::new(InMemoryUsersApi::new()), 3).await;

        assert_eq!(outcome, Outcome::stay());
        assert_eq!(view.state(), &ViewState::Ready);
        assert_eq!(view.form().value("email"), "emma.wong@reqres.in");
        assert!(view.render().contains("Emma"));
    }

    #[tokio::test]
    async fn test_user_beyond_first_page_is_not_found() {
        let (view, outcome) = loaded(Arc::new(InMemoryUsersApi::new()), 9).await;

        assert_eq!(outcome.navigation, Navigation::Navigate(Route::UserList { page: 1 }));
        assert_eq!(outcome.toasts, vec![Toast::error("User not found")]);
        assert!(view.user().is_none());
    }

    #[tokio::test]
    async fn test_empty_first_name_blocks_submit() {
        let api = Arc::new(InMemoryUsersApi::new());
        let (mut view, _) = loaded(api.clone(), 3).await;

        view.set_field("first_name", "   ").unwrap();
        assert_eq!(view.validate(), Err(AdminError::Validation(FIELDS_REQUIRED.to_string())));
        assert_eq!(view.submit().await, Outcome::stay());
        assert_eq!(view.form().error(), Some(FIELDS_REQUIRED));
        assert_eq!(api.call_count(), 1);

        view.set_field("first_name", "Emma").unwrap();
        assert_eq!(view.form().error(), None);
    }

    #[tokio::test]
    async fn test_malformed_email_blocks_submit() {
        let api = Arc::new(InMemoryUsersApi::new());
        let (mut view, _) = loaded(api.clone(), 3).await;

        view.set_field("email", "emma-at-example").unwrap();
        assert_eq!(view.submit().await, Outcome::stay());
        assert_eq!(view.form().error(), Some(INVALID_EMAIL));
        assert_eq!(api.call_count(), 1);
    }

    #[rstest]
    #[case("emma@localhost")]
    #[case(" emma@example.com ")]
    #[case("emma@example.com ")]
    #[case("emma wong@example.com")]
    #[case("emma@@example.com")]
    #[tokio::test]
    async fn test_email_shape_blocks_submit(#[case] email: &str) {
        let api = Arc::new(InMemoryUsersApi::new());
        let (mut view, _) = loaded(api.clone(), 3).await;

        view.set_field("email", email).unwrap();
        assert_eq!(view.submit().await, Outcome::stay());
        assert_eq!(view.form().error(), Some(INVALID_EMAIL));
        assert!(!api.calls().iter().any(|c| matches!(c, ApiCall::UpdateUser { .. })));
    }

    #[test]
    fn test_short_top_level_domain_is_accepted() {
        assert!(validate_edit_email("a@b.c").is_ok());
    }

    #[tokio::test]
    async fn test_successful_save_trims_names() {
        let api = Arc::new(InMemoryUsersApi::new());
        let (mut view, _) = loaded(api.clone(), 3).await;

        view.set_field("first_name", "  Emma ").unwrap();
        view.set_field("email", "emma@example.com").unwrap();
        let outcome = view.submit().await;

        assert_eq!(outcome.navigation, Navigation::Navigate(Route::UserList { page: 1 }));
        assert_eq!(outcome.toasts, vec![Toast::success(UPDATE_SUCCEEDED)]);
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::UpdateUser {
                id: 3,
                patch: UserPatch {
                    first_name: Some("Emma".into()),
                    last_name: Some("Wong".into()),
                    email: Some("emma@example.com".into()),
                },
            })
        );
        assert_eq!(view.user().map(|u| u.email.as_str()), Some("emma@example.com"));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_form_open() {
        let api = Arc::new(InMemoryUsersApi::new());
        let (mut view, _) = loaded(api.clone(), 3).await;
        api.fail_next(AdminError::Status { status: 500 });

        let outcome = view.submit().await;
        assert_eq!(outcome, Outcome::stay().with_toast(Toast::error(UPDATE_FAILED)));
        assert_eq!(view.state(), &ViewState::Ready);
    }

    #[tokio::test]
    async fn test_load_error_offers_retry() {
        let api = Arc::new(InMemoryUsersApi::new());
        api.fail_next(AdminError::Network("timeout".into()));
        let (mut view, _) = loaded(api, 3).await;

        assert_eq!(view.state(), &ViewState::Error(LOAD_FAILED.to_string()));
        assert!(view.render().contains("`back`"));

        assert_eq!(view.retry().toasts, vec![Toast::info("Retrying...")]);
        view.settle().await;
        assert_eq!(view.state(), &ViewState::Ready);
        assert_eq!(view.cancel(), Outcome::navigate(Route::landing()));
    }
}
