use std::time::Duration;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use super::{FormState, Outcome, Toast, ViewState};
use crate::clients::UserClient;
use crate::domain::Credentials;
use crate::error::{AdminError, AdminResult, LOGIN_FAILED, UNEXPECTED_ERROR};
use crate::router::Route;
use crate::session::Session;

pub const CHECK_FIELDS: &str = "Please enter correct email or password before submitting.";
pub const LOGIN_SUCCEEDED: &str = "Login Successful! Redirecting...";

const FIELDS: [&str; 2] = ["email", "password"];

/// Message toasted for a rejected login.
pub fn login_error_message(err: &AdminError) -> String {
    match err {
        AdminError::Auth(message) => message.clone(),
        AdminError::Status { .. } => LOGIN_FAILED.to_string(),
        _ => UNEXPECTED_ERROR.to_string(),
    }
}

/// `/login`
pub struct LoginView {
    client: UserClient,
    session: Session,
    redirect_delay: Duration,
    state: ViewState,
    form: FormState,
}

impl LoginView {
    pub fn new(client: UserClient, session: Session, redirect_delay: Duration) -> Self {
        Self {
            client,
            session,
            redirect_delay,
            state: ViewState::Ready,
            form: FormState::new(&FIELDS),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> AdminResult<()> {
        self.form.set(field, value)
    }

    /// Fills both fields and submits.
    pub async fn login(&mut self, email: &str, password: &str) -> Outcome {
        self.form.set("email", email).ok();
        self.form.set("password", password).ok();
        self.submit().await
    }

    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Outcome {
        let credentials = Credentials::new(self.form.value("email"), self.form.value("password"));
        if let Err(errors) = credentials.validate() {
            warn!("Login blocked by validation");
            self.form.set_field_errors(&errors);
            return Outcome::stay().with_toast(Toast::error(CHECK_FIELDS));
        }
        self.form.clear_errors();

        self.state = ViewState::Submitting;
        let result = self.client.login(&credentials).await;
        self.state = ViewState::Ready;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Login rejected");
                return Outcome::stay().with_toast(Toast::error(login_error_message(&e)));
            }
        };

        if let Err(e) = self.session.sign_in(response.token).await {
            error!(error = %e, "Could not persist session");
            return Outcome::stay().with_toast(Toast::error(UNEXPECTED_ERROR));
        }

        info!("Login succeeded");
        Outcome::navigate_after(Route::landing(), self.redirect_delay).with_toast(Toast::success(LOGIN_SUCCEEDED))
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Welcome Back\n\n");
        out.push_str(&self.form.render(&["password"]));
        if self.state == ViewState::Submitting {
            out.push_str("  (signing in...)\n");
        }
        out.push_str("\n  Type `login <email> <password>`.\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, InMemoryUsersApi, FAKE_TOKEN};
    use crate::cache::QueryCache;
    use crate::domain::Token;
    use crate::session::{MemoryStorage, Storage, TOKEN_KEY};
    use crate::views::Navigation;
    use rstest::rstest;
    use std::sync::Arc;

    async fn view(api: Arc<InMemoryUsersApi>, storage: Arc<MemoryStorage>) -> LoginView {
        let (cache, cache_client) = QueryCache::new(16);
        tokio::spawn(cache.run());
        let session = Session::init(storage).await.unwrap();
        LoginView::new(UserClient::new(api, cache_client), session, Duration::from_millis(1500))
    }

    #[tokio::test]
    async fn test_malformed_email_never_reaches_network() {
        let api = Arc::new(InMemoryUsersApi::new());
        let mut login = view(api.clone(), Arc::new(MemoryStorage::new())).await;

        let outcome = login.login("not-an-email", "secret").await;

        assert_eq!(outcome, Outcome::stay().with_toast(Toast::error(CHECK_FIELDS)));
        assert_eq!(login.form().field_error("email"), Some("Invalid email address"));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_stores_token_and_redirects_after_delay() {
        let api = Arc::new(InMemoryUsersApi::new());
        let storage = Arc::new(MemoryStorage::new());
        let mut login = view(api.clone(), storage.clone()).await;

        let outcome = login.login("eve.holt@reqres.in", "cityslicka").await;

        assert_eq!(outcome.toasts, vec![Toast::success(LOGIN_SUCCEEDED)]);
        assert_eq!(
            outcome.navigation,
            Navigation::NavigateAfter(Route::UserList { page: 1 }, Duration::from_millis(1500))
        );
        assert_eq!(storage.get_item(TOKEN_KEY).await.unwrap().as_deref(), Some(FAKE_TOKEN));
        assert_eq!(login.session.token(), Some(Token::new(FAKE_TOKEN)));
        assert_eq!(
            api.calls(),
            vec![ApiCall::Login {
                email: "eve.holt@reqres.in".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_server_message_is_toasted() {
        let api = Arc::new(InMemoryUsersApi::new());
        let storage = Arc::new(MemoryStorage::new());
        let mut login = view(api, storage.clone()).await;

        let outcome = login.login("nobody@reqres.in", "secret").await;
        assert_eq!(outcome.toasts, vec![Toast::error(LOGIN_FAILED)]);

        let outcome = login.login("eve.holt@reqres.in", "").await;
        assert_eq!(outcome.toasts, vec![Toast::error("Missing password")]);
        assert!(storage.get_item(TOKEN_KEY).await.unwrap().is_none());
    }

    #[rstest]
    #[case(AdminError::Auth("user not found".into()), "user not found")]
    #[case(AdminError::Auth(LOGIN_FAILED.into()), LOGIN_FAILED)]
    #[case(AdminError::Status { status: 502 }, LOGIN_FAILED)]
    #[case(AdminError::Network("dns".into()), UNEXPECTED_ERROR)]
    #[case(AdminError::Decode("no token".into()), UNEXPECTED_ERROR)]
    fn test_login_error_message(#[case] err: AdminError, #[case] expected: &str) {
        assert_eq!(login_error_message(&err), expected);
    }
}
