use tracing::{error, instrument};

use super::{Outcome, Toast};
use crate::router::Route;
use crate::session::Session;

pub const HEADER: &str = "User Management";

/// Chrome around every authenticated page.
#[derive(Clone)]
pub struct Layout {
    session: Session,
}

impl Layout {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn render(&self, page: &str) -> String {
        let rule = "=".repeat(48);
        format!("{rule}\n {:<38}[logout]\n{rule}\n\n{}", HEADER, page)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Outcome {
        match self.session.sign_out().await {
            Ok(()) => Outcome::navigate(Route::Login),
            Err(e) => {
                error!(error = %e, "Logout failed");
                Outcome::stay().with_toast(Toast::error(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Token;
    use crate::session::{MemoryStorage, Storage, TOKEN_KEY};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_logout_clears_token_and_goes_to_login() {
        let storage = Arc::new(MemoryStorage::new());
        let session = Session::init(storage.clone()).await.unwrap();
        session.sign_in(Token::new("abc")).await.unwrap();
        let layout = Layout::new(session.clone());

        assert_eq!(layout.logout().await, Outcome::navigate(Route::Login));
        assert!(!session.is_authenticated());
        assert!(storage.get_item(TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_render_wraps_page() {
        let session = Session::init(Arc::new(MemoryStorage::new())).await.unwrap();
        let text = Layout::new(session).render("User List\n");
        assert!(text.contains(HEADER));
        assert!(text.contains("[logout]"));
        assert!(text.ends_with("User List\n"));
    }
}
