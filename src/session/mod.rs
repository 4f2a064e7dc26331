//! Session context: who is signed in, shared by the route guard and the views.
//!
//! Init reads the persisted token once at startup. Sign-in and sign-out write
//! through to storage first and then publish the new state on a watch
//! channel, so anything holding a [`Session`] clone observes the change.

mod storage;

pub use storage::{FileStorage, MemoryStorage, Storage};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::domain::Token;
use crate::error::AdminResult;

/// Storage key the token lives under.
pub const TOKEN_KEY: &str = "token";

#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn Storage>,
    token: Arc<watch::Sender<Option<Token>>>,
}

impl Session {
    /// Restores whatever token a previous run left behind.
    #[instrument(skip(storage))]
    pub async fn init(storage: Arc<dyn Storage>) -> AdminResult<Self> {
        let token = storage
            .get_item(TOKEN_KEY)
            .await?
            .filter(|value| !value.is_empty())
            .map(Token::new);
        info!(authenticated = token.is_some(), "Session restored");

        let (sender, _) = watch::channel(token);
        Ok(Self {
            storage,
            token: Arc::new(sender),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    pub fn token(&self) -> Option<Token> {
        self.token.borrow().clone()
    }

    #[instrument(skip(self, token))]
    pub async fn sign_in(&self, token: Token) -> AdminResult<()> {
        self.storage.set_item(TOKEN_KEY, token.as_str()).await?;
        self.token.send_replace(Some(token));
        info!("Signed in");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> AdminResult<()> {
        self.storage.remove_item(TOKEN_KEY).await?;
        self.token.send_replace(None);
        info!("Signed out");
        Ok(())
    }

    /// Observe sign-in/sign-out.
    pub fn watch(&self) -> watch::Receiver<Option<Token>> {
        self.token.subscribe()
    }
}
