use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::api::UsersApi;
use crate::cache::{CacheClient, Lookup, Query, Subscription, Tag};
use crate::domain::{Credentials, LoginResponse, UpdatedUser, UserId, UserPage, UserPatch};
use crate::error::{AdminError, AdminResult};

/// Cache key for one page of the user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsersQuery {
    pub page: u32,
}

impl Query for UsersQuery {
    type Output = UserPage;

    fn tags(&self) -> Vec<Tag> {
        vec![Tag::Users]
    }
}

/// Client for the users API. Reads go through the query cache; mutations
/// invalidate the `Users` tag so every subscribed view re-fetches.
#[derive(Clone)]
pub struct UserClient {
    api: Arc<dyn UsersApi>,
    cache: CacheClient<UsersQuery>,
}

impl UserClient {
    pub fn new(api: Arc<dyn UsersApi>, cache: CacheClient<UsersQuery>) -> Self {
        Self { api, cache }
    }

    #[instrument(fields(email = %credentials.email), skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> AdminResult<LoginResponse> {
        debug!("Sending request");
        self.api.login(credentials).await
    }

    /// Cached read of one page.
    #[instrument(skip(self))]
    pub async fn list_users(&self, page: u32) -> AdminResult<UserPage> {
        let query = users_query(page)?;
        match self.cache.get(query).await? {
            Lookup::Hit(users) => Ok(users),
            Lookup::Miss { generation } => self.fetch(query, generation).await,
        }
    }

    /// Skips the cached copy and asks the server again.
    #[instrument(skip(self))]
    pub async fn refetch_users(&self, page: u32) -> AdminResult<UserPage> {
        let query = users_query(page)?;
        let generation = self.cache.generation().await?;
        self.fetch(query, generation).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: UserId, patch: &UserPatch) -> AdminResult<UpdatedUser> {
        debug!("Sending request");
        let updated = self.api.update_user(id, patch).await?;
        self.invalidate_users().await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> AdminResult<()> {
        debug!("Sending request");
        self.api.delete_user(id).await?;
        self.invalidate_users().await;
        Ok(())
    }

    pub async fn subscribe_users(&self) -> AdminResult<Subscription> {
        self.cache.subscribe(Tag::Users).await
    }

    async fn fetch(&self, query: UsersQuery, generation: u64) -> AdminResult<UserPage> {
        debug!("Sending request");
        let users = UserPage::from(self.api.list_users(query.page).await?);

        if !self.cache.put(query, users.clone(), generation).await? {
            // A mutation landed while this request was in flight; the caller
            // still gets the response, and the invalidation drives a re-fetch.
            debug!("Response not cached");
        }
        info!(user_count = users.users.len(), total_pages = users.total_pages, "Users fetched");
        Ok(users)
    }

    async fn invalidate_users(&self) {
        // The remote mutation already succeeded; a closed cache only means
        // nothing is left to refresh.
        if let Err(e) = self.cache.invalidate(Tag::Users).await {
            warn!(error = %e, "Could not invalidate users");
        }
    }
}

fn users_query(page: u32) -> AdminResult<UsersQuery> {
    if page == 0 {
        return Err(AdminError::Validation("Page must be a positive integer".to_string()));
    }
    Ok(UsersQuery { page })
}
