//! Port to the remote users API and its adapters.

mod http;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use http::{derive_login_error, HttpUsersApi};
#[cfg(any(test, feature = "test-support"))]
pub use memory::{ApiCall, InMemoryUsersApi, FAKE_TOKEN};

use async_trait::async_trait;

use crate::domain::{Credentials, LoginResponse, UpdatedUser, UserId, UserPatch, UsersEnvelope};
use crate::error::AdminResult;

/// The four remote operations the client relies on. Implementations perform
/// exactly one request per call and never retry.
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// `POST /login`
    async fn login(&self, credentials: &Credentials) -> AdminResult<LoginResponse>;

    /// `GET /users?page=N`, returned as the raw envelope.
    async fn list_users(&self, page: u32) -> AdminResult<UsersEnvelope>;

    /// `PATCH /users/{id}`
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> AdminResult<UpdatedUser>;

    /// `DELETE /users/{id}`
    async fn delete_user(&self, id: UserId) -> AdminResult<()>;
}
