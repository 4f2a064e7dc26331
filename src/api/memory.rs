//! In-memory users API for tests. Behaves like reqres, except that updates and
//! deletes actually stick.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use super::UsersApi;
use crate::domain::{Credentials, LoginResponse, Token, UpdatedUser, User, UserId, UserPatch, UsersEnvelope};
use crate::error::{AdminError, AdminResult, LOGIN_FAILED};

const SEED: [(UserId, &str, &str, &str); 12] = [
    (1, "george.bluth@reqres.in", "George", "Bluth"),
    (2, "janet.weaver@reqres.in", "Janet", "Weaver"),
    (3, "emma.wong@reqres.in", "Emma", "Wong"),
    (4, "eve.holt@reqres.in", "Eve", "Holt"),
    (5, "charles.morris@reqres.in", "Charles", "Morris"),
    (6, "tracey.ramos@reqres.in", "Tracey", "Ramos"),
    (7, "michael.lawson@reqres.in", "Michael", "Lawson"),
    (8, "lindsay.ferguson@reqres.in", "Lindsay", "Ferguson"),
    (9, "tobias.funke@reqres.in", "Tobias", "Funke"),
    (10, "byron.fields@reqres.in", "Byron", "Fields"),
    (11, "george.edwards@reqres.in", "George", "Edwards"),
    (12, "rachel.howell@reqres.in", "Rachel", "Howell"),
];

/// Token handed out for every successful login.
pub const FAKE_TOKEN: &str = "QpwL5tke4Pnpja7X4";

/// One recorded call against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Login { email: String },
    ListUsers { page: u32 },
    UpdateUser { id: UserId, patch: UserPatch },
    DeleteUser { id: UserId },
}

#[derive(Debug)]
pub struct InMemoryUsersApi {
    users: Mutex<BTreeMap<UserId, User>>,
    per_page: u32,
    calls: Mutex<Vec<ApiCall>>,
    failures: Mutex<VecDeque<AdminError>>,
}

impl Default for InMemoryUsersApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUsersApi {
    /// Seeded with the twelve reqres users, six per page.
    pub fn new() -> Self {
        let users = SEED
            .iter()
            .map(|(id, email, first, last)| {
                let avatar = format!("https://reqres.in/img/faces/{}-image.jpg", id);
                (*id, User::new(*id, *email, *first, *last, avatar))
            })
            .collect();
        Self::with_users(users, 6)
    }

    pub fn empty() -> Self {
        Self::with_users(BTreeMap::new(), 6)
    }

    fn with_users(users: BTreeMap<UserId, User>, per_page: u32) -> Self {
        Self {
            users: Mutex::new(users),
            per_page,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// The next call (of any kind) fails with `error`.
    pub fn fail_next(&self, error: AdminError) {
        lock(&self.failures).push_back(error);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        lock(&self.users).get(&id).cloned()
    }

    fn record(&self, call: ApiCall) -> AdminResult<()> {
        lock(&self.calls).push(call);
        match lock(&self.failures).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl UsersApi for InMemoryUsersApi {
    async fn login(&self, credentials: &Credentials) -> AdminResult<LoginResponse> {
        self.record(ApiCall::Login {
            email: credentials.email.clone(),
        })?;

        if credentials.password.is_empty() {
            return Err(AdminError::Auth("Missing password".to_string()));
        }
        let known = lock(&self.users).values().any(|user| user.email == credentials.email);
        // reqres answers with an `error` key, which carries no displayable message.
        if !known {
            return Err(AdminError::Auth(LOGIN_FAILED.to_string()));
        }
        Ok(LoginResponse {
            token: Token::new(FAKE_TOKEN),
        })
    }

    async fn list_users(&self, page: u32) -> AdminResult<UsersEnvelope> {
        self.record(ApiCall::ListUsers { page })?;

        let users = lock(&self.users);
        let total = users.len() as u32;
        let total_pages = total.div_ceil(self.per_page);
        let skip = (page.saturating_sub(1) * self.per_page) as usize;
        let data = users.values().skip(skip).take(self.per_page as usize).cloned().collect();

        Ok(UsersEnvelope {
            page,
            per_page: self.per_page,
            total,
            total_pages,
            data,
            support: None,
        })
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> AdminResult<UpdatedUser> {
        self.record(ApiCall::UpdateUser {
            id,
            patch: patch.clone(),
        })?;

        let mut users = lock(&self.users);
        let user = users.get_mut(&id).ok_or(AdminError::Status { status: 404 })?;
        if let Some(first_name) = &patch.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }

        Ok(UpdatedUser {
            id: Some(id),
            first_name: patch.first_name.clone(),
            last_name: patch.last_name.clone(),
            email: patch.email.clone(),
            avatar: None,
            updated_at: Some("2024-01-01T00:00:00.000Z".to_string()),
        })
    }

    async fn delete_user(&self, id: UserId) -> AdminResult<()> {
        self.record(ApiCall::DeleteUser { id })?;
        lock(&self.users).remove(&id);
        Ok(())
    }
}
