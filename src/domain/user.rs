use serde::{Deserialize, Serialize};

pub type UserId = u32;

/// A user record as served by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

impl User {
    /// Creates a new User instance.
    ///
    /// # Notes
    /// The client never originates ids; this constructor exists for fakes and
    /// tests that mirror records the server already owns.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            avatar: avatar.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Partial update for an existing user. Absent fields are left untouched
/// by the server and are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}

/// What the server echoes back after a PATCH: the fields it changed plus a
/// modification timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

impl UpdatedUser {
    /// Overlays the echoed fields onto a previously fetched record.
    pub fn apply_to(&self, user: &User) -> User {
        User {
            id: self.id.unwrap_or(user.id),
            email: self.email.clone().unwrap_or_else(|| user.email.clone()),
            first_name: self.first_name.clone().unwrap_or_else(|| user.first_name.clone()),
            last_name: self.last_name.clone().unwrap_or_else(|| user.last_name.clone()),
            avatar: self.avatar.clone().unwrap_or_else(|| user.avatar.clone()),
        }
    }
}

/// Support banner included in every list envelope. Dropped by the
/// projection into [`UserPage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    pub url: String,
    pub text: String,
}

/// Raw `GET /users?page=N` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersEnvelope {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<User>,
    #[serde(default)]
    pub support: Option<Support>,
}

/// One page of users, projected from [`UsersEnvelope`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total_pages: u32,
}

impl UserPage {
    pub fn find(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.find(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl From<UsersEnvelope> for UserPage {
    fn from(envelope: UsersEnvelope) -> Self {
        Self {
            users: envelope.data,
            total_pages: envelope.total_pages,
        }
    }
}
