//! Client handles used by the views.

mod user_client;

pub use user_client::{UserClient, UsersQuery};
