//! Business records exchanged with the remote API. Pure data, no I/O.

pub mod auth;
pub mod user;

pub use auth::*;
pub use user::*;
