//! # user-admin
//!
//! User administration client for a reqres-style REST API: sign in, browse
//! users page by page, edit and delete them.
//!
//! The crate is a headless client core driven by a line-oriented console:
//!
//! - [`api`]: the remote API behind a trait, with a reqwest adapter.
//! - [`cache`]: a query cache actor with tag invalidation and subscriptions.
//! - [`clients`]: [`UserClient`](clients::UserClient), cached reads and
//!   invalidating mutations.
//! - [`session`]: the persisted token and its change notifications.
//! - [`router`]: routes and the authentication guard.
//! - [`views`]: per-page state machines (list, edit, login) and the layout.
//! - [`console`]: the shell that maps input lines to view actions.
//! - [`app_system`]: startup, wiring and shutdown.

pub mod api;
pub mod app_system;
pub mod cache;
pub mod clients;
pub mod config;
pub mod console;
pub mod domain;
pub mod error;
pub mod router;
pub mod session;
pub mod views;

#[cfg(test)]
mod mock_framework;
