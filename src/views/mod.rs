//! # Page Views
//!
//! One state machine per page. Views never touch the network themselves: they
//! call [`UserClient`](crate::clients::UserClient), spawn the call as a task and
//! keep the receiving end of a oneshot channel. Dropping a view (navigating
//! away) drops the receiver, so a late response is simply ignored.
//!
//! User actions return an [`Outcome`]: toasts to show and where to go next.
//! The console applies it; views do not navigate on their own.

pub mod edit;
pub mod form;
pub mod layout;
pub mod list;
pub mod login;

pub use edit::EditUserView;
pub use form::FormState;
pub use layout::Layout;
pub use list::UserListView;
pub use login::LoginView;

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::error::{AdminError, AdminResult};
use crate::router::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// Transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

impl Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = match self.level {
            ToastLevel::Info => "i",
            ToastLevel::Success => "+",
            ToastLevel::Error => "!",
        };
        write!(f, "[{}] {}", marker, self.message)
    }
}

/// `Loading -> {Ready, Error}`, and `Ready -> Submitting -> {Ready, Error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready,
    Submitting,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Navigation {
    #[default]
    Stay,
    Navigate(Route),
    /// Navigate once the delay has elapsed.
    NavigateAfter(Route, Duration),
}

/// What a user action asks the shell to do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub toasts: Vec<Toast>,
    pub navigation: Navigation,
}

impl Outcome {
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn navigate(route: Route) -> Self {
        Self {
            toasts: Vec::new(),
            navigation: Navigation::Navigate(route),
        }
    }

    pub fn navigate_after(route: Route, delay: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            navigation: Navigation::NavigateAfter(route, delay),
        }
    }

    pub fn with_toast(mut self, toast: Toast) -> Self {
        self.toasts.push(toast);
        self
    }
}

/// Blocking yes/no question put to the user.
#[async_trait]
pub trait Confirm: Send {
    async fn confirm(&mut self, prompt: &str) -> bool;
}

/// An in-flight fetch owned by a view.
#[derive(Debug)]
pub struct PendingFetch<T> {
    receiver: oneshot::Receiver<AdminResult<T>>,
}

impl<T: Send + 'static> PendingFetch<T> {
    pub fn spawn<F>(fetch: F) -> Self
    where
        F: Future<Output = AdminResult<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        tokio::spawn(async move {
            // Receiver gone means the view was dropped.
            let _ = sender.send(fetch.await);
        });
        Self { receiver }
    }

    /// Non-blocking check. `None` while the request is still in flight.
    pub fn try_take(&mut self) -> Option<AdminResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(aborted())),
        }
    }

    pub async fn wait(self) -> AdminResult<T> {
        self.receiver.await.unwrap_or_else(|_| Err(aborted()))
    }
}

fn aborted() -> AdminError {
    AdminError::Network("request task aborted".to_string())
}
