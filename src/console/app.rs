use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use super::Command;
use crate::app_system::AdminSystem;
use crate::clients::UserClient;
use crate::domain::Token;
use crate::error::AdminResult;
use crate::router::{resolve, step, Resolution, Route};
use crate::session::Session;
use crate::views::{Confirm, EditUserView, Layout, LoginView, Navigation, Outcome, Toast, UserListView};

/// The mounted page.
pub enum Screen {
    Login(LoginView),
    List(UserListView),
    Edit(EditUserView),
}

/// Router plus whatever page is currently mounted. Navigating replaces the
/// screen, which drops the previous view and any fetch it had in flight.
pub struct App {
    user_client: UserClient,
    session: Session,
    login_redirect_delay: Duration,
    layout: Layout,
    auth: watch::Receiver<Option<Token>>,
    route: Route,
    screen: Screen,
}

impl App {
    /// Starts at `/` and lets the guard pick the first page.
    pub async fn new(system: &AdminSystem) -> Self {
        let session = system.session.clone();
        let auth = session.watch();

        let login = LoginView::new(system.user_client.clone(), session.clone(), system.login_redirect_delay);
        let mut app = Self {
            user_client: system.user_client.clone(),
            layout: Layout::new(session.clone()),
            session,
            login_redirect_delay: system.login_redirect_delay,
            auth,
            route: Route::Login,
            screen: Screen::Login(login),
        };
        app.open(Route::Root).await;
        app
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Runs the guard and mounts whatever it lets through.
    #[instrument(skip(self), fields(requested = %route))]
    pub async fn open(&mut self, route: Route) {
        let target = resolve(route, self.session.is_authenticated());
        info!(route = %target, "Navigating");
        self.screen = self.mount(&target).await;
        self.route = target;
    }

    pub async fn follow(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::Stay => {}
            Navigation::Navigate(route) => self.open(route).await,
            Navigation::NavigateAfter(route, delay) => {
                debug!(?delay, "Delaying navigation");
                tokio::time::sleep(delay).await;
                self.open(route).await;
            }
        }
    }

    /// Re-checks the current route after a sign-in or sign-out elsewhere.
    pub async fn sync_session(&mut self) {
        if !self.auth.has_changed().unwrap_or(false) {
            return;
        }
        self.auth.borrow_and_update();
        if let Resolution::Redirect(_) = step(&self.route, self.session.is_authenticated()) {
            let route = self.route.clone();
            self.open(route).await;
        }
    }

    /// Picks up finished fetches and invalidations without waiting.
    pub fn poll(&mut self) -> Outcome {
        match &mut self.screen {
            Screen::List(view) => {
                view.poll();
                Outcome::stay()
            }
            Screen::Edit(view) => view.poll().unwrap_or_default(),
            Screen::Login(_) => Outcome::stay(),
        }
    }

    pub fn is_busy(&self) -> bool {
        match &self.screen {
            Screen::List(view) => view.is_busy(),
            Screen::Edit(view) => view.is_busy(),
            Screen::Login(_) => false,
        }
    }

    pub async fn settle(&mut self) -> Outcome {
        match &mut self.screen {
            Screen::List(view) => {
                view.settle().await;
                Outcome::stay()
            }
            Screen::Edit(view) => view.settle().await,
            Screen::Login(_) => Outcome::stay(),
        }
    }

    /// Applies a page command to the mounted screen. `Help` and `Quit` belong
    /// to the console and are ignored here.
    pub async fn execute(&mut self, command: Command, confirm: &mut dyn Confirm) -> Outcome {
        let name = command.name();
        match (command, &mut self.screen) {
            (Command::Open(path), _) => Outcome::navigate(Route::parse(&path)),
            (Command::Help | Command::Quit, _) => Outcome::stay(),

            (Command::Login { email, password }, Screen::Login(view)) => view.login(&email, &password).await,
            (Command::Save, Screen::Login(view)) => view.submit().await,
            (Command::Set { field, value }, Screen::Login(view)) => field_result(view.set_field(&field, &value)),

            (Command::Logout, Screen::List(_) | Screen::Edit(_)) => self.layout.logout().await,

            (Command::Next, Screen::List(view)) => view.next(),
            (Command::Prev, Screen::List(view)) => view.prev(),
            (Command::Page(page), Screen::List(view)) => view.go_to(page),
            (Command::Edit(id), Screen::List(view)) => view.edit(id),
            (Command::Delete(id), Screen::List(view)) => view.delete(id, confirm).await,
            (Command::Retry, Screen::List(view)) => view.retry(),
            (Command::Refresh, Screen::List(view)) => view.refresh(),

            (Command::Set { field, value }, Screen::Edit(view)) => field_result(view.set_field(&field, &value)),
            (Command::Save, Screen::Edit(view)) => view.submit().await,
            (Command::Cancel | Command::Back, Screen::Edit(view)) => view.cancel(),
            (Command::Retry, Screen::Edit(view)) => view.retry(),

            _ => Outcome::stay().with_toast(Toast::error(format!(
                "`{}` is not available on {}",
                name, self.route
            ))),
        }
    }

    pub fn render(&self) -> String {
        let page = match &self.screen {
            Screen::Login(view) => return format!("[{}]\n{}", self.route, view.render()),
            Screen::List(view) => view.render(),
            Screen::Edit(view) => view.render(),
        };
        format!("[{}]\n{}", self.route, self.layout.render(&page))
    }

    async fn mount(&self, route: &Route) -> Screen {
        match route {
            Route::Login => Screen::Login(LoginView::new(
                self.user_client.clone(),
                self.session.clone(),
                self.login_redirect_delay,
            )),
            Route::EditUser { id } => Screen::Edit(EditUserView::mount(self.user_client.clone(), *id)),
            Route::UserList { page } => Screen::List(UserListView::mount(self.user_client.clone(), *page).await),
            // The guard never lets these render.
            Route::Root | Route::Unknown(_) => Screen::List(UserListView::mount(self.user_client.clone(), 1).await),
        }
    }
}

fn field_result(result: AdminResult<()>) -> Outcome {
    match result {
        Ok(()) => Outcome::stay(),
        Err(e) => Outcome::stay().with_toast(Toast::error(e.to_string())),
    }
}
