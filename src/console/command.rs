use std::str::FromStr;

use crate::domain::UserId;
use crate::error::AdminError;

pub const HELP: &str = "\
Commands:
  open <path>              go to a route (/login, /user/2, /edit-user/3)
  login <email> <password> sign in
  next | prev | page <n>   move through the user list
  edit <id>                edit a user from the current page
  delete <id>              delete a user from the current page (asks first)
  set <field> <value>      change a form field
  save | cancel | back     submit or leave the current form
  retry | refresh          load the current page again
  logout                   sign out
  help | quit
";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Login { email: String, password: String },
    Next,
    Prev,
    Page(u32),
    Edit(UserId),
    Delete(UserId),
    Retry,
    Set { field: String, value: String },
    Save,
    Cancel,
    Back,
    Logout,
    Refresh,
    Help,
    Quit,
}

impl Command {
    /// The word that invokes this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Open(_) => "open",
            Command::Login { .. } => "login",
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Page(_) => "page",
            Command::Edit(_) => "edit",
            Command::Delete(_) => "delete",
            Command::Retry => "retry",
            Command::Set { .. } => "set",
            Command::Save => "save",
            Command::Cancel => "cancel",
            Command::Back => "back",
            Command::Logout => "logout",
            Command::Refresh => "refresh",
            Command::Help => "help",
            Command::Quit => "quit",
        }
    }
}

impl FromStr for Command {
    type Err = AdminError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "open" | "goto" => {
                if rest.is_empty() {
                    return Err(usage("open <path>"));
                }
                Command::Open(rest.to_string())
            }
            "login" => {
                let (email, password) = match rest.split_once(char::is_whitespace) {
                    Some((email, password)) => (email, password.trim()),
                    None => (rest, ""),
                };
                if email.is_empty() {
                    return Err(usage("login <email> <password>"));
                }
                Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                }
            }
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "page" => Command::Page(number(rest, "page <n>")?),
            "edit" => Command::Edit(number(rest, "edit <id>")?),
            "delete" | "rm" => Command::Delete(number(rest, "delete <id>")?),
            "retry" => Command::Retry,
            "set" => {
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (rest, ""),
                };
                if field.is_empty() {
                    return Err(usage("set <field> <value>"));
                }
                Command::Set {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            "save" | "submit" => Command::Save,
            "cancel" => Command::Cancel,
            "back" => Command::Back,
            "logout" => Command::Logout,
            "refresh" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(AdminError::Validation(format!(
                    "Unknown command '{}'. Type `help` for commands.",
                    other
                )))
            }
        };
        Ok(command)
    }
}

fn number(raw: &str, form: &str) -> Result<u32, AdminError> {
    raw.parse().map_err(|_| usage(form))
}

fn usage(form: &str) -> AdminError {
    AdminError::Validation(format!("Usage: {}", form))
}
