//! Parsing of input lines into protocol requests.
//!
//! Pure functions, no I/O.

use hiroma_shared::protocol::Message;

use crate::error::CommandError;

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/reg <login> <password>`
    Register { login: String, password: String },
    /// `/auth <login> <password>`
    Auth { login: String, password: String },
    /// `/logout`
    Logout,
    /// Anything that is not a command
    Say(String),
}

impl Command {
    /// Parse a trimmed, non-empty input line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        match parts.next().unwrap_or_default() {
            "reg" => {
                let (login, password) =
                    credentials(&mut parts).ok_or(CommandError::MissingCredentials("/reg"))?;
                Ok(Self::Register { login, password })
            }
            "auth" => {
                let (login, password) =
                    credentials(&mut parts).ok_or(CommandError::MissingCredentials("/auth"))?;
                Ok(Self::Auth { login, password })
            }
            "logout" => Ok(Self::Logout),
            other => Err(CommandError::Unknown(format!("/{other}"))),
        }
    }

    /// Build the frame to send
    pub fn into_message(self, username: Option<&str>) -> Message {
        match self {
            Self::Register { login, password } => Message::register(&login, &password),
            Self::Auth { login, password } => Message::auth(&login, &password),
            Self::Logout => Message::logout(),
            Self::Say(text) => Message::public(username.unwrap_or_default(), text),
        }
    }
}

fn credentials<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<(String, String)> {
    let login = parts.next()?;
    let password = parts.next()?;
    Some((login.to_string(), password.to_string()))
}
