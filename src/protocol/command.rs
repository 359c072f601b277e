//! Command definitions
//!
//! Typed commands for every operation the server understands. Each one
//! renders to a single space-separated wire line via `Display`.

use std::fmt;
use std::str::FromStr;

use crate::error::{OfsError, Result};

/// User role carried by `CREATE_USER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    User = 0,
    Admin = 1,
}

impl FromStr for Role {
    type Err = OfsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "user" => Ok(Role::User),
            "1" | "admin" => Ok(Role::Admin),
            other => Err(OfsError::InvalidCommand(format!(
                "unknown role '{}' (expected 0/user or 1/admin)",
                other
            ))),
        }
    }
}

/// How a reply to a command is laid out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A single line
    Line,

    /// `OK <n>` followed by `n` lines
    CountedLines,

    /// `OK <size>` followed by `size` raw bytes and a newline
    SizedBody,
}

impl ResponseShape {
    /// Classify a raw command line by its keyword.
    ///
    /// Keywords are matched case-insensitively, including the long-form
    /// aliases the server accepts (`DIR_LIST`, `FILE_READ`, ...).
    pub fn for_line(line: &str) -> Self {
        let keyword = line.split_whitespace().next().unwrap_or("");
        match keyword.to_ascii_uppercase().as_str() {
            "LS" | "DIR_LIST" | "LIST_USERS" => ResponseShape::CountedLines,
            "READ" | "FILE_READ" => ResponseShape::SizedBody,
            _ => ResponseShape::Line,
        }
    }
}

/// True if the raw command line starts a streaming upload
pub fn is_streaming_line(line: &str) -> bool {
    let keyword = line.split_whitespace().next().unwrap_or("");
    matches!(
        keyword.to_ascii_uppercase().as_str(),
        "CREATE" | "FILE_CREATE" | "EDIT" | "FILE_EDIT"
    )
}

/// A typed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Users and sessions
    Login { user: String, password: String },
    Logout,
    CreateUser { user: String, password: String, role: Role },
    DeleteUser { user: String },
    ListUsers,
    GetSessionInfo,

    // Directories
    Mkdir { path: String },
    Ls { path: String },
    Rmdir { path: String },
    DirExists { path: String },

    // Files
    /// Streaming: content follows after `SEND_DATA`
    Create { path: String },
    Read { path: String },
    /// Streaming: content is written at `index`
    Edit { path: String, index: u32 },
    Delete { path: String },
    FileExists { path: String },
    Truncate { path: String },
    GetMetadata { path: String },
    Rename { from: String, to: String },
    SetPermissions { path: String, permissions: u32 },

    // System
    GetStats,
}

impl Command {
    /// Wire keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Login { .. } => "LOGIN",
            Command::Logout => "LOGOUT",
            Command::CreateUser { .. } => "CREATE_USER",
            Command::DeleteUser { .. } => "DELETE_USER",
            Command::ListUsers => "LIST_USERS",
            Command::GetSessionInfo => "GET_SESSION_INFO",
            Command::Mkdir { .. } => "MKDIR",
            Command::Ls { .. } => "LS",
            Command::Rmdir { .. } => "RMDIR",
            Command::DirExists { .. } => "DIR_EXISTS",
            Command::Create { .. } => "CREATE",
            Command::Read { .. } => "READ",
            Command::Edit { .. } => "EDIT",
            Command::Delete { .. } => "DELETE",
            Command::FileExists { .. } => "FILE_EXISTS",
            Command::Truncate { .. } => "TRUNCATE",
            Command::GetMetadata { .. } => "GET_METADATA",
            Command::Rename { .. } => "RENAME",
            Command::SetPermissions { .. } => "SET_PERMISSIONS",
            Command::GetStats => "GET_STATS",
        }
    }

    /// Free-form arguments (numbers are rendered by `Display`)
    fn text_args(&self) -> Vec<&str> {
        match self {
            Command::Login { user, password } => vec![user.as_str(), password.as_str()],
            Command::CreateUser { user, password, .. } => {
                vec![user.as_str(), password.as_str()]
            }
            Command::DeleteUser { user } => vec![user.as_str()],
            Command::Mkdir { path }
            | Command::Ls { path }
            | Command::Rmdir { path }
            | Command::DirExists { path }
            | Command::Create { path }
            | Command::Read { path }
            | Command::Edit { path, .. }
            | Command::Delete { path }
            | Command::FileExists { path }
            | Command::Truncate { path }
            | Command::GetMetadata { path }
            | Command::SetPermissions { path, .. } => vec![path.as_str()],
            Command::Rename { from, to } => vec![from.as_str(), to.as_str()],
            Command::Logout | Command::ListUsers | Command::GetSessionInfo | Command::GetStats => {
                Vec::new()
            }
        }
    }

    /// Check that every argument is a single non-empty token.
    ///
    /// The protocol splits on whitespace and frames on newlines, so an
    /// argument containing either would change the meaning of the line.
    pub fn validate(&self) -> Result<()> {
        for arg in self.text_args() {
            if arg.is_empty() {
                return Err(OfsError::InvalidCommand(format!(
                    "{}: empty argument",
                    self.keyword()
                )));
            }
            if arg.chars().any(|c| c.is_whitespace() || c == '\0') {
                return Err(OfsError::InvalidCommand(format!(
                    "{}: argument {:?} contains whitespace or NUL",
                    self.keyword(),
                    arg
                )));
            }
        }
        Ok(())
    }

    /// True for commands whose content travels in a streaming upload
    pub fn is_streaming(&self) -> bool {
        matches!(self, Command::Create { .. } | Command::Edit { .. })
    }

    /// Layout of the server's reply
    pub fn response_shape(&self) -> ResponseShape {
        match self {
            Command::Ls { .. } | Command::ListUsers => ResponseShape::CountedLines,
            Command::Read { .. } => ResponseShape::SizedBody,
            _ => ResponseShape::Line,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())?;
        for arg in self.text_args() {
            write!(f, " {}", arg)?;
        }
        match self {
            Command::CreateUser { role, .. } => write!(f, " {}", *role as u8),
            Command::Edit { index, .. } => write!(f, " {}", index),
            Command::SetPermissions { permissions, .. } => write!(f, " {}", permissions),
            _ => Ok(()),
        }
    }
}

/// Render a raw line for logs, hiding credentials.
pub fn redact(line: &str) -> String {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next().unwrap_or("");
    match keyword.to_ascii_uppercase().as_str() {
        "LOGIN" | "CREATE_USER" => {
            let user = tokens.next().unwrap_or("");
            format!("{} {} ****", keyword, user)
        }
        _ => line.to_string(),
    }
}
