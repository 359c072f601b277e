//! Protocol Module
//!
//! Defines the line-based wire protocol spoken with the OFS server.
//!
//! ## Protocol Format
//!
//! Every command is one line of space-separated tokens terminated by `\n`.
//! The server greets each new connection with one line, then answers each
//! command with one reply.
//!
//! ### Commands
//! - Users:       `LOGIN`, `LOGOUT`, `CREATE_USER`, `DELETE_USER`,
//!                `LIST_USERS`, `GET_SESSION_INFO`
//! - Directories: `MKDIR`, `LS`, `RMDIR`, `DIR_EXISTS`
//! - Files:       `CREATE`*, `READ`, `EDIT`*, `DELETE`, `FILE_EXISTS`,
//!                `TRUNCATE`, `GET_METADATA`, `RENAME`, `SET_PERMISSIONS`
//! - System:      `GET_STATS`
//!
//! `*` streaming: see [`Upload`].
//!
//! ### Replies
//! - `OK ...`           success, optionally followed by a body
//! - `ERR <reason>`     failure
//! - `SEND_DATA ...`    accepts a streaming upload

mod command;
mod response;
mod codec;
mod upload;

pub use command::{is_streaming_line, redact, Command, ResponseShape, Role};
pub use response::{Response, Status, CONTINUATION_TOKEN, SENTINEL};
pub use codec::{
    encode_line, read_delimited, read_response, read_single, write_command, write_line,
};
pub use upload::{Upload, UploadOutcome, UploadState};
