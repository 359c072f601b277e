//! Response definitions
//!
//! The server answers every command with free-form text. `Response` keeps
//! that text (already trimmed) and offers light-weight views over the
//! conventions the server follows: an `OK`/`ERR` head line, `OK <n>`
//! counts and `key=value` fields.

use std::fmt;

/// Continuation token that accepts a streaming upload
pub const CONTINUATION_TOKEN: &str = "SEND_DATA";

/// Line that terminates uploaded content
pub const SENTINEL: &str = "<<<EOF>>>";

/// Coarse classification of a reply's head line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Err,
    SendData,
    Other,
}

/// One server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    text: String,
}

impl Response {
    /// Wrap reply text, trimming surrounding whitespace
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// First line of the reply
    pub fn head(&self) -> &str {
        self.text.lines().next().unwrap_or("")
    }

    /// Lines after the head (listing entries, file content)
    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().skip(1)
    }

    pub fn status(&self) -> Status {
        let keyword = self.head().split_whitespace().next().unwrap_or("");
        match keyword {
            "OK" => Status::Ok,
            "ERR" | "ERROR" | "ERROR:" => Status::Err,
            _ if self.text.starts_with(CONTINUATION_TOKEN) => Status::SendData,
            _ => Status::Other,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status() == Status::Ok
    }

    pub fn is_err(&self) -> bool {
        self.status() == Status::Err
    }

    /// True if the server accepted a streaming upload.
    ///
    /// Only the prefix matters; the server may append instructions.
    pub fn is_continuation(&self) -> bool {
        self.text.starts_with(CONTINUATION_TOKEN)
    }

    /// `n` from an `OK <n>` head line
    pub fn count(&self) -> Option<usize> {
        parse_count(self.head())
    }

    /// Value of a `key=value` token in the head line
    ///
    /// e.g. `OK files=3 used=1024 free=4096` -> `field("used") == Some("1024")`
    pub fn field(&self, key: &str) -> Option<&str> {
        self.head().split_whitespace().find_map(|token| {
            let (k, v) = token.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<Response> for String {
    fn from(response: Response) -> Self {
        response.text
    }
}

/// Parse the count from an `OK <n>` line
pub(crate) fn parse_count(line: &str) -> Option<usize> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "OK" {
        return None;
    }
    tokens.next()?.parse().ok()
}
