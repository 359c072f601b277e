//! Streaming upload
//!
//! `CREATE` and `EDIT` carry file content after the command line:
//!
//! ```text
//! client: CREATE /a.txt
//! server: SEND_DATA ...
//! client: line1
//! client: line2
//! client: <<<EOF>>>
//! server: OK
//! ```
//!
//! If the server answers anything other than `SEND_DATA`, nothing else is
//! written and that answer is the result.

use std::io::{BufRead, Write};

use super::codec::{read_response, write_command};
use super::response::SENTINEL;
use super::{Response, ResponseShape};
use crate::config::Framing;
use crate::error::{OfsError, Result};

/// Progress of one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Init,
    SentCommand,
    AwaitingContinuation,
    Streaming,
    Aborted,
    Finalizing,
    Done,
}

/// How an upload ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Content was streamed; the server's final reply
    Completed(Response),

    /// The server refused before any content was sent; its reply verbatim
    Declined(Response),
}

impl UploadOutcome {
    pub fn response(&self) -> &Response {
        match self {
            UploadOutcome::Completed(r) | UploadOutcome::Declined(r) => r,
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            UploadOutcome::Completed(r) | UploadOutcome::Declined(r) => r,
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, UploadOutcome::Declined(_))
    }
}

/// One streaming upload session
#[derive(Debug)]
pub struct Upload<'a> {
    command: &'a str,
    lines: Vec<&'a str>,
    state: UploadState,
}

impl<'a> Upload<'a> {
    /// Prepare an upload of `content` for `command`.
    ///
    /// Content is split on `\n`; an empty body has no lines and a trailing
    /// newline does not add an empty one. A plain `split("\n")` would send
    /// `"x\n"` as `x` plus an empty line, so the stored file gains a blank
    /// last line; here it does not. Pass `"x\n\n"` to keep one.
    ///
    /// Fails if any line would read as the sentinel on the server side
    /// (which trims lines before comparing).
    pub fn new(command: &'a str, content: &'a str) -> Result<Self> {
        let lines: Vec<&str> = content.split_terminator('\n').collect();
        if let Some(idx) = lines.iter().position(|l| l.trim() == SENTINEL) {
            return Err(OfsError::SentinelCollision { line: idx + 1 });
        }
        Ok(Self {
            command,
            lines,
            state: UploadState::Init,
        })
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Number of content lines that will be streamed
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Drive the upload to completion over `reader`/`writer`.
    ///
    /// On an I/O error the state is left where the failure happened; the
    /// stream is then out of sync and must not be reused.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        framing: Framing,
    ) -> Result<UploadOutcome> {
        if self.state != UploadState::Init {
            return Err(OfsError::InvalidCommand(format!(
                "upload already run (state {:?})",
                self.state
            )));
        }

        write_command(writer, self.command)?;
        self.advance(UploadState::SentCommand);

        self.advance(UploadState::AwaitingContinuation);
        let ack = read_response(reader, framing, ResponseShape::Line)?;
        if !ack.is_continuation() {
            self.advance(UploadState::Aborted);
            tracing::debug!("Upload declined by server: {}", ack);
            return Ok(UploadOutcome::Declined(ack));
        }

        // one flushed write per line: the server keeps only the first line
        // of each read and discards the rest
        self.advance(UploadState::Streaming);
        for line in &self.lines {
            write_command(writer, line)?;
        }

        self.advance(UploadState::Finalizing);
        write_command(writer, SENTINEL)?;
        let reply = read_response(reader, framing, ResponseShape::Line)?;

        self.advance(UploadState::Done);
        Ok(UploadOutcome::Completed(reply))
    }

    fn advance(&mut self, next: UploadState) {
        tracing::trace!("Upload state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
