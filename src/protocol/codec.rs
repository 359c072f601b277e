//! Protocol codec
//!
//! Line framing for commands and response framing for replies.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! KEYWORD arg1 arg2 ...\n
//! ```
//!
//! ### Response (delimited framing)
//! ```text
//! OK 2\n            <- head line
//! notes 1\n         <- CountedLines: exactly n lines follow
//! readme.txt 0\n
//!
//! OK 12\n           <- SizedBody: exactly size bytes follow,
//! hello world\n\n      then one newline
//! ```
//!
//! There is no terminator for single-line replies other than the newline
//! itself, so the command keyword decides how much to read.

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::response::parse_count;
use super::{Response, ResponseShape};
use crate::config::Framing;
use crate::error::{OfsError, Result};

// =============================================================================
// Encoding
// =============================================================================

/// Encode a command line: the text followed by a single `\n`.
///
/// No escaping is performed.
pub fn encode_line(line: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(line.len() + 1);
    buf.put_slice(line.as_bytes());
    buf.put_u8(b'\n');
    buf.freeze()
}

/// Write one line without flushing
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(&encode_line(line))?;
    Ok(())
}

/// Write a command line and flush it to the peer
pub fn write_command<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    write_line(writer, line)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Read one reply using the configured framing
pub fn read_response<R: BufRead>(
    reader: &mut R,
    framing: Framing,
    shape: ResponseShape,
) -> Result<Response> {
    match framing {
        Framing::Delimited { max_response_bytes } => {
            read_delimited(reader, shape, max_response_bytes)
        }
        Framing::SingleRead { buffer_size } => read_single(reader, buffer_size),
    }
}

/// Exactly one bounded read.
///
/// Whatever the peer managed to deliver in that read is the reply; the
/// rest of a long or fragmented reply stays in the socket.
pub fn read_single<R: Read>(reader: &mut R, capacity: usize) -> Result<Response> {
    let mut buf = BytesMut::zeroed(capacity);
    let n = loop {
        match reader.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };
    if n == 0 {
        return Err(OfsError::ConnectionClosed);
    }
    buf.truncate(n);
    Ok(Response::new(String::from_utf8_lossy(&buf)))
}

/// Newline-delimited reply, extended by the count or size in the head line
pub fn read_delimited<R: BufRead>(
    reader: &mut R,
    shape: ResponseShape,
    max_response_bytes: usize,
) -> Result<Response> {
    let mut budget = Budget {
        max: max_response_bytes,
        remaining: max_response_bytes,
    };

    let head = match read_line(reader, &mut budget)? {
        Some(line) => line,
        None => return Err(OfsError::ConnectionClosed),
    };
    let mut text = head;

    match (shape, parse_count(&text)) {
        (ResponseShape::CountedLines, Some(count)) => {
            for received in 0..count {
                let line = read_line(reader, &mut budget)?.ok_or_else(|| {
                    OfsError::Protocol(format!(
                        "listing ended after {} of {} lines",
                        received, count
                    ))
                })?;
                text.push('\n');
                text.push_str(&line);
            }
        }
        (ResponseShape::SizedBody, Some(size)) if size > 0 => {
            // body plus its trailing newline
            budget.charge(size.saturating_add(1))?;
            let mut body = BytesMut::zeroed(size + 1);
            reader.read_exact(&mut body).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => {
                    OfsError::Protocol(format!("file body truncated (expected {} bytes)", size))
                }
                _ => OfsError::Io(e),
            })?;
            if body[size] != b'\n' {
                return Err(OfsError::Protocol(
                    "file body not followed by a newline".to_string(),
                ));
            }
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&body[..size]));
        }
        _ => {}
    }

    Ok(Response::new(text))
}

/// Bytes still allowed for the reply being read
struct Budget {
    max: usize,
    remaining: usize,
}

impl Budget {
    fn charge(&mut self, n: usize) -> Result<()> {
        if n > self.remaining {
            return Err(OfsError::Protocol(format!(
                "response exceeds {} bytes",
                self.max
            )));
        }
        self.remaining -= n;
        Ok(())
    }
}

/// Read up to and including `\n`, charging the bytes against `budget`.
///
/// Returns the line without its terminator, `None` on a clean EOF. Data cut
/// off by EOF before a newline still counts as a line.
fn read_line<R: BufRead>(reader: &mut R, budget: &mut Budget) -> Result<Option<String>> {
    let mut raw = Vec::new();
    // one byte past the budget so an oversized line is detectable
    let limit = (budget.remaining as u64).saturating_add(1);
    let n = reader.by_ref().take(limit).read_until(b'\n', &mut raw)?;
    if n == 0 {
        return Ok(None);
    }
    budget.charge(n)?;

    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}
