//! Upload Tests
//!
//! Drives the streaming-upload state machine against scripted server
//! replies held in memory, and checks the exact bytes written.

use std::io::{self, Cursor, Write};

use ofs_client::protocol::{Upload, UploadState};
use ofs_client::{Framing, OfsError, UploadOutcome};

const ACK: &str = "SEND_DATA <<<EOF>>> on its own line to finish\n";

type Run = (UploadState, Vec<u8>, ofs_client::Result<UploadOutcome>);

fn run(command: &str, content: &str, replies: &str) -> Run {
    let mut upload = Upload::new(command, content).unwrap();
    let mut reader = Cursor::new(replies.as_bytes().to_vec());
    let mut written = Vec::new();
    let result = upload.run(&mut reader, &mut written, Framing::default());
    (upload.state(), written, result)
}

// =============================================================================
// Accepted Uploads
// =============================================================================

#[test]
fn test_upload_streams_lines_then_sentinel() {
    let replies = format!("{}OK CREATED\n", ACK);
    let (state, written, result) = run("CREATE /a.txt", "line1\nline2", &replies);

    assert_eq!(state, UploadState::Done);
    assert_eq!(
        String::from_utf8(written).unwrap(),
        "CREATE /a.txt\nline1\nline2\n<<<EOF>>>\n"
    );
    match result.unwrap() {
        UploadOutcome::Completed(r) => assert_eq!(r.text(), "OK CREATED"),
        other => panic!("Expected completed upload, got {:?}", other),
    }
}

#[test]
fn test_upload_empty_body_sends_only_sentinel() {
    let replies = format!("{}OK\n", ACK);
    let (state, written, result) = run("CREATE /empty.txt", "", &replies);

    assert_eq!(state, UploadState::Done);
    assert_eq!(written, b"CREATE /empty.txt\n<<<EOF>>>\n");
    assert!(!result.unwrap().is_declined());
}

#[test]
fn test_upload_trailing_newline_adds_no_empty_line() {
    let replies = format!("{}OK\n", ACK);
    let (_, written, _) = run("EDIT /a.txt 4", "x\n", &replies);
    assert_eq!(written, b"EDIT /a.txt 4\nx\n<<<EOF>>>\n");
}

#[test]
fn test_upload_keeps_inner_blank_lines() {
    let replies = format!("{}OK\n", ACK);
    let (_, written, _) = run("CREATE /a.txt", "a\n\nb", &replies);
    assert_eq!(written, b"CREATE /a.txt\na\n\nb\n<<<EOF>>>\n");
}

#[test]
fn test_bare_send_data_token_is_accepted() {
    let (state, _, result) = run("CREATE /a.txt", "x", "SEND_DATA\nOK\n");
    assert_eq!(state, UploadState::Done);
    assert_eq!(result.unwrap().response().text(), "OK");
}

/// Records what reaches the peer at each flush
#[derive(Default)]
struct Flushes {
    pending: Vec<u8>,
    sent: Vec<String>,
}

impl Write for Flushes {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let chunk = std::mem::take(&mut self.pending);
            self.sent.push(String::from_utf8(chunk).unwrap());
        }
        Ok(())
    }
}

#[test]
fn test_each_content_line_is_flushed_alone() {
    // the server reads one line per receive and drops anything after it
    let mut upload = Upload::new("CREATE /a.txt", "line1\nline2\nline3").unwrap();
    let mut reader = Cursor::new(format!("{}OK\n", ACK).into_bytes());
    let mut writer = Flushes::default();

    let outcome = upload
        .run(&mut reader, &mut writer, Framing::default())
        .unwrap();

    assert_eq!(outcome.response().text(), "OK");
    assert!(writer.pending.is_empty());
    assert_eq!(
        writer.sent,
        vec![
            "CREATE /a.txt\n",
            "line1\n",
            "line2\n",
            "line3\n",
            "<<<EOF>>>\n"
        ]
    );
}

// =============================================================================
// Declined Uploads
// =============================================================================

#[test]
fn test_declined_upload_sends_nothing_after_command() {
    let (state, written, result) = run(
        "CREATE /locked.txt",
        "x",
        "ERROR permission denied\n",
    );

    assert_eq!(state, UploadState::Aborted);
    assert_eq!(written, b"CREATE /locked.txt\n");
    let outcome = result.unwrap();
    assert!(outcome.is_declined());
    assert_eq!(outcome.into_response().text(), "ERROR permission denied");
}

#[test]
fn test_not_logged_in_is_a_decline() {
    let (state, written, result) = run("EDIT /a.txt 0", "data", "ERR NOT_LOGGED_IN\n");
    assert_eq!(state, UploadState::Aborted);
    assert_eq!(written, b"EDIT /a.txt 0\n");
    assert_eq!(
        result.unwrap(),
        UploadOutcome::Declined(ofs_client::Response::new("ERR NOT_LOGGED_IN"))
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_sentinel_in_content_is_rejected_up_front() {
    let err = Upload::new("CREATE /a.txt", "one\n<<<EOF>>>\nthree").unwrap_err();
    assert!(matches!(err, OfsError::SentinelCollision { line: 2 }));

    // the server trims lines before comparing
    let err = Upload::new("CREATE /a.txt", "  <<<EOF>>>  ").unwrap_err();
    assert!(matches!(err, OfsError::SentinelCollision { line: 1 }));

    assert!(Upload::new("CREATE /a.txt", "<<<EOF>>> not alone").is_ok());
}

#[test]
fn test_connection_lost_before_ack() {
    let (state, written, result) = run("CREATE /a.txt", "x", "");
    assert_eq!(state, UploadState::AwaitingContinuation);
    assert_eq!(written, b"CREATE /a.txt\n");
    assert!(matches!(result, Err(OfsError::ConnectionClosed)));
}

#[test]
fn test_connection_lost_before_final_reply() {
    let (state, written, result) = run("CREATE /a.txt", "x", ACK);
    assert_eq!(state, UploadState::Finalizing);
    assert_eq!(written, b"CREATE /a.txt\nx\n<<<EOF>>>\n");
    assert!(result.unwrap_err().is_transport());
}

#[test]
fn test_upload_cannot_run_twice() {
    let mut upload = Upload::new("CREATE /a.txt", "x").unwrap();
    assert_eq!(upload.state(), UploadState::Init);
    assert_eq!(upload.line_count(), 1);

    let mut reader = Cursor::new(b"ERR NO\n".to_vec());
    let mut written = Vec::new();
    upload
        .run(&mut reader, &mut written, Framing::default())
        .unwrap();

    let err = upload
        .run(&mut reader, &mut written, Framing::default())
        .unwrap_err();
    assert!(matches!(err, OfsError::InvalidCommand(_)));
    assert_eq!(written, b"CREATE /a.txt\n");
}
