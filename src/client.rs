//! Protocol Client
//!
//! The public entry point: connect, run commands, stream uploads, close.
//!
//! Two flavours of every operation are offered:
//! - `execute` / `execute_with_content` return a [`Result`] for callers
//!   that want to branch on failures.
//! - `send` / `send_stream` never fail; any error comes back as text
//!   starting with `ERROR:`, ready to show to a user.
//!
//! A transport failure leaves the stream at an unknown position, so the
//! client drops the connection. Later calls report `NotConnected` until
//! [`Client::connect`] succeeds again.

use std::fmt;

use crate::config::ClientConfig;
use crate::error::{OfsError, Result};
use crate::network::Connection;
use crate::protocol::{
    is_streaming_line, Command, Response, ResponseShape, Upload, UploadOutcome,
};

/// Client for one OFS server connection
pub struct Client {
    config: ClientConfig,
    connection: Option<Connection>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("addr", &self.config.addr())
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl Client {
    /// Create a disconnected client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Connect to `host:port` with default settings.
    ///
    /// Returns the client and the server greeting.
    pub fn open(host: impl Into<String>, port: u16) -> Result<(Self, String)> {
        let config = ClientConfig::builder().host(host).port(port).build();
        let mut client = Self::new(config);
        let greeting = client.connect()?;
        Ok((client, greeting))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Open the connection and return the server greeting.
    ///
    /// An existing connection is closed first.
    pub fn connect(&mut self) -> Result<String> {
        self.close();
        let (connection, greeting) = Connection::open(&self.config)?;
        tracing::info!("Connected to {}", connection.peer_addr());
        self.connection = Some(connection);
        Ok(greeting.into_text())
    }

    /// Send one non-streaming command line and read its reply
    pub fn execute(&mut self, line: &str) -> Result<Response> {
        let connection = self.connection.as_mut().ok_or(OfsError::NotConnected)?;
        check_line(line)?;
        if is_streaming_line(line) {
            return Err(OfsError::InvalidCommand(format!(
                "'{}' carries content; use execute_with_content",
                line
            )));
        }

        let result = connection.request(line, ResponseShape::for_line(line));
        self.settle(result)
    }

    /// Send a command followed by streamed content.
    ///
    /// A server that does not answer `SEND_DATA` yields
    /// [`UploadOutcome::Declined`] and no content is written.
    pub fn execute_with_content(&mut self, line: &str, content: &str) -> Result<UploadOutcome> {
        let connection = self.connection.as_mut().ok_or(OfsError::NotConnected)?;
        check_line(line)?;
        let mut upload = Upload::new(line, content)?;

        let result = connection.upload(&mut upload);
        self.settle(result)
    }

    /// Run a typed, non-streaming command
    pub fn run(&mut self, command: &Command) -> Result<Response> {
        command.validate()?;
        if command.is_streaming() {
            return Err(OfsError::InvalidCommand(format!(
                "{} carries content; use upload",
                command.keyword()
            )));
        }
        self.execute(&command.to_string())
    }

    /// Run a typed streaming command (`CREATE`, `EDIT`)
    pub fn upload(&mut self, command: &Command, content: &str) -> Result<UploadOutcome> {
        command.validate()?;
        if !command.is_streaming() {
            return Err(OfsError::InvalidCommand(format!(
                "{} does not take content",
                command.keyword()
            )));
        }
        self.execute_with_content(&command.to_string(), content)
    }

    /// Like [`Client::execute`], with errors rendered as `ERROR: <detail>`
    pub fn send(&mut self, line: &str) -> String {
        match self.execute(line) {
            Ok(response) => response.into_text(),
            Err(e) => error_text(&e),
        }
    }

    /// Like [`Client::execute_with_content`], with errors rendered as text
    pub fn send_stream(&mut self, line: &str, content: &str) -> String {
        match self.execute_with_content(line, content) {
            Ok(outcome) => outcome.into_response().into_text(),
            Err(e) => error_text(&e),
        }
    }

    /// Close the connection. Does nothing when not connected.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.shutdown();
        }
    }

    /// Drop the connection after a transport failure
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_transport() {
                tracing::warn!("Dropping connection to {}: {}", self.config.addr(), e);
                self.close();
            }
        }
        result
    }
}

/// Text form of an error for the never-failing API
pub fn error_text(error: &OfsError) -> String {
    format!("ERROR: {}", error)
}

/// A command must fit on one line of the wire
fn check_line(line: &str) -> Result<()> {
    if line.trim().is_empty() {
        return Err(OfsError::InvalidCommand("empty command".to_string()));
    }
    if line.contains(['\n', '\r', '\0']) {
        return Err(OfsError::InvalidCommand(
            "command contains a line break or NUL".to_string(),
        ));
    }
    Ok(())
}
