//! Connection
//!
//! Owns the TCP stream to one server and performs request/response
//! exchanges on it.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::config::{ClientConfig, Framing};
use crate::error::{OfsError, Result};
use crate::protocol::{
    read_response, redact, write_command, Response, ResponseShape, Upload, UploadOutcome,
};

/// A live connection to an OFS server
pub struct Connection {
    /// TCP stream reader (buffered for line framing)
    reader: BufReader<TcpStream>,

    /// TCP stream writer; every line is flushed on its own
    writer: BufWriter<TcpStream>,

    /// Response framing strategy
    framing: Framing,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Connect and consume the server greeting.
    ///
    /// Returns the connection together with the greeting text.
    pub fn open(config: &ClientConfig) -> Result<(Self, Response)> {
        config.validate()?;
        let addr = config.addr();
        let stream = dial(config).map_err(|source| OfsError::Connect {
            addr: addr.clone(),
            source,
        })?;

        let mut connection = Self::from_stream(stream, config)?;
        let greeting = read_response(
            &mut connection.reader,
            connection.framing,
            ResponseShape::Line,
        )?;
        tracing::debug!("Connected to {}: {}", connection.peer_addr, greeting);

        Ok((connection, greeting))
    }

    /// Wrap an already connected stream, applying socket options
    pub fn from_stream(stream: TcpStream, config: &ClientConfig) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            framing: config.framing,
            peer_addr,
        })
    }

    /// Send one command line and read its reply
    pub fn request(&mut self, line: &str, shape: ResponseShape) -> Result<Response> {
        tracing::trace!("-> {}: {}", self.peer_addr, redact(line));
        write_command(&mut self.writer, line)?;
        let response = read_response(&mut self.reader, self.framing, shape)?;
        tracing::trace!("<- {}: {} bytes", self.peer_addr, response.text().len());
        Ok(response)
    }

    /// Run a streaming upload on this connection
    pub fn upload(&mut self, upload: &mut Upload<'_>) -> Result<UploadOutcome> {
        tracing::debug!(
            "Streaming {} line(s) to {}",
            upload.line_count(),
            self.peer_addr
        );
        upload.run(&mut self.reader, &mut self.writer, self.framing)
    }

    /// Close both directions of the socket
    pub fn shutdown(self) {
        if let Err(e) = self.writer.get_ref().shutdown(Shutdown::Both) {
            // the peer may already be gone
            tracing::trace!("Shutdown of {} failed: {}", self.peer_addr, e);
        }
        tracing::debug!("Connection to {} closed", self.peer_addr);
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Resolve the configured endpoint and try each address in turn
fn dial(config: &ClientConfig) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (config.host.as_str(), config.port).to_socket_addrs()? {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}
