//! Shared access
//!
//! The protocol has no request identifiers, so a connection can only ever
//! carry one exchange at a time. Two ways to use it from several threads:
//!
//! - [`SharedClient`]: one connection behind a mutex. Each call holds the
//!   lock for the whole command or upload.
//! - [`ClientPool`]: several independent connections. A checked-out client
//!   belongs to one thread until the guard is dropped. Each pooled
//!   connection has its own server session, so log in on each one.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{OfsError, Result};
use crate::protocol::{Response, UploadOutcome};

// =============================================================================
// SharedClient
// =============================================================================

/// Cloneable handle to a single client
#[derive(Debug, Clone)]
pub struct SharedClient {
    inner: Arc<Mutex<Client>>,
}

impl SharedClient {
    pub fn new(client: Client) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Exclusive access for a sequence of calls (e.g. LOGIN then READ)
    pub fn lock(&self) -> MutexGuard<'_, Client> {
        self.inner.lock()
    }

    pub fn execute(&self, line: &str) -> Result<Response> {
        self.inner.lock().execute(line)
    }

    pub fn execute_with_content(&self, line: &str, content: &str) -> Result<UploadOutcome> {
        self.inner.lock().execute_with_content(line, content)
    }

    pub fn send(&self, line: &str) -> String {
        self.inner.lock().send(line)
    }

    pub fn send_stream(&self, line: &str, content: &str) -> String {
        self.inner.lock().send_stream(line, content)
    }

    pub fn close(&self) {
        self.inner.lock().close();
    }
}

// =============================================================================
// ClientPool
// =============================================================================

/// Fixed set of connected clients
#[derive(Debug)]
pub struct ClientPool {
    config: ClientConfig,
    idle_tx: Sender<Client>,
    idle_rx: Receiver<Client>,
    size: usize,
}

impl ClientPool {
    /// Open `size` connections with the same configuration
    pub fn connect(config: ClientConfig, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(OfsError::Config("pool size must be at least 1".to_string()));
        }

        let (idle_tx, idle_rx) = channel::bounded(size);
        for _ in 0..size {
            let mut client = Client::new(config.clone());
            client.connect()?;
            // capacity == size, cannot block
            let _ = idle_tx.send(client);
        }
        tracing::debug!("Opened pool of {} connections to {}", size, config.addr());

        Ok(Self {
            config,
            idle_tx,
            idle_rx,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of clients not currently checked out
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    /// Wait for a free client.
    ///
    /// A client whose connection was dropped after a transport failure is
    /// reconnected before it is handed out. If that fails the client goes
    /// back to the pool and the error is returned.
    pub fn checkout(&self) -> Result<PooledClient<'_>> {
        let client = self
            .idle_rx
            .recv()
            .map_err(|_| OfsError::Config("pool channel disconnected".to_string()))?;
        self.revive(client)
    }

    /// Take a free client if one is available right now
    pub fn try_checkout(&self) -> Result<Option<PooledClient<'_>>> {
        match self.idle_rx.try_recv() {
            Ok(client) => self.revive(client).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn revive(&self, mut client: Client) -> Result<PooledClient<'_>> {
        if !client.is_connected() {
            tracing::debug!("Reconnecting pooled client to {}", self.config.addr());
            if let Err(e) = client.connect() {
                let _ = self.idle_tx.send(client);
                return Err(e);
            }
        }
        Ok(PooledClient { pool: self, client })
    }
}

/// A client borrowed from a [`ClientPool`]; returned on drop
#[derive(Debug)]
pub struct PooledClient<'a> {
    pool: &'a ClientPool,
    client: Client,
}

impl Deref for PooledClient<'_> {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.client
    }
}

impl DerefMut for PooledClient<'_> {
    fn deref_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl Drop for PooledClient<'_> {
    fn drop(&mut self) {
        // swap in an unconnected placeholder; only the real client goes back
        let placeholder = Client::new(self.pool.config.clone());
        let client = std::mem::replace(&mut self.client, placeholder);
        if !client.is_connected() {
            tracing::debug!("Returning disconnected client to pool; reconnects on checkout");
        }
        let _ = self.pool.idle_tx.send(client);
    }
}
