//! # OFS Client
//!
//! A blocking client for the OFS remote file-store protocol:
//! - Line-based text commands over one persistent TCP connection
//! - Streaming uploads (`CREATE`, `EDIT`) with a continuation handshake
//!   and an end-of-content sentinel
//! - Errors as structured results, or as `ERROR:` text for display
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Caller (CLI, UI, SharedClient, ClientPool)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Protocol Client                            │
//! │         (execute / execute_with_content / close)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Codec    │          │   Upload    │
//!   │  (framing)  │◄─────────│ (handshake) │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │ Connection  │
//!   │ (TcpStream) │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ofs_client::{Client, ClientConfig, Command};
//!
//! let mut client = Client::new(ClientConfig::default());
//! println!("{}", client.connect()?);
//! client.execute("LOGIN alice secret")?;
//! let outcome = client.execute_with_content("CREATE /notes.txt", "hello\nworld")?;
//! println!("{}", outcome.response());
//! println!("{}", client.run(&Command::Read { path: "/notes.txt".into() })?);
//! client.close();
//! # Ok::<(), ofs_client::OfsError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;
pub mod pool;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{OfsError, Result};
pub use config::{ClientConfig, Framing};
pub use client::Client;
pub use pool::{ClientPool, PooledClient, SharedClient};
pub use protocol::{Command, Response, Role, Status, UploadOutcome};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
