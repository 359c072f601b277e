//! Network Module
//!
//! TCP connection handling.
//!
//! ## Model
//! - Blocking std sockets, one stream per connection
//! - Exactly one request in flight per connection

mod connection;

pub use connection::Connection;
