//! Test harness: an in-process fake OFS server on 127.0.0.1:0

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ofs_client::{Client, ClientConfig, Framing};

pub const GREETING: &str = "OFS READY";

/// Server end of one accepted connection
pub struct ServerSide {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    /// Every line received, in order
    pub received: Vec<String>,
}

impl ServerSide {
    fn new(stream: TcpStream) -> Self {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self {
            reader,
            writer: stream,
            received: Vec::new(),
        }
    }

    /// Next line without its newline; None once the client hangs up
    pub fn recv_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let line = line.trim_end_matches('\n').to_string();
                self.received.push(line.clone());
                Some(line)
            }
        }
    }

    /// Write raw text and flush
    pub fn send_raw(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).unwrap();
        self.writer.flush().unwrap();
    }

    /// Write one newline-terminated reply
    pub fn reply(&mut self, text: &str) {
        self.send_raw(&format!("{}\n", text));
    }

    /// Everything the client sends until it closes the connection
    pub fn read_rest(&mut self) -> Vec<u8> {
        let mut rest = Vec::new();
        let _ = self.reader.read_to_end(&mut rest);
        rest
    }
}

/// A fake server serving a fixed number of connections
pub struct FakeServer {
    pub addr: SocketAddr,
    handles: Vec<JoinHandle<Vec<String>>>,
}

impl FakeServer {
    /// Serve one connection: send `greeting`, then hand over to `handler`
    pub fn spawn<F>(greeting: &'static str, handler: F) -> Self
    where
        F: FnOnce(&mut ServerSide) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut side = ServerSide::new(stream);
            side.reply(greeting);
            handler(&mut side);
            side.received
        });
        Self {
            addr,
            handles: vec![handle],
        }
    }

    /// Serve `count` connections concurrently, each with its own handler call
    pub fn spawn_many<F>(count: usize, handler: F) -> Self
    where
        F: Fn(&mut ServerSide) + Send + Clone + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handles = (0..count)
            .map(|_| {
                let listener = listener.try_clone().unwrap();
                let handler = handler.clone();
                thread::spawn(move || {
                    let (stream, _) = listener.accept().unwrap();
                    let mut side = ServerSide::new(stream);
                    side.reply(GREETING);
                    handler(&mut side);
                    side.received
                })
            })
            .collect();
        Self { addr, handles }
    }

    /// Wait for every connection to finish; lines received per connection
    pub fn join(self) -> Vec<Vec<String>> {
        self.handles
            .into_iter()
            .map(|h| h.join().expect("server thread panicked"))
            .collect()
    }

    /// Lines received by a single-connection server
    pub fn join_one(self) -> Vec<String> {
        self.join().into_iter().next().unwrap_or_default()
    }
}

pub fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::builder()
        .host("127.0.0.1")
        .port(addr.port())
        .connect_timeout_ms(2000)
        .read_timeout_ms(5000)
        .write_timeout_ms(5000)
        .build()
}

pub fn single_read_config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::builder()
        .host("127.0.0.1")
        .port(addr.port())
        .read_timeout_ms(5000)
        .framing(Framing::SingleRead { buffer_size: 8192 })
        .build()
}

/// Connected client plus its greeting
pub fn connect(addr: SocketAddr) -> (Client, String) {
    let mut client = Client::new(config_for(addr));
    let greeting = client.connect().unwrap();
    (client, greeting)
}

/// A tiny in-memory rendition of the OFS command dialect.
///
/// Multi-line replies are written in several flushed pieces with short
/// pauses so the client sees them split across reads.
pub fn ofs_dialect(side: &mut ServerSide) {
    let mut files: BTreeMap<String, String> = BTreeMap::new();
    let mut logged_in = false;

    while let Some(line) = side.recv_line() {
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let keyword = match args.first() {
            Some(k) => k.to_ascii_uppercase(),
            None => continue,
        };

        if keyword == "LOGIN" {
            if args.len() == 3 && args[2] == "secret" {
                logged_in = true;
                side.reply("OK SESSION");
            } else {
                side.reply("ERR INVALID_CREDENTIALS");
            }
            continue;
        }
        if !logged_in {
            side.reply("ERR NOT_LOGGED_IN");
            continue;
        }

        match keyword.as_str() {
            "CREATE" => {
                side.reply("SEND_DATA <<<EOF>>> on its own line to finish");
                let mut data = String::new();
                while let Some(l) = side.recv_line() {
                    if l.trim() == "<<<EOF>>>" {
                        break;
                    }
                    data.push_str(&l);
                    data.push('\n');
                }
                files.insert(args[1].clone(), data);
                side.reply("OK");
            }
            "READ" => match files.get(&args[1]).cloned() {
                Some(data) => {
                    side.reply(&format!("OK {}", data.len()));
                    thread::sleep(Duration::from_millis(20));
                    if !data.is_empty() {
                        side.send_raw(&format!("{}\n", data));
                    }
                }
                None => side.reply("ERR FILE_NOT_FOUND"),
            },
            "LS" => {
                side.reply(&format!("OK {}", files.len()));
                let names: Vec<String> = files.keys().cloned().collect();
                for name in names {
                    thread::sleep(Duration::from_millis(10));
                    side.reply(&format!("{} 0", name.trim_start_matches('/')));
                }
            }
            "GET_STATS" => side.reply(&format!("OK files={} used=0 free=4096", files.len())),
            "LOGOUT" => {
                side.reply("OK");
                break;
            }
            _ => side.reply("ERR UNKNOWN_COMMAND"),
        }
    }
}
